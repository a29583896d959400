//! Feature modules.

use crate::{client::Client, command::Command};
use async_trait::async_trait;
use herald_core::BoxError;
use std::sync::Arc;

/// A feature plugged into the runtime.
///
/// `init` runs once during initialization and returns the commands the
/// module contributes; they are registered after the built-ins, so a module
/// may replace one. `update` runs on every main loop pass once the
/// connection settled, for modules whose [`Module::do_update`] is `true`.
///
/// ```rust,ignore
/// struct Reminders;
///
/// #[async_trait]
/// impl Module for Reminders {
///     fn name(&self) -> &str { "Reminders" }
///     fn do_update(&self) -> bool { true }
///
///     async fn init(&self, _client: &Arc<Client>) -> Result<Vec<Command>, BoxError> {
///         Ok(vec![Command::new("remind", |args| async move { args.reply("Noted.").await })])
///     }
///
///     async fn update(&self, client: &Arc<Client>) -> Result<(), BoxError> {
///         // deliver due reminders
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Module: Send + Sync + 'static {
    /// Name used in failure reports.
    fn name(&self) -> &str;

    /// Whether [`Module::update`] should run.
    fn do_update(&self) -> bool {
        false
    }

    /// One-time setup. Returns the module's commands.
    async fn init(&self, client: &Arc<Client>) -> Result<Vec<Command>, BoxError>;

    /// Periodic work.
    async fn update(&self, _client: &Arc<Client>) -> Result<(), BoxError> {
        Ok(())
    }
}

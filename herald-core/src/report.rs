//! Failure reporting sink.

use crate::model::GuildId;
use std::{error::Error, sync::Arc};

/// The single call every catch site funnels into.
///
/// Implementations decide what to filter and where reports go. `context` is
/// free text describing where the failure happened.
pub trait FailureReporter: Send + Sync + 'static {
    /// Reports a failure.
    fn report(&self, error: &(dyn Error + 'static), context: &str, guild: Option<GuildId>);
}

impl<T: FailureReporter + ?Sized> FailureReporter for Arc<T> {
    fn report(&self, error: &(dyn Error + 'static), context: &str, guild: Option<GuildId>) {
        (**self).report(error, context, guild)
    }
}

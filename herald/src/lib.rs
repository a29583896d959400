//! # herald - Chat Bot Runtime
//!
//! `herald` turns the raw event stream of a chat platform connection into
//! permission-checked command invocations and typed events for feature
//! modules.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use herald::{BotConfig, ClientBuilder, GatewayEvent};
//!
//! let config = BotConfig::load("config.toml")?;
//! herald::logging::init_tracing(config.debug)?;
//!
//! let client = ClientBuilder::new(config, gateway)
//!     .module(Arc::new(Reminders))
//!     .on_connected(|lifecycle: Lifecycle| async move {
//!         tracing::info!("ready to serve");
//!         Ok(())
//!     })
//!     .build()?;
//!
//! while let Some(event) = transport.next_event().await {
//!     client.handle_event(event).await;
//! }
//! ```
//!
//! ## Layout
//!
//! - [`client`]: the runtime object, lifecycle and guild tracking
//! - [`dispatcher`]: message to command pipeline
//! - [`command`] and [`registry`]: commands and their lookup tables
//! - [`commands`]: the built-in commands
//! - [`main_loop`]: initialization and periodic module updates
//! - [`config`] and [`settings`]: static configuration and runtime guild settings

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub mod client;
pub mod command;
pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod guild;
pub mod logging;
pub mod main_loop;
pub mod messenger;
pub mod module;
pub mod registry;
pub mod settings;

pub use client::{Client, ClientBuilder, Lifecycle};
pub use command::{Command, CommandArguments, ManPage};
pub use config::{BotConfig, ConfigError, RoleConfig};
pub use dispatcher::Dispatcher;
pub use guild::{Guild, GuildStore};
pub use main_loop::{MainLoop, Tick, TickPhase};
pub use messenger::{DirectMessenger, DmOutcome};
pub use module::Module;
pub use registry::{CommandTable, CustomAlias, CustomCommand, GuildCommands, Resolved};
pub use settings::{GuildSettings, SettingsStore};

pub use herald_core::{
    BoxError, Capabilities, ChannelId, ChatMessage, CommandError, CommandOptions, Embed,
    FailureReporter, Gateway, GatewayEvent, GuildId, GuildInfo, Handler, HandlerResult,
    HeraldError, Member, MessageId, OutgoingMessage, PermissionOverride, PermissionType, RoleId,
    TransportError, User, UserId,
};
pub use herald_std::{EventBus, OperationGuard, OperationRegistry, PermissionResolver};

//! # herald-core
//!
//! Contracts for the Herald chat bot runtime.
//!
//! This crate carries no runtime machinery. It defines what flows through the
//! system and the seams the engines in `herald-std` plug into:
//!
//! - [`Message`]: marker for values moved across tasks
//! - [`Hook`]: inline interceptor returning [`HookResult`], used for priority claims
//! - [`Handler`]: terminal async endpoint, used for bus subscribers and command bodies
//! - [`Gateway`]: outbound calls into the chat platform
//! - [`FailureReporter`]: the single failure sink
//!
//! # Error Types
//!
//! - [`HeraldError`] - Top-level error type
//! - [`TransportError`] - Platform failures
//! - [`HookError`] - Subscriber failures
//! - [`CommandError`] - Command body failures

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod error;
mod event;
mod gateway;
mod handler;
mod hook;
mod message;
mod model;
mod permission;
mod report;

pub use error::{BoxError, CANNOT_MESSAGE_USER, CommandError, HeraldError, HookError, TransportError};
pub use event::{
    ChannelEvent, EventContext, GatewayEvent, GuildChanged, GuildEvent, MemberEvent,
    MemberUpdated, MessageDeleted, MessageEdited, MessageReceived, ReactionEvent, ReactionKind,
    RoleEvent, TypingStarted, UserChanged, VoiceStateChanged,
};
pub use gateway::{
    AllowedMentions, ApplicationCommand, Embed, Gateway, GatewayStatus, InteractionResponse,
    OutgoingMessage,
};
pub use handler::{DynHandler, Handler, HandlerResult};
pub use hook::{DynHook, FnHook, Hook, HookResult};
pub use message::Message;
pub use model::{
    Capabilities, Channel, ChannelId, ChannelKind, ChatMessage, GuildId, GuildInfo,
    Interaction, InteractionId, Member, MessageId, MessageRef, PLATFORM_EPOCH_MS, Reaction, Role,
    RoleId, User, UserId, VoiceState,
};
pub use permission::{
    CommandChannelOptions, CommandOptions, PermissionOverride, PermissionType,
    RolePermissionLevel, UnknownPermissionGroup,
};
pub use report::FailureReporter;

//! Error types for Herald.
//!
//! - [`HeraldError`] - Top-level error type
//! - [`TransportError`] - Failures reported by the chat platform
//! - [`HookError`] - Failures raised around subscriber execution
//! - [`CommandError`] - Failures raised by command bodies

use std::time::Duration;
use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Platform error code returned when a user does not accept direct messages.
pub const CANNOT_MESSAGE_USER: u32 = 50007;

/// Top-level error type for all Herald operations.
#[derive(Error, Debug)]
pub enum HeraldError {
    /// The platform rejected or failed a request.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A subscriber failed outside of its own error channel.
    #[error("hook error: {0}")]
    Hook(#[from] HookError),

    /// A command body failed.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// A custom error occurred.
    #[error(transparent)]
    Custom(BoxError),
}

/// Errors produced by the gateway transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// A REST call returned a non-success status.
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Platform specific JSON error code, if any.
        code: Option<u32>,
        /// Human readable message from the platform.
        message: String,
    },

    /// The request was rate limited.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Delay requested by the platform.
        retry_after: Duration,
    },

    /// The gateway socket was closed.
    #[error("WebSocket connection was closed")]
    Closed {
        /// Close frame code, if the peer sent one.
        code: Option<u16>,
        /// Close frame reason.
        reason: String,
    },

    /// The gateway asked the client to reconnect.
    #[error("Server requested a reconnect")]
    ReconnectRequested,

    /// The gateway stopped acknowledging heartbeats.
    #[error("Server missed last heartbeat")]
    HeartbeatMissed,

    /// Anything else the transport could not classify.
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Shorthand for an HTTP failure without a platform code.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        TransportError::Http {
            status,
            code: None,
            message: message.into(),
        }
    }

    /// Disconnect reasons the client recovers from on its own.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TransportError::ReconnectRequested | TransportError::HeartbeatMissed
        )
    }

    /// HTTP status, when this is an HTTP failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 5xx responses.
    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|status| status >= 500)
    }

    /// 404 responses.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// 403 responses.
    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(403)
    }

    /// The recipient does not accept direct messages.
    pub fn is_dm_blocked(&self) -> bool {
        matches!(
            self,
            TransportError::Http { code: Some(CANNOT_MESSAGE_USER), .. }
        ) || self.to_string().contains("50007")
    }
}

/// Errors raised around subscriber execution.
#[derive(Error, Debug)]
pub enum HookError {
    /// The subscriber panicked.
    #[error("subscriber panicked: {0}")]
    Panic(String),

    /// The subscriber was cancelled.
    #[error("subscriber was cancelled")]
    Cancelled,
}

impl HookError {
    /// Wraps a caught panic payload.
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&str>() {
            message.to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "unknown panic payload".to_string()
        };
        HookError::Panic(message)
    }
}

/// Errors raised by command bodies.
#[derive(Error, Debug)]
pub enum CommandError {
    /// The invocation was malformed. The text is sent back to the channel.
    #[error("{0}")]
    InvalidArguments(String),

    /// The referenced command does not exist.
    #[error("Command `{0}` not found.")]
    NotFound(String),

    /// The referenced command cannot be restricted.
    #[error("I'm sorry but you can not restrict this command.")]
    NotRestrictable,

    /// The operation observed its cancellation token.
    #[error("operation was cancelled")]
    Cancelled,
}

impl CommandError {
    /// Text that should be shown in the invoking channel, if any.
    pub fn user_message(&self) -> Option<String> {
        match self {
            CommandError::Cancelled => None,
            other => Some(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        let dm = TransportError::Http {
            status: 403,
            code: Some(CANNOT_MESSAGE_USER),
            message: "Cannot send messages to this user".into(),
        };
        assert!(dm.is_dm_blocked());
        assert!(dm.is_forbidden());
        assert!(!dm.is_server_error());

        assert!(TransportError::http(502, "Bad Gateway").is_server_error());
        assert!(TransportError::http(404, "Unknown Message").is_not_found());
        assert!(TransportError::ReconnectRequested.is_transient());
        assert!(!TransportError::Other("boom".into()).is_transient());
    }

    #[test]
    fn test_command_error_user_message() {
        let err = CommandError::InvalidArguments("Say what?".into());
        assert_eq!(err.user_message().as_deref(), Some("Say what?"));
        assert!(CommandError::Cancelled.user_message().is_none());
    }
}

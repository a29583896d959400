//! Direct messages that give up on users who keep refusing them.

use herald_core::{FailureReporter, Gateway, OutgoingMessage, TransportError, UserId};
use herald_std::Counters;
use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc};

/// Refusals after which a user is no longer messaged.
pub const MAX_REFUSALS: u32 = 3;

/// Outcome of [`DirectMessenger::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmOutcome {
    /// Delivered.
    Sent,
    /// The user is not known to the gateway.
    UnknownUser,
    /// The user refused too many times; nothing was sent.
    Suppressed,
    /// The user does not accept messages from the bot.
    Blocked,
    /// The platform failed.
    PlatformError,
    /// Any other failure; it was reported.
    Failed,
}

impl DmOutcome {
    /// Whether the message was delivered.
    pub fn is_sent(self) -> bool {
        self == DmOutcome::Sent
    }
}

/// Sends direct messages and remembers who refuses them.
pub struct DirectMessenger {
    gateway: Arc<dyn Gateway>,
    reporter: Arc<dyn FailureReporter>,
    counters: Arc<Counters>,
    refusals: Mutex<HashMap<UserId, u32>>,
}

impl DirectMessenger {
    /// Creates a messenger with no refusals recorded.
    pub fn new(
        gateway: Arc<dyn Gateway>,
        reporter: Arc<dyn FailureReporter>,
        counters: Arc<Counters>,
    ) -> Self {
        Self {
            gateway,
            reporter,
            counters,
            refusals: Mutex::new(HashMap::new()),
        }
    }

    /// Refusals recorded for `user`.
    pub fn refusals(&self, user: UserId) -> u32 {
        self.refusals.lock().get(&user).copied().unwrap_or(0)
    }

    /// Sends `message` to `user`.
    pub async fn send(&self, user: UserId, message: impl Into<OutgoingMessage>) -> DmOutcome {
        if self.gateway.cached_user(user).is_none() {
            return DmOutcome::UnknownUser;
        }
        if self.refusals(user) >= MAX_REFUSALS {
            tracing::debug!(%user, "direct message suppressed");
            return DmOutcome::Suppressed;
        }

        match self.gateway.send_direct_message(user, message.into()).await {
            Ok(_) => DmOutcome::Sent,
            Err(error) if error.is_forbidden() || error.is_dm_blocked() => {
                *self.refusals.lock().entry(user).or_insert(0) += 1;
                DmOutcome::Blocked
            }
            Err(error) if error.is_server_error() => {
                self.counters.server_error();
                DmOutcome::PlatformError
            }
            Err(error) => {
                self.report(&error);
                DmOutcome::Failed
            }
        }
    }

    fn report(&self, error: &TransportError) {
        self.reporter.report(error, "Unknown PM error.", None);
    }
}

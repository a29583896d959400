//! Testing utilities.
//!
//! - [`MockGateway`]: records outbound calls, serves canned history, injects failures
//! - [`RecordingReporter`]: captures every reported failure
//! - [`RecordingHandler`]: records the events it receives and lets tests wait for them

use async_trait::async_trait;
use herald_core::{
    ApplicationCommand, ChannelId, ChatMessage, FailureReporter, Gateway, GatewayStatus, GuildId,
    HandlerResult, InteractionId, InteractionResponse, Message, MessageId, OutgoingMessage,
    TransportError, User, UserId,
};
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    error::Error,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::sync::Notify;

// ============================================================================
// Mock Gateway
// ============================================================================

/// An outbound call captured by [`MockGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// `send_message`.
    Message {
        /// Target channel.
        channel: ChannelId,
        /// Sent message.
        message: OutgoingMessage,
    },
    /// `send_direct_message`.
    Direct {
        /// Recipient.
        user: UserId,
        /// Sent message.
        message: OutgoingMessage,
    },
    /// `edit_message`.
    Edit {
        /// Channel of the message.
        channel: ChannelId,
        /// Edited message.
        message: MessageId,
        /// New text.
        content: String,
    },
    /// `delete_message`.
    Delete {
        /// Channel of the message.
        channel: ChannelId,
        /// Deleted message.
        message: MessageId,
    },
    /// `set_presence`.
    Presence(String),
    /// `create_global_command`.
    GlobalCommand(ApplicationCommand),
    /// `respond_to_interaction`.
    Interaction {
        /// Answered interaction.
        interaction: InteractionId,
        /// The answer.
        response: InteractionResponse,
    },
}

/// In-memory [`Gateway`].
pub struct MockGateway {
    bot: User,
    status: Mutex<GatewayStatus>,
    users: Mutex<HashMap<UserId, User>>,
    history: Mutex<HashMap<MessageId, ChatMessage>>,
    outbound: Mutex<Vec<Outbound>>,
    fetch_failure: Mutex<Option<TransportError>>,
    send_failure: Mutex<Option<TransportError>>,
    direct_failures: Mutex<HashMap<UserId, TransportError>>,
    next_id: AtomicU64,
    sent: Notify,
}

impl MockGateway {
    /// Creates an online gateway for the given bot account.
    pub fn new(bot: User) -> Self {
        Self {
            bot,
            status: Mutex::new(GatewayStatus::online()),
            users: Mutex::new(HashMap::new()),
            history: Mutex::new(HashMap::new()),
            outbound: Mutex::new(Vec::new()),
            fetch_failure: Mutex::new(None),
            send_failure: Mutex::new(None),
            direct_failures: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1_000),
            sent: Notify::new(),
        }
    }

    /// Sets the reported connection state.
    pub fn set_status(&self, status: GatewayStatus) {
        *self.status.lock() = status;
    }

    /// Adds a user to the cache.
    pub fn add_user(&self, user: User) {
        self.users.lock().insert(user.id, user);
    }

    /// Makes a message fetchable.
    pub fn add_history(&self, message: ChatMessage) {
        self.history.lock().insert(message.id, message);
    }

    /// Fails every fetch with `error` until cleared.
    pub fn fail_fetches(&self, error: Option<TransportError>) {
        *self.fetch_failure.lock() = error;
    }

    /// Fails every channel send with `error` until cleared.
    pub fn fail_sends(&self, error: Option<TransportError>) {
        *self.send_failure.lock() = error;
    }

    /// Fails direct messages to `user` with `error`.
    pub fn fail_direct_messages(&self, user: UserId, error: TransportError) {
        self.direct_failures.lock().insert(user, error);
    }

    /// Every captured call, in order.
    pub fn outbound(&self) -> Vec<Outbound> {
        self.outbound.lock().clone()
    }

    /// Text of every channel message, in order.
    pub fn sent_messages(&self) -> Vec<(ChannelId, String)> {
        self.outbound
            .lock()
            .iter()
            .filter_map(|call| match call {
                Outbound::Message { channel, message } => Some((*channel, message.content.clone())),
                _ => None,
            })
            .collect()
    }

    /// Text of every direct message, in order.
    pub fn direct_messages(&self) -> Vec<(UserId, String)> {
        self.outbound
            .lock()
            .iter()
            .filter_map(|call| match call {
                Outbound::Direct { user, message } => Some((*user, message.content.clone())),
                _ => None,
            })
            .collect()
    }

    /// Waits until at least `count` calls were captured.
    ///
    /// Panics after one second; meant for tests only.
    pub async fn wait_for_outbound(&self, count: usize) -> Vec<Outbound> {
        let wait = async {
            loop {
                let notified = self.sent.notified();
                if self.outbound.lock().len() >= count {
                    return;
                }
                notified.await;
            }
        };
        if tokio::time::timeout(Duration::from_secs(1), wait).await.is_err() {
            panic!(
                "expected {count} outbound calls, got {:?}",
                self.outbound.lock()
            );
        }
        self.outbound()
    }

    fn record(&self, call: Outbound) {
        self.outbound.lock().push(call);
        self.sent.notify_waiters();
    }

    fn next_message_id(&self) -> MessageId {
        MessageId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

#[async_trait]
impl Gateway for MockGateway {
    fn current_user(&self) -> User {
        self.bot.clone()
    }

    fn status(&self) -> GatewayStatus {
        *self.status.lock()
    }

    fn cached_user(&self, user: UserId) -> Option<User> {
        self.users.lock().get(&user).cloned()
    }

    async fn send_message(
        &self,
        channel: ChannelId,
        message: OutgoingMessage,
    ) -> Result<MessageId, TransportError> {
        if let Some(error) = self.send_failure.lock().clone() {
            return Err(error);
        }
        self.record(Outbound::Message { channel, message });
        Ok(self.next_message_id())
    }

    async fn send_direct_message(
        &self,
        user: UserId,
        message: OutgoingMessage,
    ) -> Result<MessageId, TransportError> {
        if let Some(error) = self.direct_failures.lock().get(&user).cloned() {
            return Err(error);
        }
        self.record(Outbound::Direct { user, message });
        Ok(self.next_message_id())
    }

    async fn edit_message(
        &self,
        channel: ChannelId,
        message: MessageId,
        content: String,
    ) -> Result<(), TransportError> {
        self.record(Outbound::Edit {
            channel,
            message,
            content,
        });
        Ok(())
    }

    async fn delete_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<(), TransportError> {
        self.record(Outbound::Delete { channel, message });
        Ok(())
    }

    async fn fetch_message(
        &self,
        _channel: ChannelId,
        message: MessageId,
    ) -> Result<Option<ChatMessage>, TransportError> {
        if let Some(error) = self.fetch_failure.lock().clone() {
            return Err(error);
        }
        Ok(self.history.lock().get(&message).cloned())
    }

    async fn set_presence(&self, status: &str) -> Result<(), TransportError> {
        self.record(Outbound::Presence(status.to_string()));
        Ok(())
    }

    async fn create_global_command(
        &self,
        command: ApplicationCommand,
    ) -> Result<(), TransportError> {
        self.record(Outbound::GlobalCommand(command));
        Ok(())
    }

    async fn respond_to_interaction(
        &self,
        interaction: InteractionId,
        response: InteractionResponse,
    ) -> Result<(), TransportError> {
        self.record(Outbound::Interaction {
            interaction,
            response,
        });
        Ok(())
    }
}

// ============================================================================
// Recording Reporter
// ============================================================================

/// A failure captured by [`RecordingReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedFailure {
    /// `to_string()` of the error.
    pub message: String,
    /// The context text.
    pub context: String,
    /// The guild, if any.
    pub guild: Option<GuildId>,
}

/// A [`FailureReporter`] that keeps everything it is given.
#[derive(Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<ReportedFailure>>,
    reported: Notify,
}

impl RecordingReporter {
    /// Creates an empty reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// All reports so far.
    pub fn reports(&self) -> Vec<ReportedFailure> {
        self.reports.lock().clone()
    }

    /// Waits until at least `count` reports arrived.
    ///
    /// Panics after one second; meant for tests only.
    pub async fn wait_for(&self, count: usize) -> Vec<ReportedFailure> {
        let wait = async {
            loop {
                let notified = self.reported.notified();
                if self.reports.lock().len() >= count {
                    return;
                }
                notified.await;
            }
        };
        if tokio::time::timeout(Duration::from_secs(1), wait).await.is_err() {
            panic!("expected {count} reports, got {:?}", self.reports.lock());
        }
        self.reports()
    }
}

impl FailureReporter for RecordingReporter {
    fn report(&self, error: &(dyn Error + 'static), context: &str, guild: Option<GuildId>) {
        self.reports.lock().push(ReportedFailure {
            message: error.to_string(),
            context: context.to_string(),
            guild,
        });
        self.reported.notify_waiters();
    }
}

// ============================================================================
// Recording Handler
// ============================================================================

/// A handler that records every event it receives.
pub struct RecordingHandler<E> {
    events: Arc<Mutex<Vec<E>>>,
    received: Arc<Notify>,
}

impl<E> Clone for RecordingHandler<E> {
    fn clone(&self) -> Self {
        Self {
            events: self.events.clone(),
            received: self.received.clone(),
        }
    }
}

impl<E: Clone> Default for RecordingHandler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone> RecordingHandler<E> {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            received: Arc::new(Notify::new()),
        }
    }

    /// Events received so far.
    pub fn events(&self) -> Vec<E> {
        self.events.lock().clone()
    }

    /// Number of events received.
    pub fn count(&self) -> usize {
        self.events.lock().len()
    }

    /// Waits until at least `count` events arrived.
    ///
    /// Panics after one second; meant for tests only.
    pub async fn wait_for(&self, count: usize) -> Vec<E> {
        let wait = async {
            loop {
                let notified = self.received.notified();
                if self.events.lock().len() >= count {
                    return;
                }
                notified.await;
            }
        };
        if tokio::time::timeout(Duration::from_secs(1), wait).await.is_err() {
            panic!("expected {count} events, got {}", self.events.lock().len());
        }
        self.events()
    }
}

impl<E: Message + Clone> herald_core::Handler<E> for RecordingHandler<E> {
    async fn call(&self, input: E) -> HandlerResult {
        self.events.lock().push(input);
        self.received.notify_waiters();
        Ok(())
    }
}

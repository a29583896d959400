//! Outbound transport contract.
//!
//! The connection itself (login, heartbeats, reconnect backoff, REST) lives
//! behind [`Gateway`]. The runtime only needs the calls below.

use crate::{
    error::TransportError,
    model::{ChannelId, ChatMessage, InteractionId, MessageId, User, UserId},
};
use async_trait::async_trait;

/// Connection state reported by the transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GatewayStatus {
    /// The session is authenticated.
    pub logged_in: bool,
    /// The socket is connected.
    pub connected: bool,
}

impl GatewayStatus {
    /// Logged in and connected.
    pub fn online() -> Self {
        Self {
            logged_in: true,
            connected: true,
        }
    }

    /// Both flags set.
    pub fn is_online(self) -> bool {
        self.logged_in && self.connected
    }
}

/// Which mentions in an outgoing message may ping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AllowedMentions {
    /// Nothing pings.
    None,
    /// Only explicit user mentions ping.
    #[default]
    Users,
    /// Everything pings, including `@everyone`.
    All,
}

/// A rich embed attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Embed {
    /// Title line.
    pub title: Option<String>,
    /// Body text.
    pub description: Option<String>,
    /// Side color.
    pub color: Option<u32>,
    /// Name/value fields.
    pub fields: Vec<(String, String)>,
}

/// A message to send.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Text content.
    pub content: String,
    /// Optional embed.
    pub embed: Option<Embed>,
    /// Mention policy.
    pub allowed_mentions: AllowedMentions,
}

impl OutgoingMessage {
    /// Plain text with the default mention policy.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    /// Sets the mention policy.
    pub fn allowed_mentions(mut self, allowed: AllowedMentions) -> Self {
        self.allowed_mentions = allowed;
        self
    }

    /// Attaches an embed.
    pub fn embed(mut self, embed: Embed) -> Self {
        self.embed = Some(embed);
        self
    }
}

impl From<&str> for OutgoingMessage {
    fn from(value: &str) -> Self {
        OutgoingMessage::text(value)
    }
}

impl From<String> for OutgoingMessage {
    fn from(value: String) -> Self {
        OutgoingMessage::text(value)
    }
}

/// A global application command definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationCommand {
    /// Command name.
    pub name: String,
    /// Description shown by the client.
    pub description: String,
}

/// Reply to an application command interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionResponse {
    /// Text content.
    pub content: String,
    /// Only visible to the invoking user.
    pub ephemeral: bool,
}

/// Outbound calls into the chat platform.
#[async_trait]
pub trait Gateway: Send + Sync + 'static {
    /// The bot account.
    fn current_user(&self) -> User;

    /// Current connection state.
    fn status(&self) -> GatewayStatus;

    /// Looks a user up in the transport cache.
    fn cached_user(&self, user: UserId) -> Option<User>;

    /// Posts a message to a channel.
    async fn send_message(
        &self,
        channel: ChannelId,
        message: OutgoingMessage,
    ) -> Result<MessageId, TransportError>;

    /// Sends a direct message to a user.
    async fn send_direct_message(
        &self,
        user: UserId,
        message: OutgoingMessage,
    ) -> Result<MessageId, TransportError>;

    /// Replaces the text of a message sent by the bot.
    async fn edit_message(
        &self,
        channel: ChannelId,
        message: MessageId,
        content: String,
    ) -> Result<(), TransportError>;

    /// Deletes a message.
    async fn delete_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<(), TransportError>;

    /// Reads a message from channel history.
    async fn fetch_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<Option<ChatMessage>, TransportError>;

    /// Sets the presence text.
    async fn set_presence(&self, status: &str) -> Result<(), TransportError>;

    /// Registers a global application command.
    async fn create_global_command(&self, command: ApplicationCommand)
    -> Result<(), TransportError>;

    /// Answers an application command interaction.
    async fn respond_to_interaction(
        &self,
        interaction: InteractionId,
        response: InteractionResponse,
    ) -> Result<(), TransportError>;
}

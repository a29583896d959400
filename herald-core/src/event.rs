//! Inbound events.
//!
//! [`GatewayEvent`] is what the transport hands to the runtime. The bus turns
//! the raw form into the typed payloads below before firing subscribers;
//! references to uncached messages are resolved on the way.

use crate::{
    error::TransportError,
    message::Message,
    model::{
        Channel, ChannelId, ChatMessage, GuildId, GuildInfo, Interaction, Member, MessageRef,
        Reaction, Role, User, VoiceState,
    },
};

/// Raw event stream produced by the gateway transport.
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    /// The transport started connecting.
    Connecting,
    /// The socket is up.
    Connected,
    /// The session is ready.
    Ready,
    /// The socket dropped.
    Disconnected(TransportError),

    /// A guild became available after connecting.
    GuildAvailable(GuildInfo),
    /// A guild became unavailable.
    GuildUnavailable(GuildInfo),
    /// The bot was added to a guild.
    GuildJoined(GuildInfo),
    /// The bot left or was removed from a guild.
    GuildLeft(GuildInfo),
    /// Guild information changed.
    GuildUpdated {
        /// Previous info.
        before: GuildInfo,
        /// Current info.
        after: GuildInfo,
    },

    /// A role was created.
    RoleCreated(Role),
    /// A role changed.
    RoleUpdated {
        /// Previous role.
        before: Role,
        /// Current role.
        after: Role,
    },
    /// A role was deleted.
    RoleDeleted(Role),

    /// A channel was created.
    ChannelCreated(Channel),
    /// A channel changed.
    ChannelUpdated {
        /// Previous channel.
        before: Channel,
        /// Current channel.
        after: Channel,
    },
    /// A channel was deleted.
    ChannelDestroyed(Channel),

    /// A message was posted.
    MessageReceived(ChatMessage),
    /// A message was edited.
    MessageUpdated {
        /// The message before the edit, possibly uncached.
        before: MessageRef,
        /// The message after the edit.
        after: ChatMessage,
    },
    /// A message was deleted.
    MessageDeleted(MessageRef),

    /// A reaction was added.
    ReactionAdded {
        /// Reacted message.
        message: MessageRef,
        /// The reaction.
        reaction: Reaction,
    },
    /// A reaction was removed.
    ReactionRemoved {
        /// Reacted message.
        message: MessageRef,
        /// The reaction.
        reaction: Reaction,
    },
    /// All reactions were removed.
    ReactionsCleared {
        /// Cleared message.
        message: MessageRef,
    },

    /// A member joined a guild.
    UserJoined(Member),
    /// A user left a guild.
    UserLeft {
        /// Guild that was left.
        guild_id: GuildId,
        /// The user.
        user: User,
    },
    /// A user was banned.
    UserBanned {
        /// Guild of the ban.
        guild_id: GuildId,
        /// The user.
        user: User,
    },
    /// A user was unbanned.
    UserUnbanned {
        /// Guild of the ban.
        guild_id: GuildId,
        /// The user.
        user: User,
    },
    /// A user account changed.
    UserUpdated {
        /// Previous state.
        before: User,
        /// Current state.
        after: User,
    },
    /// Guild membership changed. Either side may be missing from the cache.
    GuildMemberUpdated {
        /// Previous state.
        before: Option<Member>,
        /// Current state.
        after: Option<Member>,
    },
    /// A user started typing. The user may be missing from the cache.
    UserTyping {
        /// The user.
        user: Option<User>,
        /// The channel.
        channel_id: ChannelId,
    },
    /// A voice state changed.
    VoiceStateUpdated {
        /// The user.
        user: User,
        /// Guild of the voice channel.
        guild_id: Option<GuildId>,
        /// Previous state.
        before: VoiceState,
        /// Current state.
        after: VoiceState,
    },

    /// An application command was invoked.
    InteractionCreated(Interaction),
}

impl Message for GatewayEvent {}

/// Context attached to failures raised while handling an event.
pub trait EventContext {
    /// Multi-line description used by the failure reporter.
    fn failure_context(&self) -> String;

    /// Guild the event belongs to, if any.
    fn guild_id(&self) -> Option<GuildId> {
        None
    }
}

// ============================================================================
// Typed payloads
// ============================================================================

/// A posted message.
#[derive(Debug, Clone)]
pub struct MessageReceived {
    /// The message.
    pub message: ChatMessage,
}

/// An edited message.
#[derive(Debug, Clone)]
pub struct MessageEdited {
    /// The message before the edit, when it could be read.
    pub before: Option<ChatMessage>,
    /// The message after the edit.
    pub after: ChatMessage,
}

/// A deleted message that could still be read.
#[derive(Debug, Clone)]
pub struct MessageDeleted {
    /// The message.
    pub message: ChatMessage,
}

/// What happened to the reactions of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionKind {
    /// A reaction was added.
    Added,
    /// A reaction was removed.
    Removed,
    /// All reactions were removed.
    Cleared,
}

/// A reaction change on a resolved message.
#[derive(Debug, Clone)]
pub struct ReactionEvent {
    /// What happened.
    pub kind: ReactionKind,
    /// The reacted message.
    pub message: ChatMessage,
    /// The reaction, absent for [`ReactionKind::Cleared`].
    pub reaction: Option<Reaction>,
}

/// Guild lifecycle event.
#[derive(Debug, Clone)]
pub struct GuildEvent {
    /// The guild.
    pub guild: GuildInfo,
}

/// Guild information change.
#[derive(Debug, Clone)]
pub struct GuildChanged {
    /// Previous info.
    pub before: GuildInfo,
    /// Current info.
    pub after: GuildInfo,
}

/// Role lifecycle event.
#[derive(Debug, Clone)]
pub struct RoleEvent {
    /// Previous role, for updates.
    pub before: Option<Role>,
    /// The role.
    pub role: Role,
}

/// Channel lifecycle event.
#[derive(Debug, Clone)]
pub struct ChannelEvent {
    /// Previous channel, for updates.
    pub before: Option<Channel>,
    /// The channel.
    pub channel: Channel,
}

/// Membership event: join, leave, ban or unban.
#[derive(Debug, Clone)]
pub struct MemberEvent {
    /// The guild.
    pub guild_id: GuildId,
    /// The user.
    pub user: User,
    /// Membership details, for joins.
    pub member: Option<Member>,
}

/// Membership change with both sides cached.
#[derive(Debug, Clone)]
pub struct MemberUpdated {
    /// Previous state.
    pub before: Member,
    /// Current state.
    pub after: Member,
}

/// User account change.
#[derive(Debug, Clone)]
pub struct UserChanged {
    /// Previous state.
    pub before: User,
    /// Current state.
    pub after: User,
}

/// Typing indicator.
#[derive(Debug, Clone)]
pub struct TypingStarted {
    /// The user.
    pub user: User,
    /// The channel.
    pub channel_id: ChannelId,
}

/// Voice state change.
#[derive(Debug, Clone)]
pub struct VoiceStateChanged {
    /// The user.
    pub user: User,
    /// Guild of the voice channel.
    pub guild_id: Option<GuildId>,
    /// Previous state.
    pub before: VoiceState,
    /// Current state.
    pub after: VoiceState,
}

fn message_context(message: &ChatMessage) -> String {
    format!(
        "--MessageId: {}\n--ChannelId: {}\n--Content: {}",
        message.id, message.channel_id, message.content
    )
}

fn guild_context(guild_id: GuildId) -> String {
    format!("--GuildId: {guild_id}")
}

macro_rules! impl_message {
    ($($ty:ty),* $(,)?) => {$( impl Message for $ty {} )*};
}

impl_message!(
    MessageReceived,
    MessageEdited,
    MessageDeleted,
    ReactionEvent,
    GuildEvent,
    GuildChanged,
    RoleEvent,
    ChannelEvent,
    MemberEvent,
    MemberUpdated,
    UserChanged,
    TypingStarted,
    VoiceStateChanged,
);

impl EventContext for MessageReceived {
    fn failure_context(&self) -> String {
        message_context(&self.message)
    }
    fn guild_id(&self) -> Option<GuildId> {
        self.message.guild_id
    }
}

impl EventContext for MessageEdited {
    fn failure_context(&self) -> String {
        message_context(&self.after)
    }
    fn guild_id(&self) -> Option<GuildId> {
        self.after.guild_id
    }
}

impl EventContext for MessageDeleted {
    fn failure_context(&self) -> String {
        message_context(&self.message)
    }
    fn guild_id(&self) -> Option<GuildId> {
        self.message.guild_id
    }
}

impl EventContext for ReactionEvent {
    fn failure_context(&self) -> String {
        message_context(&self.message)
    }
    fn guild_id(&self) -> Option<GuildId> {
        self.message.guild_id
    }
}

impl EventContext for GuildEvent {
    fn failure_context(&self) -> String {
        guild_context(self.guild.id)
    }
    fn guild_id(&self) -> Option<GuildId> {
        Some(self.guild.id)
    }
}

impl EventContext for GuildChanged {
    fn failure_context(&self) -> String {
        guild_context(self.after.id)
    }
    fn guild_id(&self) -> Option<GuildId> {
        Some(self.after.id)
    }
}

impl EventContext for RoleEvent {
    fn failure_context(&self) -> String {
        format!("{}\n--RoleId: {}", guild_context(self.role.guild_id), self.role.id)
    }
    fn guild_id(&self) -> Option<GuildId> {
        Some(self.role.guild_id)
    }
}

impl EventContext for ChannelEvent {
    fn failure_context(&self) -> String {
        format!("--ChannelId: {}", self.channel.id)
    }
    fn guild_id(&self) -> Option<GuildId> {
        self.channel.guild_id
    }
}

impl EventContext for MemberEvent {
    fn failure_context(&self) -> String {
        format!("{}\n--UserId: {}", guild_context(self.guild_id), self.user.id)
    }
    fn guild_id(&self) -> Option<GuildId> {
        Some(self.guild_id)
    }
}

impl EventContext for MemberUpdated {
    fn failure_context(&self) -> String {
        format!(
            "{}\n--UserId: {}",
            guild_context(self.after.guild_id),
            self.after.id()
        )
    }
    fn guild_id(&self) -> Option<GuildId> {
        Some(self.after.guild_id)
    }
}

impl EventContext for UserChanged {
    fn failure_context(&self) -> String {
        format!("--UserId: {}", self.after.id)
    }
}

impl EventContext for TypingStarted {
    fn failure_context(&self) -> String {
        format!("--UserId: {}\n--ChannelId: {}", self.user.id, self.channel_id)
    }
}

impl EventContext for VoiceStateChanged {
    fn failure_context(&self) -> String {
        format!("--UserId: {}", self.user.id)
    }
    fn guild_id(&self) -> Option<GuildId> {
        self.guild_id
    }
}

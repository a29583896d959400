//! Platform data model.
//!
//! Plain values handed over by the transport. Everything here is cheap to
//! clone and safe to move onto spawned tasks.

use bitflags::bitflags;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Milliseconds between the Unix epoch and the platform epoch (2015-01-01).
pub const PLATFORM_EPOCH_MS: u64 = 1_420_070_400_000;

macro_rules! snowflake_id {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {$(
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Raw 64-bit value.
            pub fn get(self) -> u64 {
                self.0
            }

            /// Creation time encoded in the id.
            pub fn created_at(self) -> DateTime<Utc> {
                let millis = (self.0 >> 22) + PLATFORM_EPOCH_MS;
                Utc.timestamp_millis_opt(millis as i64)
                    .single()
                    .unwrap_or_default()
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }
    )*};
}

snowflake_id!(
    /// Guild identifier.
    GuildId,
    /// Channel identifier.
    ChannelId,
    /// User identifier.
    UserId,
    /// Message identifier.
    MessageId,
    /// Role identifier.
    RoleId,
    /// Application command interaction identifier.
    InteractionId,
);

impl ChannelId {
    /// Mention markup for this channel.
    pub fn mention(self) -> String {
        format!("<#{}>", self.0)
    }
}

impl UserId {
    /// Mention markup for this user.
    pub fn mention(self) -> String {
        format!("<@{}>", self.0)
    }
}

bitflags! {
    /// Platform capabilities relevant to the runtime.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Capabilities: u32 {
        /// May manage the guild.
        const MANAGE_GUILD = 1 << 0;
        /// Administrator.
        const ADMINISTRATOR = 1 << 1;
        /// May delete messages of other users.
        const MANAGE_MESSAGES = 1 << 2;
        /// May read channel history.
        const READ_MESSAGE_HISTORY = 1 << 3;
    }
}

/// A platform user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// User id.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Whether the account is a bot.
    pub bot: bool,
}

impl User {
    /// Creates a human user.
    pub fn new(id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            bot: false,
        }
    }
}

/// A user as seen inside a guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// The underlying user.
    pub user: User,
    /// Guild the membership belongs to.
    pub guild_id: GuildId,
    /// Roles held in the guild.
    pub roles: Vec<RoleId>,
    /// Effective guild-level capabilities.
    pub capabilities: Capabilities,
}

impl Member {
    /// Creates a member without roles or capabilities.
    pub fn new(user: User, guild_id: GuildId) -> Self {
        Self {
            user,
            guild_id,
            roles: Vec::new(),
            capabilities: Capabilities::empty(),
        }
    }

    /// Adds a role.
    pub fn with_role(mut self, role: impl Into<RoleId>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// Adds capabilities.
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities |= capabilities;
        self
    }

    /// Member id shortcut.
    pub fn id(&self) -> UserId {
        self.user.id
    }
}

/// Static guild information delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildInfo {
    /// Guild id.
    pub id: GuildId,
    /// Guild name.
    pub name: String,
    /// Owner of the guild.
    pub owner_id: UserId,
    /// Capabilities granted to the bot in this guild.
    pub bot_capabilities: Capabilities,
}

/// Kind of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    /// Text channel in a guild.
    GuildText,
    /// Voice channel in a guild.
    GuildVoice,
    /// Direct messages with a single user.
    Direct,
    /// Group direct messages.
    Group,
}

/// A channel reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    /// Channel id.
    pub id: ChannelId,
    /// Owning guild, for guild channels.
    pub guild_id: Option<GuildId>,
    /// Channel kind.
    pub kind: ChannelKind,
    /// Channel name.
    pub name: String,
}

/// A guild role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    /// Role id.
    pub id: RoleId,
    /// Owning guild.
    pub guild_id: GuildId,
    /// Role name.
    pub name: String,
}

/// A chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Message id.
    pub id: MessageId,
    /// Channel the message was posted in.
    pub channel_id: ChannelId,
    /// Kind of that channel.
    pub channel_kind: ChannelKind,
    /// Guild of the channel, if any.
    pub guild_id: Option<GuildId>,
    /// The author.
    pub author: User,
    /// Guild membership of the author, for guild messages.
    pub member: Option<Member>,
    /// Raw text.
    pub content: String,
    /// Users mentioned in the text, in order of appearance.
    pub mentions: Vec<User>,
}

impl ChatMessage {
    /// Whether the message was posted in a guild text channel.
    pub fn is_guild_text(&self) -> bool {
        self.channel_kind == ChannelKind::GuildText && self.guild_id.is_some()
    }

    /// Whether `user` is mentioned.
    pub fn mentions_user(&self, user: UserId) -> bool {
        self.mentions.iter().any(|mentioned| mentioned.id == user)
    }
}

/// A message that may not be present in the transport cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRef {
    /// Message id.
    pub id: MessageId,
    /// Channel the message lives in.
    pub channel_id: ChannelId,
    /// Kind of that channel.
    pub channel_kind: ChannelKind,
    /// Guild of the channel, if any.
    pub guild_id: Option<GuildId>,
    /// Cached copy, when the transport had one.
    pub cached: Option<ChatMessage>,
}

/// A reaction on a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reaction {
    /// Reacting user.
    pub user_id: UserId,
    /// Emoji name or id.
    pub emoji: String,
}

/// Voice state of a member.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceState {
    /// Connected channel, if any.
    pub channel_id: Option<ChannelId>,
    /// Self muted.
    pub self_mute: bool,
    /// Self deafened.
    pub self_deaf: bool,
}

/// An application command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction {
    /// Interaction id.
    pub id: InteractionId,
    /// Guild it was invoked in.
    pub guild_id: Option<GuildId>,
    /// Channel it was invoked in.
    pub channel_id: ChannelId,
    /// Invoking user.
    pub user: User,
    /// Name of the invoked command.
    pub command_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snowflake_timestamp() {
        // 175928847299117063 is the documented example snowflake: 2016-04-30 11:18:25.796 UTC.
        let id = MessageId(175_928_847_299_117_063);
        assert_eq!(id.created_at().timestamp_millis(), 1_462_015_105_796);
    }

    #[test]
    fn test_id_parsing_and_mentions() {
        let channel: ChannelId = " 42 ".parse().unwrap();
        assert_eq!(channel.mention(), "<#42>");
        assert_eq!(UserId(7).mention(), "<@7>");
        assert!("abc".parse::<RoleId>().is_err());
    }
}

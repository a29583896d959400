//! Bot configuration.
//!
//! Stored as TOML. The file is read once at start-up and written back only
//! through an explicit [`BotConfig::save`].

use crate::registry::{CustomAlias, CustomCommand};
use herald_core::{
    ChannelId, CommandChannelOptions, CommandOptions, GuildId, RoleId, RolePermissionLevel, UserId,
};
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

/// Reply used when the bot is mentioned without a recognised question.
pub const DEFAULT_MENTION_REPLY: &str = "Hi! Mention me with `help` or `prefix` if you're lost.";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Reading or writing the file failed.
    #[error("config io error at {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The file is not valid TOML for [`BotConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The value could not be rendered as TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// `token` is empty.
    #[error("missing bot token")]
    MissingToken,

    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// A role configured for one guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleConfig {
    /// Guild the role belongs to.
    pub guild_id: GuildId,
    /// The role.
    pub role_id: RoleId,
    /// Assigned level.
    pub level: RolePermissionLevel,
}

/// Process-wide configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Platform token.
    pub token: String,
    /// Verbose logging.
    pub debug: bool,
    /// Presence text shown once connected.
    pub game_status: String,
    /// Prefix that marks a message as a command.
    pub command_prefix: String,
    /// Re-run commands when their message is edited.
    pub execute_on_edit: bool,
    /// Ignore messages authored by bots.
    pub ignore_bots: bool,
    /// Ignore messages that ping everyone, and defuse those pings in custom commands.
    pub ignore_everyone: bool,
    /// `help` without arguments lists every command in the channel.
    pub help_prints_everything: bool,
    /// Process owner. Zero disables the owner shortcut.
    pub owner_user_id: UserId,
    /// Channel receiving guild failure notices. Zero falls back to the guild owner.
    pub notification_channel_id: ChannelId,
    /// Roles treated as admins in every guild.
    pub admin_role_ids: Vec<RoleId>,
    /// Roles treated as moderators in every guild.
    pub moderator_role_ids: Vec<RoleId>,
    /// Roles treated as sub-moderators in every guild.
    pub sub_moderator_role_ids: Vec<RoleId>,
    /// Number of shards the bot runs as.
    pub total_shards: u32,
    /// Shard served by this process.
    pub shard_id: u32,
    /// Grace period after connecting before updates start.
    pub initial_update_delay_secs: u64,
    /// Update passes per second.
    pub target_fps: f64,
    /// Operations running at once. Zero means no limit.
    pub operations_max: usize,
    /// Longest message the platform accepts.
    pub message_character_limit: usize,
    /// Fallback reply to mentions.
    pub mention_reply: String,

    /// Per-guild role levels.
    pub roles: Vec<RoleConfig>,
    /// Per-guild command options.
    pub command_options: Vec<CommandOptions>,
    /// Per-guild channel restrictions.
    pub channel_options: Vec<CommandChannelOptions>,
    /// Per-guild custom commands.
    pub custom_commands: Vec<CustomCommand>,
    /// Per-guild custom aliases.
    pub custom_aliases: Vec<CustomAlias>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            debug: false,
            game_status: String::new(),
            command_prefix: "!".to_string(),
            execute_on_edit: true,
            ignore_bots: true,
            ignore_everyone: true,
            help_prints_everything: false,
            owner_user_id: UserId(0),
            notification_channel_id: ChannelId(0),
            admin_role_ids: Vec::new(),
            moderator_role_ids: Vec::new(),
            sub_moderator_role_ids: Vec::new(),
            total_shards: 1,
            shard_id: 0,
            initial_update_delay_secs: 180,
            target_fps: 0.05,
            operations_max: 2,
            message_character_limit: 2000,
            mention_reply: DEFAULT_MENTION_REPLY.to_string(),
            roles: Vec::new(),
            command_options: Vec::new(),
            channel_options: Vec::new(),
            custom_commands: Vec::new(),
            custom_aliases: Vec::new(),
        }
    }
}

impl BotConfig {
    /// Reads the config at `path`, writing the defaults there first if the file is missing.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(path = %path.display(), "config not found, writing defaults");
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }

        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw)
    }

    /// Parses a TOML document.
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Writes the config to `path`, replacing the file in one rename.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let rendered = toml::to_string_pretty(self)?;
        let staging = path.with_extension("toml.tmp");
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        fs::write(&staging, rendered).map_err(io_error)?;
        fs::rename(&staging, path).map_err(io_error)?;
        Ok(())
    }

    /// Checks the values the runtime relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        if !self.target_fps.is_finite()
            || self.target_fps <= 0.0
            || Duration::try_from_secs_f64(self.target_fps.recip()).is_err()
        {
            return Err(ConfigError::Invalid(format!(
                "target_fps must be positive, got {}",
                self.target_fps
            )));
        }
        if self.total_shards == 0 || self.shard_id >= self.total_shards {
            return Err(ConfigError::Invalid(format!(
                "shard {} out of range for {} shards",
                self.shard_id, self.total_shards
            )));
        }
        if self.message_character_limit == 0 {
            return Err(ConfigError::Invalid(
                "message_character_limit must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Grace period after connecting.
    pub fn initial_update_delay(&self) -> Duration {
        Duration::from_secs(self.initial_update_delay_secs)
    }

    /// Target length of one update pass. Saturates for rates too low to represent.
    pub fn frame_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.target_fps.recip()).unwrap_or(Duration::MAX)
    }

    /// Lower bound for the pause between update passes.
    pub fn minimum_update_pause(&self) -> Duration {
        Duration::from_millis(u64::from(self.total_shards) * 1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = BotConfig::from_toml(
            r#"
            token = "abc"
            command_prefix = "?"
            admin_role_ids = [5, 6]

            [[custom_commands]]
            guild_id = 1
            command_id = "hug"
            response = "{sender} hugs {mentioned}"
            "#,
        )
        .unwrap();

        assert_eq!(config.command_prefix, "?");
        assert_eq!(config.admin_role_ids, vec![RoleId(5), RoleId(6)]);
        assert!(config.execute_on_edit);
        assert_eq!(config.operations_max, 2);
        assert_eq!(config.custom_commands[0].command_id, "hug");
        assert!(!config.custom_commands[0].mentions_enabled);
        config.validate().unwrap();
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            BotConfig::default().validate(),
            Err(ConfigError::MissingToken)
        ));

        let config = BotConfig {
            token: "abc".into(),
            shard_id: 1,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = BotConfig {
            token: "abc".into(),
            target_fps: 0.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_timing_helpers() {
        let config = BotConfig {
            total_shards: 3,
            target_fps: 0.5,
            ..Default::default()
        };
        assert_eq!(config.frame_interval(), Duration::from_secs(2));
        assert_eq!(config.minimum_update_pause(), Duration::from_secs(3));
        assert_eq!(config.initial_update_delay(), Duration::from_secs(180));
    }

    #[test]
    fn test_tiny_target_fps_is_rejected() {
        let config = BotConfig {
            token: "abc".into(),
            target_fps: 1e-300,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        assert_eq!(config.frame_interval(), Duration::MAX);
    }
}

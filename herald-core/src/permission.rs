//! Permission data types.
//!
//! The evaluation algorithm lives in `herald-std`; these are the values it
//! works on, shared with configuration.

use crate::model::{ChannelId, GuildId};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

bitflags! {
    /// Tiers allowed to execute a command, evaluated as a logical OR.
    ///
    /// The empty set means only the process owner may execute the command.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct PermissionType: u8 {
        /// Guild owner, or a member with both manage-guild and administrator.
        const SERVER_OWNER = 1 << 0;
        /// Members holding a configured admin role.
        const ADMIN = 1 << 1;
        /// Members holding a configured moderator role.
        const MODERATOR = 1 << 2;
        /// Members holding a configured sub-moderator role.
        const SUB_MODERATOR = 1 << 3;
        /// Members holding a role at member level or above.
        const MEMBER = 1 << 4;
        /// Anybody.
        const EVERYONE = 1 << 5;
    }
}

impl PermissionType {
    /// Only the configured process owner.
    pub const OWNER_ONLY: Self = Self::empty();

    /// Whether this is [`PermissionType::OWNER_ONLY`].
    pub fn is_owner_only(self) -> bool {
        self.is_empty()
    }
}

/// Server-admin configurable override of a command's required tiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionOverride {
    /// Keep the command's own requirement.
    #[default]
    Default,
    /// Nobody may execute the command.
    Nobody,
    /// Server owner only.
    ServerOwner,
    /// Admins and up.
    Admins,
    /// Moderators and up.
    Moderators,
    /// Sub-moderators and up.
    SubModerators,
    /// Members and up.
    Members,
    /// Everyone.
    Everyone,
}

impl PermissionOverride {
    /// All variants, in ascending openness.
    pub const ALL: [PermissionOverride; 8] = [
        PermissionOverride::Default,
        PermissionOverride::Nobody,
        PermissionOverride::ServerOwner,
        PermissionOverride::Admins,
        PermissionOverride::Moderators,
        PermissionOverride::SubModerators,
        PermissionOverride::Members,
        PermissionOverride::Everyone,
    ];

    /// The tier union this override rewrites the requirement to.
    ///
    /// `None` for [`PermissionOverride::Default`] and [`PermissionOverride::Nobody`].
    pub fn tiers(self) -> Option<PermissionType> {
        let base = PermissionType::SERVER_OWNER;
        match self {
            PermissionOverride::Default | PermissionOverride::Nobody => None,
            PermissionOverride::ServerOwner => Some(base),
            PermissionOverride::Admins => Some(base | PermissionType::ADMIN),
            PermissionOverride::Moderators => {
                Some(base | PermissionType::ADMIN | PermissionType::MODERATOR)
            }
            PermissionOverride::SubModerators => Some(
                base | PermissionType::ADMIN | PermissionType::MODERATOR | PermissionType::SUB_MODERATOR,
            ),
            PermissionOverride::Members => Some(
                base | PermissionType::ADMIN
                    | PermissionType::MODERATOR
                    | PermissionType::SUB_MODERATOR
                    | PermissionType::MEMBER,
            ),
            PermissionOverride::Everyone => Some(PermissionType::EVERYONE),
        }
    }

    fn name(self) -> &'static str {
        match self {
            PermissionOverride::Default => "Default",
            PermissionOverride::Nobody => "Nobody",
            PermissionOverride::ServerOwner => "ServerOwner",
            PermissionOverride::Admins => "Admins",
            PermissionOverride::Moderators => "Moderators",
            PermissionOverride::SubModerators => "SubModerators",
            PermissionOverride::Members => "Members",
            PermissionOverride::Everyone => "Everyone",
        }
    }
}

impl fmt::Display for PermissionOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a string names no [`PermissionOverride`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown permission group `{0}`")]
pub struct UnknownPermissionGroup(pub String);

impl FromStr for PermissionOverride {
    type Err = UnknownPermissionGroup;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PermissionOverride::ALL
            .into_iter()
            .find(|candidate| candidate.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownPermissionGroup(s.to_string()))
    }
}

/// Level assigned to a guild role.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RolePermissionLevel {
    /// No level.
    #[default]
    None,
    /// Publicly assignable role.
    Public,
    /// Member.
    Member,
    /// Sub-moderator.
    SubModerator,
    /// Moderator.
    Moderator,
    /// Admin.
    Admin,
}

/// Per-command options set by server admins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOptions {
    /// Guild the options belong to.
    pub guild_id: GuildId,
    /// Lowercase command id.
    pub command_id: String,
    /// Requirement override.
    #[serde(default)]
    pub permission_override: PermissionOverride,
    /// Delete the invoking message before executing.
    #[serde(default)]
    pub delete_request: bool,
}

/// Per-channel restriction record for a command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandChannelOptions {
    /// Guild the record belongs to.
    pub guild_id: GuildId,
    /// Lowercase command id.
    pub command_id: String,
    /// Restricted channel.
    pub channel_id: ChannelId,
    /// The command is blocked in this channel.
    #[serde(default)]
    pub blocked: bool,
    /// The channel is on the command's allow-list.
    #[serde(default)]
    pub allowed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_parsing_is_case_insensitive() {
        assert_eq!(
            "moderators".parse::<PermissionOverride>(),
            Ok(PermissionOverride::Moderators)
        );
        assert_eq!(
            "EVERYONE".parse::<PermissionOverride>(),
            Ok(PermissionOverride::Everyone)
        );
        assert!("wizards".parse::<PermissionOverride>().is_err());
    }

    #[test]
    fn test_override_tiers_are_cumulative() {
        let mods = PermissionOverride::Moderators.tiers().unwrap();
        assert!(mods.contains(PermissionType::SERVER_OWNER | PermissionType::ADMIN));
        assert!(!mods.contains(PermissionType::SUB_MODERATOR));
        assert_eq!(
            PermissionOverride::Everyone.tiers(),
            Some(PermissionType::EVERYONE)
        );
        assert_eq!(PermissionOverride::Nobody.tiers(), None);
    }

    #[test]
    fn test_role_levels_are_ordered() {
        assert!(RolePermissionLevel::Admin > RolePermissionLevel::Moderator);
        assert!(RolePermissionLevel::Member > RolePermissionLevel::Public);
    }
}

//! Permission resolution.
//!
//! Evaluated in order:
//!
//! 1. The configured process owner is always allowed.
//! 2. Channel restrictions, skipped for owner-only commands. A block record for
//!    the channel denies; any allow record switches the command to allow-list
//!    mode. A block record beats an allow record for the same channel.
//! 3. The per-command override: `Nobody` denies, anything but `Default`
//!    rewrites the required tiers.
//! 4. The required tiers are OR-ed; ownership implies every tier.

use herald_core::{
    ChannelId, CommandChannelOptions, CommandOptions, Capabilities, Member, PermissionOverride,
    PermissionType, RoleId, RolePermissionLevel, UserId,
};
use std::collections::{HashMap, HashSet};

/// Role configuration of one guild.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleTiers {
    admin: HashSet<RoleId>,
    moderator: HashSet<RoleId>,
    sub_moderator: HashSet<RoleId>,
    levels: HashMap<RoleId, RolePermissionLevel>,
}

impl RoleTiers {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds tiers from the three configured id lists. Zero ids are skipped.
    pub fn from_lists(admin: &[RoleId], moderator: &[RoleId], sub_moderator: &[RoleId]) -> Self {
        let mut tiers = Self::new();
        for &role in sub_moderator {
            tiers.insert(role, RolePermissionLevel::SubModerator);
        }
        for &role in moderator {
            tiers.insert(role, RolePermissionLevel::Moderator);
        }
        for &role in admin {
            tiers.insert(role, RolePermissionLevel::Admin);
        }
        tiers
    }

    /// Assigns `level` to `role`.
    ///
    /// Admin, moderator and sub-moderator levels also place the role on that
    /// tier's list. Zero ids are ignored.
    pub fn insert(&mut self, role: RoleId, level: RolePermissionLevel) {
        if role.get() == 0 {
            return;
        }
        match level {
            RolePermissionLevel::Admin => self.admin.insert(role),
            RolePermissionLevel::Moderator => self.moderator.insert(role),
            RolePermissionLevel::SubModerator => self.sub_moderator.insert(role),
            _ => false,
        };
        let entry = self.levels.entry(role).or_default();
        *entry = (*entry).max(level);
    }

    /// Level of `role`, if configured.
    pub fn level(&self, role: RoleId) -> Option<RolePermissionLevel> {
        self.levels.get(&role).copied()
    }

    /// Number of configured roles.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// No roles configured.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Restriction settings that apply to one command in one guild.
#[derive(Debug, Clone, Copy)]
pub struct CommandPolicy<'a> {
    /// The command's own requirement.
    pub required: PermissionType,
    /// Admin-configured options.
    pub options: Option<&'a CommandOptions>,
    /// Channel restriction records for this command.
    pub channels: &'a [CommandChannelOptions],
}

impl<'a> CommandPolicy<'a> {
    /// A policy with no overrides or channel records.
    pub fn new(required: PermissionType) -> Self {
        Self {
            required,
            options: None,
            channels: &[],
        }
    }

    /// Attaches admin-configured options.
    pub fn with_options(mut self, options: Option<&'a CommandOptions>) -> Self {
        self.options = options;
        self
    }

    /// Attaches channel restriction records.
    pub fn with_channels(mut self, channels: &'a [CommandChannelOptions]) -> Self {
        self.channels = channels;
        self
    }
}

/// Why an invocation was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The channel is blocked for this command.
    ChannelBlocked,
    /// The command is allow-listed elsewhere.
    NotAllowListed,
    /// The override is `Nobody`.
    Nobody,
    /// The caller holds none of the required tiers.
    InsufficientTier,
}

/// Outcome of a permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Execution may proceed.
    Allowed,
    /// Execution is refused.
    Denied(DenyReason),
}

impl Decision {
    /// Whether execution may proceed.
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allowed)
    }
}

/// The caller and the guild facts the check needs.
#[derive(Debug, Clone, Copy)]
pub struct Caller<'a> {
    /// The invoking member.
    pub member: &'a Member,
    /// Owner of the guild.
    pub guild_owner: UserId,
    /// The guild's role configuration.
    pub roles: &'a RoleTiers,
    /// Channel of the invocation.
    pub channel: ChannelId,
}

impl Caller<'_> {
    /// Guild owner, or holds both manage-guild and administrator.
    pub fn is_owner(&self) -> bool {
        self.member.id() == self.guild_owner
            || self
                .member
                .capabilities
                .contains(Capabilities::MANAGE_GUILD | Capabilities::ADMINISTRATOR)
    }

    /// Owner or holds a configured admin role.
    pub fn is_admin(&self) -> bool {
        self.is_owner() || self.holds_any(&self.roles.admin)
    }

    /// Owner or holds a configured moderator role.
    pub fn is_moderator(&self) -> bool {
        self.is_owner() || self.holds_any(&self.roles.moderator)
    }

    /// Owner or holds a configured sub-moderator role.
    pub fn is_sub_moderator(&self) -> bool {
        self.is_owner() || self.holds_any(&self.roles.sub_moderator)
    }

    /// Owner or holds a role at member level or above.
    pub fn is_member(&self) -> bool {
        self.is_owner()
            || self.member.roles.iter().any(|role| {
                self.roles
                    .level(*role)
                    .is_some_and(|level| level >= RolePermissionLevel::Member)
            })
    }

    fn holds_any(&self, roles: &HashSet<RoleId>) -> bool {
        self.member.roles.iter().any(|role| roles.contains(role))
    }

    /// OR-evaluates `required` against this caller.
    pub fn satisfies(&self, required: PermissionType) -> bool {
        required.contains(PermissionType::EVERYONE)
            || (required.contains(PermissionType::SERVER_OWNER) && self.is_owner())
            || (required.contains(PermissionType::ADMIN) && self.is_admin())
            || (required.contains(PermissionType::MODERATOR) && self.is_moderator())
            || (required.contains(PermissionType::SUB_MODERATOR) && self.is_sub_moderator())
            || (required.contains(PermissionType::MEMBER) && self.is_member())
    }
}

/// Decides whether a caller may execute a command.
#[derive(Debug, Clone, Copy)]
pub struct PermissionResolver {
    owner_id: UserId,
}

impl PermissionResolver {
    /// Creates a resolver for the given process owner.
    pub fn new(owner_id: UserId) -> Self {
        Self { owner_id }
    }

    /// The configured process owner.
    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    /// Whether `user` is the configured process owner.
    pub fn is_process_owner(&self, user: UserId) -> bool {
        self.owner_id.get() != 0 && user == self.owner_id
    }

    /// Full check for a built-in command.
    pub fn check(&self, caller: &Caller<'_>, policy: &CommandPolicy<'_>) -> Decision {
        if self.is_process_owner(caller.member.id()) {
            return Decision::Allowed;
        }
        Self::check_guild(caller, policy)
    }

    /// Check for a custom command. Custom commands only ever require `Everyone`.
    pub fn check_custom(&self, caller: &Caller<'_>, policy: &CommandPolicy<'_>) -> Decision {
        let policy = CommandPolicy {
            required: PermissionType::EVERYONE,
            ..*policy
        };
        self.check(caller, &policy)
    }

    /// Steps 2 to 4, without the process owner shortcut.
    pub fn check_guild(caller: &Caller<'_>, policy: &CommandPolicy<'_>) -> Decision {
        let mut required = policy.required;

        if !required.is_owner_only() {
            if let Some(reason) = channel_restriction(policy.channels, caller.channel) {
                return Decision::Denied(reason);
            }
        }

        if let Some(options) = policy.options.filter(|_| !required.is_owner_only()) {
            match options.permission_override {
                PermissionOverride::Default => {}
                PermissionOverride::Nobody => return Decision::Denied(DenyReason::Nobody),
                other => required = other.tiers().unwrap_or(required),
            }
        }

        if caller.satisfies(required) {
            Decision::Allowed
        } else {
            Decision::Denied(DenyReason::InsufficientTier)
        }
    }
}

fn channel_restriction(records: &[CommandChannelOptions], channel: ChannelId) -> Option<DenyReason> {
    let current = records.iter().find(|record| record.channel_id == channel);

    if current.is_some_and(|record| record.blocked) {
        return Some(DenyReason::ChannelBlocked);
    }

    let allow_list_mode = records.iter().any(|record| record.allowed);
    if allow_list_mode && !current.is_some_and(|record| record.allowed) {
        return Some(DenyReason::NotAllowListed);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::{GuildId, User};

    const GUILD: GuildId = GuildId(1);
    const OWNER: UserId = UserId(10);
    const PROCESS_OWNER: UserId = UserId(99);
    const ADMIN_ROLE: RoleId = RoleId(100);
    const MOD_ROLE: RoleId = RoleId(200);
    const MEMBER_ROLE: RoleId = RoleId(300);

    fn tiers() -> RoleTiers {
        let mut tiers = RoleTiers::from_lists(&[ADMIN_ROLE], &[MOD_ROLE], &[RoleId(0)]);
        tiers.insert(MEMBER_ROLE, RolePermissionLevel::Member);
        tiers
    }

    fn member(id: u64) -> Member {
        Member::new(User::new(id, format!("user{id}")), GUILD)
    }

    fn caller<'a>(member: &'a Member, roles: &'a RoleTiers, channel: u64) -> Caller<'a> {
        Caller {
            member,
            guild_owner: OWNER,
            roles,
            channel: ChannelId(channel),
        }
    }

    fn channel_record(channel: u64, blocked: bool, allowed: bool) -> CommandChannelOptions {
        CommandChannelOptions {
            guild_id: GUILD,
            command_id: "say".into(),
            channel_id: ChannelId(channel),
            blocked,
            allowed,
        }
    }

    fn override_options(value: PermissionOverride) -> CommandOptions {
        CommandOptions {
            guild_id: GUILD,
            command_id: "say".into(),
            permission_override: value,
            delete_request: false,
        }
    }

    #[test]
    fn test_moderator_denied_for_owner_admin_command() {
        let resolver = PermissionResolver::new(PROCESS_OWNER);
        let roles = tiers();
        let moderator = member(20).with_role(MOD_ROLE);
        let policy = CommandPolicy::new(PermissionType::SERVER_OWNER | PermissionType::ADMIN);

        assert_eq!(
            resolver.check(&caller(&moderator, &roles, 1), &policy),
            Decision::Denied(DenyReason::InsufficientTier)
        );

        let admin = member(21).with_role(ADMIN_ROLE);
        assert!(resolver.check(&caller(&admin, &roles, 1), &policy).is_allowed());
    }

    #[test]
    fn test_guild_owner_always_passes_tiers() {
        let resolver = PermissionResolver::new(PROCESS_OWNER);
        let roles = RoleTiers::new();
        let owner = member(OWNER.get());

        for required in [
            PermissionType::SERVER_OWNER,
            PermissionType::ADMIN,
            PermissionType::MODERATOR,
            PermissionType::SUB_MODERATOR,
            PermissionType::MEMBER,
        ] {
            let policy = CommandPolicy::new(required);
            assert!(resolver.check(&caller(&owner, &roles, 1), &policy).is_allowed());
        }
    }

    #[test]
    fn test_manage_guild_and_administrator_counts_as_owner() {
        let roles = RoleTiers::new();
        let both = member(30).with_capabilities(Capabilities::MANAGE_GUILD | Capabilities::ADMINISTRATOR);
        let one = member(31).with_capabilities(Capabilities::ADMINISTRATOR);

        assert!(caller(&both, &roles, 1).is_owner());
        assert!(!caller(&one, &roles, 1).is_owner());
    }

    #[test]
    fn test_nobody_override_spares_only_process_owner() {
        let resolver = PermissionResolver::new(PROCESS_OWNER);
        let roles = tiers();
        let options = override_options(PermissionOverride::Nobody);
        let policy = CommandPolicy::new(PermissionType::EVERYONE).with_options(Some(&options));

        let guild_owner = member(OWNER.get());
        assert_eq!(
            resolver.check(&caller(&guild_owner, &roles, 1), &policy),
            Decision::Denied(DenyReason::Nobody)
        );

        let process_owner = member(PROCESS_OWNER.get());
        assert!(resolver.check(&caller(&process_owner, &roles, 1), &policy).is_allowed());
    }

    #[test]
    fn test_override_rewrites_requirement() {
        let resolver = PermissionResolver::new(PROCESS_OWNER);
        let roles = tiers();
        let options = override_options(PermissionOverride::Members);
        let policy = CommandPolicy::new(PermissionType::SERVER_OWNER).with_options(Some(&options));

        let regular = member(40).with_role(MEMBER_ROLE);
        assert!(resolver.check(&caller(&regular, &roles, 1), &policy).is_allowed());

        let stranger = member(41);
        assert!(!resolver.check(&caller(&stranger, &roles, 1), &policy).is_allowed());
    }

    #[test]
    fn test_allow_list_denies_other_channels() {
        let resolver = PermissionResolver::new(PROCESS_OWNER);
        let roles = RoleTiers::new();
        let records = [channel_record(1, false, true)];
        let policy = CommandPolicy::new(PermissionType::EVERYONE).with_channels(&records);
        let anyone = member(50);

        assert!(resolver.check(&caller(&anyone, &roles, 1), &policy).is_allowed());
        assert_eq!(
            resolver.check(&caller(&anyone, &roles, 2), &policy),
            Decision::Denied(DenyReason::NotAllowListed)
        );
    }

    #[test]
    fn test_block_beats_allow_on_same_channel() {
        let resolver = PermissionResolver::new(PROCESS_OWNER);
        let roles = RoleTiers::new();
        let records = [channel_record(1, true, true)];
        let policy = CommandPolicy::new(PermissionType::EVERYONE).with_channels(&records);

        assert_eq!(
            resolver.check(&caller(&member(50), &roles, 1), &policy),
            Decision::Denied(DenyReason::ChannelBlocked)
        );
    }

    #[test]
    fn test_owner_only_ignores_channels_and_overrides() {
        let resolver = PermissionResolver::new(PROCESS_OWNER);
        let roles = tiers();
        let records = [channel_record(1, true, false)];
        let options = override_options(PermissionOverride::Everyone);
        let policy = CommandPolicy::new(PermissionType::OWNER_ONLY)
            .with_options(Some(&options))
            .with_channels(&records);

        let admin = member(60).with_role(ADMIN_ROLE);
        assert_eq!(
            resolver.check(&caller(&admin, &roles, 1), &policy),
            Decision::Denied(DenyReason::InsufficientTier)
        );

        let process_owner = member(PROCESS_OWNER.get());
        assert!(resolver.check(&caller(&process_owner, &roles, 1), &policy).is_allowed());
    }

    #[test]
    fn test_custom_commands_check_everyone_but_respect_channels() {
        let resolver = PermissionResolver::new(PROCESS_OWNER);
        let roles = RoleTiers::new();
        let records = [channel_record(2, true, false)];
        let policy = CommandPolicy::new(PermissionType::ADMIN).with_channels(&records);
        let anyone = member(70);

        assert!(resolver.check_custom(&caller(&anyone, &roles, 1), &policy).is_allowed());
        assert!(!resolver.check_custom(&caller(&anyone, &roles, 2), &policy).is_allowed());
    }

    #[test]
    fn test_zero_role_ids_are_skipped() {
        let tiers = RoleTiers::from_lists(&[RoleId(0)], &[], &[]);
        assert!(tiers.is_empty());
    }
}

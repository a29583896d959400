//! Tracked guilds.
//!
//! A [`Guild`] is an immutable snapshot: guild info, the commands visible in
//! it, its role tiers and command restrictions. Changes build a new snapshot
//! and swap it into the [`GuildStore`] in one write. Work already in flight
//! keeps the snapshot it started with.

use crate::{
    command::Command,
    config::BotConfig,
    registry::{CommandTable, CustomCommand, GuildCommands},
    settings::GuildSettings,
};
use herald_core::{
    Capabilities, ChannelId, CommandChannelOptions, CommandOptions, Embed, GuildId, GuildInfo,
    Member, PermissionType,
};
use herald_std::{Caller, CommandPolicy, Decision, PermissionResolver, RoleTiers};
use parking_lot::RwLock;
use std::{
    collections::HashMap,
    sync::{Arc, atomic::AtomicU32},
};

/// Snapshot of one tracked guild.
#[derive(Clone)]
pub struct Guild {
    /// Platform information.
    pub info: GuildInfo,
    /// Commands visible in the guild.
    pub commands: GuildCommands,
    /// Role tiers.
    pub roles: RoleTiers,
    command_options: HashMap<String, CommandOptions>,
    channel_options: HashMap<String, Vec<CommandChannelOptions>>,
    http_failures: Arc<AtomicU32>,
}

impl Guild {
    /// Builds a snapshot from the shared table, the config and the guild's settings.
    pub fn build(
        info: GuildInfo,
        table: Arc<CommandTable>,
        config: &BotConfig,
        settings: GuildSettings,
        http_failures: Arc<AtomicU32>,
    ) -> Self {
        let mut roles = RoleTiers::from_lists(
            &config.admin_role_ids,
            &config.moderator_role_ids,
            &config.sub_moderator_role_ids,
        );
        for (role, level) in settings.roles {
            roles.insert(role, level);
        }

        let command_options = settings
            .command_options
            .into_iter()
            .map(|options| (options.command_id.clone(), options))
            .collect();

        let mut channel_options: HashMap<String, Vec<CommandChannelOptions>> = HashMap::new();
        for record in settings.channel_options {
            channel_options
                .entry(record.command_id.clone())
                .or_default()
                .push(record);
        }

        Self {
            info,
            commands: GuildCommands::new(table, settings.custom_commands, settings.custom_aliases),
            roles,
            command_options,
            channel_options,
            http_failures,
        }
    }

    /// Guild id.
    pub fn id(&self) -> GuildId {
        self.info.id
    }

    /// A copy carrying new platform information.
    pub fn with_info(&self, info: GuildInfo) -> Self {
        Self {
            info,
            ..self.clone()
        }
    }

    /// Options configured for `command_id`.
    pub fn options(&self, command_id: &str) -> Option<&CommandOptions> {
        self.command_options.get(command_id)
    }

    /// Channel restriction records of `command_id`.
    pub fn channel_options(&self, command_id: &str) -> &[CommandChannelOptions] {
        self.channel_options
            .get(command_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The restriction policy of `command_id`.
    pub fn policy(&self, command_id: &str, required: PermissionType) -> CommandPolicy<'_> {
        CommandPolicy::new(required)
            .with_options(self.options(command_id))
            .with_channels(self.channel_options(command_id))
    }

    /// `member` invoking something from `channel`.
    pub fn caller<'a>(&'a self, member: &'a Member, channel: ChannelId) -> Caller<'a> {
        Caller {
            member,
            guild_owner: self.info.owner_id,
            roles: &self.roles,
            channel,
        }
    }

    /// Permission decision for a built-in command.
    pub fn check(
        &self,
        resolver: &PermissionResolver,
        command: &Command,
        member: &Member,
        channel: ChannelId,
    ) -> Decision {
        resolver.check(
            &self.caller(member, channel),
            &self.policy(command.key(), command.required_tiers()),
        )
    }

    /// Permission decision for a custom command.
    pub fn check_custom(
        &self,
        resolver: &PermissionResolver,
        command: &CustomCommand,
        member: &Member,
        channel: ChannelId,
    ) -> Decision {
        let id = command.command_id.to_lowercase();
        resolver.check_custom(
            &self.caller(member, channel),
            &self.policy(&id, PermissionType::EVERYONE),
        )
    }

    /// Whether the bot holds `capabilities` here.
    pub fn bot_can(&self, capabilities: Capabilities) -> bool {
        self.info.bot_capabilities.contains(capabilities)
    }

    /// Consecutive platform failures seen for this guild.
    pub fn http_failures(&self) -> &Arc<AtomicU32> {
        &self.http_failures
    }

    /// Manual page of `command`. Owner-only commands and commands without a manual have none.
    pub fn man_page(&self, command: &Command, prefix: &str) -> Option<Embed> {
        let manual = command.manual_page()?;
        if command.required_tiers().is_owner_only() {
            return None;
        }

        let mut usage = format!("{prefix}{}", command.id());
        if !manual.usage.is_empty() {
            usage.push(' ');
            usage.push_str(&manual.usage);
        }

        let mut embed = Embed {
            title: Some(format!("{prefix}{}", command.id())),
            description: Some(command.describe().to_string()),
            color: Some(0x00_80_ff),
            fields: vec![("Usage".to_string(), format!("`{usage}`"))],
        };
        if !command.aliases().is_empty() {
            let aliases = command
                .aliases()
                .iter()
                .map(|alias| format!("`{prefix}{alias}`"))
                .collect::<Vec<_>>()
                .join(", ");
            embed.fields.push(("Aliases".to_string(), aliases));
        }
        if !manual.text.is_empty() {
            embed.fields.push(("Parameters".to_string(), manual.text.clone()));
        }
        Some(embed)
    }
}

/// Concurrent map of tracked guilds.
#[derive(Default)]
pub struct GuildStore {
    guilds: RwLock<HashMap<GuildId, Arc<Guild>>>,
    reload: tokio::sync::Mutex<()>,
}

impl GuildStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot of `guild`.
    pub fn get(&self, guild: GuildId) -> Option<Arc<Guild>> {
        self.guilds.read().get(&guild).cloned()
    }

    /// Whether `guild` is tracked.
    pub fn contains(&self, guild: GuildId) -> bool {
        self.guilds.read().contains_key(&guild)
    }

    /// Publishes a snapshot, replacing the previous one.
    pub fn insert(&self, guild: Guild) -> Arc<Guild> {
        let guild = Arc::new(guild);
        self.guilds.write().insert(guild.id(), guild.clone());
        guild
    }

    /// Builds a snapshot from the current one, if any, and publishes it.
    pub fn upsert(&self, guild: GuildId, build: impl FnOnce(Option<&Guild>) -> Guild) -> Arc<Guild> {
        let mut guilds = self.guilds.write();
        let next = Arc::new(build(guilds.get(&guild).map(Arc::as_ref)));
        guilds.insert(guild, next.clone());
        next
    }

    /// Builds a new snapshot from the current one and publishes it.
    pub fn replace_with(
        &self,
        guild: GuildId,
        change: impl FnOnce(&Guild) -> Guild,
    ) -> Option<Arc<Guild>> {
        let mut guilds = self.guilds.write();
        let current = guilds.get(&guild)?;
        let next = Arc::new(change(current));
        guilds.insert(guild, next.clone());
        Some(next)
    }

    /// Stops tracking `guild`.
    pub fn remove(&self, guild: GuildId) -> Option<Arc<Guild>> {
        self.guilds.write().remove(&guild)
    }

    /// Every tracked snapshot.
    pub fn snapshot(&self) -> Vec<Arc<Guild>> {
        self.guilds.read().values().cloned().collect()
    }

    /// Number of tracked guilds.
    pub fn len(&self) -> usize {
        self.guilds.read().len()
    }

    /// Nothing tracked.
    pub fn is_empty(&self) -> bool {
        self.guilds.read().is_empty()
    }

    /// Serializes guild rebuilds.
    pub fn reload_gate(&self) -> &tokio::sync::Mutex<()> {
        &self.reload
    }
}

//! Guild-scoped settings.
//!
//! Seeded from [`BotConfig`] and changed at runtime by the built-in
//! configuration commands. Changes live in memory only; a guild snapshot is
//! rebuilt from here after every change.

use crate::{
    config::{BotConfig, RoleConfig},
    registry::{CustomAlias, CustomCommand},
};
use herald_core::{
    ChannelId, CommandChannelOptions, CommandOptions, GuildId, RoleId, RolePermissionLevel,
};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Everything configurable for one guild.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuildSettings {
    /// Guild-specific role levels.
    pub roles: Vec<(RoleId, RolePermissionLevel)>,
    /// Per-command options.
    pub command_options: Vec<CommandOptions>,
    /// Per-command channel restrictions.
    pub channel_options: Vec<CommandChannelOptions>,
    /// Custom commands.
    pub custom_commands: Vec<CustomCommand>,
    /// Custom aliases.
    pub custom_aliases: Vec<CustomAlias>,
}

impl GuildSettings {
    /// Options of `command_id`, created with defaults when missing.
    pub fn options_mut(&mut self, guild: GuildId, command_id: &str) -> &mut CommandOptions {
        let index = match self
            .command_options
            .iter()
            .position(|options| options.command_id == command_id)
        {
            Some(index) => index,
            None => {
                self.command_options.push(CommandOptions {
                    guild_id: guild,
                    command_id: command_id.to_string(),
                    ..Default::default()
                });
                self.command_options.len() - 1
            }
        };
        &mut self.command_options[index]
    }

    /// Restriction record of `command_id` in `channel`, created when missing.
    pub fn channel_options_mut(
        &mut self,
        guild: GuildId,
        command_id: &str,
        channel: ChannelId,
    ) -> &mut CommandChannelOptions {
        let index = match self
            .channel_options
            .iter()
            .position(|record| record.command_id == command_id && record.channel_id == channel)
        {
            Some(index) => index,
            None => {
                self.channel_options.push(CommandChannelOptions {
                    guild_id: guild,
                    command_id: command_id.to_string(),
                    channel_id: channel,
                    ..Default::default()
                });
                self.channel_options.len() - 1
            }
        };
        &mut self.channel_options[index]
    }

    /// Adds `alias` unless a custom alias or custom command already owns its key.
    pub fn add_alias(&mut self, alias: CustomAlias) -> bool {
        let key = alias.alias.to_lowercase();
        let taken = self
            .custom_aliases
            .iter()
            .any(|existing| existing.alias.to_lowercase() == key)
            || self
                .custom_commands
                .iter()
                .any(|command| command.command_id.to_lowercase() == key);
        if taken {
            return false;
        }
        self.custom_aliases.push(alias);
        true
    }

    /// Clears every channel restriction of `command_id`. Returns how many records changed.
    pub fn reset_restrictions(&mut self, command_id: &str) -> usize {
        let mut changed = 0;
        for record in self
            .channel_options
            .iter_mut()
            .filter(|record| record.command_id == command_id)
        {
            if record.allowed || record.blocked {
                changed += 1;
            }
            record.allowed = false;
            record.blocked = false;
        }
        changed
    }
}

/// Settings of every guild, keyed by id.
#[derive(Debug, Default)]
pub struct SettingsStore {
    guilds: RwLock<HashMap<GuildId, GuildSettings>>,
}

impl SettingsStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Groups the guild-scoped tables of `config` by guild.
    pub fn from_config(config: &BotConfig) -> Self {
        let mut guilds: HashMap<GuildId, GuildSettings> = HashMap::new();
        for role in &config.roles {
            guilds
                .entry(role.guild_id)
                .or_default()
                .roles
                .push((role.role_id, role.level));
        }
        for options in &config.command_options {
            let mut options = options.clone();
            options.command_id = options.command_id.to_lowercase();
            guilds.entry(options.guild_id).or_default().command_options.push(options);
        }
        for record in &config.channel_options {
            let mut record = record.clone();
            record.command_id = record.command_id.to_lowercase();
            guilds.entry(record.guild_id).or_default().channel_options.push(record);
        }
        for command in &config.custom_commands {
            guilds
                .entry(command.guild_id)
                .or_default()
                .custom_commands
                .push(command.clone());
        }
        for alias in &config.custom_aliases {
            guilds
                .entry(alias.guild_id)
                .or_default()
                .custom_aliases
                .push(alias.clone());
        }
        Self {
            guilds: RwLock::new(guilds),
        }
    }

    /// Copy of the settings of `guild`; empty when nothing is configured.
    pub fn get(&self, guild: GuildId) -> GuildSettings {
        self.guilds.read().get(&guild).cloned().unwrap_or_default()
    }

    /// Applies `change` to the settings of `guild`.
    pub fn update<R>(&self, guild: GuildId, change: impl FnOnce(&mut GuildSettings) -> R) -> R {
        change(self.guilds.write().entry(guild).or_default())
    }

    /// Writes every guild's settings back into the guild-scoped tables of `config`.
    pub fn export_into(&self, config: &mut BotConfig) {
        config.roles.clear();
        config.command_options.clear();
        config.channel_options.clear();
        config.custom_commands.clear();
        config.custom_aliases.clear();

        let guilds = self.guilds.read();
        let mut ids: Vec<_> = guilds.keys().copied().collect();
        ids.sort();
        for id in ids {
            let settings = &guilds[&id];
            config.roles.extend(settings.roles.iter().map(|(role, level)| RoleConfig {
                guild_id: id,
                role_id: *role,
                level: *level,
            }));
            config.command_options.extend(settings.command_options.iter().cloned());
            config.channel_options.extend(
                settings
                    .channel_options
                    .iter()
                    .filter(|record| record.allowed || record.blocked)
                    .cloned(),
            );
            config.custom_commands.extend(settings.custom_commands.iter().cloned());
            config.custom_aliases.extend(settings.custom_aliases.iter().cloned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_is_grouped_by_guild() {
        let config = BotConfig {
            roles: vec![
                RoleConfig {
                    guild_id: GuildId(1),
                    role_id: RoleId(10),
                    level: RolePermissionLevel::Member,
                },
                RoleConfig {
                    guild_id: GuildId(2),
                    role_id: RoleId(20),
                    level: RolePermissionLevel::Admin,
                },
            ],
            command_options: vec![CommandOptions {
                guild_id: GuildId(1),
                command_id: "Say".into(),
                ..Default::default()
            }],
            ..Default::default()
        };

        let store = SettingsStore::from_config(&config);
        let first = store.get(GuildId(1));
        assert_eq!(first.roles, vec![(RoleId(10), RolePermissionLevel::Member)]);
        assert_eq!(first.command_options[0].command_id, "say");
        assert_eq!(store.get(GuildId(2)).roles.len(), 1);
        assert_eq!(store.get(GuildId(3)), GuildSettings::default());
    }

    #[test]
    fn test_records_are_created_once() {
        let store = SettingsStore::new();
        store.update(GuildId(1), |settings| {
            settings.options_mut(GuildId(1), "say").delete_request = true;
            settings.options_mut(GuildId(1), "say").permission_override =
                herald_core::PermissionOverride::Admins;
            settings
                .channel_options_mut(GuildId(1), "say", ChannelId(5))
                .blocked = true;
            settings
                .channel_options_mut(GuildId(1), "say", ChannelId(6))
                .allowed = true;
        });

        let settings = store.get(GuildId(1));
        assert_eq!(settings.command_options.len(), 1);
        assert!(settings.command_options[0].delete_request);
        assert_eq!(settings.channel_options.len(), 2);

        let changed = store.update(GuildId(1), |settings| settings.reset_restrictions("say"));
        assert_eq!(changed, 2);
        assert!(
            store
                .get(GuildId(1))
                .channel_options
                .iter()
                .all(|record| !record.allowed && !record.blocked)
        );
    }

    #[test]
    fn test_alias_key_is_added_once() {
        let store = SettingsStore::new();
        let alias = |target: &str| CustomAlias {
            guild_id: GuildId(1),
            alias: "x".into(),
            command_id: target.into(),
        };

        assert!(store.update(GuildId(1), |settings| settings.add_alias(alias("say"))));
        assert!(!store.update(GuildId(1), |settings| settings.add_alias(alias("status"))));

        let aliases = store.get(GuildId(1)).custom_aliases;
        assert_eq!(aliases, vec![alias("say")]);
    }

    #[test]
    fn test_export_drops_cleared_restrictions() {
        let store = SettingsStore::new();
        store.update(GuildId(2), |settings| {
            settings.roles.push((RoleId(20), RolePermissionLevel::Moderator));
            settings.channel_options_mut(GuildId(2), "say", ChannelId(5)).blocked = true;
            settings.channel_options_mut(GuildId(2), "say", ChannelId(6));
        });

        let mut config = BotConfig::default();
        store.export_into(&mut config);
        assert_eq!(config.roles[0].role_id, RoleId(20));
        assert_eq!(config.roles[0].guild_id, GuildId(2));
        assert_eq!(config.channel_options.len(), 1);
        assert_eq!(config.channel_options[0].channel_id, ChannelId(5));
    }
}

//! # Command Registry
//!
//! Built-in commands live in one [`CommandTable`] shared by every guild. It is
//! assembled during initialization and swapped in whole; nothing mutates a
//! published table.
//!
//! Custom commands and custom aliases are per guild and travel in
//! [`GuildCommands`], which answers every lookup the dispatcher and the
//! built-in commands make.

use crate::command::Command;
use herald_core::GuildId;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};

/// A guild-defined text response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomCommand {
    /// Owning guild.
    pub guild_id: GuildId,
    /// Lowercase command id.
    pub command_id: String,
    /// Response template.
    pub response: String,
    /// Shown by `help`.
    #[serde(default)]
    pub description: String,
    /// Let the response ping the users it mentions.
    #[serde(default)]
    pub mentions_enabled: bool,
}

/// A guild-defined alternative name for a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomAlias {
    /// Owning guild.
    pub guild_id: GuildId,
    /// Lowercase alias.
    pub alias: String,
    /// Lowercase id of the target command.
    pub command_id: String,
}

/// Map of lowercase command ids, aliases included, to commands.
#[derive(Clone, Default)]
pub struct CommandTable {
    commands: HashMap<String, Arc<Command>>,
}

impl CommandTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `command` and its aliases. A later registration under the same key wins.
    pub fn register(&mut self, command: Command) {
        let command = Arc::new(command);
        for alias in command.aliases() {
            let entry = Arc::new(Command::alias_of(&command, alias));
            if self.commands.insert(alias.clone(), entry).is_some() {
                tracing::debug!(alias, "command alias replaced");
            }
        }
        if self
            .commands
            .insert(command.key().to_string(), command.clone())
            .is_some()
        {
            tracing::debug!(command = command.key(), "command replaced");
        }
    }

    /// Entry stored under `key`, alias entries included.
    pub fn get(&self, key: &str) -> Option<&Arc<Command>> {
        self.commands.get(key)
    }

    /// Entry stored under `key`, with internal aliases redirected to their parent.
    pub fn resolve(&self, key: &str) -> Option<Arc<Command>> {
        let command = self.commands.get(key)?;
        match command.parent_id() {
            Some(parent) => self.commands.get(parent).cloned().or_else(|| Some(command.clone())),
            None => Some(command.clone()),
        }
    }

    /// Whether `key` is taken by a command or an internal alias.
    pub fn contains(&self, key: &str) -> bool {
        self.commands.contains_key(key)
    }

    /// Every entry, aliases included, in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = &Arc<Command>> {
        self.commands.values()
    }

    /// Primary commands sorted by id.
    pub fn primary(&self) -> Vec<Arc<Command>> {
        let mut commands: Vec<_> = self
            .commands
            .values()
            .filter(|command| command.parent_id().is_none())
            .cloned()
            .collect();
        commands.sort_by(|a, b| a.key().cmp(b.key()));
        commands
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// No keys.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// What a command token resolved to.
#[derive(Clone)]
pub enum Resolved {
    /// A built-in or module command.
    BuiltIn(Arc<Command>),
    /// A custom command of the guild.
    Custom(CustomCommand),
}

/// Result of mapping a token to the id its restrictions are stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestrictableId {
    /// No such command.
    NotFound,
    /// Core and owner-only commands cannot be restricted.
    NotRestrictable,
    /// Id to store options under.
    Id(String),
}

/// The commands visible in one guild.
#[derive(Clone, Default)]
pub struct GuildCommands {
    commands: Arc<CommandTable>,
    custom_commands: HashMap<String, CustomCommand>,
    custom_aliases: HashMap<String, CustomAlias>,
}

impl GuildCommands {
    /// Combines the shared table with the guild's own commands.
    pub fn new(
        commands: Arc<CommandTable>,
        custom_commands: impl IntoIterator<Item = CustomCommand>,
        custom_aliases: impl IntoIterator<Item = CustomAlias>,
    ) -> Self {
        Self {
            commands,
            custom_commands: custom_commands
                .into_iter()
                .map(|command| (command.command_id.to_lowercase(), command))
                .collect(),
            custom_aliases: custom_aliases
                .into_iter()
                .map(|alias| (alias.alias.to_lowercase(), alias))
                .collect(),
        }
    }

    /// The shared built-in table.
    pub fn table(&self) -> &Arc<CommandTable> {
        &self.commands
    }

    /// Custom commands keyed by lowercase id.
    pub fn custom_commands(&self) -> &HashMap<String, CustomCommand> {
        &self.custom_commands
    }

    /// Custom aliases keyed by lowercase alias.
    pub fn custom_aliases(&self) -> &HashMap<String, CustomAlias> {
        &self.custom_aliases
    }

    /// Resolves a lowercase token.
    ///
    /// Built-in commands win, either directly or through a custom alias.
    /// Custom commands are tried next, the same two ways.
    pub fn resolve(&self, key: &str) -> Option<Resolved> {
        let alias_target = self
            .custom_aliases
            .get(key)
            .map(|alias| alias.command_id.to_lowercase());

        if let Some(command) = self
            .commands
            .resolve(key)
            .or_else(|| alias_target.as_deref().and_then(|target| self.commands.resolve(target)))
        {
            return Some(Resolved::BuiltIn(command));
        }

        self.custom_commands
            .get(key)
            .or_else(|| alias_target.as_deref().and_then(|target| self.custom_commands.get(target)))
            .cloned()
            .map(Resolved::Custom)
    }

    /// Built-in command behind `key`, following custom aliases and internal aliases.
    pub fn builtin(&self, key: &str) -> Option<Arc<Command>> {
        match self.resolve(key)? {
            Resolved::BuiltIn(command) => Some(command),
            Resolved::Custom(_) => None,
        }
    }

    /// Whether `key` is already taken by anything in this guild.
    pub fn is_taken(&self, key: &str) -> bool {
        self.commands.contains(key)
            || self.custom_commands.contains_key(key)
            || self.custom_aliases.contains_key(key)
    }

    /// Maps a user-supplied token to the id its options are stored under.
    pub fn restrictable_id(&self, token: &str) -> RestrictableId {
        let mut key = token.to_lowercase();
        if let Some(alias) = self.custom_aliases.get(&key) {
            key = alias.command_id.to_lowercase();
        }

        if let Some(command) = self.commands.get(&key) {
            let command = self.commands.resolve(&key).unwrap_or_else(|| command.clone());
            if command.is_core() || command.required_tiers().is_owner_only() {
                return RestrictableId::NotRestrictable;
            }
            return RestrictableId::Id(command.key().to_string());
        }

        match self.custom_commands.get(&key) {
            Some(custom) => RestrictableId::Id(custom.command_id.to_lowercase()),
            None => RestrictableId::NotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::PermissionType;

    fn noop() -> Command {
        Command::new("placeholder", |_| async { Ok(()) })
    }

    fn table() -> Arc<CommandTable> {
        let mut table = CommandTable::new();
        table.register(
            Command::new("Status", |_| async { Ok(()) })
                .core()
                .alias("ping"),
        );
        table.register(
            Command::new("say", |_| async { Ok(()) })
                .required(PermissionType::SERVER_OWNER | PermissionType::ADMIN),
        );
        table.register(Command::new("restart", |_| async { Ok(()) }).required(PermissionType::OWNER_ONLY));
        Arc::new(table)
    }

    fn guild() -> GuildCommands {
        GuildCommands::new(
            table(),
            [CustomCommand {
                guild_id: GuildId(1),
                command_id: "Hug".into(),
                response: "hugs".into(),
                description: String::new(),
                mentions_enabled: false,
            }],
            [
                CustomAlias {
                    guild_id: GuildId(1),
                    alias: "speak".into(),
                    command_id: "say".into(),
                },
                CustomAlias {
                    guild_id: GuildId(1),
                    alias: "cuddle".into(),
                    command_id: "hug".into(),
                },
            ],
        )
    }

    #[test]
    fn test_internal_alias_redirects_to_parent() {
        let table = table();
        assert_eq!(table.get("ping").and_then(|c| c.parent_id()), Some("status"));
        assert_eq!(table.resolve("ping").map(|c| c.id().to_string()), Some("Status".into()));
        assert_eq!(table.primary().len(), 3);
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_later_registration_wins() {
        let mut table = CommandTable::new();
        table.register(noop().description("first"));
        table.register(noop().description("second"));
        assert_eq!(table.resolve("placeholder").unwrap().describe(), "second");
    }

    #[test]
    fn test_resolution_order() {
        let guild = guild();
        assert!(matches!(guild.resolve("say"), Some(Resolved::BuiltIn(c)) if c.id() == "say"));
        assert!(matches!(guild.resolve("speak"), Some(Resolved::BuiltIn(c)) if c.id() == "say"));
        assert!(matches!(guild.resolve("ping"), Some(Resolved::BuiltIn(c)) if c.key() == "status"));
        assert!(matches!(guild.resolve("hug"), Some(Resolved::Custom(c)) if c.response == "hugs"));
        assert!(matches!(guild.resolve("cuddle"), Some(Resolved::Custom(_))));
        assert!(guild.resolve("nope").is_none());
    }

    #[test]
    fn test_restrictable_id() {
        let guild = guild();
        assert_eq!(guild.restrictable_id("SPEAK"), RestrictableId::Id("say".into()));
        assert_eq!(guild.restrictable_id("ping"), RestrictableId::NotRestrictable);
        assert_eq!(guild.restrictable_id("restart"), RestrictableId::NotRestrictable);
        assert_eq!(guild.restrictable_id("cuddle"), RestrictableId::Id("hug".into()));
        assert_eq!(guild.restrictable_id("nope"), RestrictableId::NotFound);
    }
}

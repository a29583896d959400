//! # Built-in Commands
//!
//! Registered during initialization, before any module command. Every one of
//! them goes through the regular permission pipeline.
//!
//! | Group | Commands |
//! |-------|----------|
//! | system | `restart`, `operations`, `cancel`, `status` |
//! | chat | `say`, `edit` |
//! | help | `help`, `man` |
//! | aliases | `alias` |
//! | restrictions | `permissions`, `deleteRequest`, `cmdChannelAllow`, `cmdChannelBlock`, `cmdResetRestrictions` and their custom command variants |

mod alias;
mod chat;
mod help;
mod restrictions;
mod system;

use crate::{
    command::{Command, CommandArguments},
    registry::RestrictableId,
};
use herald_core::CommandError;

/// Every built-in command.
pub fn builtin() -> Vec<Command> {
    let mut commands = Vec::new();
    commands.extend(system::commands());
    commands.extend(chat::commands());
    commands.extend(help::commands());
    commands.extend(alias::commands());
    commands.extend(restrictions::commands());
    commands
}

/// The id options of `token` are stored under.
fn restrictable_id(args: &CommandArguments, token: &str) -> Result<String, CommandError> {
    match args.guild.commands.restrictable_id(token) {
        RestrictableId::Id(id) => Ok(id),
        RestrictableId::NotRestrictable => Err(CommandError::NotRestrictable),
        RestrictableId::NotFound => Err(CommandError::NotFound(token.to_string())),
    }
}

/// "`!a`", "`!a` and `!b`", "`!a`, `!b` and `!c`".
fn list_names<'a>(prefix: &str, names: impl IntoIterator<Item = &'a str>) -> String {
    let names: Vec<&str> = names.into_iter().collect();
    let mut listed = String::new();
    for (index, name) in names.iter().enumerate() {
        if index != 0 {
            listed.push_str(if index == names.len() - 1 { " and " } else { ", " });
        }
        listed.push_str(&format!("`{prefix}{name}`"));
    }
    listed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CommandTable;

    #[test]
    fn test_builtin_ids_are_unique() {
        let mut table = CommandTable::new();
        let commands = builtin();
        let count = commands.len();
        let aliases: usize = commands.iter().map(|command| command.aliases().len()).sum();
        for command in commands {
            table.register(command);
        }
        assert_eq!(table.len(), count + aliases);
        assert!(table.get("shutdown").is_some_and(|c| c.parent_id() == Some("restart")));
        assert!(table.get("ping").is_some_and(|c| c.parent_id() == Some("status")));
    }

    #[test]
    fn test_list_names() {
        assert_eq!(list_names("!", ["a"]), "`!a`");
        assert_eq!(list_names("!", ["a", "b"]), "`!a` and `!b`");
        assert_eq!(list_names("!", ["a", "b", "c"]), "`!a`, `!b` and `!c`");
    }
}

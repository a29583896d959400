//! Custom aliases.

use crate::{
    command::{Command, CommandArguments, ManPage},
    registry::CustomAlias,
};
use herald_core::{HandlerResult, PermissionType};

const LIST_HEADER: &str = "```http\nexampleAlias: command\n---------------------\n";

pub(super) fn commands() -> Vec<Command> {
    vec![
        Command::new("alias", alias)
            .description("Manage command aliases, use without parameters for more details.")
            .manual(ManPage::new(
                "<list|create|delete> [alias] [command]",
                "`list` - Display the list of custom aliases.\n\n`create alias command` - Create a new `alias` to the `command`.\n\n`delete alias` - Delete the `alias`.",
            ))
            .required(PermissionType::SERVER_OWNER | PermissionType::ADMIN),
    ]
}

fn usage(args: &CommandArguments) -> String {
    let (prefix, id) = (args.prefix(), args.command.id());
    format!(
        "Use this command with the following parameters:\n  \
         `{prefix}{id} list` - Display the list of your custom aliases.\n  \
         `{prefix}{id} create alias command` - Create a new `alias` to the old `command`.\n  \
         `{prefix}{id} delete alias` - Delete the `alias`.\n"
    )
}

async fn alias(args: CommandArguments) -> HandlerResult {
    let action = args.arguments.first().map(|action| action.to_lowercase());
    let response = match (action.as_deref(), args.arguments.len()) {
        (Some("list"), 1) => return list(&args).await,
        (Some("create" | "add"), 3) => create(&args, &args.arguments[1], &args.arguments[2]),
        (Some("delete" | "remove"), 2) => delete(&args, &args.arguments[1]),
        _ => usage(&args),
    };
    args.reply(response).await
}

async fn list(args: &CommandArguments) -> HandlerResult {
    let mut aliases: Vec<&CustomAlias> = args.guild.commands.custom_aliases().values().collect();
    if aliases.is_empty() {
        return args.reply("There aren't any! O_O").await;
    }
    aliases.sort_by(|a, b| a.alias.cmp(&b.alias));

    let limit = args.client.config().message_character_limit;
    let mut response = format!("Command-Aliases on this server:\n{LIST_HEADER}");
    for alias in aliases {
        let line = format!("{}: {}\n", alias.alias, alias.command_id);
        if line.len() + response.len() + 5 > limit {
            response.push_str("```");
            args.reply(std::mem::replace(&mut response, LIST_HEADER.to_string()))
                .await?;
        }
        response.push_str(&line);
    }
    response.push_str("```");
    args.reply(response).await
}

fn create(args: &CommandArguments, alias: &str, target: &str) -> String {
    let commands = &args.guild.commands;
    let key = alias.to_lowercase();
    if commands.is_taken(&key) {
        return format!("I already have a command with this name (`{alias}`)");
    }

    let target_key = target.to_lowercase();
    let command_id = match commands.table().get(&target_key) {
        Some(command) => command.parent_id().unwrap_or(command.key()).to_string(),
        None if commands.custom_commands().contains_key(&target_key) => target_key,
        None => return format!("Target command not found (`{target}`)"),
    };

    let guild = args.guild.id();
    let added = args.client.update_settings(guild, |settings| {
        settings.add_alias(CustomAlias {
            guild_id: guild,
            alias: key,
            command_id,
        })
    });
    if !added {
        return format!("I already have a command with this name (`{alias}`)");
    }
    tracing::info!(%guild, alias, "custom alias created");
    format!("Alias `{}{alias}` created.", args.prefix())
}

fn delete(args: &CommandArguments, alias: &str) -> String {
    let key = alias.to_lowercase();
    if !args.guild.commands.custom_aliases().contains_key(&key) {
        return format!("Alias not found. (`{alias}`)");
    }

    let guild = args.guild.id();
    args.client.update_settings(guild, |settings| {
        settings
            .custom_aliases
            .retain(|existing| !existing.alias.eq_ignore_ascii_case(&key));
    });
    tracing::info!(%guild, alias, "custom alias deleted");
    format!("RIP `{}{alias}`.", args.prefix())
}

//! Per-guild command restrictions: permission overrides, request deletion
//! and channel allow/block lists.

use super::restrictable_id;
use crate::command::{Command, CommandArguments, ManPage};
use herald_core::{ChannelId, HandlerResult, PermissionOverride, PermissionType};
use std::fmt::Write;

const SUCCESS: &str = "Success! \\o/";
const RESET: &str = "As you wish my thane.";

fn admins() -> PermissionType {
    PermissionType::SERVER_OWNER | PermissionType::ADMIN
}

pub(super) fn commands() -> Vec<Command> {
    vec![
        Command::new("permissions", permissions)
            .description("Configure permission groups for every command. Use without parameters for help.")
            .manual(ManPage::new(
                "<CommandId> [PermissionGroup]",
                "`<CommandId>` - name of the command for which you would like to display or change permissions.\n\n\
                 `[PermissionGroup]` - Optional argument to change the permissions of the CommandId - one of:\n\
                 *    `ServerOwner`, `Admins`, `Moderators`, `SubModerators` or `Members`, which follow the configured roles.\n\
                 *    `Everyone`, `Nobody` and `Default` (will set default permissions of the command.)\n",
            ))
            .required(PermissionType::SERVER_OWNER)
            .core(),
        Command::new("deleteRequest", delete_request)
            .description("Set a command to have the issuing request message deleted automatically.")
            .manual(ManPage::new(
                "<CommandId> <true|false>",
                "`<CommandId>` - The command for which to change the delete settings.\n\n`<true|false>` - True to delete the issuing request message.",
            ))
            .required(admins())
            .alias("removeRequest"),
        Command::new("cmdChannelAllow", |args| channel_restriction(args, Restriction::Allow))
            .description("Allow a command to be ran only in certain channels.")
            .manual(ManPage::new(
                "<CommandId> <add|remove> <ChannelId>",
                "`<CommandId>` - The command for which to change the restriction settings.\n\n`<add|remove>` - Add or remove to/from the restriction list.\n\n`<ChannelId>` - Id or mention of the channel in which to allow the execution of the Command",
            ))
            .required(admins()),
        Command::new("cmdChannelAllowAllCC", |args| custom_channel_restriction(args, Restriction::Allow))
            .description("Allow all custom commands to be ran only in certain channels.")
            .manual(ManPage::new(
                "<add|remove> <ChannelId>",
                "`<add|remove>` - Add or remove to/from the restriction list.\n\n`<ChannelId>` - Id or mention of the channel in which to allow the execution of the CustomCommands",
            ))
            .required(admins()),
        Command::new("cmdChannelBlock", |args| channel_restriction(args, Restriction::Block))
            .description("Block a command from certain channels.")
            .manual(ManPage::new(
                "<CommandId> <add|remove> <ChannelId>",
                "`<CommandId>` - The command for which to change the restriction settings.\n\n`<add|remove>` - Add or remove to/from the restriction list.\n\n`<ChannelId>` - Id or mention of the channel in which to deny the execution of the Command",
            ))
            .required(admins()),
        Command::new("cmdChannelBlockAllCC", |args| custom_channel_restriction(args, Restriction::Block))
            .description("Block all custom commands from certain channels.")
            .manual(ManPage::new(
                "<add|remove> <ChannelId>",
                "`<add|remove>` - Add or remove to/from the restriction list.\n\n`<ChannelId>` - Id or mention of the channel in which to deny the execution of the CustomCommands",
            ))
            .required(admins()),
        Command::new("cmdResetRestrictions", reset_restrictions)
            .description(
                "Reset restrictions placed on a command by the _cmdChannelAllow_ and _cmdChannelBlock_ commands. Use with the `CommandID` as parameter.",
            )
            .manual(ManPage::new(
                "<CommandId>",
                "`<CommandId>` - The command for which to reset the restriction settings.",
            ))
            .required(admins()),
        Command::new("cmdResetRestrictionsAllCC", reset_custom_restrictions)
            .description(
                "Reset restrictions placed on all custom commands by the _cmdChannelAllow_ and _cmdChannelBlock_ commands.",
            )
            .required(admins()),
    ]
}

// ============================================================================
// Permissions
// ============================================================================

fn permissions_usage(args: &CommandArguments) -> String {
    let (prefix, id) = (args.prefix(), args.command.id());
    format!(
        "Use this command with the following parameters:\n  \
         `{prefix}{id} CommandID PermissionGroup` - where `CommandID` is name of the command, and `PermissionGroups` can be:\n    \
         `ServerOwner`, `Admins`, `Moderators`, `SubModerators`, `Members`, `Everyone` - following the roles configured for this server.\n    \
         `Nobody` - Block this command from execution even by Server Owner.\n    \
         `Default` - will set default permissions of the command.\n  \
         For example `{prefix}{id} say Moderators`"
    )
}

/// The override that grants exactly `required`, `Everyone` when none does.
fn effective_override(required: PermissionType) -> PermissionOverride {
    PermissionOverride::ALL
        .into_iter()
        .find(|candidate| candidate.tiers() == Some(required))
        .unwrap_or(PermissionOverride::Everyone)
}

async fn permissions(args: CommandArguments) -> HandlerResult {
    let Some(token) = args.arguments.first() else {
        return args.reply(permissions_usage(&args)).await;
    };
    let id = restrictable_id(&args, token)?;

    let response = match args.arguments.get(1) {
        None => describe_permissions(&args, &id),
        Some(group) => match group.parse::<PermissionOverride>() {
            Ok(group) if args.arguments.len() == 2 => {
                let guild = args.guild.id();
                args.client.update_settings(guild, |settings| {
                    settings.options_mut(guild, &id).permission_override = group;
                });
                tracing::info!(%guild, command = %id, %group, "permission override changed");
                "All set!".to_string()
            }
            _ => permissions_usage(&args),
        },
    };
    args.reply(response).await
}

fn describe_permissions(args: &CommandArguments, id: &str) -> String {
    let options = args.guild.options(id).cloned().unwrap_or_default();
    let mut response = format!(
        "Current permissions for `{id}` are:\n`{}`",
        options.permission_override
    );

    if options.permission_override == PermissionOverride::Default {
        let effective = match args.guild.commands.table().get(id) {
            Some(command) => effective_override(command.required_tiers()),
            None => PermissionOverride::Everyone,
        };
        let _ = write!(response, " -> `{effective}`");
    }
    if options.delete_request {
        response.push_str("\n+ This command will attempt to delete the message that issued the command.");
    }

    let records = args.guild.channel_options(id);
    let blocked: Vec<ChannelId> = records
        .iter()
        .filter(|record| record.blocked)
        .map(|record| record.channel_id)
        .collect();
    if !blocked.is_empty() {
        response.push_str("\n+ This command can not be invoked in any of the following channels:");
        for channel in &blocked {
            let _ = write!(response, "\n    {}", channel.mention());
        }
    }

    let allowed: Vec<ChannelId> = records
        .iter()
        .filter(|record| record.allowed && !blocked.contains(&record.channel_id))
        .map(|record| record.channel_id)
        .collect();
    if !allowed.is_empty() {
        response.push_str("\n+ This command can be invoked only in the following channels:");
        for channel in allowed {
            let _ = write!(response, "\n    {}", channel.mention());
        }
    }
    response
}

// ============================================================================
// Request deletion
// ============================================================================

async fn delete_request(args: CommandArguments) -> HandlerResult {
    let delete = match args.arguments.get(1).map(|value| value.to_lowercase()) {
        Some(value) if value == "true" => true,
        Some(value) if value == "false" => false,
        _ => return Err(args.invalid_parameters()),
    };
    let id = restrictable_id(&args, &args.arguments[0])?;

    let guild = args.guild.id();
    args.client.update_settings(guild, |settings| {
        settings.options_mut(guild, &id).delete_request = delete;
    });
    args.reply("Okay...").await
}

// ============================================================================
// Channel restrictions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Restriction {
    Allow,
    Block,
}

/// `add` or `remove`, followed by a channel id or mention.
fn parse_channel_change(action: &str, channel: &str) -> Option<(bool, ChannelId)> {
    let enable = match action.to_lowercase().as_str() {
        "add" => true,
        "remove" => false,
        _ => return None,
    };
    let channel = channel
        .trim_matches(|c| c == '<' || c == '#' || c == '>')
        .parse()
        .ok()?;
    Some((enable, channel))
}

fn restrict(
    args: &CommandArguments,
    ids: &[String],
    channel: ChannelId,
    restriction: Restriction,
    enable: bool,
) {
    let guild = args.guild.id();
    args.client.update_settings(guild, |settings| {
        for id in ids {
            let record = settings.channel_options_mut(guild, id, channel);
            match restriction {
                Restriction::Allow => record.allowed = enable,
                Restriction::Block => record.blocked = enable,
            }
        }
    });
    tracing::info!(%guild, %channel, ?restriction, enable, commands = ids.len(), "channel restriction changed");
}

async fn channel_restriction(args: CommandArguments, restriction: Restriction) -> HandlerResult {
    if args.arguments.len() < 3 {
        return Err(args.invalid_parameters());
    }
    let Some((enable, channel)) = parse_channel_change(&args.arguments[1], &args.arguments[2]) else {
        return Err(args.invalid_parameters());
    };
    let id = restrictable_id(&args, &args.arguments[0])?;

    restrict(&args, &[id], channel, restriction, enable);
    args.reply(SUCCESS).await
}

async fn custom_channel_restriction(args: CommandArguments, restriction: Restriction) -> HandlerResult {
    if args.arguments.len() < 2 {
        return Err(args.invalid_parameters());
    }
    let Some((enable, channel)) = parse_channel_change(&args.arguments[0], &args.arguments[1]) else {
        return Err(args.invalid_parameters());
    };

    let ids: Vec<String> = args.guild.commands.custom_commands().keys().cloned().collect();
    restrict(&args, &ids, channel, restriction, enable);
    args.reply(SUCCESS).await
}

async fn reset_restrictions(args: CommandArguments) -> HandlerResult {
    let Some(token) = args.arguments.first() else {
        return Err(args.invalid_parameters());
    };
    let id = restrictable_id(&args, token)?;

    let guild = args.guild.id();
    let changed = args
        .client
        .update_settings(guild, |settings| settings.reset_restrictions(&id));
    tracing::info!(%guild, command = %id, changed, "channel restrictions reset");
    args.reply(RESET).await
}

async fn reset_custom_restrictions(args: CommandArguments) -> HandlerResult {
    let guild = args.guild.id();
    let ids: Vec<String> = args.guild.commands.custom_commands().keys().cloned().collect();
    args.client.update_settings(guild, |settings| {
        for id in &ids {
            settings.reset_restrictions(id);
        }
    });
    args.reply(RESET).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_channel_change() {
        assert_eq!(parse_channel_change("ADD", "<#42>"), Some((true, ChannelId(42))));
        assert_eq!(parse_channel_change("remove", "42"), Some((false, ChannelId(42))));
        assert_eq!(parse_channel_change("toggle", "42"), None);
        assert_eq!(parse_channel_change("add", "general"), None);
    }

    #[test]
    fn test_effective_override() {
        assert_eq!(
            effective_override(PermissionType::SERVER_OWNER | PermissionType::ADMIN),
            PermissionOverride::Admins
        );
        assert_eq!(effective_override(PermissionType::EVERYONE), PermissionOverride::Everyone);
        assert_eq!(
            effective_override(PermissionType::ADMIN | PermissionType::MODERATOR),
            PermissionOverride::Everyone
        );
    }
}

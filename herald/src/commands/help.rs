//! `help` and `man`.

use super::list_names;
use crate::{
    command::{Command, CommandArguments, ManPage},
    registry::CustomCommand,
};
use herald_core::{CommandError, HandlerResult, OutgoingMessage, PermissionType};
use regex::Regex;
use std::{collections::HashSet, fmt::Write, sync::Arc};

/// Search results listed before giving up.
const SEARCH_LIMIT: usize = 5;

pub(super) fn commands() -> Vec<Command> {
    vec![
        Command::new("man", man)
            .description("Show detailed manual page for a command.")
            .manual(ManPage::new("<command>", "`<command>` - Command ID for which to display the manual page."))
            .required(PermissionType::EVERYONE)
            .alias("manual"),
        Command::new("help", help)
            .description(
                "PMs a list of Custom Commands for the server if used without arguments, or search for specific commands.",
            )
            .manual(ManPage::new(
                "[search expression]",
                "[search expression] - Optional argument to search for specific commands.",
            ))
            .required(PermissionType::EVERYONE),
    ]
}

async fn man(args: CommandArguments) -> HandlerResult {
    let key = args.trimmed.to_lowercase();
    let commands = &args.guild.commands;
    let table = commands.table();

    let target = if table.contains(&key) {
        Some(key)
    } else {
        commands
            .custom_aliases()
            .get(&key)
            .map(|alias| alias.command_id.to_lowercase())
            .filter(|target| table.contains(target))
    };
    let command = target.filter(|key| !key.is_empty()).and_then(|key| table.resolve(&key));
    let page = command.and_then(|command| args.guild.man_page(&command, args.prefix()));

    match page {
        Some(embed) => args.reply(OutgoingMessage::default().embed(embed)).await,
        None => {
            args.reply("I ain't got no real command like that. (This feature isn't a thing for Custom Commands!)")
                .await
        }
    }
}

/// Entries collected by `help`, flushed in pages when listing everything.
struct Listing<'a> {
    args: &'a CommandArguments,
    paginate: bool,
    page: String,
    included: HashSet<String>,
    cant_pm: bool,
}

impl<'a> Listing<'a> {
    fn new(args: &'a CommandArguments, paginate: bool) -> Self {
        Self {
            args,
            paginate,
            page: String::new(),
            included: HashSet::new(),
            cant_pm: false,
        }
    }

    async fn append(&mut self, entry: String) -> HandlerResult {
        let limit = self.args.client.config().message_character_limit;
        if self.paginate && self.page.len() + entry.len() >= limit {
            let page = std::mem::take(&mut self.page);
            self.flush(page).await?;
        }
        self.page.push_str(&entry);
        self.page.push('\n');
        Ok(())
    }

    /// Sends a full page where `help` without arguments delivers it.
    async fn flush(&mut self, page: String) -> HandlerResult {
        let args = self.args;
        if args.client.config().help_prints_everything {
            return args.reply(page).await;
        }
        if !args.client.messenger().send(args.member.id(), page).await.is_sent() {
            self.cant_pm = true;
        }
        Ok(())
    }

    async fn add_command(&mut self, command: &Command) -> HandlerResult {
        if !self.included.insert(command.key().to_string()) {
            return Ok(());
        }

        let args = self.args;
        let prefix = args.prefix();
        let allowed = args
            .guild
            .check(args.client.permissions(), command, &args.member, args.message.channel_id)
            .is_allowed();
        let mut entry = format!(
            "\n```diff\n{}  {prefix}{}``` **-** {}",
            if allowed { "+" } else { "-" },
            command.id(),
            command.describe()
        );
        if !command.aliases().is_empty() {
            entry.push_str(if command.aliases().len() == 1 {
                "\n **-** Alias: "
            } else {
                "\n **-** Aliases: "
            });
            entry.push_str(&list_names(prefix, command.aliases().iter().map(String::as_str)));
        }

        self.append(entry).await?;
        self.add_custom_aliases(command.key()).await
    }

    async fn add_custom_command(&mut self, command: &CustomCommand) -> HandlerResult {
        let key = command.command_id.to_lowercase();
        if !self.included.insert(key.clone()) {
            return Ok(());
        }

        let args = self.args;
        let allowed = args
            .guild
            .check_custom(args.client.permissions(), command, &args.member, args.message.channel_id)
            .is_allowed();
        let mut entry = format!(
            "\n```diff\n{}  {}{}```",
            if allowed { "+" } else { "-" },
            args.prefix(),
            command.command_id
        );
        if !command.description.trim().is_empty() {
            let _ = write!(entry, "\n **-** {}", command.description);
        }

        self.append(entry).await?;
        self.add_custom_aliases(&key).await
    }

    async fn add_custom_aliases(&mut self, key: &str) -> HandlerResult {
        let args = self.args;
        let mut aliases: Vec<&str> = args
            .guild
            .commands
            .custom_aliases()
            .values()
            .filter(|alias| alias.command_id.eq_ignore_ascii_case(key))
            .map(|alias| alias.alias.as_str())
            .collect();
        if aliases.is_empty() {
            return Ok(());
        }
        aliases.sort_unstable();

        let mut entry = String::from(if aliases.len() == 1 {
            " **-** Custom Alias: "
        } else {
            " **-** Custom Aliases: "
        });
        entry.push_str(&list_names(args.prefix(), aliases));
        self.append(entry).await
    }
}

/// Case-insensitive pattern matching ids that contain any of the search terms.
fn search_pattern(terms: &[String]) -> Result<Regex, CommandError> {
    let alternatives = terms
        .iter()
        .map(|term| regex::escape(term))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\w*({alternatives})\w*"))
        .map_err(|_| CommandError::InvalidArguments("Invalid search expression.".to_string()))
}

async fn help(args: CommandArguments) -> HandlerResult {
    let prefix = args.prefix().to_string();
    args.reply(format!(
        "`{prefix}help` is merely a search. Use `{prefix}man` for detailed manual page."
    ))
    .await?;

    let mut response = String::new();
    if !args.arguments.is_empty() {
        search(&args, &mut response).await?;
    } else if args.client.config().help_prints_everything {
        let mut listing = Listing::new(&args, true);
        for command in args.guild.commands.table().primary() {
            if !command.is_hidden() {
                listing.add_command(&command).await?;
            }
        }
        response.push_str(&listing.page);
    } else if !args.guild.commands.custom_commands().is_empty() {
        let mut listing = Listing::new(&args, true);
        for command in sorted_custom_commands(&args) {
            listing.add_custom_command(&command).await?;
        }
        let page = std::mem::take(&mut listing.page);
        listing.flush(page).await?;
        if !listing.cant_pm {
            response.push_str("I've PMed you the Custom Commands for this server.\n");
        } else {
            response.push_str(
                "And I was unable to PM you the Custom Commands for this server. (Fix your privacy settings or unblock me.)\n",
            );
        }
    }

    args.reply(response).await
}

async fn search(args: &CommandArguments, response: &mut String) -> HandlerResult {
    let pattern = search_pattern(&args.arguments)?;
    let commands = &args.guild.commands;
    let table = commands.table();
    let mut listing = Listing::new(args, false);
    let mut count = 0;

    let mut entries: Vec<Arc<Command>> = table.entries().cloned().collect();
    entries.sort_by(|a, b| a.key().cmp(b.key()));
    for entry in entries {
        if entry.is_hidden()
            || entry.required_tiers().is_owner_only()
            || !pattern.is_match(entry.id())
        {
            continue;
        }
        let command = table.resolve(entry.key()).unwrap_or(entry);
        if listing.included.contains(command.key()) {
            continue;
        }
        count += 1;
        if count > SEARCH_LIMIT {
            break;
        }
        listing.add_command(&command).await?;
    }

    if count <= SEARCH_LIMIT {
        for command in sorted_custom_commands(args) {
            if !pattern.is_match(&command.command_id) {
                continue;
            }
            count += 1;
            if count > SEARCH_LIMIT {
                break;
            }
            listing.add_custom_command(&command).await?;
        }
    }

    if count <= SEARCH_LIMIT {
        let mut aliases: Vec<_> = commands.custom_aliases().values().cloned().collect();
        aliases.sort_by(|a, b| a.alias.cmp(&b.alias));
        for alias in aliases {
            if !pattern.is_match(&alias.alias) {
                continue;
            }
            count += 1;
            if count > SEARCH_LIMIT {
                break;
            }
            let target = alias.command_id.to_lowercase();
            if let Some(command) = table.resolve(&target) {
                listing.add_command(&command).await?;
            } else if let Some(command) = commands.custom_commands().get(&target) {
                listing.add_custom_command(command).await?;
            }
        }
    }

    if count == 0 {
        response.push_str("I did not find any commands matching your search expression.\n");
        return Ok(());
    }
    if count > SEARCH_LIMIT {
        response.push_str(
            "I found too many commands matching your search expression. **Here are the first five:**\n",
        );
    }
    response.push_str(&listing.page);
    Ok(())
}

fn sorted_custom_commands(args: &CommandArguments) -> Vec<CustomCommand> {
    let mut commands: Vec<_> = args.guild.commands.custom_commands().values().cloned().collect();
    commands.sort_by(|a, b| a.command_id.cmp(&b.command_id));
    commands
}

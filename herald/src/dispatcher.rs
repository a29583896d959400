//! # Dispatcher
//!
//! Subscribes to received and edited messages and turns them into command
//! executions, custom command responses or mention replies.
//!
//! A message is considered only when:
//!
//! - the client finished connecting,
//! - it was posted in a text channel of a tracked guild,
//! - it is not from a bot (when `ignore_bots`),
//! - it does not ping everyone (when `ignore_everyone`).

use crate::{
    client::Client,
    command::CommandArguments,
    guild::Guild,
    registry::{CustomCommand, Resolved},
};
use herald_core::{
    AllowedMentions, BoxError, Capabilities, ChatMessage, Handler, HandlerResult, MessageEdited,
    MessageReceived, OutgoingMessage, User, UserId,
};
use herald_std::parse;
use rand::Rng;
use regex::Regex;
use std::sync::{Arc, LazyLock, Weak};

static EVERYONE_PING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(@everyone)|(@here)").expect("valid regex"));
static MENTION_HELP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(help|commands)").expect("valid regex"));
static MENTION_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(command character|prefix)").expect("valid regex"));

/// Sent to the channel once a `<pm>` response was delivered.
pub const PM_SENT: &str = "It is nao sent via PM.";
/// Sent to the channel when a `<pm>` response could not be delivered.
pub const PM_FAILED: &str =
    "I'm sorry, I couldn't send the message. Either I'm blocked, or it's _**that** privacy option._";

const ALTERNATIVE_SEPARATOR: &str = "<|>";

/// Message subscriber driving command execution.
#[derive(Clone)]
pub struct Dispatcher {
    client: Weak<Client>,
}

impl Dispatcher {
    /// Creates a dispatcher for `client`.
    pub fn new(client: Weak<Client>) -> Self {
        Self { client }
    }

    /// The guild the message belongs to, if the message passes the filters.
    fn accept(client: &Client, message: &ChatMessage) -> Option<Arc<Guild>> {
        if !message.is_guild_text() {
            return None;
        }
        let guild = client.guilds().get(message.guild_id?)?;

        let config = client.config();
        if config.ignore_bots && message.author.bot {
            return None;
        }
        if config.ignore_everyone && EVERYONE_PING.is_match(&message.content) {
            return None;
        }
        Some(guild)
    }

    async fn received(&self, message: ChatMessage) -> HandlerResult {
        let Some(client) = self.client.upgrade() else {
            return Ok(());
        };
        if !client.is_connected() {
            return Ok(());
        }
        let Some(guild) = Self::accept(&client, &message) else {
            return Ok(());
        };

        let bot = client.gateway().current_user();
        let executed = match command_input(&client, &message, bot.id) {
            Some(input) => Self::handle_command(&client, guild.clone(), &message, input).await?,
            None => false,
        };

        if !executed && message.mentions_user(bot.id) {
            let reply = mention_response(
                &message.content,
                &client.config().command_prefix,
                &client.config().mention_reply,
            );
            client.send_message(guild.id(), message.channel_id, reply).await?;
        }
        Ok(())
    }

    async fn edited(&self, before: Option<ChatMessage>, after: ChatMessage) -> HandlerResult {
        let Some(client) = self.client.upgrade() else {
            return Ok(());
        };
        if !client.is_connected() {
            return Ok(());
        }
        match before {
            Some(before) if before.content != after.content => {}
            _ => return Ok(()),
        }
        let Some(guild) = Self::accept(&client, &after) else {
            return Ok(());
        };
        if !client.config().execute_on_edit {
            return Ok(());
        }

        let bot = client.gateway().current_user();
        if let Some(input) = command_input(&client, &after, bot.id) {
            Self::handle_command(&client, guild, &after, input).await?;
        }
        Ok(())
    }

    /// Resolves and runs the command in `input`. Returns whether anything executed.
    pub async fn handle_command(
        client: &Arc<Client>,
        guild: Arc<Guild>,
        message: &ChatMessage,
        input: &str,
    ) -> Result<bool, BoxError> {
        let parsed = parse(input);
        let key = parsed.key();
        if key.is_empty() {
            return Ok(false);
        }
        let Some(member) = message.member.clone() else {
            tracing::debug!(message = %message.id, "command without member information");
            return Ok(false);
        };
        tracing::debug!(command = %key, remainder = %parsed.remainder, "command received");

        match guild.commands.resolve(&key) {
            Some(Resolved::BuiltIn(command)) => {
                let options = guild.options(command.key()).cloned();
                let args = CommandArguments {
                    client: client.clone(),
                    guild: guild.clone(),
                    command: command.clone(),
                    message: message.clone(),
                    member,
                    command_token: parsed.command,
                    trimmed: parsed.remainder,
                    arguments: parsed.arguments,
                    options,
                };
                Ok(command.execute(args).await)
            }
            Some(Resolved::Custom(custom)) => {
                let allowed = guild
                    .check_custom(client.permissions(), &custom, &member, message.channel_id)
                    .is_allowed();
                if !allowed {
                    return Ok(false);
                }
                Self::run_custom(client, &guild, &custom, message).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn run_custom(
        client: &Arc<Client>,
        guild: &Guild,
        custom: &CustomCommand,
        message: &ChatMessage,
    ) -> HandlerResult {
        let delete = guild
            .options(&custom.command_id.to_lowercase())
            .is_some_and(|options| options.delete_request);
        if delete && guild.bot_can(Capabilities::MANAGE_MESSAGES) {
            if let Err(error) = client
                .gateway()
                .delete_message(message.channel_id, message.id)
                .await
            {
                let notice = format!(
                    "Failed to delete the command message in {}",
                    message.channel_id.mention()
                );
                client
                    .report_transport(guild.id(), error, &notice, "--CustomCommand.DeleteRequest")
                    .await;
            }
        }

        let mut text = expand_placeholders(&custom.response, message.author.id, &message.mentions);
        if client.config().ignore_everyone {
            text = defuse_everyone(&text);
        }

        if let Some((target, body)) = pm_directive(&text) {
            let recipients: Vec<UserId> = match target {
                PmTarget::Mentioned if !message.mentions.is_empty() => {
                    message.mentions.iter().map(|user| user.id).collect()
                }
                _ => vec![message.author.id],
            };
            let body = body.to_string();
            text = PM_SENT.to_string();
            for user in recipients {
                if !client.messenger().send(user, body.as_str()).await.is_sent() {
                    text = PM_FAILED.to_string();
                    break;
                }
            }
        }

        let text = pick_alternative(&text, &mut rand::thread_rng()).to_string();
        let allowed = if custom.mentions_enabled {
            AllowedMentions::All
        } else {
            AllowedMentions::default()
        };
        client
            .send_message(
                guild.id(),
                message.channel_id,
                OutgoingMessage::text(text).allowed_mentions(allowed),
            )
            .await
    }
}

impl Handler<MessageReceived> for Dispatcher {
    async fn call(&self, event: MessageReceived) -> HandlerResult {
        self.received(event.message).await
    }
}

impl Handler<MessageEdited> for Dispatcher {
    async fn call(&self, event: MessageEdited) -> HandlerResult {
        self.edited(event.before, event.after).await
    }
}

/// The text after the prefix, when `message` is a command invocation.
fn command_input<'a>(client: &Client, message: &'a ChatMessage, bot: UserId) -> Option<&'a str> {
    let prefix = &client.config().command_prefix;
    if message.author.id == bot || prefix.trim().is_empty() {
        return None;
    }
    message.content.strip_prefix(prefix.as_str())
}

// ============================================================================
// Custom command rendering
// ============================================================================

/// Who a `<pm>` directive sends to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PmTarget {
    /// `<pm>`: the mentioned users, or the sender when nobody is mentioned.
    Mentioned,
    /// `<pm-sender>`: the sender.
    Sender,
}

/// `<@a>, <@b> and <@c>`; empty for no users.
pub fn join_mentions(users: &[User]) -> String {
    let mut joined = String::new();
    for (index, user) in users.iter().enumerate() {
        if index != 0 {
            joined.push_str(if index == users.len() - 1 { " and " } else { ", " });
        }
        joined.push_str(&user.id.mention());
    }
    joined
}

/// Replaces `{sender}` and `{mentioned}`, in single or double braces.
pub fn expand_placeholders(template: &str, sender: UserId, mentioned: &[User]) -> String {
    let mut text = template.to_string();
    if text.contains("{sender}") {
        let sender = sender.mention();
        text = text.replace("{{sender}}", &sender).replace("{sender}", &sender);
    }
    if text.contains("{mentioned}") {
        let mut mentions = join_mentions(mentioned);
        if mentions.is_empty() {
            mentions = "Nobody".to_string();
        }
        text = text
            .replace("{{mentioned}}", &mentions)
            .replace("{mentioned}", &mentions);
    }
    text
}

/// Breaks `@everyone` and `@here` pings.
pub fn defuse_everyone(text: &str) -> String {
    text.replace("@everyone", "@-everyone").replace("@here", "@-here")
}

/// Splits a leading `<pm>` or `<pm-sender>` off `text`.
pub fn pm_directive(text: &str) -> Option<(PmTarget, &str)> {
    if let Some(body) = text.strip_prefix("<pm>") {
        Some((PmTarget::Mentioned, body.trim()))
    } else {
        text.strip_prefix("<pm-sender>")
            .map(|body| (PmTarget::Sender, body.trim()))
    }
}

/// Picks one of the `<|>`-enclosed alternatives.
///
/// Only segments with a separator on both sides count. With fewer than two
/// such segments the text is returned whole.
pub fn pick_alternative<'a>(text: &'a str, rng: &mut impl Rng) -> &'a str {
    let parts: Vec<&str> = text.split(ALTERNATIVE_SEPARATOR).collect();
    if parts.len() < 4 {
        return text;
    }
    let inner = &parts[1..parts.len() - 1];
    inner[rng.gen_range(0..inner.len())]
}

/// Reply to a message mentioning the bot.
pub fn mention_response(content: &str, prefix: &str, filler: &str) -> String {
    if MENTION_HELP.is_match(content) {
        format!(
            "Use `{prefix}help` command to search for things, or the manual pages (`{prefix}man`) for specific and detailed information about a command"
        )
    } else if MENTION_PREFIX.is_match(content) {
        if prefix.is_empty() {
            "Command prefix is empty. Someone forgot to set it up?".to_string()
        } else {
            format!("Try this: `{prefix}`")
        }
    } else {
        filler.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn users(ids: &[u64]) -> Vec<User> {
        ids.iter().map(|id| User::new(*id, format!("user{id}"))).collect()
    }

    #[test]
    fn test_join_mentions() {
        assert_eq!(join_mentions(&[]), "");
        assert_eq!(join_mentions(&users(&[1])), "<@1>");
        assert_eq!(join_mentions(&users(&[1, 2])), "<@1> and <@2>");
        assert_eq!(join_mentions(&users(&[1, 2, 3])), "<@1>, <@2> and <@3>");
    }

    #[test]
    fn test_expand_placeholders() {
        let text = expand_placeholders("{sender} hugs {mentioned}!", UserId(7), &users(&[1, 2]));
        assert_eq!(text, "<@7> hugs <@1> and <@2>!");

        let text = expand_placeholders("{{sender}} hugs {mentioned}", UserId(7), &[]);
        assert_eq!(text, "<@7> hugs Nobody");
    }

    #[test]
    fn test_pm_directive() {
        assert_eq!(pm_directive("<pm> secret "), Some((PmTarget::Mentioned, "secret")));
        assert_eq!(pm_directive("<pm-sender>secret"), Some((PmTarget::Sender, "secret")));
        assert_eq!(pm_directive("hello <pm>"), None);
    }

    #[test]
    fn test_pick_alternative() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(pick_alternative("no choice", &mut rng), "no choice");
        assert_eq!(pick_alternative("<|>only<|>", &mut rng), "<|>only<|>");

        let options = ["heads", "tails"];
        for _ in 0..20 {
            let picked = pick_alternative("Flip: <|>heads<|>tails<|>", &mut rng);
            assert!(options.contains(&picked), "unexpected pick {picked}");
        }
    }

    #[test]
    fn test_mention_response() {
        assert!(mention_response("hey, HELP me", "!", "hi").starts_with("Use `!help`"));
        assert_eq!(mention_response("what's the prefix?", "!", "hi"), "Try this: `!`");
        assert_eq!(
            mention_response("what's the prefix?", "", "hi"),
            "Command prefix is empty. Someone forgot to set it up?"
        );
        assert_eq!(mention_response("hello there", "!", "hi"), "hi");
    }

    #[test]
    fn test_everyone_filters() {
        assert!(EVERYONE_PING.is_match("ping @here now"));
        assert!(!EVERYONE_PING.is_match("hello everyone"));
        assert_eq!(defuse_everyone("@everyone and @here"), "@-everyone and @-here");
    }
}

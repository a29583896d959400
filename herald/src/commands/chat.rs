//! Speaking through the bot.

use crate::command::{Command, CommandArguments, ManPage};
use herald_core::{CommandError, HandlerResult, MessageId, PermissionType};

fn speakers() -> PermissionType {
    PermissionType::SERVER_OWNER
        | PermissionType::ADMIN
        | PermissionType::MODERATOR
        | PermissionType::SUB_MODERATOR
}

pub(super) fn commands() -> Vec<Command> {
    vec![
        Command::new("say", say)
            .description("Make the bot say something!")
            .manual(ManPage::new("<text>", "`<text>` - Text which the bot will repeat."))
            .required(speakers())
            .delete_request(true),
        Command::new("edit", edit)
            .description("Edit a message the bot previously said!")
            .manual(ManPage::new(
                "<MessageId> <text>",
                "`<MessageId>` - An ID of a message that will be edited.\n\n`<text>` - Text which the bot will repeat.",
            ))
            .required(speakers())
            .delete_request(true),
    ]
}

async fn say(args: CommandArguments) -> HandlerResult {
    if args.trimmed.is_empty() {
        return Err(CommandError::InvalidArguments("Say what?".to_string()).into());
    }
    args.reply(args.trimmed.clone()).await
}

async fn edit(args: CommandArguments) -> HandlerResult {
    let edit_what = || CommandError::InvalidArguments("Edit what?".to_string());
    if args.arguments.len() < 2 {
        return Err(edit_what().into());
    }
    let message_id: MessageId = args.arguments[0].parse().map_err(|_| edit_what())?;

    let channel = args.message.channel_id;
    let gateway = args.client.gateway();
    if gateway.fetch_message(channel, message_id).await?.is_none() {
        return Err(edit_what().into());
    }

    let content = args
        .trimmed
        .get(args.arguments[0].len()..)
        .unwrap_or_default()
        .trim_start()
        .to_string();
    gateway.edit_message(channel, message_id, content).await?;
    Ok(())
}

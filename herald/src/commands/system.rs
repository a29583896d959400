//! Process control and status commands.

use crate::command::{Command, CommandArguments, ManPage};
use chrono::Utc;
use herald_core::{HandlerResult, PermissionType};
use herald_std::resident_memory;
use std::{fmt::Write, time::Duration};

pub(super) fn commands() -> Vec<Command> {
    vec![
        Command::new("restart", restart)
            .description("Shut down the bot.")
            .required(PermissionType::OWNER_ONLY)
            .core()
            .alias("shutdown"),
        Command::new("operations", operations)
            .description("Display info about all queued or running operations on your server.")
            .required(PermissionType::SERVER_OWNER | PermissionType::ADMIN)
            .core(),
        Command::new("cancel", cancel)
            .description(
                "Cancel queued or running operation - use in the same channel. (nuke, promoteEveryone, etc...)",
            )
            .manual(ManPage::new(
                "<CommandId>",
                "`<CommandId>` - running operation type command which this will interrupt.",
            ))
            .required(PermissionType::SERVER_OWNER | PermissionType::ADMIN)
            .core(),
        Command::new("status", status)
            .description("Display basic server status.")
            .required(PermissionType::EVERYONE)
            .core()
            .alias("ping"),
    ]
}

async fn restart(args: CommandArguments) -> HandlerResult {
    args.reply("bai").await?;
    tokio::time::sleep(Duration::from_secs(1)).await;
    tracing::info!(user = %args.member.id(), "shutdown requested");
    args.client.shutdown();
    Ok(())
}

async fn operations(args: CommandArguments) -> HandlerResult {
    let everything = args.is_process_owner();
    let guild = args.guild.id();
    let visible: Vec<_> = args
        .client
        .operations()
        .snapshot()
        .into_iter()
        .filter(|op| everything || op.args.guild.id() == guild)
        .collect();

    if visible.is_empty() {
        return args.reply("There are no operations running.").await;
    }

    let mut text = format!("Total operations in the queue: `{}`\n", visible.len());
    if everything {
        let memory = resident_memory().unwrap_or_default() as f64 / 1_000_000.0;
        let _ = writeln!(text, "Currently allocated data Memory: `{memory:.2} MB`");
    }
    text.push('\n');

    for op in &visible {
        let _ = writeln!(text, "{op}");
        if everything {
            let memory = op.memory_at_start.unwrap_or_default() as f64 / 1_000_000.0;
            let _ = writeln!(
                text,
                "Server: `{}`\nServerID: `{}`\nAllocated DataMemory: `{memory:.2} MB`",
                op.args.guild.info.name,
                op.args.guild.id()
            );
        }
        text.push('\n');
    }

    args.reply(text).await
}

async fn cancel(args: CommandArguments) -> HandlerResult {
    let key = args.trimmed.to_lowercase();
    match args
        .client
        .operations()
        .cancel_in_channel(args.message.channel_id, &key)
    {
        Some(op) => args.reply(format!("Operation canceled:\n\n{op}")).await,
        None => args.reply("Operation not found.").await,
    }
}

async fn status(args: CommandArguments) -> HandlerResult {
    let latency = Utc::now()
        .signed_duration_since(args.message.id.created_at())
        .to_std()
        .ok();
    args.reply(args.client.status_text(latency)).await
}

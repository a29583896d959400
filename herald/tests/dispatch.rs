use herald::{CustomCommand, dispatcher::PM_SENT};
use herald_core::{GatewayEvent, MessageRef, User};

mod common;
use common::{GUILD, MEMBER, OWNER, bot, harness, message};

#[tokio::test]
async fn test_say_repeats_and_deletes_request() {
    let h = harness().await;

    let request = h.send(OWNER, "!say hello there").await;

    assert_eq!(h.replies(1).await, vec!["hello there"]);
    assert_eq!(h.deleted(), vec![request.id]);
    assert_eq!(h.client.counters().snapshot().commands_executed, 1);
}

#[tokio::test]
async fn test_say_without_text_asks_back() {
    let h = harness().await;

    h.send(OWNER, "!say").await;

    assert_eq!(h.replies(1).await, vec!["Say what?"]);
}

#[tokio::test]
async fn test_denied_command_does_nothing() {
    let h = harness().await;

    h.send(MEMBER, "!say hi").await;
    h.settle().await;

    assert!(h.channel_texts().is_empty());
    assert!(h.deleted().is_empty());
    assert_eq!(h.client.counters().snapshot().commands_executed, 0);
}

#[tokio::test]
async fn test_unknown_command_is_silent() {
    let h = harness().await;

    h.send(OWNER, "!definitelynotacommand").await;
    h.settle().await;

    assert!(h.channel_texts().is_empty());
}

#[tokio::test]
async fn test_command_id_is_case_insensitive() {
    let h = harness().await;

    h.send(MEMBER, "!PING").await;

    let replies = h.replies(1).await;
    assert!(replies[0].starts_with("```md"));
    assert!(replies[0].contains("Shard"));
}

#[tokio::test]
async fn test_bots_are_ignored() {
    let h = harness().await;
    let mut from_bot = message(MEMBER, "!status");
    from_bot.author.bot = true;

    h.deliver(from_bot).await;
    h.settle().await;

    assert!(h.channel_texts().is_empty());
}

#[tokio::test]
async fn test_mention_without_command_gets_hint() {
    let h = harness().await;

    let mut asking = message(MEMBER, "<@999> what is your prefix?");
    asking.mentions = vec![bot()];
    h.deliver(asking).await;
    assert_eq!(h.replies(1).await, vec!["Try this: `!`"]);

    let mut lost = message(MEMBER, "<@999> I need help");
    lost.mentions = vec![bot()];
    h.deliver(lost).await;
    let replies = h.replies(2).await;
    assert!(replies[1].starts_with("Use `!help` command"));
}

#[tokio::test]
async fn test_executed_command_skips_mention_reply() {
    let h = harness().await;

    let mut ping = message(MEMBER, "!ping <@999>");
    ping.mentions = vec![bot()];
    h.deliver(ping).await;
    h.replies(1).await;
    h.settle().await;

    assert_eq!(h.channel_texts().len(), 1);
    assert!(h.channel_texts()[0].starts_with("```md"));
}

#[tokio::test]
async fn test_custom_command_expands_placeholders() {
    let h = harness().await;
    h.client.update_settings(GUILD, |settings| {
        settings.custom_commands.push(CustomCommand {
            guild_id: GUILD,
            command_id: "hug".into(),
            response: "{sender} hugs {mentioned}".into(),
            description: String::new(),
            mentions_enabled: false,
        });
    });

    let mut hug = message(MEMBER, "!hug");
    hug.mentions = vec![User::new(OWNER, "owner")];
    h.deliver(hug).await;
    h.replies(1).await;
    h.send(MEMBER, "!HUG").await;

    assert_eq!(
        h.replies(2).await,
        vec!["<@43> hugs <@42>", "<@43> hugs Nobody"]
    );
}

#[tokio::test]
async fn test_custom_command_sends_pm() {
    let h = harness().await;
    h.client.update_settings(GUILD, |settings| {
        settings.custom_commands.push(CustomCommand {
            guild_id: GUILD,
            command_id: "secret".into(),
            response: "<pm-sender> the cake is a lie".into(),
            description: String::new(),
            mentions_enabled: false,
        });
    });

    h.send(MEMBER, "!secret").await;

    assert_eq!(h.replies(1).await, vec![PM_SENT]);
    assert_eq!(
        h.gateway.direct_messages(),
        vec![(MEMBER, "the cake is a lie".to_string())]
    );
}

#[tokio::test]
async fn test_edit_reruns_changed_command() {
    let h = harness().await;
    let before = message(OWNER, "!say one");
    let mut after = before.clone();
    after.content = "!say two".into();

    let reference = |cached| MessageRef {
        id: before.id,
        channel_id: before.channel_id,
        channel_kind: before.channel_kind,
        guild_id: before.guild_id,
        cached,
    };

    h.client
        .handle_event(GatewayEvent::MessageUpdated {
            before: reference(Some(after.clone())),
            after: after.clone(),
        })
        .await;
    h.settle().await;
    assert!(h.channel_texts().is_empty());

    h.client
        .handle_event(GatewayEvent::MessageUpdated {
            before: reference(Some(before.clone())),
            after,
        })
        .await;
    assert_eq!(h.replies(1).await, vec!["two"]);
}

#[tokio::test]
async fn test_edit_of_unknown_message_is_ignored() {
    let h = harness().await;
    let original = h.send(OWNER, "!say once").await;
    assert_eq!(h.replies(1).await, vec!["once"]);

    h.client
        .handle_event(GatewayEvent::MessageUpdated {
            before: MessageRef {
                id: original.id,
                channel_id: original.channel_id,
                channel_kind: original.channel_kind,
                guild_id: original.guild_id,
                cached: None,
            },
            after: original.clone(),
        })
        .await;
    h.settle().await;

    assert_eq!(h.channel_texts(), vec!["once"]);
}

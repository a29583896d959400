use herald_core::{
    BoxError, Capabilities, FnHook, GatewayEvent, MemberUpdated, MessageDeleted, MessageEdited, MessageReceived,
    TransportError,
};
use herald_std::testing::RecordingHandler;
use std::sync::Arc;

mod common;
use common::{GUILD, StaticDirectory, harness, message, uncached};

#[tokio::test]
async fn test_unsubscribed_event_only_counts() {
    let h = harness();

    h.bus
        .publish(GatewayEvent::MessageReceived(message(1, "hello")))
        .await;
    tokio::task::yield_now().await;

    assert_eq!(h.bus.counters().snapshot().messages_received, 1);
    assert!(h.reporter.reports().is_empty());
    assert!(h.gateway.outbound().is_empty());
}

#[tokio::test]
async fn test_failing_subscriber_does_not_starve_others() {
    let h = harness();
    let recorder = RecordingHandler::<MessageReceived>::new();

    h.bus
        .message_received
        .subscribe(|_event: MessageReceived| async move {
            Err::<(), BoxError>("subscriber exploded".into())
        });
    h.bus
        .message_received
        .subscribe(|event: MessageReceived| async move {
            if event.message.id.get() > 0 {
                panic!("subscriber panicked");
            }
            Ok::<(), BoxError>(())
        });
    h.bus.message_received.subscribe(recorder.clone());

    h.bus
        .publish(GatewayEvent::MessageReceived(message(7, "still delivered")))
        .await;

    let events = recorder.wait_for(1).await;
    assert_eq!(events[0].message.content, "still delivered");

    let reports = h.reporter.wait_for(2).await;
    assert!(reports.iter().all(|report| report.guild == Some(GUILD)));
    assert!(reports.iter().all(|report| report.context.contains("--MessageId: 7")));
    assert!(reports.iter().any(|report| report.message == "subscriber exploded"));
    assert!(reports.iter().any(|report| report.message.contains("panicked")));
}

#[tokio::test]
async fn test_priority_hook_claims_message() {
    let h = harness();
    let recorder = RecordingHandler::<MessageReceived>::new();
    h.bus.message_received.subscribe(recorder.clone());
    h.bus
        .add_priority_hook(FnHook::new(|event: &MessageReceived| event.message.content == "mine"));

    h.bus
        .publish(GatewayEvent::MessageReceived(message(1, "mine")))
        .await;
    h.bus
        .publish(GatewayEvent::MessageReceived(message(2, "yours")))
        .await;

    let events = recorder.wait_for(1).await;
    tokio::task::yield_now().await;

    assert_eq!(recorder.count(), 1);
    assert_eq!(events[0].message.content, "yours");
    assert_eq!(h.bus.counters().snapshot().messages_received, 2);
}

#[tokio::test]
async fn test_filtered_subscriber_skips_non_matching_events() {
    let h = harness();
    let commands = RecordingHandler::<MessageReceived>::new();
    h.bus.message_received.subscribe_when(
        |event: &MessageReceived| event.message.content.starts_with('!'),
        commands.clone(),
    );

    h.bus
        .publish(GatewayEvent::MessageReceived(message(1, "chatter")))
        .await;
    h.bus
        .publish(GatewayEvent::MessageReceived(message(2, "!help")))
        .await;

    let events = commands.wait_for(1).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].message.content, "!help");
}

#[tokio::test]
async fn test_deleted_message_of_untracked_guild_is_dropped() {
    let h = harness();
    let directory = Arc::new(StaticDirectory::default());
    h.bus.attach_directory(Arc::downgrade(&directory) as _);
    h.gateway.add_history(message(5, "gone"));

    let recorder = RecordingHandler::<MessageDeleted>::new();
    h.bus.message_deleted.subscribe(recorder.clone());

    h.bus.publish(GatewayEvent::MessageDeleted(uncached(5))).await;
    tokio::task::yield_now().await;

    assert_eq!(recorder.count(), 0);
}

#[tokio::test]
async fn test_deleted_message_is_fetched_when_uncached() {
    let h = harness();
    let directory = Arc::new(StaticDirectory {
        tracked: [GUILD].into(),
        ..Default::default()
    });
    h.bus.attach_directory(Arc::downgrade(&directory) as _);
    h.gateway.add_history(message(5, "gone"));

    let recorder = RecordingHandler::<MessageDeleted>::new();
    h.bus.message_deleted.subscribe(recorder.clone());

    h.bus.publish(GatewayEvent::MessageDeleted(uncached(5))).await;
    let events = recorder.wait_for(1).await;
    assert_eq!(events[0].message.content, "gone");

    // Unknown to history: nothing to fire.
    h.bus.publish(GatewayEvent::MessageDeleted(uncached(6))).await;
    tokio::task::yield_now().await;
    assert_eq!(recorder.count(), 1);
}

#[tokio::test]
async fn test_fetch_http_failure_goes_to_guild_handler() {
    let h = harness();
    let directory = Arc::new(StaticDirectory {
        tracked: [GUILD].into(),
        ..Default::default()
    });
    h.bus.attach_directory(Arc::downgrade(&directory) as _);
    h.gateway
        .fail_fetches(Some(TransportError::http(403, "Missing Access")));

    h.bus
        .publish(GatewayEvent::ReactionsCleared { message: uncached(5) })
        .await;

    let http_errors = directory.http_errors.lock().clone();
    assert_eq!(http_errors.len(), 1);
    assert!(http_errors[0].1.contains("<#10>"));
    assert!(http_errors[0].1.contains("ReadMessageHistory"));
    assert!(h.reporter.reports().is_empty());

    h.gateway
        .fail_fetches(Some(TransportError::Other("socket hiccup".into())));
    h.bus
        .publish(GatewayEvent::ReactionsCleared { message: uncached(5) })
        .await;
    let reports = h.reporter.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].context, "Event Exception");
}

#[tokio::test]
async fn test_edit_reads_history_only_with_permission() {
    let h = harness();
    let directory = Arc::new(StaticDirectory {
        tracked: [GUILD].into(),
        capabilities: Capabilities::READ_MESSAGE_HISTORY,
        ..Default::default()
    });
    h.bus.attach_directory(Arc::downgrade(&directory) as _);
    h.gateway.add_history(message(5, "before"));

    let recorder = RecordingHandler::<MessageEdited>::new();
    h.bus.message_edited.subscribe(recorder.clone());

    h.bus
        .publish(GatewayEvent::MessageUpdated {
            before: uncached(5),
            after: message(5, "after"),
        })
        .await;

    let events = recorder.wait_for(1).await;
    assert_eq!(events[0].before.as_ref().map(|m| m.content.as_str()), Some("before"));
    assert_eq!(events[0].after.content, "after");
    assert_eq!(h.bus.counters().snapshot().messages_received, 1);
}

#[tokio::test]
async fn test_uncached_member_update_is_ignored() {
    let h = harness();
    let recorder = RecordingHandler::<MemberUpdated>::new();
    h.bus.member_updated.subscribe(recorder.clone());

    h.bus
        .publish(GatewayEvent::GuildMemberUpdated {
            before: None,
            after: None,
        })
        .await;
    tokio::task::yield_now().await;

    assert_eq!(recorder.count(), 0);
}

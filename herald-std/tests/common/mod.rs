#![allow(dead_code)]

use herald_core::{
    Capabilities, ChannelId, ChannelKind, ChatMessage, FailureReporter, GuildId, Member,
    MessageId, MessageRef, TransportError, User, UserId,
};
use herald_std::{
    Counters, EventBus, GuildDirectory,
    testing::{MockGateway, RecordingReporter},
};
use parking_lot::Mutex;
use std::{collections::HashSet, sync::Arc};

pub const GUILD: GuildId = GuildId(1);
pub const CHANNEL: ChannelId = ChannelId(10);

pub fn bot() -> User {
    User {
        id: UserId(999),
        name: "herald".into(),
        bot: true,
    }
}

pub fn message(id: u64, content: &str) -> ChatMessage {
    let author = User::new(42, "author");
    ChatMessage {
        id: MessageId(id),
        channel_id: CHANNEL,
        channel_kind: ChannelKind::GuildText,
        guild_id: Some(GUILD),
        member: Some(Member::new(author.clone(), GUILD)),
        author,
        content: content.to_string(),
        mentions: Vec::new(),
    }
}

pub fn uncached(id: u64) -> MessageRef {
    MessageRef {
        id: MessageId(id),
        channel_id: CHANNEL,
        channel_kind: ChannelKind::GuildText,
        guild_id: Some(GUILD),
        cached: None,
    }
}

pub struct Harness {
    pub gateway: Arc<MockGateway>,
    pub reporter: Arc<RecordingReporter>,
    pub bus: Arc<EventBus>,
}

pub fn harness() -> Harness {
    let gateway = Arc::new(MockGateway::new(bot()));
    let reporter = Arc::new(RecordingReporter::new());
    let bus = Arc::new(EventBus::new(
        gateway.clone(),
        reporter.clone() as Arc<dyn FailureReporter>,
        Arc::new(Counters::new()),
    ));
    Harness {
        gateway,
        reporter,
        bus,
    }
}

/// Directory tracking a fixed set of guilds and recording HTTP failures.
#[derive(Default)]
pub struct StaticDirectory {
    pub tracked: HashSet<GuildId>,
    pub capabilities: Capabilities,
    pub http_errors: Mutex<Vec<(GuildId, String)>>,
}

#[async_trait::async_trait]
impl GuildDirectory for StaticDirectory {
    fn is_tracked(&self, guild: GuildId) -> bool {
        self.tracked.contains(&guild)
    }

    fn bot_capabilities(&self, guild: GuildId) -> Option<Capabilities> {
        self.tracked.contains(&guild).then_some(self.capabilities)
    }

    async fn handle_http_error(&self, guild: GuildId, _error: &TransportError, notice: &str) -> bool {
        self.http_errors.lock().push((guild, notice.to_string()));
        false
    }
}

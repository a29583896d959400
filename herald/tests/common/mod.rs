#![allow(dead_code)]

use herald::{BotConfig, Client, ClientBuilder};
use herald_core::{
    Capabilities, ChannelId, ChannelKind, ChatMessage, GatewayEvent, GuildId, GuildInfo, Member,
    MessageId, User, UserId,
};
use herald_std::testing::{MockGateway, Outbound, RecordingReporter};
use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

pub const GUILD: GuildId = GuildId(1);
pub const CHANNEL: ChannelId = ChannelId(10);
/// Owns the guild.
pub const OWNER: UserId = UserId(42);
/// Plain member without roles.
pub const MEMBER: UserId = UserId(43);
/// Runs the process.
pub const PROCESS_OWNER: UserId = UserId(7);
pub const BOT: UserId = UserId(999);

static NEXT_MESSAGE: AtomicU64 = AtomicU64::new(1);

pub fn bot() -> User {
    User {
        id: BOT,
        name: "herald".into(),
        bot: true,
    }
}

pub fn config() -> BotConfig {
    BotConfig {
        token: "test".into(),
        owner_user_id: PROCESS_OWNER,
        initial_update_delay_secs: 0,
        ..Default::default()
    }
}

pub fn guild_info() -> GuildInfo {
    GuildInfo {
        id: GUILD,
        name: "Test Guild".into(),
        owner_id: OWNER,
        bot_capabilities: Capabilities::MANAGE_MESSAGES,
    }
}

pub fn message(author: UserId, content: &str) -> ChatMessage {
    let author = User::new(author, format!("user-{author}"));
    ChatMessage {
        id: MessageId(NEXT_MESSAGE.fetch_add(1, Ordering::Relaxed)),
        channel_id: CHANNEL,
        channel_kind: ChannelKind::GuildText,
        guild_id: Some(GUILD),
        member: Some(Member::new(author.clone(), GUILD)),
        author,
        content: content.to_string(),
        mentions: Vec::new(),
    }
}

pub struct Harness {
    pub gateway: Arc<MockGateway>,
    pub reporter: Arc<RecordingReporter>,
    pub client: Arc<Client>,
}

/// A built but not yet initialized client.
pub fn build(config: BotConfig, configure: impl FnOnce(ClientBuilder) -> ClientBuilder) -> Harness {
    let gateway = Arc::new(MockGateway::new(bot()));
    for user in [OWNER, MEMBER, PROCESS_OWNER] {
        gateway.add_user(User::new(user, format!("user-{user}")));
    }
    let reporter = Arc::new(RecordingReporter::new());
    let builder = ClientBuilder::new(config, gateway.clone()).reporter(reporter.clone());
    let client = configure(builder).build().expect("valid config");
    Harness {
        gateway,
        reporter,
        client,
    }
}

/// An initialized, connected client tracking [`GUILD`].
pub async fn harness_with(
    config: BotConfig,
    configure: impl FnOnce(ClientBuilder) -> ClientBuilder,
) -> Harness {
    let h = build(config, configure);
    h.client.initialize().await;
    h.client.load_guild(guild_info()).await;
    h.client.mark_connected().await;
    h
}

pub async fn harness() -> Harness {
    harness_with(config(), |builder| builder).await
}

impl Harness {
    /// Delivers a message from `author` in [`CHANNEL`].
    pub async fn send(&self, author: UserId, content: &str) -> ChatMessage {
        let message = message(author, content);
        self.deliver(message.clone()).await;
        message
    }

    pub async fn deliver(&self, message: ChatMessage) {
        self.client
            .handle_event(GatewayEvent::MessageReceived(message))
            .await;
    }

    /// Texts sent to [`CHANNEL`], waiting until there are at least `count`.
    pub async fn replies(&self, count: usize) -> Vec<String> {
        let wait = async {
            loop {
                let replies = self.channel_texts();
                if replies.len() >= count {
                    return replies;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        };
        match tokio::time::timeout(Duration::from_secs(2), wait).await {
            Ok(replies) => replies,
            Err(_) => panic!("expected {count} replies, got {:?}", self.channel_texts()),
        }
    }

    /// Lets spawned subscribers run to completion.
    pub async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    /// Non-empty texts sent to [`CHANNEL`]; embed-only messages are left out.
    pub fn channel_texts(&self) -> Vec<String> {
        self.gateway
            .sent_messages()
            .into_iter()
            .filter(|(channel, text)| *channel == CHANNEL && !text.is_empty())
            .map(|(_, text)| text)
            .collect()
    }

    pub fn deleted(&self) -> Vec<MessageId> {
        self.gateway
            .outbound()
            .into_iter()
            .filter_map(|call| match call {
                Outbound::Delete { message, .. } => Some(message),
                _ => None,
            })
            .collect()
    }
}

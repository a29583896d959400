//! # Event Bus
//!
//! Adapts the raw [`GatewayEvent`] stream into typed, independently firing
//! subscriber invocations.
//!
//! For every event the bus:
//!
//! 1. bumps the relevant counters synchronously,
//! 2. runs the priority hooks inline (received messages only); a
//!    [`HookResult::Stop`](herald_core::HookResult::Stop) claims the event,
//! 3. resolves uncached message references, dropping events of untracked
//!    guilds and routing fetch failures to the guild's HTTP handler,
//! 4. spawns one task per subscriber and returns.
//!
//! Lifecycle events (connecting, connected, ready, disconnected) and
//! interactions are left to the client.

mod subscription;

pub use subscription::Subscription;

use crate::counters::Counters;
use async_trait::async_trait;
use herald_core::{
    Capabilities, ChannelEvent, ChannelId, ChatMessage, DynHook, EventContext, FailureReporter, Gateway,
    GatewayEvent, GuildChanged, GuildEvent, GuildId, Hook, MemberEvent, MemberUpdated,
    MessageDeleted, MessageEdited, MessageReceived, MessageRef, Reaction, ReactionEvent, ReactionKind,
    RoleEvent, TransportError, TypingStarted, UserChanged, VoiceStateChanged,
};
use parking_lot::RwLock;
use std::sync::{Arc, OnceLock, Weak};

/// What the bus needs to know about tracked guilds.
#[async_trait]
pub trait GuildDirectory: Send + Sync + 'static {
    /// Whether the guild is currently tracked.
    fn is_tracked(&self, guild: GuildId) -> bool;

    /// Capabilities the bot holds in the guild.
    fn bot_capabilities(&self, guild: GuildId) -> Option<Capabilities>;

    /// Handles a failed platform call made on behalf of the guild.
    ///
    /// `notice` is the text users should see. Returns `true` once the guild
    /// has failed often enough that callers should give up.
    async fn handle_http_error(&self, guild: GuildId, error: &TransportError, notice: &str) -> bool;
}

/// Typed multi-subscriber dispatch surface.
pub struct EventBus {
    gateway: Arc<dyn Gateway>,
    reporter: Arc<dyn FailureReporter>,
    counters: Arc<Counters>,
    directory: OnceLock<Weak<dyn GuildDirectory>>,
    priority_message: RwLock<Vec<Arc<dyn DynHook<MessageReceived>>>>,

    /// A message was posted.
    pub message_received: Subscription<MessageReceived>,
    /// A message was edited.
    pub message_edited: Subscription<MessageEdited>,
    /// A readable message was deleted.
    pub message_deleted: Subscription<MessageDeleted>,
    /// A reaction was added.
    pub reaction_added: Subscription<ReactionEvent>,
    /// A reaction was removed.
    pub reaction_removed: Subscription<ReactionEvent>,
    /// All reactions were removed.
    pub reactions_cleared: Subscription<ReactionEvent>,

    /// A guild became available.
    pub guild_available: Subscription<GuildEvent>,
    /// A guild became unavailable.
    pub guild_unavailable: Subscription<GuildEvent>,
    /// The bot joined a guild.
    pub guild_joined: Subscription<GuildEvent>,
    /// The bot left a guild.
    pub guild_left: Subscription<GuildEvent>,
    /// Guild information changed.
    pub guild_updated: Subscription<GuildChanged>,

    /// A role was created.
    pub role_created: Subscription<RoleEvent>,
    /// A role changed.
    pub role_updated: Subscription<RoleEvent>,
    /// A role was deleted.
    pub role_deleted: Subscription<RoleEvent>,

    /// A channel was created.
    pub channel_created: Subscription<ChannelEvent>,
    /// A channel changed.
    pub channel_updated: Subscription<ChannelEvent>,
    /// A channel was deleted.
    pub channel_destroyed: Subscription<ChannelEvent>,

    /// A member joined.
    pub user_joined: Subscription<MemberEvent>,
    /// A user left.
    pub user_left: Subscription<MemberEvent>,
    /// A user was banned.
    pub user_banned: Subscription<MemberEvent>,
    /// A user was unbanned.
    pub user_unbanned: Subscription<MemberEvent>,
    /// A user account changed.
    pub user_updated: Subscription<UserChanged>,
    /// Guild membership changed.
    pub member_updated: Subscription<MemberUpdated>,
    /// A user started typing.
    pub user_typing: Subscription<TypingStarted>,
    /// A voice state changed.
    pub voice_state_changed: Subscription<VoiceStateChanged>,
}

impl EventBus {
    /// Creates a bus with no subscribers.
    pub fn new(
        gateway: Arc<dyn Gateway>,
        reporter: Arc<dyn FailureReporter>,
        counters: Arc<Counters>,
    ) -> Self {
        Self {
            gateway,
            reporter,
            counters,
            directory: OnceLock::new(),
            priority_message: RwLock::new(Vec::new()),
            message_received: Subscription::new("MessageReceived"),
            message_edited: Subscription::new("MessageUpdated"),
            message_deleted: Subscription::new("MessageDeleted"),
            reaction_added: Subscription::new("ReactionAdded"),
            reaction_removed: Subscription::new("ReactionRemoved"),
            reactions_cleared: Subscription::new("ReactionsCleared"),
            guild_available: Subscription::new("GuildAvailable"),
            guild_unavailable: Subscription::new("GuildUnavailable"),
            guild_joined: Subscription::new("GuildJoined"),
            guild_left: Subscription::new("GuildLeft"),
            guild_updated: Subscription::new("GuildUpdated"),
            role_created: Subscription::new("RoleCreated"),
            role_updated: Subscription::new("RoleUpdated"),
            role_deleted: Subscription::new("RoleDeleted"),
            channel_created: Subscription::new("ChannelCreated"),
            channel_updated: Subscription::new("ChannelUpdated"),
            channel_destroyed: Subscription::new("ChannelDestroyed"),
            user_joined: Subscription::new("UserJoined"),
            user_left: Subscription::new("UserLeft"),
            user_banned: Subscription::new("UserBanned"),
            user_unbanned: Subscription::new("UserUnbanned"),
            user_updated: Subscription::new("UserUpdated"),
            member_updated: Subscription::new("GuildMemberUpdated"),
            user_typing: Subscription::new("UserTyping"),
            voice_state_changed: Subscription::new("UserVoiceStateUpdated"),
        }
    }

    /// Attaches the guild directory. Only the first call has an effect.
    ///
    /// Without a directory every guild counts as tracked and fetch failures
    /// go straight to the reporter.
    pub fn attach_directory(&self, directory: Weak<dyn GuildDirectory>) {
        let _ = self.directory.set(directory);
    }

    /// Appends a priority hook for received messages.
    pub fn add_priority_hook(&self, hook: impl Hook<MessageReceived>) {
        self.priority_message.write().push(Arc::new(hook));
    }

    /// The counters this bus increments.
    pub fn counters(&self) -> &Arc<Counters> {
        &self.counters
    }

    /// The failure sink subscribers report into.
    pub fn reporter(&self) -> &Arc<dyn FailureReporter> {
        &self.reporter
    }

    fn directory(&self) -> Option<Arc<dyn GuildDirectory>> {
        self.directory.get().and_then(Weak::upgrade)
    }

    fn is_tracked(&self, guild: GuildId) -> bool {
        self.directory().is_none_or(|directory| directory.is_tracked(guild))
    }

    /// Translates one raw event and fires the matching subscribers.
    pub async fn publish(&self, event: GatewayEvent) {
        let reporter = &self.reporter;
        match event {
            GatewayEvent::MessageReceived(message) => {
                self.counters.message_received();
                let event = MessageReceived { message };
                if self.claimed_by_priority(&event).await {
                    return;
                }
                self.message_received.fire(&event, reporter);
            }
            GatewayEvent::MessageUpdated { before, after } => {
                self.counters.message_received();
                let before = self.previous_version(before, &after).await;
                self.message_edited
                    .fire(&MessageEdited { before, after }, reporter);
            }
            GatewayEvent::MessageDeleted(reference) => {
                if let Some(message) = self.resolve(reference).await {
                    self.message_deleted.fire(&MessageDeleted { message }, reporter);
                }
            }
            GatewayEvent::ReactionAdded { message, reaction } => {
                self.fire_reaction(&self.reaction_added, ReactionKind::Added, message, Some(reaction))
                    .await;
            }
            GatewayEvent::ReactionRemoved { message, reaction } => {
                self.fire_reaction(&self.reaction_removed, ReactionKind::Removed, message, Some(reaction))
                    .await;
            }
            GatewayEvent::ReactionsCleared { message } => {
                self.fire_reaction(&self.reactions_cleared, ReactionKind::Cleared, message, None)
                    .await;
            }

            GatewayEvent::GuildAvailable(guild) => {
                self.guild_available.fire(&GuildEvent { guild }, reporter);
            }
            GatewayEvent::GuildUnavailable(guild) => {
                self.guild_unavailable.fire(&GuildEvent { guild }, reporter);
            }
            GatewayEvent::GuildJoined(guild) => {
                self.guild_joined.fire(&GuildEvent { guild }, reporter);
            }
            GatewayEvent::GuildLeft(guild) => {
                self.guild_left.fire(&GuildEvent { guild }, reporter);
            }
            GatewayEvent::GuildUpdated { before, after } => {
                self.guild_updated.fire(&GuildChanged { before, after }, reporter);
            }

            GatewayEvent::RoleCreated(role) => {
                self.role_created.fire(&RoleEvent { before: None, role }, reporter);
            }
            GatewayEvent::RoleUpdated { before, after } => {
                let event = RoleEvent {
                    before: Some(before),
                    role: after,
                };
                self.role_updated.fire(&event, reporter);
            }
            GatewayEvent::RoleDeleted(role) => {
                self.role_deleted.fire(&RoleEvent { before: None, role }, reporter);
            }

            GatewayEvent::ChannelCreated(channel) => {
                let event = ChannelEvent {
                    before: None,
                    channel,
                };
                self.channel_created.fire(&event, reporter);
            }
            GatewayEvent::ChannelUpdated { before, after } => {
                let event = ChannelEvent {
                    before: Some(before),
                    channel: after,
                };
                self.channel_updated.fire(&event, reporter);
            }
            GatewayEvent::ChannelDestroyed(channel) => {
                let event = ChannelEvent {
                    before: None,
                    channel,
                };
                self.channel_destroyed.fire(&event, reporter);
            }

            GatewayEvent::UserJoined(member) => {
                let event = MemberEvent {
                    guild_id: member.guild_id,
                    user: member.user.clone(),
                    member: Some(member),
                };
                self.user_joined.fire(&event, reporter);
            }
            GatewayEvent::UserLeft { guild_id, user } => {
                let event = MemberEvent {
                    guild_id,
                    user,
                    member: None,
                };
                self.user_left.fire(&event, reporter);
            }
            GatewayEvent::UserBanned { guild_id, user } => {
                let event = MemberEvent {
                    guild_id,
                    user,
                    member: None,
                };
                self.user_banned.fire(&event, reporter);
            }
            GatewayEvent::UserUnbanned { guild_id, user } => {
                let event = MemberEvent {
                    guild_id,
                    user,
                    member: None,
                };
                self.user_unbanned.fire(&event, reporter);
            }
            GatewayEvent::UserUpdated { before, after } => {
                self.user_updated.fire(&UserChanged { before, after }, reporter);
            }
            GatewayEvent::GuildMemberUpdated { before, after } => {
                if let (Some(before), Some(after)) = (before, after) {
                    self.member_updated
                        .fire(&MemberUpdated { before, after }, reporter);
                }
            }
            GatewayEvent::UserTyping { user, channel_id } => {
                if let Some(user) = user {
                    self.user_typing
                        .fire(&TypingStarted { user, channel_id }, reporter);
                }
            }
            GatewayEvent::VoiceStateUpdated {
                user,
                guild_id,
                before,
                after,
            } => {
                let event = VoiceStateChanged {
                    user,
                    guild_id,
                    before,
                    after,
                };
                self.voice_state_changed.fire(&event, reporter);
            }

            GatewayEvent::Connecting
            | GatewayEvent::Connected
            | GatewayEvent::Ready
            | GatewayEvent::Disconnected(_)
            | GatewayEvent::InteractionCreated(_) => {
                tracing::trace!("lifecycle event is not dispatched by the bus");
            }
        }
    }

    async fn claimed_by_priority(&self, event: &MessageReceived) -> bool {
        let hooks = self.priority_message.read().clone();
        for hook in hooks {
            match hook.on_event_dyn(event).await {
                Ok(result) if result.is_stop() => {
                    tracing::debug!(message = %event.message.id, "message claimed by priority hook");
                    return true;
                }
                Ok(_) => {}
                Err(error) => {
                    let context = format!(
                        "--Events.PriorityMessageReceived\n{}",
                        event.failure_context()
                    );
                    self.reporter.report(&*error, &context, event.guild_id());
                }
            }
        }
        false
    }

    /// The pre-edit message: the cached copy, or a history read when the bot may.
    async fn previous_version(
        &self,
        before: MessageRef,
        after: &ChatMessage,
    ) -> Option<ChatMessage> {
        if before.cached.is_some() {
            return before.cached;
        }
        let guild = before.guild_id.filter(|_| after.is_guild_text())?;
        let can_read = self
            .directory()
            .and_then(|directory| directory.bot_capabilities(guild))
            .is_some_and(|caps| caps.contains(Capabilities::READ_MESSAGE_HISTORY));
        if !can_read {
            return None;
        }

        match self.gateway.fetch_message(before.channel_id, before.id).await {
            Ok(message) => message,
            Err(error) => {
                self.fetch_failed(guild, before.channel_id, error).await;
                None
            }
        }
    }

    /// Resolves a possibly uncached message of a tracked guild.
    async fn resolve(&self, reference: MessageRef) -> Option<ChatMessage> {
        let guild = reference.guild_id?;
        if !self.is_tracked(guild) {
            return None;
        }
        if reference.cached.is_some() {
            return reference.cached;
        }

        match self
            .gateway
            .fetch_message(reference.channel_id, reference.id)
            .await
        {
            Ok(message) => message,
            Err(error) => {
                self.fetch_failed(guild, reference.channel_id, error).await;
                None
            }
        }
    }

    async fn fetch_failed(&self, guild: GuildId, channel: ChannelId, error: TransportError) {
        match (&error, self.directory()) {
            (TransportError::Http { .. }, Some(directory)) => {
                let notice = format!(
                    "I couldn't read messages in {}, please ensure that I have `ReadMessageHistory`!",
                    channel.mention()
                );
                directory.handle_http_error(guild, &error, &notice).await;
            }
            _ => self.reporter.report(&error, "Event Exception", Some(guild)),
        }
    }

    async fn fire_reaction(
        &self,
        subscription: &Subscription<ReactionEvent>,
        kind: ReactionKind,
        reference: MessageRef,
        reaction: Option<Reaction>,
    ) {
        if let Some(message) = self.resolve(reference).await {
            let event = ReactionEvent {
                kind,
                message,
                reaction,
            };
            subscription.fire(&event, &self.reporter);
        }
    }
}

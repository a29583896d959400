//! # Client
//!
//! Owns every runtime component and turns the raw gateway stream into guild
//! bookkeeping, lifecycle transitions and bus events.
//!
//! ```rust,ignore
//! let client = ClientBuilder::new(config, gateway)
//!     .module(Arc::new(MyModule))
//!     .on_connected(|event: Lifecycle| async move {
//!         tracing::info!(guilds = event.client.guilds().len(), "ready to serve");
//!         Ok(())
//!     })
//!     .build()?;
//!
//! while let Some(event) = transport.next().await {
//!     client.handle_event(event).await;
//! }
//! ```

use crate::{
    command::CommandArguments,
    commands,
    config::{BotConfig, ConfigError},
    dispatcher::Dispatcher,
    guild::{Guild, GuildStore},
    main_loop::MainLoop,
    messenger::DirectMessenger,
    module::Module,
    registry::CommandTable,
    settings::{GuildSettings, SettingsStore},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use herald_core::{
    ApplicationCommand, Capabilities, ChannelId, DynHandler, FailureReporter, Gateway,
    GatewayEvent, GuildId, GuildInfo, Handler, HandlerResult, HookError, Interaction,
    InteractionResponse, Message, OutgoingMessage, TransportError,
};
use herald_std::{
    CancellationToken, Counters, EventBus, GuildDirectory, OperationRegistry, PermissionResolver,
    TracingReporter,
};
use parking_lot::{Mutex, RwLock};
use std::{
    panic::AssertUnwindSafe,
    sync::{
        Arc, Weak,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::{sync::watch, task::JoinHandle, time::Instant};

/// Notices are sent while a guild has failed fewer times than this.
const NOTICE_LIMIT: u32 = 5;
/// [`GuildDirectory::handle_http_error`] tells callers to give up past this count.
const GIVE_UP_AFTER: u32 = 3;

const NOTIFICATION_HINT: &str =
    "\n\nYou can also set these messages to be sent into a notification channel in the config.";

/// Payload of the lifecycle hooks.
#[derive(Clone)]
pub struct Lifecycle {
    /// The runtime.
    pub client: Arc<Client>,
    /// Why the connection dropped, for disconnect hooks.
    pub error: Option<TransportError>,
}

impl Message for Lifecycle {}

type LifecycleHooks = Vec<Arc<dyn DynHandler<Lifecycle>>>;

// ============================================================================
// Builder
// ============================================================================

/// Assembles a [`Client`].
pub struct ClientBuilder {
    config: BotConfig,
    gateway: Arc<dyn Gateway>,
    reporter: Option<Arc<dyn FailureReporter>>,
    counters: Arc<Counters>,
    modules: Vec<Arc<dyn Module>>,
    initialize: LifecycleHooks,
    connected: LifecycleHooks,
    disconnected: LifecycleHooks,
}

impl ClientBuilder {
    /// Starts a client for `config`, talking to the platform through `gateway`.
    pub fn new(config: BotConfig, gateway: Arc<dyn Gateway>) -> Self {
        Self {
            config,
            gateway,
            reporter: None,
            counters: Arc::new(Counters::new()),
            modules: Vec::new(),
            initialize: Vec::new(),
            connected: Vec::new(),
            disconnected: Vec::new(),
        }
    }

    /// Replaces the default [`TracingReporter`].
    pub fn reporter(mut self, reporter: Arc<dyn FailureReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Adds a module. Modules initialize and update in the order they were added.
    pub fn module(mut self, module: Arc<dyn Module>) -> Self {
        self.modules.push(module);
        self
    }

    /// Runs `hook` once, at the end of initialization.
    pub fn on_initialize(mut self, hook: impl Handler<Lifecycle>) -> Self {
        self.initialize.push(Arc::new(hook));
        self
    }

    /// Runs `hook` once the connection settled and updates are about to start.
    pub fn on_connected(mut self, hook: impl Handler<Lifecycle>) -> Self {
        self.connected.push(Arc::new(hook));
        self
    }

    /// Runs `hook` on every disconnect.
    pub fn on_disconnected(mut self, hook: impl Handler<Lifecycle>) -> Self {
        self.disconnected.push(Arc::new(hook));
        self
    }

    /// Validates the config and wires the components together.
    pub fn build(self) -> Result<Arc<Client>, ConfigError> {
        self.config.validate()?;

        let counters = self.counters;
        let reporter = self
            .reporter
            .unwrap_or_else(|| Arc::new(TracingReporter::new(counters.clone())));
        let config = Arc::new(self.config);
        let settings = SettingsStore::from_config(&config);
        let bus = EventBus::new(self.gateway.clone(), reporter.clone(), counters.clone());
        let messenger = DirectMessenger::new(self.gateway.clone(), reporter.clone(), counters.clone());
        let (initialized, _) = watch::channel(false);

        let client = Arc::new(Client {
            operations: OperationRegistry::new(config.operations_max),
            permissions: PermissionResolver::new(config.owner_user_id),
            config,
            gateway: self.gateway,
            reporter,
            counters,
            bus,
            guilds: GuildStore::new(),
            settings,
            commands: RwLock::new(Arc::new(CommandTable::new())),
            messenger,
            modules: self.modules,
            initialize_hooks: self.initialize,
            connected_hooks: self.connected,
            disconnected_hooks: self.disconnected,
            init_started: AtomicBool::new(false),
            initialized,
            connected: AtomicBool::new(false),
            connected_at: Mutex::new(None),
            main_loop: Mutex::new(None),
            shutdown: CancellationToken::new(),
            started_at: Utc::now(),
        });

        let dispatcher = Dispatcher::new(Arc::downgrade(&client));
        client.bus.message_received.subscribe(dispatcher.clone());
        client.bus.message_edited.subscribe(dispatcher);
        let directory: Weak<Client> = Arc::downgrade(&client);
        client.bus.attach_directory(directory);

        Ok(client)
    }
}

// ============================================================================
// Client
// ============================================================================

/// The bot runtime.
pub struct Client {
    config: Arc<BotConfig>,
    gateway: Arc<dyn Gateway>,
    reporter: Arc<dyn FailureReporter>,
    counters: Arc<Counters>,
    bus: EventBus,
    guilds: GuildStore,
    settings: SettingsStore,
    commands: RwLock<Arc<CommandTable>>,
    operations: OperationRegistry<CommandArguments>,
    permissions: PermissionResolver,
    messenger: DirectMessenger,
    modules: Vec<Arc<dyn Module>>,
    initialize_hooks: LifecycleHooks,
    connected_hooks: LifecycleHooks,
    disconnected_hooks: LifecycleHooks,
    init_started: AtomicBool,
    initialized: watch::Sender<bool>,
    connected: AtomicBool,
    connected_at: Mutex<Option<Instant>>,
    main_loop: Mutex<Option<JoinHandle<()>>>,
    shutdown: CancellationToken,
    started_at: DateTime<Utc>,
}

impl Client {
    /// The configuration the client was built with.
    pub fn config(&self) -> &Arc<BotConfig> {
        &self.config
    }

    /// Outbound platform calls.
    pub fn gateway(&self) -> &Arc<dyn Gateway> {
        &self.gateway
    }

    /// The failure sink.
    pub fn reporter(&self) -> &Arc<dyn FailureReporter> {
        &self.reporter
    }

    /// Runtime counters.
    pub fn counters(&self) -> &Arc<Counters> {
        &self.counters
    }

    /// The event bus. Subscribe here for anything the runtime does not handle itself.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Tracked guilds.
    pub fn guilds(&self) -> &GuildStore {
        &self.guilds
    }

    /// Runtime guild settings.
    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// Long-running operations.
    pub fn operations(&self) -> &OperationRegistry<CommandArguments> {
        &self.operations
    }

    /// Permission checks.
    pub fn permissions(&self) -> &PermissionResolver {
        &self.permissions
    }

    /// Direct messages.
    pub fn messenger(&self) -> &DirectMessenger {
        &self.messenger
    }

    /// Registered modules.
    pub fn modules(&self) -> &[Arc<dyn Module>] {
        &self.modules
    }

    /// The current built-in command table.
    pub fn command_table(&self) -> Arc<CommandTable> {
        self.commands.read().clone()
    }

    /// Whether the connection settled and updates are running.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Whether initialization finished.
    pub fn is_initialized(&self) -> bool {
        *self.initialized.borrow()
    }

    /// When the socket last came up.
    pub fn connected_at(&self) -> Option<Instant> {
        *self.connected_at.lock()
    }

    /// The config with the runtime settings written back into it.
    pub fn export_config(&self) -> BotConfig {
        let mut config = BotConfig::clone(&self.config);
        self.settings.export_into(&mut config);
        config
    }

    // ========================================================================
    // Event intake
    // ========================================================================

    /// Handles one event from the transport.
    pub async fn handle_event(self: &Arc<Self>, event: GatewayEvent) {
        match event {
            GatewayEvent::Connecting => tracing::info!("connecting"),
            GatewayEvent::Connected => self.on_connected().await,
            GatewayEvent::Ready => {
                tracing::info!("session ready");
                self.start_main_loop();
            }
            GatewayEvent::Disconnected(error) => self.on_disconnected(error).await,

            GatewayEvent::GuildAvailable(info) => {
                self.track_guild(info, GatewayEvent::GuildAvailable).await;
            }
            GatewayEvent::GuildJoined(info) => {
                self.track_guild(info, GatewayEvent::GuildJoined).await;
            }
            GatewayEvent::GuildUnavailable(info) => {
                let cancelled = self.operations.cancel_guild(info.id);
                tracing::info!(guild = %info.id, cancelled, "guild unavailable");
                self.bus.publish(GatewayEvent::GuildUnavailable(info)).await;
            }
            GatewayEvent::GuildLeft(info) => {
                let cancelled = self.operations.cancel_guild(info.id);
                self.guilds.remove(info.id);
                tracing::info!(guild = %info.id, cancelled, "left guild");
                self.bus.publish(GatewayEvent::GuildLeft(info)).await;
            }
            GatewayEvent::GuildUpdated { before, after } => {
                self.guilds
                    .replace_with(after.id, |current| current.with_info(after.clone()));
                self.bus
                    .publish(GatewayEvent::GuildUpdated { before, after })
                    .await;
            }

            GatewayEvent::InteractionCreated(interaction) => {
                self.handle_interaction(interaction).await;
            }

            other => self.bus.publish(other).await,
        }
    }

    async fn on_connected(&self) {
        *self.connected_at.lock() = Some(Instant::now());
        tracing::info!("connected");
        if let Err(error) = self.gateway.set_presence("Connecting...").await {
            self.reporter.report(&error, "--OnConnected", None);
        }
    }

    async fn on_disconnected(self: &Arc<Self>, error: TransportError) {
        self.connected.store(false, Ordering::SeqCst);
        self.counters.disconnected();
        self.reporter.report(&error, "--Client Disconnected", None);

        self.run_hooks(&self.disconnected_hooks, Some(error.clone()), "--Events.Disconnected")
            .await;

        if !error.is_transient() {
            tracing::error!(%error, "connection lost, shutting down");
            self.shutdown();
        }
    }

    fn start_main_loop(self: &Arc<Self>) {
        let mut slot = self.main_loop.lock();
        if slot.is_some() {
            return;
        }
        let main_loop = MainLoop::new(self.clone());
        *slot = Some(tokio::spawn(main_loop.run(self.shutdown.clone())));
    }

    async fn track_guild(self: &Arc<Self>, info: GuildInfo, event: fn(GuildInfo) -> GatewayEvent) {
        if self.is_initialized() {
            self.load_guild(info.clone()).await;
            self.bus.publish(event(info)).await;
            return;
        }

        let client = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = client.shutdown.cancelled() => {}
                _ = client.load_guild(info.clone()) => client.bus.publish(event(info)).await,
            }
        });
    }

    // ========================================================================
    // Initialization and lifecycle
    // ========================================================================

    /// One-time initialization. Returns `false` if it already ran or is running.
    ///
    /// Registers the built-in commands and every module's commands, creates
    /// the global `ping` command, runs the initialize hooks and finally
    /// releases guilds waiting to be loaded.
    pub async fn initialize(self: &Arc<Self>) -> bool {
        if self.init_started.swap(true, Ordering::SeqCst) {
            return false;
        }
        tracing::info!("initializing");

        let mut table = CommandTable::new();
        for command in commands::builtin() {
            table.register(command);
        }
        for module in &self.modules {
            match module.init(self).await {
                Ok(commands) => {
                    for command in commands {
                        table.register(command);
                    }
                }
                Err(error) => {
                    let context = format!("--ModuleInit.{}", module.name());
                    self.reporter.report(&*error, &context, None);
                }
            }
        }
        *self.commands.write() = Arc::new(table);
        self.refresh_guilds();

        let ping = ApplicationCommand {
            name: "ping".to_string(),
            description: "Verify basic functionality.".to_string(),
        };
        if let Err(error) = self.gateway.create_global_command(ping).await {
            self.reporter.report(&error, "InitSlashCommands", None);
        }

        self.run_hooks(&self.initialize_hooks, None, "--Events.Initialize")
            .await;
        self.initialized.send_replace(true);
        true
    }

    /// Waits until [`Client::initialize`] finished.
    pub async fn wait_until_initialized(&self) {
        let mut initialized = self.initialized.subscribe();
        let _ = initialized.wait_for(|ready| *ready).await;
    }

    /// Marks the connection as settled and runs the connected hooks.
    pub async fn mark_connected(self: &Arc<Self>) {
        self.connected.store(true, Ordering::SeqCst);
        tracing::info!("connection settled, starting updates");

        if !self.config.game_status.is_empty() {
            if let Err(error) = self.gateway.set_presence(&self.config.game_status).await {
                self.reporter.report(&error, "--Events.Connected", None);
            }
        }
        self.run_hooks(&self.connected_hooks, None, "--Events.Connected")
            .await;
    }

    async fn run_hooks(
        self: &Arc<Self>,
        hooks: &[Arc<dyn DynHandler<Lifecycle>>],
        error: Option<TransportError>,
        context: &str,
    ) {
        for hook in hooks {
            let event = Lifecycle {
                client: self.clone(),
                error: error.clone(),
            };
            match AssertUnwindSafe(hook.call_dyn(event)).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(error)) => self.reporter.report(&*error, context, None),
                Err(panic) => self
                    .reporter
                    .report(&HookError::from_panic(&*panic), context, None),
            }
        }
    }

    /// Requests shutdown: stops the main loop and cancels every operation.
    pub fn shutdown(&self) {
        if self.shutdown.cancel() {
            let cancelled = self.operations.cancel_where(|_| true);
            tracing::info!(cancelled, "shutdown requested");
        }
    }

    /// Whether shutdown was requested.
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Resolves once shutdown is requested.
    pub async fn wait_for_shutdown(&self) {
        self.shutdown.cancelled().await;
    }

    // ========================================================================
    // Guilds
    // ========================================================================

    /// Starts tracking `info`, or rebuilds it if it is tracked already.
    ///
    /// Waits for initialization first. The failure counter of a previous
    /// snapshot is carried over.
    pub async fn load_guild(&self, info: GuildInfo) -> Arc<Guild> {
        self.wait_until_initialized().await;
        let _gate = self.guilds.reload_gate().lock().await;

        let table = self.command_table();
        let id = info.id;
        let guild = self.guilds.upsert(id, |current| {
            let failures = current.map(|guild| guild.http_failures().clone()).unwrap_or_default();
            Guild::build(info, table, &self.config, self.settings.get(id), failures)
        });
        tracing::debug!(guild = %id, name = %guild.info.name, "guild loaded");
        guild
    }

    /// Changes the settings of `guild` and swaps in a rebuilt snapshot.
    pub fn update_settings<R>(
        &self,
        guild: GuildId,
        change: impl FnOnce(&mut GuildSettings) -> R,
    ) -> R {
        let result = self.settings.update(guild, change);
        self.rebuild(guild);
        result
    }

    fn rebuild(&self, guild: GuildId) -> Option<Arc<Guild>> {
        let table = self.command_table();
        self.guilds.replace_with(guild, |current| {
            Guild::build(
                current.info.clone(),
                table,
                &self.config,
                self.settings.get(guild),
                current.http_failures().clone(),
            )
        })
    }

    fn refresh_guilds(&self) {
        for guild in self.guilds.snapshot() {
            self.rebuild(guild.id());
        }
    }

    // ========================================================================
    // Outbound
    // ========================================================================

    /// Sends `message` to `channel` of `guild`, split to the character limit.
    ///
    /// HTTP failures go to the guild's failure gate and stop the send without
    /// an error. Other transport failures are returned.
    pub async fn send_message(
        &self,
        guild: GuildId,
        channel: ChannelId,
        message: impl Into<OutgoingMessage>,
    ) -> HandlerResult {
        let message = message.into();
        if message.content.trim().is_empty() && message.embed.is_none() {
            return Ok(());
        }

        for chunk in split_message(message, self.config.message_character_limit) {
            match self.gateway.send_message(channel, chunk).await {
                Ok(_) => {}
                Err(error @ TransportError::Http { .. }) => {
                    let notice = format!(
                        "I couldn't send a message in {}, please ensure that I have `SendMessages`!",
                        channel.mention()
                    );
                    self.handle_http_error(guild, &error, &notice).await;
                    return Ok(());
                }
                Err(error) => return Err(error.into()),
            }
        }
        Ok(())
    }

    /// Routes a failed platform call: HTTP failures to the guild's gate, the rest to the reporter.
    pub async fn report_transport(
        &self,
        guild: GuildId,
        error: TransportError,
        notice: &str,
        context: &str,
    ) {
        match error {
            TransportError::Http { .. } => {
                self.handle_http_error(guild, &error, notice).await;
            }
            other => self.reporter.report(&other, context, Some(guild)),
        }
    }

    async fn handle_interaction(&self, interaction: Interaction) {
        if interaction.command_name != "ping" {
            return;
        }
        let Some(guild) = interaction.guild_id.filter(|guild| self.guilds.contains(*guild)) else {
            return;
        };

        let latency = Utc::now()
            .signed_duration_since(interaction.id.created_at())
            .to_std()
            .ok();
        let response = InteractionResponse {
            content: self.status_text(latency),
            ephemeral: true,
        };
        if let Err(error) = self.gateway.respond_to_interaction(interaction.id, response).await {
            self.reporter.report(&error, "--SlashCommand.ping", Some(guild));
        }
    }

    /// Status block shown by `status` and the `ping` slash command.
    pub fn status_text(&self, latency: Option<Duration>) -> String {
        let counters = self.counters.snapshot();
        let uptime = Utc::now().signed_duration_since(self.started_at);
        let uptime = format!(
            "{}d {}h {}m {}s",
            uptime.num_days(),
            uptime.num_hours() % 24,
            uptime.num_minutes() % 60,
            uptime.num_seconds() % 60
        );
        let latency = latency
            .map(|latency| format!("{} ms", latency.as_millis()))
            .unwrap_or_else(|| "n/a".to_string());
        let connection = if self.is_connected() {
            "connected"
        } else {
            "connecting"
        };

        format!(
            "```md\n\
             [       Shard ][ {}/{} ]\n\
             [      Uptime ][ {uptime} ]\n\
             [  Connection ][ {connection} ]\n\
             [     Latency ][ {latency} ]\n\
             [      Guilds ][ {} ]\n\
             [    Messages ][ {} ]\n\
             [    Commands ][ {} ]\n\
             [ Disconnects ][ {} ]\n\
             [  Operations ][ {} ]\n\
             ```",
            self.config.shard_id + 1,
            self.config.total_shards,
            self.guilds.len(),
            counters.messages_received,
            counters.commands_executed,
            counters.disconnects,
            self.operations.len(),
        )
    }

    async fn notify_guild(&self, guild: &Guild, status: u16, notice: &str) {
        let mut text = format!(
            "Received error code `{status}`\n{notice}\n\nPlease fix my permissions and channel access on your server `{}`.",
            guild.info.name
        );

        let channel = self.config.notification_channel_id;
        if channel.get() > 0 {
            if let Err(error) = self.gateway.send_message(channel, text.into()).await {
                if !matches!(error, TransportError::Http { .. }) {
                    self.reporter.report(&error, "--HttpErrorNotice", Some(guild.id()));
                }
            }
            return;
        }

        text.push_str(NOTIFICATION_HINT);
        let outcome = self.messenger.send(guild.info.owner_id, text).await;
        tracing::debug!(guild = %guild.id(), ?outcome, "failure notice sent to owner");
    }
}

#[async_trait]
impl GuildDirectory for Client {
    fn is_tracked(&self, guild: GuildId) -> bool {
        self.guilds.contains(guild)
    }

    fn bot_capabilities(&self, guild: GuildId) -> Option<Capabilities> {
        self.guilds.get(guild).map(|guild| guild.info.bot_capabilities)
    }

    async fn handle_http_error(&self, guild: GuildId, error: &TransportError, notice: &str) -> bool {
        let Some(guild) = self.guilds.get(guild) else {
            tracing::debug!(%guild, %error, "failure for untracked guild dropped");
            return false;
        };

        let failures = guild.http_failures();
        let log_message = if error.is_server_error() {
            Some("platform error")
        } else if error.is_not_found() {
            None
        } else if error.is_dm_blocked() {
            Some("Failed to PM")
        } else {
            if failures.load(Ordering::SeqCst) < NOTICE_LIMIT {
                self.notify_guild(&guild, error.status().unwrap_or_default(), notice)
                    .await;
            }
            Some("HttpException - further logging disabled")
        };

        let count = failures.fetch_add(1, Ordering::SeqCst) + 1;
        match log_message {
            Some(context) if count == 1 => self.reporter.report(error, context, Some(guild.id())),
            _ => {}
        }
        count > GIVE_UP_AFTER
    }
}

/// Splits `message` so that no chunk exceeds `limit` characters. The embed rides on the last chunk.
fn split_message(message: OutgoingMessage, limit: usize) -> Vec<OutgoingMessage> {
    if message.content.chars().count() <= limit {
        return vec![message];
    }

    let mut chunks: Vec<OutgoingMessage> = split_content(&message.content, limit)
        .into_iter()
        .map(|content| OutgoingMessage::text(content).allowed_mentions(message.allowed_mentions))
        .collect();
    if let (Some(embed), Some(last)) = (message.embed, chunks.last_mut()) {
        last.embed = Some(embed);
    }
    chunks
}

/// Splits on line boundaries; a single line longer than `limit` is cut hard.
fn split_content(content: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in content.split_inclusive('\n') {
        let line_len = line.chars().count();
        if current_len + line_len > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len <= limit {
            current.push_str(line);
            current_len += line_len;
            continue;
        }

        let chars: Vec<char> = line.chars().collect();
        let mut pieces = chars.chunks(limit).peekable();
        while let Some(piece) = pieces.next() {
            let piece: String = piece.iter().collect();
            if pieces.peek().is_some() {
                chunks.push(piece);
            } else {
                current_len = piece.chars().count();
                current = piece;
            }
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::Embed;

    #[test]
    fn test_split_prefers_line_boundaries() {
        let chunks = split_content("aaaa\nbbbb\ncc", 10);
        assert_eq!(chunks, vec!["aaaa\nbbbb\n".to_string(), "cc".to_string()]);
    }

    #[test]
    fn test_split_cuts_overlong_lines() {
        let chunks = split_content("abcdefghij\nxy", 4);
        assert_eq!(chunks, vec!["abcd", "efgh", "ij\n", "xy"]);
        assert!(chunks.iter().all(|chunk| chunk.chars().count() <= 4));
    }

    #[test]
    fn test_embed_rides_on_last_chunk() {
        let message = OutgoingMessage::text("one\ntwo\nthree").embed(Embed {
            title: Some("t".into()),
            ..Default::default()
        });
        let chunks = split_message(message, 8);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].embed.is_none());
        assert!(chunks[1].embed.is_some());

        let short = split_message(OutgoingMessage::text("hi"), 8);
        assert_eq!(short, vec![OutgoingMessage::text("hi")]);
    }
}

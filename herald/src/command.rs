//! Commands and their invocation context.

use crate::{client::Client, guild::Guild};
use futures::FutureExt;
use herald_core::{
    BoxError, Capabilities, ChannelId, ChatMessage, CommandError, CommandOptions, DynHandler,
    GuildId, Handler, HandlerResult, HookError, Member, Message, OutgoingMessage, PermissionType,
};
use herald_std::{OperationGuard, OperationScope};
use std::{fmt, future::Future, panic::AssertUnwindSafe, sync::Arc};

/// Manual shown by `man`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManPage {
    /// Parameter synopsis, e.g. `<text>`.
    pub usage: String,
    /// Parameter descriptions.
    pub text: String,
}

impl ManPage {
    /// Creates a manual page.
    pub fn new(usage: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            usage: usage.into(),
            text: text.into(),
        }
    }
}

/// A built-in or module command.
///
/// ```rust,ignore
/// let echo = Command::new("echo", |args: CommandArguments| async move {
///     args.reply(args.trimmed.clone()).await
/// })
/// .description("Repeats you.")
/// .required(PermissionType::EVERYONE)
/// .alias("repeat");
/// ```
pub struct Command {
    id: String,
    key: String,
    description: String,
    required: PermissionType,
    parent_id: Option<String>,
    aliases: Vec<String>,
    is_core: bool,
    is_hidden: bool,
    delete_request: bool,
    manual: Option<ManPage>,
    body: Arc<dyn DynHandler<CommandArguments>>,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("id", &self.id)
            .field("required", &self.required)
            .field("parent_id", &self.parent_id)
            .field("aliases", &self.aliases)
            .field("is_core", &self.is_core)
            .finish_non_exhaustive()
    }
}

impl Command {
    /// Creates a command running `body`. Anyone may run it until [`Command::required`] says otherwise.
    pub fn new<F, Fut>(id: impl Into<String>, body: F) -> Self
    where
        F: Fn(CommandArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self::with_handler(id, body)
    }

    /// Creates a command running a [`Handler`].
    pub fn with_handler(id: impl Into<String>, handler: impl Handler<CommandArguments>) -> Self {
        let id = id.into();
        Self {
            key: id.to_lowercase(),
            id,
            description: String::new(),
            required: PermissionType::EVERYONE,
            parent_id: None,
            aliases: Vec::new(),
            is_core: false,
            is_hidden: false,
            delete_request: false,
            manual: None,
            body: Arc::new(handler),
        }
    }

    /// Internal alias entry pointing at `parent`.
    pub(crate) fn alias_of(parent: &Command, alias: &str) -> Command {
        Command {
            id: alias.to_string(),
            key: alias.to_lowercase(),
            description: parent.description.clone(),
            required: parent.required,
            parent_id: Some(parent.key.clone()),
            aliases: Vec::new(),
            is_core: parent.is_core,
            is_hidden: parent.is_hidden,
            delete_request: parent.delete_request,
            manual: parent.manual.clone(),
            body: parent.body.clone(),
        }
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the required tiers.
    pub fn required(mut self, required: PermissionType) -> Self {
        self.required = required;
        self
    }

    /// Adds an alternative name.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into().to_lowercase());
        self
    }

    /// Marks the command as core: it cannot be restricted per guild.
    pub fn core(mut self) -> Self {
        self.is_core = true;
        self
    }

    /// Hides the command from `help`.
    pub fn hidden(mut self) -> Self {
        self.is_hidden = true;
        self
    }

    /// Deletes the invoking message before running.
    pub fn delete_request(mut self, delete: bool) -> Self {
        self.delete_request = delete;
        self
    }

    /// Attaches a manual page.
    pub fn manual(mut self, manual: ManPage) -> Self {
        self.manual = Some(manual);
        self
    }

    /// Id as registered.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Lowercase id, the key options and operations are stored under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Description.
    pub fn describe(&self) -> &str {
        &self.description
    }

    /// Required tiers.
    pub fn required_tiers(&self) -> PermissionType {
        self.required
    }

    /// Parent key, for internal aliases.
    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    /// Alternative names, lowercase.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Cannot be restricted per guild.
    pub fn is_core(&self) -> bool {
        self.is_core
    }

    /// Hidden from `help`.
    pub fn is_hidden(&self) -> bool {
        self.is_hidden
    }

    /// Deletes the invoking message.
    pub fn deletes_request(&self) -> bool {
        self.delete_request
    }

    /// Manual page, if any.
    pub fn manual_page(&self) -> Option<&ManPage> {
        self.manual.as_ref()
    }

    /// Runs the command if the caller may.
    ///
    /// Returns `false` when the permission check denied the invocation and
    /// `true` once the body ran, whatever its outcome. Body failures never
    /// propagate: user-facing errors are replied, the rest is reported.
    pub async fn execute(&self, args: CommandArguments) -> bool {
        let decision = args.guild.check(
            args.client.permissions(),
            self,
            &args.member,
            args.message.channel_id,
        );
        if !decision.is_allowed() {
            tracing::debug!(command = %self.key, ?decision, "command denied");
            return false;
        }

        let client = args.client.clone();
        let wants_delete =
            self.delete_request || args.options.as_ref().is_some_and(|options| options.delete_request);
        if wants_delete && args.guild.bot_can(Capabilities::MANAGE_MESSAGES) {
            args.delete_request().await;
        }

        client.counters().command_executed();
        tracing::debug!(command = %self.key, guild = %args.guild.id(), "executing command");

        let context = args.failure_context();
        let guild = args.guild.id();
        let outcome = AssertUnwindSafe(self.body.call_dyn(args.clone()))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(error)) => match error.downcast::<CommandError>() {
                Ok(error) => {
                    if let Some(text) = error.user_message() {
                        if let Err(error) = args.reply(text).await {
                            client.reporter().report(&*error, &context, Some(guild));
                        }
                    }
                }
                Err(error) => client.reporter().report(&*error, &context, Some(guild)),
            },
            Err(panic) => {
                let error = HookError::from_panic(&*panic);
                client.reporter().report(&error, &context, Some(guild));
            }
        }
        true
    }
}

/// Everything a command body gets to work with.
#[derive(Clone)]
pub struct CommandArguments {
    /// The runtime.
    pub client: Arc<Client>,
    /// Snapshot of the guild at invocation.
    pub guild: Arc<Guild>,
    /// The command being run, after alias redirection.
    pub command: Arc<Command>,
    /// The invoking message.
    pub message: ChatMessage,
    /// The invoking member.
    pub member: Member,
    /// The command token as typed, without prefix.
    pub command_token: String,
    /// Everything after the command token, trimmed.
    pub trimmed: String,
    /// Tokenized arguments. Empty when none were given.
    pub arguments: Vec<String>,
    /// Options configured for the command in this guild.
    pub options: Option<CommandOptions>,
}

impl Message for CommandArguments {}

impl fmt::Debug for CommandArguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandArguments")
            .field("guild", &self.guild.id())
            .field("command", &self.command.key())
            .field("message", &self.message.id)
            .field("arguments", &self.arguments)
            .finish_non_exhaustive()
    }
}

impl OperationScope for CommandArguments {
    fn guild_id(&self) -> GuildId {
        self.guild.id()
    }

    fn channel_id(&self) -> ChannelId {
        self.message.channel_id
    }

    fn command_id(&self) -> &str {
        self.command.key()
    }
}

impl CommandArguments {
    /// The configured command prefix.
    pub fn prefix(&self) -> &str {
        &self.client.config().command_prefix
    }

    /// Sends `message` to the invoking channel.
    ///
    /// Platform rejections go to the guild's failure gate and are not
    /// returned; anything else is.
    pub async fn reply(&self, message: impl Into<OutgoingMessage>) -> HandlerResult {
        self.client
            .send_message(self.guild.id(), self.message.channel_id, message)
            .await
    }

    /// Registers this invocation as a long-running operation and waits for a slot.
    pub async fn begin_operation(&self) -> Result<OperationGuard<CommandArguments>, CommandError> {
        self.client.operations().begin(Arc::new(self.clone())).await
    }

    /// Whether the caller is the process owner.
    pub fn is_process_owner(&self) -> bool {
        self.client.permissions().is_process_owner(self.member.id())
    }

    /// Invalid-arguments error carrying the command description.
    pub fn invalid_parameters(&self) -> BoxError {
        CommandError::InvalidArguments(format!("Invalid parameters...\n{}", self.command.describe()))
            .into()
    }

    async fn delete_request(&self) {
        let result = self
            .client
            .gateway()
            .delete_message(self.message.channel_id, self.message.id)
            .await;
        if let Err(error) = result {
            let notice = format!(
                "I couldn't delete a command request in {}, please ensure that I have `ManageMessages`!",
                self.message.channel_id.mention()
            );
            self.client
                .report_transport(self.guild.id(), error, &notice, "--DeleteRequest")
                .await;
        }
    }

    fn failure_context(&self) -> String {
        format!(
            "--Command: {}\n--MessageId: {}\n--ChannelId: {}\n--Content: {}",
            self.command.key(),
            self.message.id,
            self.message.channel_id,
            self.message.content
        )
    }
}

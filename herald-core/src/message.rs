//! Payload marker.

/// Anything the bus, hooks or command handlers carry.
///
/// Subscribers run on spawned tasks, so payloads must be `Send + Sync + 'static`.
/// Every event payload of this crate implements it, as does the command
/// invocation context in `herald`.
///
/// ```rust,ignore
/// #[derive(Clone)]
/// struct ReminderDue { user: UserId }
///
/// impl Message for ReminderDue {}
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot travel through the event bus",
    label = "must implement `Message`",
    note = "Event payloads are moved onto spawned tasks and must be `Send + Sync + 'static`."
)]
pub trait Message: Send + Sync + 'static {}

impl Message for () {}
impl Message for String {}
impl<T: Message> Message for std::sync::Arc<T> {}

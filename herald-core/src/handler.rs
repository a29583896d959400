//! # Handlers
//!
//! The terminal endpoint of an event or command invocation. Bus subscribers
//! and command bodies are both handlers: they receive an owned value and
//! perform async work.
//!
//! Most subscribers are closures (`|event: MessageReceived| async move { Ok(()) }`);
//! stateful ones, like the command dispatcher, implement [`Handler`] directly.

use crate::{error::BoxError, message::Message};
use std::{future::Future, pin::Pin};

/// The output every handler produces: completion or a failure for the reporter.
pub type HandlerResult = Result<(), BoxError>;

/// Async endpoint receiving an owned input.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot handle input of type `{In}`",
    label = "missing `Handler<{In}>` implementation",
    note = "Handlers must implement the `call` method for the input type `{In}`."
)]
pub trait Handler<In: Message>: Send + Sync + 'static {
    /// Executes the handler logic.
    fn call(&self, input: In) -> impl Future<Output = HandlerResult> + Send;
}

impl<F, In, Fut> Handler<In> for F
where
    In: Message,
    F: Fn(In) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send,
{
    fn call(&self, input: In) -> impl Future<Output = HandlerResult> + Send {
        (self)(input)
    }
}

/// Object-safe version of [`Handler`].
pub trait DynHandler<In: Message>: Send + Sync + 'static {
    /// Boxed counterpart of [`Handler::call`].
    fn call_dyn(&self, input: In) -> Pin<Box<dyn Future<Output = HandlerResult> + Send + '_>>;
}

impl<In: Message, T: Handler<In>> DynHandler<In> for T {
    fn call_dyn(&self, input: In) -> Pin<Box<dyn Future<Output = HandlerResult> + Send + '_>> {
        Box::pin(self.call(input))
    }
}

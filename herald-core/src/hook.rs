//! # Priority Hooks
//!
//! A [`Hook`] inspects an event inline, before it is fanned out, and decides
//! whether later stages still see it. The bus uses hooks for the exclusive
//! "priority" claim on received messages.

use crate::{error::BoxError, message::Message};
use std::{future::Future, pin::Pin};

/// Result of hook execution indicating whether to continue or stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookResult {
    /// The event was observed, continue to the next hook and the subscribers.
    Next,
    /// The event was claimed. Nothing after this hook sees it.
    Stop,
}

impl HookResult {
    /// Returns `true` when the hook claimed the event.
    pub fn is_stop(self) -> bool {
        matches!(self, HookResult::Stop)
    }
}

/// Inline event interceptor.
///
/// # Example
///
/// ```rust,ignore
/// struct ClaimPings;
///
/// impl Hook<MessageReceived> for ClaimPings {
///     async fn on_event(&self, event: &MessageReceived) -> Result<HookResult, BoxError> {
///         if event.message.content == "ping" {
///             return Ok(HookResult::Stop);
///         }
///         Ok(HookResult::Next)
///     }
/// }
/// ```
///
/// This trait uses native `async fn`; the bus stores hooks as [`DynHook`].
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `Hook<{E}>`",
    label = "missing `Hook` implementation",
    note = "Hooks must implement `on_event` for the specific event type `{E}`."
)]
pub trait Hook<E: Message>: Send + Sync + 'static {
    /// Called inline when an event is published.
    fn on_event(&self, event: &E) -> impl Future<Output = Result<HookResult, BoxError>> + Send;
}

/// Object-safe version of [`Hook`].
pub trait DynHook<E: Message>: Send + Sync + 'static {
    /// Boxed counterpart of [`Hook::on_event`].
    fn on_event_dyn<'a>(
        &'a self,
        event: &'a E,
    ) -> Pin<Box<dyn Future<Output = Result<HookResult, BoxError>> + Send + 'a>>;
}

impl<E: Message, T: Hook<E>> DynHook<E> for T {
    fn on_event_dyn<'a>(
        &'a self,
        event: &'a E,
    ) -> Pin<Box<dyn Future<Output = Result<HookResult, BoxError>> + Send + 'a>> {
        Box::pin(self.on_event(event))
    }
}

/// A closure-backed hook for synchronous predicates.
///
/// Returning `true` claims the event.
pub struct FnHook<F> {
    claim: F,
}

impl<F> FnHook<F> {
    /// Wraps `claim` as a hook.
    pub fn new(claim: F) -> Self {
        Self { claim }
    }
}

impl<E, F> Hook<E> for FnHook<F>
where
    E: Message,
    F: Fn(&E) -> bool + Send + Sync + 'static,
{
    async fn on_event(&self, event: &E) -> Result<HookResult, BoxError> {
        if (self.claim)(event) {
            Ok(HookResult::Stop)
        } else {
            Ok(HookResult::Next)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fn_hook_claims_matching_events() {
        let hook = FnHook::new(|event: &String| event.starts_with("claim"));
        let dyn_hook: &dyn DynHook<String> = &hook;

        let claimed = dyn_hook.on_event_dyn(&"claim me".to_string()).await.unwrap();
        let passed = dyn_hook.on_event_dyn(&"ignore me".to_string()).await.unwrap();

        assert!(claimed.is_stop());
        assert_eq!(passed, HookResult::Next);
    }
}

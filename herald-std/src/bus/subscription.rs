//! Ordered subscriber lists.

use futures::FutureExt;
use herald_core::{DynHandler, EventContext, FailureReporter, Handler, HookError, Message};
use parking_lot::RwLock;
use std::{panic::AssertUnwindSafe, sync::Arc};

type Filter<E> = Box<dyn Fn(&E) -> bool + Send + Sync>;

struct Subscriber<E> {
    handler: Box<dyn DynHandler<E>>,
    filter: Option<Filter<E>>,
}

/// The subscription point of one event kind.
///
/// Subscribers are kept in registration order. Each one runs on its own task
/// when the event fires; a failure or panic in one never reaches the others.
pub struct Subscription<E> {
    name: &'static str,
    subscribers: RwLock<Vec<Arc<Subscriber<E>>>>,
}

impl<E> Subscription<E>
where
    E: Message + Clone + EventContext,
{
    /// Creates an empty subscription. `name` shows up in failure reports.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Event kind name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Appends a subscriber.
    pub fn subscribe(&self, handler: impl Handler<E>) {
        self.push(Subscriber {
            handler: Box::new(handler),
            filter: None,
        });
    }

    /// Appends a subscriber that only sees events matching `filter`.
    pub fn subscribe_when(
        &self,
        filter: impl Fn(&E) -> bool + Send + Sync + 'static,
        handler: impl Handler<E>,
    ) {
        self.push(Subscriber {
            handler: Box::new(handler),
            filter: Some(Box::new(filter)),
        });
    }

    fn push(&self, subscriber: Subscriber<E>) {
        self.subscribers.write().push(Arc::new(subscriber));
    }

    /// Number of subscribers.
    pub fn len(&self) -> usize {
        self.subscribers.read().len()
    }

    /// No subscribers.
    pub fn is_empty(&self) -> bool {
        self.subscribers.read().is_empty()
    }

    /// Spawns one task per matching subscriber and returns without waiting.
    ///
    /// Returns the number of tasks spawned.
    pub fn fire(&self, event: &E, reporter: &Arc<dyn FailureReporter>) -> usize {
        let subscribers = self.subscribers.read().clone();
        let mut spawned = 0;

        for subscriber in subscribers {
            if subscriber.filter.as_ref().is_some_and(|filter| !filter(event)) {
                continue;
            }

            let event = event.clone();
            let reporter = reporter.clone();
            let name = self.name;
            tokio::spawn(async move {
                let outcome = AssertUnwindSafe(subscriber.handler.call_dyn(event.clone()))
                    .catch_unwind()
                    .await;

                let context = || format!("--Events.{name}\n{}", event.failure_context());
                match outcome {
                    Ok(Ok(())) => {}
                    Ok(Err(error)) => reporter.report(&*error, &context(), event.guild_id()),
                    Err(panic) => {
                        let error = HookError::from_panic(&*panic);
                        reporter.report(&error, &context(), event.guild_id());
                    }
                }
            });
            spawned += 1;
        }

        spawned
    }
}

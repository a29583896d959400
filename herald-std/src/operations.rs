//! # Operation Registry
//!
//! Tracks long-running command executions. One lock guards both the list and
//! the run counter; enumeration and cancellation go through the same lock.
//!
//! A body registers with [`OperationRegistry::begin`] and holds the returned
//! [`OperationGuard`] for as long as it works. Dropping the guard removes the
//! entry, whether the body finished, failed or noticed cancellation.

use crate::cancel::CancellationToken;
use chrono::{DateTime, Utc};
use herald_core::{ChannelId, CommandError, GuildId};
use parking_lot::Mutex;
use std::{fmt, sync::Arc};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// What the registry needs to know about an operation's owner.
pub trait OperationScope: Send + Sync + 'static {
    /// Guild the operation runs in.
    fn guild_id(&self) -> GuildId;
    /// Channel the operation was started from.
    fn channel_id(&self) -> ChannelId;
    /// Lowercase id of the command running the operation.
    fn command_id(&self) -> &str;
}

/// Whether the operation is waiting for a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    /// Waiting for a free slot.
    Queued,
    /// Doing work.
    Running,
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationState::Queued => f.write_str("Queued"),
            OperationState::Running => f.write_str("Running"),
        }
    }
}

/// Snapshot of one tracked operation.
pub struct Operation<A> {
    /// Registry-unique id.
    pub id: u64,
    /// The owning invocation.
    pub args: Arc<A>,
    /// Queue state.
    pub state: OperationState,
    /// When the operation was registered.
    pub started_at: DateTime<Utc>,
    /// Resident memory of the process at registration, in bytes.
    pub memory_at_start: Option<u64>,
    token: CancellationToken,
}

impl<A> Clone for Operation<A> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            args: self.args.clone(),
            state: self.state,
            started_at: self.started_at,
            memory_at_start: self.memory_at_start,
            token: self.token.clone(),
        }
    }
}

impl<A> Operation<A> {
    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl<A: OperationScope> fmt::Display for Operation<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let elapsed = Utc::now().signed_duration_since(self.started_at);
        write!(
            f,
            "Command: `{}`\nStatus: `{}`\nChannel: <#{}>\nElapsed: `{}s`",
            self.args.command_id(),
            self.state,
            self.args.channel_id(),
            elapsed.num_seconds()
        )
    }
}

struct Registry<A> {
    entries: Vec<Operation<A>>,
    total_started: u64,
}

/// Shared registry of in-flight operations.
pub struct OperationRegistry<A> {
    inner: Arc<Mutex<Registry<A>>>,
    slots: Arc<Semaphore>,
}

impl<A> Clone for OperationRegistry<A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            slots: self.slots.clone(),
        }
    }
}

impl<A: OperationScope> OperationRegistry<A> {
    /// Creates a registry allowing `max_running` operations at once.
    ///
    /// Zero means no limit.
    pub fn new(max_running: usize) -> Self {
        let permits = if max_running == 0 {
            Semaphore::MAX_PERMITS
        } else {
            max_running
        };
        Self {
            inner: Arc::new(Mutex::new(Registry {
                entries: Vec::new(),
                total_started: 0,
            })),
            slots: Arc::new(Semaphore::new(permits)),
        }
    }

    /// Registers an operation and waits for a free slot.
    ///
    /// Returns [`CommandError::Cancelled`] if the operation is cancelled while
    /// queued; the entry is removed in that case.
    pub async fn begin(&self, args: Arc<A>) -> Result<OperationGuard<A>, CommandError> {
        let token = CancellationToken::new();
        let id = {
            let mut registry = self.inner.lock();
            registry.total_started += 1;
            let id = registry.total_started;
            registry.entries.push(Operation {
                id,
                args,
                state: OperationState::Queued,
                started_at: Utc::now(),
                memory_at_start: resident_memory(),
                token: token.clone(),
            });
            id
        };

        let mut guard = OperationGuard {
            registry: self.inner.clone(),
            id,
            token: token.clone(),
            _slot: None,
        };

        let slot = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(CommandError::Cancelled),
            slot = self.slots.clone().acquire_owned() => slot.map_err(|_| CommandError::Cancelled)?,
        };
        guard._slot = Some(slot);

        if let Some(entry) = self.inner.lock().entries.iter_mut().find(|op| op.id == id) {
            entry.state = OperationState::Running;
        }
        tracing::debug!(operation = id, "operation running");
        Ok(guard)
    }

    /// Copies the current list, in registration order.
    pub fn snapshot(&self) -> Vec<Operation<A>> {
        self.inner.lock().entries.clone()
    }

    /// Number of tracked operations.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Whether nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Operations ever registered.
    pub fn total_started(&self) -> u64 {
        self.inner.lock().total_started
    }

    /// Cancels every operation matching `predicate`. Returns how many were newly cancelled.
    pub fn cancel_where(&self, predicate: impl Fn(&A) -> bool) -> usize {
        let registry = self.inner.lock();
        registry
            .entries
            .iter()
            .filter(|op| predicate(&op.args))
            .filter(|op| op.token.cancel())
            .count()
    }

    /// Cancels every operation owned by `guild`.
    pub fn cancel_guild(&self, guild: GuildId) -> usize {
        let cancelled = self.cancel_where(|args| args.guild_id() == guild);
        if cancelled > 0 {
            tracing::info!(%guild, cancelled, "cancelled guild operations");
        }
        cancelled
    }

    /// Finds the operation of `command_id` started from `channel`.
    pub fn find_in_channel(&self, channel: ChannelId, command_id: &str) -> Option<Operation<A>> {
        self.inner
            .lock()
            .entries
            .iter()
            .find(|op| op.args.channel_id() == channel && op.args.command_id() == command_id)
            .cloned()
    }

    /// Finds and cancels the operation of `command_id` started from `channel`.
    pub fn cancel_in_channel(&self, channel: ChannelId, command_id: &str) -> Option<Operation<A>> {
        let registry = self.inner.lock();
        let op = registry
            .entries
            .iter()
            .find(|op| op.args.channel_id() == channel && op.args.command_id() == command_id)?;
        op.token.cancel();
        Some(op.clone())
    }
}

/// Keeps an operation registered. Dropping it removes the entry and frees the slot.
pub struct OperationGuard<A> {
    registry: Arc<Mutex<Registry<A>>>,
    id: u64,
    token: CancellationToken,
    _slot: Option<OwnedSemaphorePermit>,
}

impl<A> OperationGuard<A> {
    /// Registry-unique id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The token the body must observe.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Shorthand for `token().is_cancelled()`.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns [`CommandError::Cancelled`] once cancellation was requested.
    pub fn checkpoint(&self) -> Result<(), CommandError> {
        if self.token.is_cancelled() {
            Err(CommandError::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl<A> Drop for OperationGuard<A> {
    fn drop(&mut self) {
        self.registry.lock().entries.retain(|op| op.id != self.id);
    }
}

/// Resident set size of this process in bytes, where the platform exposes it.
pub fn resident_memory() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    parse_vm_rss(&status)
}

fn parse_vm_rss(status: &str) -> Option<u64> {
    let line = status.lines().find(|line| line.starts_with("VmRSS:"))?;
    let kib: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(kib * 1024)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct Scope {
        guild: GuildId,
        channel: ChannelId,
        command: &'static str,
    }

    impl OperationScope for Scope {
        fn guild_id(&self) -> GuildId {
            self.guild
        }
        fn channel_id(&self) -> ChannelId {
            self.channel
        }
        fn command_id(&self) -> &str {
            self.command
        }
    }

    fn scope(guild: u64, channel: u64, command: &'static str) -> Arc<Scope> {
        Arc::new(Scope {
            guild: GuildId(guild),
            channel: ChannelId(channel),
            command,
        })
    }

    #[tokio::test]
    async fn test_guard_drop_removes_entry() {
        let registry = OperationRegistry::new(2);
        let guard = registry.begin(scope(1, 10, "nuke")).await.unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.snapshot()[0].state, OperationState::Running);

        drop(guard);
        assert!(registry.is_empty());
        assert_eq!(registry.total_started(), 1);
    }

    #[tokio::test]
    async fn test_cancel_guild_leaves_other_guilds_alone() {
        let registry = OperationRegistry::new(0);
        let g = registry.begin(scope(1, 10, "nuke")).await.unwrap();
        let h = registry.begin(scope(2, 20, "nuke")).await.unwrap();

        assert_eq!(registry.cancel_guild(GuildId(1)), 1);
        assert!(g.is_cancelled());
        assert!(!h.is_cancelled());
        assert!(g.checkpoint().is_err());

        // Cancelling again does not count twice.
        assert_eq!(registry.cancel_guild(GuildId(1)), 0);
    }

    #[tokio::test]
    async fn test_cancelled_task_disappears_after_exit() {
        let registry = OperationRegistry::new(0);
        let worker_registry = registry.clone();
        let task = tokio::spawn(async move {
            let op = worker_registry.begin(scope(1, 10, "purge")).await.unwrap();
            op.token().cancelled().await;
        });

        while registry.is_empty() {
            tokio::task::yield_now().await;
        }
        registry.cancel_guild(GuildId(1));
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("task observed cancellation")
            .unwrap();

        assert!(registry.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_queue_limit_and_queued_cancellation() {
        let registry = OperationRegistry::new(1);
        let running = registry.begin(scope(1, 10, "first")).await.unwrap();

        let queued_registry = registry.clone();
        let queued = tokio::spawn(async move {
            queued_registry
                .begin(scope(1, 11, "second"))
                .await
                .map(|guard| guard.id())
        });

        while registry.len() < 2 {
            tokio::task::yield_now().await;
        }
        let states: Vec<_> = registry.snapshot().iter().map(|op| op.state).collect();
        assert_eq!(states, vec![OperationState::Running, OperationState::Queued]);

        let cancelled = registry.cancel_in_channel(ChannelId(11), "second").unwrap();
        assert_eq!(cancelled.args.command_id(), "second");
        assert!(matches!(queued.await.unwrap(), Err(CommandError::Cancelled)));
        assert_eq!(registry.len(), 1);

        drop(running);
        assert!(registry.find_in_channel(ChannelId(10), "first").is_none());
    }

    #[test]
    fn test_vm_rss_is_read_in_kibibytes() {
        let status = "Name:\therald\nVmPeak:\t  9000 kB\nVmRSS:\t  1536 kB\nThreads:\t4\n";
        assert_eq!(parse_vm_rss(status), Some(1536 * 1024));
        assert_eq!(parse_vm_rss("Name:\therald\n"), None);
    }
}

//! Runtime counters.
//!
//! Incremented synchronously at the point an event is seen, before anything
//! is dispatched.

use std::sync::atomic::{AtomicU64, Ordering};

/// Shared runtime counters.
#[derive(Debug, Default)]
pub struct Counters {
    messages_received: AtomicU64,
    commands_executed: AtomicU64,
    disconnects: AtomicU64,
    server_errors: AtomicU64,
}

/// Point-in-time copy of [`Counters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Messages received or edited.
    pub messages_received: u64,
    /// Commands executed.
    pub commands_executed: u64,
    /// Gateway disconnects.
    pub disconnects: u64,
    /// Platform 5xx failures seen by the reporter.
    pub server_errors: u64,
}

impl Counters {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts a received message.
    pub fn message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts an executed command.
    pub fn command_executed(&self) {
        self.commands_executed.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a disconnect.
    pub fn disconnected(&self) {
        self.disconnects.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a platform 5xx failure.
    pub fn server_error(&self) {
        self.server_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Reads all counters.
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            commands_executed: self.commands_executed.load(Ordering::Relaxed),
            disconnects: self.disconnects.load(Ordering::Relaxed),
            server_errors: self.server_errors.load(Ordering::Relaxed),
        }
    }
}

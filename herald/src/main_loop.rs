//! # Main Loop
//!
//! The scheduler task started on the first `Ready`. Each tick:
//!
//! 1. runs the one-time initialization if it has not run yet,
//! 2. waits [`WAITING_DELAY`] while the transport is offline or the grace
//!    period after connecting has not passed,
//! 3. on the first tick past that point, marks the client connected and
//!    ticks again right away,
//! 4. afterwards runs the module update pass and sleeps for
//!    `max(total_shards * 1s, frame interval - time spent)`.
//!
//! Failures inside any step are reported and never end the loop.

use crate::client::Client;
use futures::FutureExt;
use herald_core::HookError;
use herald_std::CancellationToken;
use std::{panic::AssertUnwindSafe, sync::Arc, time::Duration};
use tokio::time::Instant;

/// Pause while waiting for the connection to settle.
pub const WAITING_DELAY: Duration = Duration::from_secs(10);

/// What a tick did after the initialization step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickPhase {
    /// Offline or inside the grace period.
    Waiting,
    /// The connection settled during this tick.
    Connected,
    /// The module update pass ran.
    Updated,
}

/// Outcome of one [`MainLoop::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// The one-time initialization ran during this tick.
    pub initialized: bool,
    /// What happened next.
    pub phase: TickPhase,
    /// Pause before the next tick.
    pub delay: Duration,
}

/// Drives initialization and periodic module updates.
pub struct MainLoop {
    client: Arc<Client>,
}

impl MainLoop {
    /// Creates a loop for `client`.
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    /// Runs until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!("main loop started");
        while !shutdown.is_cancelled() {
            let tick = self.tick().await;
            if tick.delay.is_zero() {
                continue;
            }
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(tick.delay) => {}
            }
        }
        tracing::info!("main loop stopped");
    }

    /// Runs one pass.
    pub async fn tick(&self) -> Tick {
        let started = Instant::now();
        let client = &self.client;
        let initialized = client.initialize().await;
        let config = client.config();

        let settled = client
            .connected_at()
            .is_some_and(|at| at.elapsed() >= config.initial_update_delay());
        if !client.gateway().status().is_online() || !settled {
            return Tick {
                initialized,
                phase: TickPhase::Waiting,
                delay: WAITING_DELAY,
            };
        }

        if !client.is_connected() {
            client.mark_connected().await;
            return Tick {
                initialized,
                phase: TickPhase::Connected,
                delay: Duration::ZERO,
            };
        }

        self.update().await;
        let delay = config
            .minimum_update_pause()
            .max(config.frame_interval().saturating_sub(started.elapsed()));
        Tick {
            initialized,
            phase: TickPhase::Updated,
            delay,
        }
    }

    async fn update(&self) {
        let client = &self.client;
        for module in client.modules().iter().filter(|module| module.do_update()) {
            if !client.gateway().status().is_online() {
                break;
            }

            let context = format!("--ModuleUpdate.{}", module.name());
            match AssertUnwindSafe(module.update(client)).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(error)) => client.reporter().report(&*error, &context, None),
                Err(panic) => {
                    client
                        .reporter()
                        .report(&HookError::from_panic(&*panic), &context, None);
                }
            }
        }
    }
}

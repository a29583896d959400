//! The default failure sink: structured `tracing` events.
//!
//! Filtering rules:
//!
//! - reconnect requests, missed heartbeats and configured noise are dropped
//! - platform 5xx failures are counted
//! - close frames get their code and reason appended
//! - source errors are reported recursively, unless their text matches the
//!   outer error or the outer error is a rate limit or a closed socket

use crate::counters::Counters;
use herald_core::{FailureReporter, GuildId, TransportError};
use std::{error::Error, sync::Arc};

const DEFAULT_NOISE: &[&str] = &["PermissionTarget"];
const DISPATCH_FAILURE: &str = "Error handling Dispatch";

/// Finds the first [`TransportError`] in the source chain.
pub fn find_transport_error<'a>(error: &'a (dyn Error + 'static)) -> Option<&'a TransportError> {
    let mut current = Some(error);
    while let Some(error) = current {
        if let Some(transport) = error.downcast_ref::<TransportError>() {
            return Some(transport);
        }
        current = error.source();
    }
    None
}

/// Reports failures as `tracing` warnings.
pub struct TracingReporter {
    noise: Vec<String>,
    counters: Arc<Counters>,
}

impl TracingReporter {
    /// Creates a reporter counting into `counters`.
    pub fn new(counters: Arc<Counters>) -> Self {
        Self {
            noise: DEFAULT_NOISE.iter().map(|s| s.to_string()).collect(),
            counters,
        }
    }

    /// Adds a substring that marks an error as noise.
    pub fn with_noise(mut self, pattern: impl Into<String>) -> Self {
        self.noise.push(pattern.into());
        self
    }

    fn is_noise(&self, transport: Option<&TransportError>, message: &str) -> bool {
        transport.is_some_and(TransportError::is_transient)
            || self.noise.iter().any(|pattern| message.contains(pattern.as_str()))
    }

    fn report_chain(&self, error: &(dyn Error + 'static), context: &str, guild: Option<GuildId>) {
        let transport = find_transport_error(error);
        let mut message = error.to_string();

        if transport.is_some_and(TransportError::is_server_error)
            || context.contains(DISPATCH_FAILURE)
        {
            self.counters.server_error();
        }

        if let Some(TransportError::Closed { code, reason }) = transport {
            match code {
                Some(code) => message.push_str(&format!("\nCloseCode: {code}")),
                None => message.push_str("\nCloseCode: none"),
            }
            message.push_str(&format!("\nReason: {reason}"));
        }

        if self.is_noise(transport, &message) {
            return;
        }

        match guild {
            Some(guild) => tracing::warn!(%guild, context, "{message}"),
            None => tracing::warn!(context, "{message}"),
        }

        let stop = matches!(
            transport,
            Some(TransportError::RateLimited { .. } | TransportError::Closed { .. })
        ) || message.contains("WebSocket connection was closed");
        if stop {
            return;
        }

        if let Some(source) = error.source() {
            if source.to_string() != error.to_string() {
                self.report_chain(source, &format!("InnerException | {context}"), guild);
            }
        }
    }
}

impl FailureReporter for TracingReporter {
    fn report(&self, error: &(dyn Error + 'static), context: &str, guild: Option<GuildId>) {
        self.report_chain(error, context, guild);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::HeraldError;

    #[test]
    fn test_server_errors_are_counted() {
        let counters = Arc::new(Counters::new());
        let reporter = TracingReporter::new(counters.clone());

        reporter.report(&TransportError::http(503, "Service Unavailable"), "send", None);
        reporter.report(&TransportError::http(403, "Missing Access"), "send", None);
        reporter.report(&TransportError::Other("boom".into()), "Error handling Dispatch", None);

        assert_eq!(counters.snapshot().server_errors, 2);
    }

    #[test]
    fn test_transport_error_found_through_wrapper() {
        let wrapped = HeraldError::from(TransportError::HeartbeatMissed);
        let found = find_transport_error(&wrapped).unwrap();
        assert!(found.is_transient());

        let reporter = TracingReporter::new(Arc::new(Counters::new()));
        assert!(reporter.is_noise(Some(found), &wrapped.to_string()));
        assert!(reporter.is_noise(None, "Unknown PermissionTarget type"));
        assert!(!reporter.is_noise(None, "real failure"));
    }
}

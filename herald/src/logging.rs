//! Tracing bootstrap.

use herald_core::BoxError;
use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber.
///
/// `RUST_LOG` wins when set. Otherwise the level is `warn`, or `debug` when
/// `debug` is true. Fails if a subscriber is already installed.
pub fn init_tracing(debug: bool) -> Result<(), BoxError> {
    let default_level = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(debug)
        .try_init()
}

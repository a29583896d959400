//! # herald-std
//!
//! Standard engines for the Herald chat bot runtime.
//!
//! - [`EventBus`]: typed fan-out of the raw gateway stream
//! - [`parser`]: command tokenizer
//! - [`PermissionResolver`]: layered permission checks
//! - [`OperationRegistry`]: tracked, cancellable long-running work
//! - [`TracingReporter`]: default failure sink
//! - [`testing`]: mock collaborators for tests

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod bus;
mod cancel;
mod counters;
mod operations;
pub mod parser;
mod permissions;
mod reporting;
pub mod testing;

pub use bus::{EventBus, GuildDirectory, Subscription};
pub use cancel::CancellationToken;
pub use counters::{CounterSnapshot, Counters};
pub use operations::{
    Operation, OperationGuard, OperationRegistry, OperationScope, OperationState, resident_memory,
};
pub use parser::{ParsedCommand, parse};
pub use permissions::{Caller, CommandPolicy, Decision, DenyReason, PermissionResolver, RoleTiers};
pub use reporting::{TracingReporter, find_transport_error};

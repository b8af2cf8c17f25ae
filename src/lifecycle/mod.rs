//! # System Lifecycle & Orchestration
//!
//! Starting, wiring and stopping the dispatch core.
//!
//! - [`config`]: the TOML startup configuration ([`DispatchConfig`])
//! - [`DispatchSystem`]: spawns one actor per courier, wires graph, estimator, classifier,
//!   assigner and manifest sink, and exposes the operations collaborators call
//! - [`setup_tracing`]: structured logging for the binary
//!
//! ## Graceful Shutdown
//!
//! 1. **Cancel routing** - in-flight searches return their fail-soft plan
//! 2. **Drop all clients** - closes the sender side of every courier channel
//! 3. **Actors detect closure** - `receiver.recv()` returns `None` and the loop ends
//! 4. **Await completion** - a panicked actor is reported as an error
//!
//! Courier state is in memory only; it does not survive a restart.

pub mod config;
pub mod dispatch_system;
pub mod tracing;

pub use config::*;
pub use dispatch_system::*;
pub use tracing::*;

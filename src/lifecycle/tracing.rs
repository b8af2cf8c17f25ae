//! # Observability & Tracing
//!
//! The [`setup_tracing`] function initializes structured logging with the `tracing` crate.
//!
//! ## Configuration
//!
//! Log lines use the compact format without the module prefix (`with_target(false)`);
//! the structured fields (`courier`, `customer`, `entity_type`, `size`, …) carry the
//! context instead.
//!
//! - **Configurable log levels** via the `RUST_LOG` environment variable
//! - **Hierarchical spans**: client calls are `#[instrument]`ed, so actor logs appear
//!   nested under the request that caused them
//!
//! ```bash
//! RUST_LOG=info dispatchd dispatch.toml            # placements, flushes, deliveries
//! RUST_LOG=debug dispatchd dispatch.toml           # every actor message with its payload
//! RUST_LOG=courier_dispatch::routing=trace dispatchd dispatch.toml   # search internals
//! ```
//!
//! ## Workflow Trace Example
//!
//! **With `RUST_LOG=info`**, a placement that fills a batch of two:
//!
//! ```text
//! INFO place_order: Order assigned customer="099 222" outcome=Batched { courier: CourierId("ana"), full: true }
//! INFO Manifest dispatched courier=ana stops=2 distance_km=3.1
//! INFO flush: Batch flushed courier=ana sent=2 size=0
//! ```
//!
//! Speed tags that could not be parsed are reported at `trace` only.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false) // Don't show module paths - fields carry the context
        .compact()
        .init();
}

//! # Courier Dispatch
//!
//! The routing and batch-assignment core of a food-delivery service. Orders arrive from a
//! conversational front end, get a road route and ETA from the store, a quadrant around
//! the store, and a courier. Couriers collect orders in fixed-capacity batches; a full
//! batch is sent out as a manifest and then flushed.
//!
//! ## Module Tour
//!
//! ### 1. Streets ([`graph`], [`routing`])
//! A directed, weighted street graph loaded once at startup and shared behind an `Arc`.
//! - **Role**: nearest-node snapping and fastest-path search (A* or Dijkstra) with a
//!   deadline, which fails soft into a tagged [`RoutePlan`](model::RoutePlan).
//! - **Key items**: [`StreetGraph`](graph::StreetGraph), [`RouteEstimator`](routing::RouteEstimator).
//!
//! ### 2. Couriers ([`courier_actor`], [`clients`], [`assignment`])
//! One actor per courier owns that courier's batch, overflow queue and delivery history,
//! so every courier has exactly one writer.
//! - **Role**: batching with overflow, flush/refill, delivery tracking, ratings, and
//!   picking a courier for each order.
//! - **Key items**: [`CourierClient`](clients::CourierClient),
//!   [`CourierAssigner`](assignment::CourierAssigner),
//!   [`CourierPicker`](assignment::CourierPicker).
//!
//! ### 3. The Orchestrator ([`lifecycle`])
//! - **Role**: configuration, tracing, and [`DispatchSystem`](lifecycle::DispatchSystem),
//!   which wires everything and runs the placement pipeline.
//!
//! ### 4. Supporting pieces
//! [`zone`] (store-relative quadrants), [`manifest`] (what a courier receives),
//! [`model`] (plain data), [`invariant`] (strict vs lenient violation handling).
//!
//! ## Running
//!
//! ```bash
//! RUST_LOG=info DISPATCH_CONFIG=dispatch.toml cargo run --bin dispatchd < drafts.jsonl
//! ```

pub mod assignment;
pub mod clients;
pub mod courier_actor;
pub mod error;
pub mod graph;
pub mod invariant;
pub mod lifecycle;
pub mod manifest;
pub mod model;
pub mod routing;
pub mod zone;

pub use error::DispatchError;

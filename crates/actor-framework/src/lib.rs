//! # Actor Framework
//!
//! Building blocks for type-safe, concurrent actor systems on Tokio. Each actor owns a set
//! of long-lived records (couriers, vehicles, depots, …) and processes requests for them
//! one at a time, which gives every record a single writer without any locking.
//!
//! ## Architecture Overview
//!
//! The framework separates concerns into three layers:
//!
//! 1. **Entity Layer** ([`ActorEntity`]) - Your business logic and domain models
//! 2. **Runtime Layer** ([`ResourceActor`]) - Message processing and concurrency
//! 3. **Interface Layer** ([`ResourceClient`]) - Type-safe communication
//!
//! You write the business rules once in the entity trait; the framework handles the
//! message passing, error mapping and state ownership.
//!
//! ## Example
//!
//! ```rust
//! use actor_framework::{ActorEntity, ResourceActor};
//! use async_trait::async_trait;
//!
//! #[derive(Clone, Debug)]
//! struct Locker {
//!     id: String,
//!     parcels: Vec<String>,
//! }
//!
//! #[derive(Debug)] struct LockerCreate { code: String }
//! #[derive(Debug)] struct LockerUpdate;
//! #[derive(Debug)] enum LockerAction { Drop(String) }
//! #[derive(Debug, thiserror::Error)] #[error("locker error")] struct LockerError;
//!
//! #[async_trait]
//! impl ActorEntity for Locker {
//!     type Id = String;
//!     type Create = LockerCreate;
//!     type Update = LockerUpdate;
//!     type Action = LockerAction;
//!     type ActionResult = usize;
//!     type Context = ();
//!     type Error = LockerError;
//!
//!     fn from_create_params(id: String, _: LockerCreate) -> Result<Self, Self::Error> {
//!         Ok(Self { id, parcels: Vec::new() })
//!     }
//!
//!     async fn on_update(&mut self, _: LockerUpdate, _: &()) -> Result<(), Self::Error> {
//!         Ok(())
//!     }
//!
//!     async fn handle_action(&mut self, action: LockerAction, _: &()) -> Result<usize, Self::Error> {
//!         match action {
//!             LockerAction::Drop(parcel) => {
//!                 self.parcels.push(parcel);
//!                 Ok(self.parcels.len())
//!             }
//!         }
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     // Ids come from the creation payload here; a counter works just as well.
//!     let (actor, client) = ResourceActor::<Locker>::new(10, |params| params.code.clone());
//!     tokio::spawn(actor.run(()));
//!
//!     let id = client.create(LockerCreate { code: "L-1".into() }).await.unwrap();
//!     let held = client.perform_action(id.clone(), LockerAction::Drop("p-9".into())).await.unwrap();
//!     assert_eq!(held, 1);
//!     assert_eq!(client.list().await.unwrap(), vec![id]);
//! }
//! ```
//!
//! ## Context Injection Pattern
//!
//! Dependencies are injected at **runtime** via the `run()` method, not at construction
//! time. Actors can be created first and wired to each other's clients afterwards.
//!
//! ## Concurrency Model
//!
//! - Each actor runs in its own Tokio task
//! - Messages are processed **sequentially** within an actor
//! - Multiple actors run in **parallel**
//! - Dropping every client closes the channel and ends the actor's loop
//!
//! ## Testing
//!
//! [`mock::MockClient`] answers requests from queued expectations so client wrappers can be
//! tested without a running actor.

pub mod actor;
pub mod client;
pub mod client_trait;
pub mod entity;
pub mod error;
pub mod message;
pub mod mock;

// Re-export core types for convenience
pub use actor::ResourceActor;
pub use client::ResourceClient;
pub use client_trait::ActorClient;
pub use entity::ActorEntity;
pub use error::FrameworkError;
pub use message::{ResourceRequest, Response};

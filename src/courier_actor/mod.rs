//! # Courier Actor
//!
//! One [`ResourceActor`] per courier owns that courier's batch, overflow queue, in-transit
//! list and delivered history. Every mutation is a message to that actor, which makes the
//! actor the single writer for the courier while distinct couriers proceed in parallel.
//!
//! ## Structure
//!
//! - [`entity`] - [`ActorEntity`](actor_framework::ActorEntity) implementation for [`Courier`]
//! - [`error`] - [`CourierError`] type for type-safe error handling
//! - [`actions`] - [`CourierAction`] and [`CourierActionResult`]
//! - [`new()`] - Factory function that creates the actor and client
//!
//! ## Usage
//!
//! ```rust
//! use courier_dispatch::clients::CourierClient;
//! use courier_dispatch::courier_actor::{self, CourierContext};
//! use courier_dispatch::model::{CourierCreate, LineItem, OrderDraft, Placement};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (actor, generic_client) = courier_actor::new(16);
//!     let client = CourierClient::new(generic_client);
//!     tokio::spawn(actor.run(CourierContext { strict_invariants: false }));
//!
//!     let id = client
//!         .register(CourierCreate {
//!             id: "ana".into(),
//!             name: "Ana".into(),
//!             contact: "+598 91 000 001".into(),
//!             capacity: 1,
//!         })
//!         .await?;
//!
//!     let order = OrderDraft::new("099 123 456", vec![LineItem::new("p-1", "Pizza", 520, 1)])
//!         .with_address("Uruguay 1000")
//!         .validate()?;
//!     assert_eq!(client.assign(&id, order).await?, Placement::Batched { full: true });
//!     assert_eq!(client.flush(&id).await?.len(), 1);
//!     Ok(())
//! }
//! ```

pub mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;

use crate::model::{Courier, CourierCreate};
use actor_framework::{ResourceActor, ResourceClient};

/// Runtime settings injected into every courier actor.
#[derive(Debug, Clone, Copy)]
pub struct CourierContext {
    /// Panic on invariant violations instead of logging them.
    pub strict_invariants: bool,
}

/// Creates a new Courier actor and its client. Couriers keep their configured ids.
pub fn new(buffer_size: usize) -> (ResourceActor<Courier>, ResourceClient<Courier>) {
    ResourceActor::new(buffer_size, |params: &CourierCreate| params.id.clone())
}

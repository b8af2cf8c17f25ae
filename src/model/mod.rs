//! Pure data structures shared by the routing, zoning and assignment layers.
//!
//! [`Courier`] implements the [`ActorEntity`](actor_framework::ActorEntity) trait (see
//! [`courier_actor`](crate::courier_actor)); everything else here is plain data.

pub mod coordinate;
pub mod courier;
pub mod order;
pub mod route;

pub use coordinate::*;
pub use courier::*;
pub use order::*;
pub use route::*;

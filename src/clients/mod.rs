//! Type-safe wrappers around [`ResourceClient`](actor_framework::ResourceClient).

pub mod courier_client;

pub use courier_client::*;

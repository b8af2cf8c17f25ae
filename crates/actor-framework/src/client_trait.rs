//! # ActorClient Trait
//!
//! Common interface for resource-specific clients, adding default `get` and `ids`
//! methods on top of a generic `ResourceClient`.
use crate::{ActorEntity, FrameworkError, ResourceClient};
use async_trait::async_trait;

/// Trait for resource-specific clients to inherit the standard read operations.
///
/// # Example
///
/// ```rust
/// use actor_framework::{ActorClient, ActorEntity, FrameworkError, ResourceClient};
/// use async_trait::async_trait;
///
/// #[derive(Clone, Debug)] struct Depot { id: u32 }
/// #[derive(Debug)] struct DepotCreate;
/// #[derive(Debug)] struct DepotUpdate;
/// #[derive(Debug)] enum DepotAction {}
/// #[derive(Debug, thiserror::Error)] #[error("{0}")] struct DepotError(String);
///
/// impl From<String> for DepotError {
///     fn from(s: String) -> Self { DepotError(s) }
/// }
///
/// #[async_trait]
/// impl ActorEntity for Depot {
///     type Id = u32;
///     type Create = DepotCreate;
///     type Update = DepotUpdate;
///     type Action = DepotAction;
///     type ActionResult = ();
///     type Context = ();
///     type Error = DepotError;
///
///     fn from_create_params(id: u32, _: DepotCreate) -> Result<Self, Self::Error> { Ok(Self { id }) }
///     async fn on_update(&mut self, _: DepotUpdate, _: &()) -> Result<(), Self::Error> { Ok(()) }
///     async fn handle_action(&mut self, _: DepotAction, _: &()) -> Result<(), Self::Error> { Ok(()) }
/// }
///
/// struct DepotClient {
///     inner: ResourceClient<Depot>,
/// }
///
/// #[async_trait]
/// impl ActorClient<Depot> for DepotClient {
///     type Error = DepotError;
///
///     fn inner(&self) -> &ResourceClient<Depot> {
///         &self.inner
///     }
///
///     fn map_error(e: FrameworkError) -> Self::Error {
///         DepotError(e.to_string())
///     }
/// }
///
/// async fn usage(client: DepotClient) {
///     // get() and ids() are provided automatically
///     let _ = client.get(1).await;
///     let _ = client.ids().await;
/// }
/// ```
#[async_trait]
pub trait ActorClient<T: ActorEntity>: Send + Sync {
    /// The resource-specific error type.
    type Error: From<String> + Send + Sync;

    /// Access the inner generic ResourceClient.
    fn inner(&self) -> &ResourceClient<T>;

    /// Map framework errors to the specific resource error type.
    fn map_error(e: FrameworkError) -> Self::Error;

    /// Fetch an entity by ID.
    #[tracing::instrument(skip(self))]
    async fn get(&self, id: T::Id) -> Result<Option<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().get(id).await.map_err(Self::map_error)
    }

    /// Ids of every entity held by the actor, in creation order.
    #[tracing::instrument(skip(self))]
    async fn ids(&self) -> Result<Vec<T::Id>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().list().await.map_err(Self::map_error)
    }
}

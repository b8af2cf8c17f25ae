use actor_framework::{ActorEntity, FrameworkError, ResourceActor};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

// --- Test Entity ---

#[derive(Clone, Debug, PartialEq)]
struct Van {
    id: u32,
    plate: String,
    odometer_km: u32,
}

#[derive(Debug)]
struct VanCreate {
    plate: String,
}

#[derive(Debug)]
struct VanUpdate {
    plate: Option<String>,
}

#[derive(Debug)]
enum VanAction {
    Drive(u32),
    Service,
}

#[derive(Debug, thiserror::Error)]
#[error("odometer overflow")]
struct VanError;

#[async_trait]
impl ActorEntity for Van {
    type Id = u32;
    type Create = VanCreate;
    type Update = VanUpdate;
    type Action = VanAction;
    type ActionResult = u32;
    type Context = ();
    type Error = VanError;

    fn from_create_params(id: u32, params: VanCreate) -> Result<Self, Self::Error> {
        Ok(Self {
            id,
            plate: params.plate,
            odometer_km: 0,
        })
    }

    async fn on_update(&mut self, update: VanUpdate, _ctx: &()) -> Result<(), Self::Error> {
        if let Some(plate) = update.plate {
            self.plate = plate;
        }
        Ok(())
    }

    async fn handle_action(&mut self, action: VanAction, _ctx: &()) -> Result<u32, Self::Error> {
        match action {
            VanAction::Drive(km) => {
                self.odometer_km = self.odometer_km.checked_add(km).ok_or(VanError)?;
                Ok(self.odometer_km)
            }
            VanAction::Service => Ok(self.odometer_km),
        }
    }
}

fn counter() -> impl Fn(&VanCreate) -> u32 + Send + Sync + 'static {
    let next = Arc::new(AtomicU32::new(1));
    move |_| next.fetch_add(1, Ordering::SeqCst)
}

// --- Tests ---

#[tokio::test]
async fn test_framework_full_lifecycle() {
    let (actor, client) = ResourceActor::new(10, counter());
    tokio::spawn(actor.run(()));

    let id: u32 = client
        .create(VanCreate {
            plate: "SAL-1001".into(),
        })
        .await
        .unwrap();
    assert_eq!(id, 1);

    let km = client.perform_action(id, VanAction::Drive(12)).await.unwrap();
    assert_eq!(km, 12);
    let km = client.perform_action(id, VanAction::Drive(3)).await.unwrap();
    assert_eq!(km, 15);

    let updated = client
        .update(
            id,
            VanUpdate {
                plate: Some("SAL-2002".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.plate, "SAL-2002");
    assert_eq!(updated.odometer_km, 15);

    let fetched: Van = client.get(id).await.unwrap().unwrap();
    assert_eq!(fetched, updated);
}

#[tokio::test]
async fn test_entity_error_is_wrapped() {
    let (actor, client) = ResourceActor::new(10, counter());
    tokio::spawn(actor.run(()));

    let id = client
        .create(VanCreate {
            plate: "SAL-1".into(),
        })
        .await
        .unwrap();
    client
        .perform_action(id, VanAction::Drive(u32::MAX))
        .await
        .unwrap();

    let err = client
        .perform_action(id, VanAction::Drive(1))
        .await
        .unwrap_err();
    assert!(matches!(err, FrameworkError::EntityError(_)));

    // State is untouched by the failed action.
    let km = client.perform_action(id, VanAction::Service).await.unwrap();
    assert_eq!(km, u32::MAX);
}

#[tokio::test]
async fn test_ids_from_payload_reject_duplicates() {
    let (actor, client) = ResourceActor::<Van>::new(10, |params: &VanCreate| {
        params.plate.len() as u32
    });
    tokio::spawn(actor.run(()));

    let first = client
        .create(VanCreate {
            plate: "ABC".into(),
        })
        .await
        .unwrap();
    assert_eq!(first, 3);

    let clash = client
        .create(VanCreate {
            plate: "XYZ".into(),
        })
        .await;
    assert!(matches!(clash, Err(FrameworkError::AlreadyExists(id)) if id == "3"));

    let second = client
        .create(VanCreate {
            plate: "LONG".into(),
        })
        .await
        .unwrap();
    assert_eq!(client.list().await.unwrap(), vec![first, second]);
}

#[tokio::test]
async fn test_unknown_id_is_not_found() {
    let (actor, client) = ResourceActor::new(10, counter());
    tokio::spawn(actor.run(()));

    assert!(client.get(42).await.unwrap().is_none());
    let err = client
        .perform_action(42, VanAction::Service)
        .await
        .unwrap_err();
    assert!(matches!(err, FrameworkError::NotFound(id) if id == "42"));
}

#[tokio::test]
async fn test_actor_stops_when_clients_drop() {
    let (actor, client) = ResourceActor::new(10, counter());
    let handle = tokio::spawn(actor.run(()));

    client
        .create(VanCreate {
            plate: "SAL-9".into(),
        })
        .await
        .unwrap();
    drop(client);

    handle.await.expect("actor task should finish cleanly");
}

//! Socket-level tests: a real client talking to a ticking server.

use std::time::Duration;

use scene_client::{CommandClient, Reply};
use scene_server::ServerState;
use scene_shared::{
    config::ServerConfig,
    host::{CollisionEnabled, SceneHost},
    math::Vec3,
    protocol::{LocationData, ObjectId, ObjectPayload, ScaleData},
};
use scene_tests::{init_tracing, local_config, start_server};

/// Create, update, then delete an unknown id over one connection.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn create_update_and_unknown_delete() -> anyhow::Result<()> {
    init_tracing();
    let running = start_server(local_config()).await?;
    let mut client = CommandClient::connect(running.addr).await?;

    let reply = client
        .send_raw(br#"{"location":{"x":50,"y":50,"z":50}}"#)
        .await?;
    assert_eq!(reply, "0");

    let reply = client
        .update(
            ObjectId::from("0"),
            ObjectPayload {
                scale: Some(ScaleData {
                    x: 2.0,
                    y: 2.0,
                    z: 2.0,
                }),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(reply, Reply::Ok(ObjectId::from("0")));

    let reply = client.delete(ObjectId::from("7")).await?;
    assert_eq!(reply, Reply::Invalid("Object not found".to_string()));

    let server = running.stop().await?;
    let d = server.dispatcher();
    assert_eq!(d.registry().len(), 1);
    let handle = d.registry().find("0").expect("object 0 registered");
    let t = d.host().transform(handle).expect("transform");
    assert_eq!(t.location, Vec3::new(50.0, 50.0, 50.0));
    assert_eq!(t.scale, Vec3::new(2.0, 2.0, 2.0));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn full_object_lifecycle() -> anyhow::Result<()> {
    init_tracing();
    let running = start_server(local_config()).await?;
    let mut client = CommandClient::connect(running.addr).await?;

    let reply = client
        .send_raw(
            br#"{
                "action": "add_object",
                "location": {"x": -10, "y": 600, "z": 250},
                "mesh_path": "StaticMesh'/Game/StarterContent/Shapes/Shape_Cube.Shape_Cube'",
                "material_path": "/Game/StarterContent/Materials/M_Metal_Steel.M_Metal_Steel",
                "physics": true
            }"#,
        )
        .await?;
    assert_eq!(reply, "0");

    let second = client
        .create(ObjectPayload {
            location: Some(LocationData {
                x: 1.0,
                y: 1.0,
                z: 1.0,
            }),
            ..Default::default()
        })
        .await?;
    assert_eq!(second, Reply::Ok(ObjectId::from("1")));

    let deleted = client.delete(ObjectId::from("1")).await?;
    assert_eq!(deleted, Reply::Ok(ObjectId::from("1")));

    let server = running.stop().await?;
    let d = server.dispatcher();
    assert_eq!(d.registry().len(), 1);
    assert!(d.registry().find("1").is_none());
    assert_eq!(d.host().stats().destroyed, 1);

    let handle = d.registry().find("0").expect("object 0 registered");
    assert!(d.host().is_alive(handle));
    let t = d.host().transform(handle).expect("transform");
    assert_eq!(t.location, Vec3::new(0.0, 500.0, 250.0));
    let mesh = d.host().mesh_component(handle).expect("mesh component");
    assert!(mesh.mesh.is_some());
    assert!(mesh.material(0).is_some());
    assert!(mesh.physics.simulate);
    assert_eq!(mesh.physics.collision, CollisionEnabled::QUERY_AND_PHYSICS);
    assert_eq!(mesh.physics.profile, "BlockAll");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn malformed_message_does_not_kill_connection() -> anyhow::Result<()> {
    init_tracing();
    let running = start_server(local_config()).await?;
    let mut client = CommandClient::connect(running.addr).await?;

    let reply = client.send_raw(b"this is not json").await?;
    assert!(reply.starts_with("Invalid: Malformed JSON"), "{reply}");

    let reply = client.send_raw(br#"{"action":"delete_object"}"#).await?;
    assert_eq!(reply, "Invalid: No object_id provided");

    let reply = client.create(ObjectPayload::default()).await?;
    assert_eq!(reply, Reply::Ok(ObjectId::from("0")));

    let server = running.stop().await?;
    assert_eq!(server.dispatcher().registry().len(), 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn new_client_replaces_previous_one() -> anyhow::Result<()> {
    init_tracing();
    let running = start_server(local_config()).await?;

    let mut first = CommandClient::connect(running.addr).await?;
    assert_eq!(first.create(ObjectPayload::default()).await?, Reply::Ok(ObjectId::from("0")));

    let mut second = CommandClient::connect(running.addr)
        .await?
        .with_reply_timeout(Duration::from_secs(5));
    assert_eq!(second.create(ObjectPayload::default()).await?, Reply::Ok(ObjectId::from("1")));

    // The server dropped the first socket when it accepted the second.
    let stale = first
        .with_reply_timeout(Duration::from_millis(500))
        .create(ObjectPayload::default())
        .await;
    assert!(stale.is_err(), "replaced client still got a reply: {stale:?}");

    let server = running.stop().await?;
    assert_eq!(server.state(), ServerState::Connected);
    assert_eq!(server.dispatcher().registry().len(), 2);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn disconnect_returns_server_to_listening() -> anyhow::Result<()> {
    init_tracing();
    let running = start_server(local_config()).await?;

    let mut client = CommandClient::connect(running.addr).await?;
    client.create(ObjectPayload::default()).await?;
    drop(client);

    tokio::time::sleep(Duration::from_millis(100)).await;
    let server = running.stop().await?;
    assert_eq!(server.state(), ServerState::Listening);
    assert!(server.peer().is_none());
    assert_eq!(server.dispatcher().registry().len(), 1);

    let host = server.shutdown();
    assert_eq!(host.entity_count(), 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn many_creates_get_distinct_ids() -> anyhow::Result<()> {
    init_tracing();
    let running = start_server(local_config()).await?;
    let mut client = CommandClient::connect(running.addr).await?;

    let mut ids = Vec::new();
    for _ in 0..10 {
        match client.create(ObjectPayload::default()).await? {
            Reply::Ok(id) => ids.push(id),
            other => panic!("unexpected reply {other:?}"),
        }
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 10);

    let server = running.stop().await?;
    assert_eq!(server.dispatcher().registry().len(), 10);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn spawn_failure_is_reported_and_server_keeps_running() -> anyhow::Result<()> {
    init_tracing();
    let cfg = ServerConfig {
        max_entities: Some(1),
        ..local_config()
    };
    let running = start_server(cfg).await?;
    let mut client = CommandClient::connect(running.addr).await?;

    assert_eq!(client.create(ObjectPayload::default()).await?, Reply::Ok(ObjectId::from("0")));
    assert_eq!(
        client.create(ObjectPayload::default()).await?,
        Reply::Error("Unable to create object".to_string())
    );
    assert_eq!(
        client.update(ObjectId::from("0"), ObjectPayload::default()).await?,
        Reply::Ok(ObjectId::from("0"))
    );

    let server = running.stop().await?;
    assert_eq!(server.dispatcher().registry().len(), 1);
    Ok(())
}

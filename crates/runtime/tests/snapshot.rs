use std::sync::Arc;

use combat_core::{Entity, EntityKind};
use runtime::{
    FileSnapshotRepository, InMemorySnapshotRepository, Runtime, RuntimeConfig, RuntimeError,
    SnapshotRepository,
};

#[tokio::test]
async fn mid_battle_snapshot_round_trips_through_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = RuntimeConfig {
        seed: 99,
        snapshot_dir: Some(dir.path().to_path_buf()),
        ..RuntimeConfig::default()
    };
    let runtime = Runtime::builder()
        .config(config)
        .build()
        .await
        .expect("runtime should start");
    let handle = runtime.handle();

    let room = handle.add_room("pit").await.expect("room");
    let ann = handle
        .spawn(Entity::new("Ann", EntityKind::Character), room)
        .await
        .expect("spawn");
    let rat = handle
        .spawn(Entity::new("Rat", EntityKind::Npc), room)
        .await
        .expect("spawn");
    handle.attack(ann, rat).await.expect("attack");

    // ================================================================
    // Save mid-turn, let time run on, then restore
    // ================================================================
    let info = handle.save_snapshot("mid").await.expect("save");
    let saved = handle.query_world().await.expect("query");
    assert_eq!(info.clock, saved.clock);
    assert_eq!(info.battles, 1);

    handle.advance(20).await.expect("advance");
    assert_ne!(handle.query_world().await.expect("query").clock, saved.clock);

    handle.load_snapshot("mid").await.expect("load");
    let restored = handle.query_world().await.expect("query");
    assert_eq!(restored.clock, saved.clock);
    assert_eq!(restored.battles, saved.battles);
    assert_eq!(restored.entities, saved.entities);
    assert_eq!(restored.timers, saved.timers);

    // The file on disk is self-describing and exportable.
    let repo = FileSnapshotRepository::new(dir.path()).expect("repo");
    assert_eq!(repo.list().expect("list"), vec!["mid".to_string()]);
    let json_path = dir.path().join("mid.json");
    assert!(repo.export_json("mid", &json_path).expect("export"));
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(json_path).expect("read")).expect("json");
    assert_eq!(json["seed"], 99);

    let error = handle.load_snapshot("nope").await.expect_err("missing");
    assert!(matches!(error, RuntimeError::SnapshotNotFound(_)));

    drop(handle);
    runtime.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn snapshots_need_a_repository() {
    let runtime = Runtime::builder().build().await.expect("runtime");
    let handle = runtime.handle();

    let error = handle.save_snapshot("x").await.expect_err("no repository");
    assert!(matches!(error, RuntimeError::NoRepository));

    drop(handle);
    runtime.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn in_memory_repository_can_seed_a_new_runtime() {
    let repo = Arc::new(InMemorySnapshotRepository::new());
    let first = Runtime::builder()
        .repository(repo.clone())
        .build()
        .await
        .expect("runtime");
    let handle = first.handle();
    let room = handle.add_room("hall").await.expect("room");
    handle
        .spawn(Entity::new("Ann", EntityKind::Character), room)
        .await
        .expect("spawn");
    handle.save_snapshot("hall").await.expect("save");
    drop(handle);
    first.shutdown().await.expect("shutdown");

    let world = repo.load("hall").expect("load").expect("present");
    let second = Runtime::builder().world(world).build().await.expect("runtime");
    let restored = second.handle().query_world().await.expect("query");
    assert_eq!(restored.entities.len(), 1);

    second.shutdown().await.expect("shutdown");
}

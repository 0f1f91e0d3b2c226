//! Contract Test: Idempotency
//!
//! Reconciling a resource that already matches the requested state must not
//! send a single mutating call.
//!
//! Constraints verified:
//! - `absent` on a missing resource is a no-op for every kind
//! - `present` on an existing resource never creates a duplicate
//! - `update` only sends what differs from the current snapshot
//! - Attaching to where a resource is already attached is skipped
//! - The access password is the one field that is always sent, since it
//!   cannot be read back
//!
//! If this test fails, repeated runs would churn remote state.

mod common;

use common::*;
use onectl_core::model::{AttachedServer, Rights, ServerAccess};
use onectl_core::{
    Action, BlockStorageParams, DesiredState, Reconciler, SharedStorageParams, SshKeyParams,
};

#[tokio::test]
async fn absent_on_missing_resource_is_noop_for_every_kind() {
    let cloud = MockCloud::new();
    let reconciler = Reconciler::new(&cloud, false);

    let outcome = reconciler
        .reconcile_block_storage(&BlockStorageParams {
            state: DesiredState::Absent,
            name: Some("ghost".to_string()),
            wait: no_wait(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(!outcome.changed);
    assert!(outcome.resource.is_none());

    let outcome = reconciler
        .reconcile_shared_storage(&SharedStorageParams {
            state: DesiredState::Absent,
            name: Some("ghost".to_string()),
            wait: no_wait(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(!outcome.changed);

    let outcome = reconciler
        .reconcile_ssh_key(&SshKeyParams {
            state: DesiredState::Absent,
            name: Some("ghost".to_string()),
            wait: no_wait(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(!outcome.changed);

    assert!(
        cloud.mutations().is_empty(),
        "Expected no mutating calls, got {:?}",
        cloud.mutations()
    );
}

#[tokio::test]
async fn present_on_existing_resource_does_not_create() {
    let cloud = MockCloud::new();
    cloud.seed_block_storage(block_storage("BS-A", "data", 40));
    cloud.seed_shared_storage(shared_storage("SS-A", "shared", 50));
    cloud.seed_ssh_key(ssh_key("K-A", "deploy"));
    let reconciler = Reconciler::new(&cloud, false);

    let outcome = reconciler
        .reconcile_block_storage(&BlockStorageParams {
            state: DesiredState::Present,
            name: Some("data".to_string()),
            size: Some(40),
            wait: no_wait(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(!outcome.changed);
    assert_eq!(outcome.resource.unwrap().id, "BS-A");

    let outcome = reconciler
        .reconcile_shared_storage(&SharedStorageParams {
            state: DesiredState::Present,
            name: Some("shared".to_string()),
            size: Some(100),
            wait: no_wait(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(!outcome.changed, "present must not resize an existing storage");

    let outcome = reconciler
        .reconcile_ssh_key(&SshKeyParams {
            state: DesiredState::Present,
            name: Some("deploy".to_string()),
            wait: no_wait(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(!outcome.changed);

    assert!(cloud.mutations().is_empty());
    assert_eq!(cloud.block_storages().len(), 1);
    assert_eq!(cloud.ssh_keys().len(), 1);
}

#[tokio::test]
async fn second_present_run_is_noop() {
    let cloud = MockCloud::new();
    let reconciler = Reconciler::new(&cloud, false);
    let params = SshKeyParams {
        state: DesiredState::Present,
        name: Some("deploy".to_string()),
        wait: no_wait(),
        ..Default::default()
    };

    let first = reconciler.reconcile_ssh_key(&params).await.unwrap();
    let second = reconciler.reconcile_ssh_key(&params).await.unwrap();

    assert!(first.changed);
    assert!(!second.changed);
    assert_eq!(cloud.call_count("create_ssh_key"), 1);
    assert_eq!(first.resource.unwrap().id, second.resource.unwrap().id);
}

#[tokio::test]
async fn update_with_current_values_is_noop() {
    let cloud = MockCloud::new();
    let mut storage = block_storage("BS-A", "data", 40);
    storage.description = Some("logs".to_string());
    cloud.seed_block_storage(storage);
    let reconciler = Reconciler::new(&cloud, false);

    let outcome = reconciler
        .reconcile_block_storage(&BlockStorageParams {
            state: DesiredState::Update,
            block_storage: Some("data".to_string()),
            name: Some("data".to_string()),
            description: Some("logs".to_string()),
            wait: no_wait(),
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(!outcome.changed);
    assert!(outcome.actions.is_empty());
    assert!(cloud.mutations().is_empty());
}

#[tokio::test]
async fn update_sends_only_changed_fields() {
    let cloud = MockCloud::new();
    cloud.seed_shared_storage(shared_storage("SS-A", "shared", 50));
    let reconciler = Reconciler::new(&cloud, false);

    let outcome = reconciler
        .reconcile_shared_storage(&SharedStorageParams {
            state: DesiredState::Update,
            shared_storage: Some("SS-A".to_string()),
            name: Some("shared".to_string()),
            size: Some(100),
            wait: no_wait(),
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(outcome.changed);
    assert_eq!(cloud.mutations(), vec!["modify_shared_storage"]);
    let storage = outcome.resource.unwrap();
    assert_eq!(storage.size, Some(100));
    assert_eq!(storage.name, "shared");
}

#[tokio::test]
async fn attach_to_current_server_is_skipped() {
    let cloud = MockCloud::new();
    cloud.seed_server("S1", "web");
    let mut storage = block_storage("BS-A", "data", 40);
    storage.server = Some(AttachedServer {
        id: "S1".to_string(),
        name: "web".to_string(),
        rights: None,
    });
    cloud.seed_block_storage(storage);
    let reconciler = Reconciler::new(&cloud, false);

    let outcome = reconciler
        .reconcile_block_storage(&BlockStorageParams {
            state: DesiredState::Update,
            block_storage: Some("BS-A".to_string()),
            server_id: Some("web".to_string()),
            attach: true,
            wait: no_wait(),
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(!outcome.changed);
    assert_eq!(cloud.call_count("attach_block_storage"), 0);
}

#[tokio::test]
async fn shared_attach_skips_servers_with_same_rights() {
    let cloud = MockCloud::new();
    cloud.seed_server("S1", "web");
    cloud.seed_server("S2", "db");
    let mut storage = shared_storage("SS-A", "shared", 50);
    storage.servers.push(AttachedServer {
        id: "S1".to_string(),
        name: "web".to_string(),
        rights: Some(Rights::Read),
    });
    cloud.seed_shared_storage(storage);
    let reconciler = Reconciler::new(&cloud, false);

    let outcome = reconciler
        .reconcile_shared_storage(&SharedStorageParams {
            state: DesiredState::Update,
            shared_storage: Some("shared".to_string()),
            servers: vec![
                ServerAccess::new("S1", Rights::Read),
                ServerAccess::new("db", Rights::ReadWrite),
            ],
            attach: true,
            wait: no_wait(),
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(outcome.changed);
    assert_eq!(
        cloud.last_attach(),
        vec![ServerAccess::new("S2", Rights::ReadWrite)]
    );
}

#[tokio::test]
async fn detach_when_nothing_attached_is_noop() {
    let cloud = MockCloud::new();
    cloud.seed_block_storage(block_storage("BS-A", "data", 40));
    cloud.seed_shared_storage(shared_storage("SS-A", "shared", 50));
    cloud.seed_server("S1", "web");
    let reconciler = Reconciler::new(&cloud, false);

    let block = reconciler
        .reconcile_block_storage(&BlockStorageParams {
            state: DesiredState::Update,
            block_storage: Some("data".to_string()),
            detach: true,
            wait: no_wait(),
            ..Default::default()
        })
        .await
        .unwrap();
    let shared = reconciler
        .reconcile_shared_storage(&SharedStorageParams {
            state: DesiredState::Update,
            shared_storage: Some("shared".to_string()),
            server_id: Some("S1".to_string()),
            detach: true,
            wait: no_wait(),
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(!block.changed);
    assert!(!shared.changed);
    assert!(cloud.mutations().is_empty());
}

#[tokio::test]
async fn password_update_is_sent_on_every_run() {
    let cloud = MockCloud::new();
    cloud.seed_shared_storage(shared_storage("SS-A", "shared", 50));
    let reconciler = Reconciler::new(&cloud, false);

    let params = SharedStorageParams {
        state: DesiredState::Update,
        shared_storage: Some("shared".to_string()),
        password: Some("n3w-pass".to_string()),
        wait: no_wait(),
        ..Default::default()
    };

    for _ in 0..2 {
        let outcome = reconciler.reconcile_shared_storage(&params).await.unwrap();
        assert!(outcome.changed);
        assert_eq!(outcome.actions, vec![Action::ChangePassword]);
    }

    assert_eq!(cloud.call_count("change_shared_storage_password"), 2);
}

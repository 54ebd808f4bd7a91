//! JSON file store integration tests

use equity_ledger::{
    EmployeeStatus, EquityAdmin, EquityConfig, EquityError, JsonFileStore, SharedLedger,
    SnapshotStore, StoreError,
};

#[tokio::test]
async fn test_file_store_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("nested").join("state.json"));
    assert!(!store.exists().await);
    assert!(store.load().await.unwrap().is_none());

    let mut admin = EquityAdmin::new(&EquityConfig::default()).unwrap();
    admin
        .add_employee("Alice", "Engineering", "P8", EmployeeStatus::Active)
        .unwrap();
    let snapshot = admin.export_snapshot();
    store.save(&snapshot).await.unwrap();

    assert!(store.exists().await);
    assert!(!dir.path().join("nested").join("state.json.tmp").exists());

    let loaded = store.load().await.unwrap().unwrap();
    assert_eq!(loaded, snapshot);

    let mut restored = EquityAdmin::new(&EquityConfig::default()).unwrap();
    restored.import_snapshot(loaded).unwrap();
    assert_eq!(restored, admin);
}

#[tokio::test]
async fn test_file_store_rejects_incomplete_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, r#"{"employees": [], "pool": {"total_capacity": 10}}"#).unwrap();

    let store = JsonFileStore::new(&path);
    match store.load().await {
        Err(StoreError::Import(EquityError::ImportFormat(msg))) => {
            assert!(msg.contains("level_standards"));
        }
        other => panic!("expected import error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_shared_ledger_with_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("state.json"));

    let ledger = SharedLedger::new(EquityAdmin::new(&EquityConfig::default()).unwrap());
    let id = ledger
        .command(|admin| admin.add_employee("Bob", "Product", "P6", EmployeeStatus::PendingHire))
        .await
        .unwrap()
        .employee_id;
    ledger.command(|admin| admin.process_hire(id)).await.unwrap();
    ledger.save_to(&store).await.unwrap();

    let reopened = SharedLedger::new(EquityAdmin::new(&EquityConfig::default()).unwrap());
    assert!(reopened.load_from(&store).await.unwrap());
    let status = reopened
        .query(|admin| admin.employee(id).map(|e| e.status))
        .await
        .unwrap();
    assert_eq!(status, EmployeeStatus::Active);

    // A corrupt file leaves the loaded state in place
    std::fs::write(store.path(), "{}").unwrap();
    assert!(reopened.load_from(&store).await.is_err());
    assert_eq!(reopened.snapshot_state().await, ledger.snapshot_state().await);
}

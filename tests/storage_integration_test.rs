use incident_api::{
    models::{IncidentSource, IncidentStatus, NewIncident},
    state::{IncidentFilter, IncidentStore, InMemoryStore, Page, SledStore},
};
use incident_api::AppError;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Open a store whose previous handle was just dropped. Sled's background
/// flusher can keep the file lock for a moment after the drop.
async fn reopen_sled(path: &Path) -> SledStore {
    for _ in 0..50 {
        match SledStore::new(path) {
            Ok(store) => return store,
            Err(AppError::Database(msg)) if msg.contains("WouldBlock") => {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            Err(e) => panic!("failed to reopen sled store: {}", e),
        }
    }
    panic!("sled lock at {:?} was never released", path);
}

/// Test suite that runs against any IncidentStore implementation
async fn test_store_operations<S: IncidentStore + 'static>(store: Arc<S>) {
    // Create and retrieve
    let created = store
        .create(NewIncident::new("Scooter offline", IncidentSource::Operator))
        .await
        .unwrap();
    assert_eq!(created.status, IncidentStatus::New);

    let retrieved = store.get(created.id).await.unwrap().unwrap();
    assert_eq!(retrieved, created);

    // Update status changes nothing else
    let updated = store
        .update_status(created.id, IncidentStatus::InProgress)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.status, IncidentStatus::InProgress);
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.description, created.description);
    assert_eq!(updated.source, created.source);
    assert_eq!(updated.created_at, created.created_at);

    // Missing ids are absent, not errors
    assert!(store.get(999999).await.unwrap().is_none());
    assert!(store
        .update_status(999999, IncidentStatus::Closed)
        .await
        .unwrap()
        .is_none());

    // List and count agree
    let filter = IncidentFilter::default();
    let incidents = store.list(&filter, Page::default()).await.unwrap();
    assert_eq!(incidents.len(), 1);
    assert_eq!(store.count(&filter).await.unwrap(), 1);
}

async fn test_filtering_and_paging<S: IncidentStore + 'static>(store: Arc<S>) {
    let statuses = [
        IncidentStatus::New,
        IncidentStatus::InProgress,
        IncidentStatus::Resolved,
        IncidentStatus::Closed,
    ];
    let sources = [
        IncidentSource::Operator,
        IncidentSource::Monitoring,
        IncidentSource::Partner,
    ];

    let mut ids = Vec::new();
    for i in 0..12 {
        let incident = store
            .create(NewIncident::new(format!("Incident {}", i), sources[i % 3]))
            .await
            .unwrap();
        store
            .update_status(incident.id, statuses[i % 4])
            .await
            .unwrap();
        ids.push(incident.id);
    }

    // Ids increase in creation order
    assert!(ids.windows(2).all(|w| w[0] < w[1]));

    for status in statuses {
        let filter = IncidentFilter::by_status(status);
        let incidents = store.list(&filter, Page::default()).await.unwrap();
        assert_eq!(incidents.len(), 3);
        assert!(incidents.iter().all(|i| i.status == status));
        assert_eq!(store.count(&filter).await.unwrap(), 3);
    }

    // Consecutive pages cover the listing exactly once, in order
    let filter = IncidentFilter::default();
    let mut paged = Vec::new();
    for offset in (0..12).step_by(5) {
        let page = Page::new(offset, 5).unwrap();
        paged.extend(store.list(&filter, page).await.unwrap().into_iter().map(|i| i.id));
    }
    assert_eq!(paged, ids);
    assert_eq!(store.count(&filter).await.unwrap(), 12);
}

async fn test_concurrent_creates<S: IncidentStore + 'static>(store: Arc<S>) {
    let mut handles = Vec::new();
    for i in 0..20 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .create(NewIncident::new(
                    format!("Concurrent {}", i),
                    IncidentSource::Monitoring,
                ))
                .await
                .unwrap()
                .id
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.sort_unstable();
    ids.dedup();

    assert_eq!(ids.len(), 20);
    assert_eq!(store.count(&IncidentFilter::default()).await.unwrap(), 20);
}

#[tokio::test]
async fn test_in_memory_store() {
    test_store_operations(Arc::new(InMemoryStore::new())).await;
    test_filtering_and_paging(Arc::new(InMemoryStore::new())).await;
    test_concurrent_creates(Arc::new(InMemoryStore::new())).await;
}

#[tokio::test]
async fn test_sled_store() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(SledStore::new(temp_dir.path().join("ops")).unwrap());
    test_store_operations(store).await;

    let store = Arc::new(SledStore::new(temp_dir.path().join("paging")).unwrap());
    test_filtering_and_paging(store).await;

    let store = Arc::new(SledStore::new(temp_dir.path().join("concurrent")).unwrap());
    test_concurrent_creates(store).await;
}

#[tokio::test]
async fn test_sled_status_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().to_path_buf();

    let id = {
        let store = SledStore::new(&path).unwrap();
        let incident = store
            .create(NewIncident::new("Dock offline", IncidentSource::Partner))
            .await
            .unwrap();
        store
            .update_status(incident.id, IncidentStatus::Resolved)
            .await
            .unwrap();
        store.flush().await.unwrap();
        incident.id
    };

    let store = reopen_sled(&path).await;
    let incident = store.get(id).await.unwrap().unwrap();
    assert_eq!(incident.status, IncidentStatus::Resolved);
    assert_eq!(incident.description, "Dock offline");
}

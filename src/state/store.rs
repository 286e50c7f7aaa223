use crate::error::Result;
use crate::models::{Incident, IncidentId, IncidentStatus, NewIncident};
use crate::state::{IncidentFilter, IncidentStore, Page};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// In-memory incident store (for development and testing)
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    incidents: BTreeMap<IncidentId, Incident>,
    last_id: IncidentId,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IncidentStore for InMemoryStore {
    async fn create(&self, incident: NewIncident) -> Result<Incident> {
        let mut inner = self.inner.write();
        inner.last_id += 1;

        let incident = Incident::create(inner.last_id, incident, Utc::now());
        inner.incidents.insert(incident.id, incident.clone());

        tracing::debug!(incident_id = incident.id, "Incident saved");
        Ok(incident)
    }

    async fn get(&self, id: IncidentId) -> Result<Option<Incident>> {
        Ok(self.inner.read().incidents.get(&id).cloned())
    }

    async fn list(&self, filter: &IncidentFilter, page: Page) -> Result<Vec<Incident>> {
        let inner = self.inner.read();

        // BTreeMap iterates in id order, which is creation order
        Ok(page.apply(
            inner
                .incidents
                .values()
                .filter(|incident| filter.matches(incident))
                .cloned(),
        ))
    }

    async fn count(&self, filter: &IncidentFilter) -> Result<u64> {
        let count = self
            .inner
            .read()
            .incidents
            .values()
            .filter(|incident| filter.matches(incident))
            .count();

        Ok(count as u64)
    }

    async fn update_status(
        &self,
        id: IncidentId,
        status: IncidentStatus,
    ) -> Result<Option<Incident>> {
        let mut inner = self.inner.write();

        match inner.incidents.get_mut(&id) {
            Some(incident) => {
                incident.status = status;
                tracing::debug!(incident_id = id, status = %status, "Incident status updated");
                Ok(Some(incident.clone()))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IncidentSource;

    #[tokio::test]
    async fn test_create_and_get_incident() {
        let store = InMemoryStore::new();

        let created = store
            .create(NewIncident::new("Scooter offline", IncidentSource::Operator))
            .await
            .unwrap();

        assert_eq!(created.id, 1);
        assert_eq!(created.status, IncidentStatus::New);

        let retrieved = store.get(created.id).await.unwrap();
        assert_eq!(retrieved, Some(created));
    }

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let store = InMemoryStore::new();

        for expected in 1..=3 {
            let incident = store
                .create(NewIncident::new("Battery low", IncidentSource::Monitoring))
                .await
                .unwrap();
            assert_eq!(incident.id, expected);
        }
    }

    #[tokio::test]
    async fn test_update_status() {
        let store = InMemoryStore::new();
        let created = store
            .create(NewIncident::new("Lock jammed", IncidentSource::Partner))
            .await
            .unwrap();

        let updated = store
            .update_status(created.id, IncidentStatus::Resolved)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.status, IncidentStatus::Resolved);
        assert_eq!(updated.description, created.description);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_update_missing_incident() {
        let store = InMemoryStore::new();

        let result = store
            .update_status(999, IncidentStatus::Closed)
            .await
            .unwrap();
        assert!(result.is_none());
        assert_eq!(store.count(&IncidentFilter::default()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_incidents_with_filter() {
        let store = InMemoryStore::new();

        for i in 0..5 {
            let incident = store
                .create(NewIncident::new(
                    format!("Incident {}", i),
                    IncidentSource::Operator,
                ))
                .await
                .unwrap();
            if i % 2 == 0 {
                store
                    .update_status(incident.id, IncidentStatus::InProgress)
                    .await
                    .unwrap();
            }
        }

        let filter = IncidentFilter::by_status(IncidentStatus::InProgress);
        let incidents = store.list(&filter, Page::default()).await.unwrap();
        assert_eq!(incidents.len(), 3); // 0, 2, 4
        assert!(incidents
            .iter()
            .all(|i| i.status == IncidentStatus::InProgress));
        assert_eq!(store.count(&filter).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_list_paging_in_creation_order() {
        let store = InMemoryStore::new();
        for i in 0..10 {
            store
                .create(NewIncident::new(
                    format!("Incident {}", i),
                    IncidentSource::Monitoring,
                ))
                .await
                .unwrap();
        }

        let page = Page::new(3, 4).unwrap();
        let incidents = store.list(&IncidentFilter::default(), page).await.unwrap();
        let ids: Vec<_> = incidents.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![4, 5, 6, 7]);

        let past_end = Page::new(50, 10).unwrap();
        assert!(store
            .list(&IncidentFilter::default(), past_end)
            .await
            .unwrap()
            .is_empty());
    }
}

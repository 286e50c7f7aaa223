use crate::error::{AppError, Result};
use crate::metrics::{INCIDENTS_CREATED_TOTAL, INCIDENT_STATUS_CHANGES_TOTAL};
use crate::models::{Incident, IncidentId, IncidentSource, IncidentStatus, NewIncident};
use crate::state::{IncidentFilter, IncidentStore, Page};
use std::sync::Arc;

/// One page of a filtered listing plus the size of the whole matching set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncidentPage {
    pub incidents: Vec<Incident>,
    pub total: u64,
}

/// Validates requests and maps store outcomes to caller-facing results
pub struct IncidentService {
    store: Arc<dyn IncidentStore>,
}

impl IncidentService {
    pub fn new(store: Arc<dyn IncidentStore>) -> Self {
        Self { store }
    }

    /// Record a new incident. The result always has status `new`.
    pub async fn submit(&self, description: String, source: IncidentSource) -> Result<Incident> {
        if description.is_empty() {
            return Err(AppError::Validation(
                "description must not be empty".to_string(),
            ));
        }

        let incident = self
            .store
            .create(NewIncident::new(description, source))
            .await?;

        let source_label: &'static str = source.into();
        INCIDENTS_CREATED_TOTAL
            .with_label_values(&[source_label])
            .inc();

        tracing::info!(
            incident_id = incident.id,
            source = %incident.source,
            "Created new incident"
        );

        Ok(incident)
    }

    /// List incidents with an optional status filter and offset/limit paging
    pub async fn query(
        &self,
        status: Option<IncidentStatus>,
        offset: i64,
        limit: i64,
    ) -> Result<IncidentPage> {
        let page = Page::new(offset, limit)?;
        let filter = IncidentFilter { status };

        let incidents = self.store.list(&filter, page).await?;
        let total = self.store.count(&filter).await?;

        tracing::debug!(
            status = ?status,
            offset = page.offset,
            limit = page.limit,
            returned = incidents.len(),
            total,
            "Listed incidents"
        );

        Ok(IncidentPage { incidents, total })
    }

    /// Get an incident by ID
    pub async fn fetch(&self, id: IncidentId) -> Result<Incident> {
        self.store
            .get(id)
            .await?
            .ok_or(AppError::IncidentNotFound { id })
    }

    /// Move an incident to another status. Any status may follow any other.
    pub async fn change_status(&self, id: IncidentId, status: IncidentStatus) -> Result<Incident> {
        let incident = self
            .store
            .update_status(id, status)
            .await?
            .ok_or(AppError::IncidentNotFound { id })?;

        let status_label: &'static str = status.into();
        INCIDENT_STATUS_CHANGES_TOTAL
            .with_label_values(&[status_label])
            .inc();

        tracing::info!(
            incident_id = id,
            new_status = %incident.status,
            "Incident status updated"
        );

        Ok(incident)
    }
}

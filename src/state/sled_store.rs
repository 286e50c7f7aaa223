use crate::error::{AppError, Result};
use crate::models::{Incident, IncidentId, IncidentStatus, NewIncident};
use crate::state::{IncidentFilter, IncidentStore, Page};
use async_trait::async_trait;
use chrono::Utc;
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
};
use sled::Db;
use std::path::Path;
use std::sync::Arc;

/// Persistent incident store using Sled embedded database
#[derive(Clone)]
pub struct SledStore {
    db: Arc<Db>,
    incidents_tree: sled::Tree,
}

impl SledStore {
    /// Create a new Sled store at the specified path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let db = sled::open(path_ref).map_err(|e| {
            AppError::Database(format!("Failed to open Sled database: {}", e))
        })?;

        let incidents_tree = db.open_tree("incidents").map_err(|e| {
            AppError::Database(format!("Failed to open incidents tree: {}", e))
        })?;

        tracing::info!("Initialized Sled store at {:?}", path_ref);

        Ok(Self {
            db: Arc::new(db),
            incidents_tree,
        })
    }

    /// Serialize incident to bytes
    fn serialize_incident(incident: &Incident) -> Result<Vec<u8>> {
        bincode::serialize(incident).map_err(|e| {
            AppError::Serialization(format!("Failed to serialize incident: {}", e))
        })
    }

    /// Deserialize incident from bytes
    fn deserialize_incident(bytes: &[u8]) -> Result<Incident> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// Big-endian keys keep tree order equal to id order
    fn incident_key(id: IncidentId) -> Option<[u8; 8]> {
        u64::try_from(id).ok().map(u64::to_be_bytes)
    }

    /// Next never-used id. Sled persists its id generator across restarts.
    fn next_id(&self) -> Result<IncidentId> {
        let raw = self.db.generate_id().map_err(|e| {
            AppError::Database(format!("Failed to generate incident id: {}", e))
        })?;

        IncidentId::try_from(raw + 1)
            .map_err(|_| AppError::Database("Incident id space exhausted".to_string()))
    }

    /// Iterate over stored incidents in creation order
    fn scan(&self) -> impl Iterator<Item = Result<Incident>> + '_ {
        self.incidents_tree.iter().map(|result| {
            let (_, value) = result.map_err(|e| {
                AppError::Database(format!("Failed to iterate incidents: {}", e))
            })?;
            Self::deserialize_incident(&value)
        })
    }
}

#[async_trait]
impl IncidentStore for SledStore {
    async fn create(&self, incident: NewIncident) -> Result<Incident> {
        let incident = Incident::create(self.next_id()?, incident, Utc::now());
        let key = Self::incident_key(incident.id)
            .ok_or_else(|| AppError::Internal(format!("Invalid incident id {}", incident.id)))?;
        let value = Self::serialize_incident(&incident)?;

        // A single insert is atomic: readers see the whole record or nothing
        self.incidents_tree.insert(key, value).map_err(|e| {
            AppError::Database(format!("Failed to save incident: {}", e))
        })?;

        self.incidents_tree.flush().map_err(|e| {
            AppError::Database(format!("Failed to flush incidents tree: {}", e))
        })?;

        tracing::debug!(incident_id = incident.id, "Incident saved to Sled");
        Ok(incident)
    }

    async fn get(&self, id: IncidentId) -> Result<Option<Incident>> {
        let Some(key) = Self::incident_key(id) else {
            return Ok(None);
        };

        match self.incidents_tree.get(key) {
            Ok(Some(bytes)) => Ok(Some(Self::deserialize_incident(&bytes)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(AppError::Database(format!("Failed to get incident: {}", e))),
        }
    }

    async fn list(&self, filter: &IncidentFilter, page: Page) -> Result<Vec<Incident>> {
        let mut incidents = Vec::new();
        let mut skipped = 0u64;

        // Stop decoding once the page is full
        for incident in self.scan() {
            if incidents.len() as u64 >= page.limit {
                break;
            }

            let incident = incident?;
            if !filter.matches(&incident) {
                continue;
            }
            if skipped < page.offset {
                skipped += 1;
                continue;
            }
            incidents.push(incident);
        }

        Ok(incidents)
    }

    /// Decodes every record, so a corrupt row fails here just as it fails `list`
    async fn count(&self, filter: &IncidentFilter) -> Result<u64> {
        let mut count = 0u64;
        for incident in self.scan() {
            if filter.matches(&incident?) {
                count += 1;
            }
        }

        Ok(count)
    }

    async fn update_status(
        &self,
        id: IncidentId,
        status: IncidentStatus,
    ) -> Result<Option<Incident>> {
        let Some(key) = Self::incident_key(id) else {
            return Ok(None);
        };

        let result = self.incidents_tree.transaction(
            |tx| -> ConflictableTransactionResult<Option<Incident>, bincode::Error> {
                let Some(bytes) = tx.get(key)? else {
                    return Ok(None);
                };

                let mut incident: Incident = bincode::deserialize(&bytes)
                    .map_err(ConflictableTransactionError::Abort)?;
                incident.status = status;

                let value = bincode::serialize(&incident)
                    .map_err(ConflictableTransactionError::Abort)?;
                tx.insert(&key[..], value)?;

                Ok(Some(incident))
            },
        );

        let updated = match result {
            Ok(updated) => updated,
            Err(TransactionError::Abort(e)) => return Err(e.into()),
            Err(TransactionError::Storage(e)) => {
                return Err(AppError::Database(format!(
                    "Failed to update incident status: {}",
                    e
                )))
            }
        };

        if updated.is_some() {
            self.incidents_tree.flush().map_err(|e| {
                AppError::Database(format!("Failed to flush incidents tree: {}", e))
            })?;
            tracing::debug!(incident_id = id, status = %status, "Incident status updated in Sled");
        }

        Ok(updated)
    }

    async fn flush(&self) -> Result<()> {
        self.db.flush_async().await.map_err(|e| {
            AppError::Database(format!("Failed to flush database: {}", e))
        })?;
        Ok(())
    }
}

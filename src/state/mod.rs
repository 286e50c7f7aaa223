pub mod store;
pub mod sled_store;
pub mod factory;

pub use store::*;
pub use sled_store::SledStore;
pub use factory::{create_store, create_in_memory_store};

use crate::error::Result;
use crate::models::{Incident, IncidentId, IncidentStatus, NewIncident};
use async_trait::async_trait;

/// Trait for incident storage operations.
///
/// Absence of a record is reported as `Ok(None)`; `Err` is reserved for
/// persistence failures.
#[async_trait]
pub trait IncidentStore: Send + Sync {
    /// Persist a new incident with status `new`, a fresh id and creation time
    async fn create(&self, incident: NewIncident) -> Result<Incident>;

    /// Get an incident by ID
    async fn get(&self, id: IncidentId) -> Result<Option<Incident>>;

    /// List incidents matching the filter in creation order, restricted to a page
    async fn list(&self, filter: &IncidentFilter, page: Page) -> Result<Vec<Incident>>;

    /// Count incidents matching the filter, ignoring paging
    async fn count(&self, filter: &IncidentFilter) -> Result<u64>;

    /// Set the status of an existing incident and return the updated record
    async fn update_status(
        &self,
        id: IncidentId,
        status: IncidentStatus,
    ) -> Result<Option<Incident>>;

    /// Flush pending writes to durable storage
    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Filter for querying incidents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IncidentFilter {
    pub status: Option<IncidentStatus>,
}

impl IncidentFilter {
    pub fn by_status(status: IncidentStatus) -> Self {
        Self {
            status: Some(status),
        }
    }

    pub fn matches(&self, incident: &Incident) -> bool {
        incident.matches_status(self.status)
    }
}

/// A validated offset/limit window over a filtered listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: u64,
    pub limit: u64,
}

impl Page {
    pub const DEFAULT_LIMIT: u64 = 100;
    pub const MAX_LIMIT: u64 = 1000;

    /// Validate a caller-supplied window: offset >= 0, limit in [1, 1000]
    pub fn new(offset: i64, limit: i64) -> Result<Self> {
        if offset < 0 {
            return Err(crate::error::AppError::Validation(format!(
                "skip must be greater than or equal to 0, got {}",
                offset
            )));
        }

        if limit < 1 || limit as u64 > Self::MAX_LIMIT {
            return Err(crate::error::AppError::Validation(format!(
                "limit must be between 1 and {}, got {}",
                Self::MAX_LIMIT,
                limit
            )));
        }

        Ok(Self {
            offset: offset as u64,
            limit: limit as u64,
        })
    }

    /// Apply the window to an iterator of already filtered records
    pub fn apply<I>(&self, items: I) -> Vec<Incident>
    where
        I: IntoIterator<Item = Incident>,
    {
        items
            .into_iter()
            .skip(self.offset as usize)
            .take(self.limit as usize)
            .collect()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn test_page_bounds() {
        assert_eq!(Page::new(0, 1).unwrap(), Page { offset: 0, limit: 1 });
        assert_eq!(
            Page::new(25, 1000).unwrap(),
            Page {
                offset: 25,
                limit: 1000
            }
        );

        assert!(matches!(Page::new(-1, 10), Err(AppError::Validation(_))));
        assert!(matches!(Page::new(0, 0), Err(AppError::Validation(_))));
        assert!(matches!(Page::new(0, 1001), Err(AppError::Validation(_))));
        assert!(matches!(Page::new(0, -5), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_default_page() {
        let page = Page::default();
        assert_eq!(page.offset, 0);
        assert_eq!(page.limit, 100);
    }
}

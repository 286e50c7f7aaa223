use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Store-assigned incident identifier
pub type IncidentId = i64;

/// Represents a reported incident
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    /// Unique identifier, assigned by the store
    pub id: IncidentId,

    /// What happened
    pub description: String,

    /// Who or what reported the incident
    pub source: IncidentSource,

    /// Current lifecycle stage
    pub status: IncidentStatus,

    /// Creation timestamp, assigned by the store
    pub created_at: DateTime<Utc>,
}

impl Incident {
    /// Build a freshly created record. New incidents always start as `new`.
    pub fn create(id: IncidentId, new: NewIncident, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            description: new.description,
            source: new.source,
            status: IncidentStatus::New,
            created_at,
        }
    }

    /// Whether the incident matches an optional status filter
    pub fn matches_status(&self, status: Option<IncidentStatus>) -> bool {
        status.map_or(true, |s| self.status == s)
    }
}

/// Input for creating an incident. There is deliberately no status here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIncident {
    pub description: String,
    pub source: IncidentSource,
}

impl NewIncident {
    pub fn new(description: impl Into<String>, source: IncidentSource) -> Self {
        Self {
            description: description.into(),
            source,
        }
    }
}

/// Lifecycle stage of an incident.
///
/// Any status may move to any other status; there is no enforced workflow.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    Display,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IncidentStatus {
    #[default]
    New,
    InProgress,
    Resolved,
    Closed,
}

/// Origin of an incident report
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    Display,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IncidentSource {
    Operator,
    Monitoring,
    Partner,
}

use crate::api::AppState;
use crate::error::Result;
use crate::models::{Incident, IncidentId, IncidentSource, IncidentStatus};
use crate::state::Page;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

const SERVICE_NAME: &str = "incident-api";

/// Root endpoint with service information
pub async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Incident Management API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "create_incident": "POST /incidents/",
            "get_incidents": "GET /incidents/",
            "update_incident": "PATCH /incidents/{id}",
            "get_incident": "GET /incidents/{id}",
        }
    }))
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
    })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

/// Prometheus metrics endpoint
pub async fn metrics() -> (StatusCode, String) {
    (StatusCode::OK, crate::metrics::gather_metrics())
}

/// Create an incident
pub async fn create_incident(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateIncidentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<IncidentResponse>)> {
    let Json(request) = payload?;
    request.validate()?;

    let created = state
        .service
        .submit(request.description, request.source)
        .await?;

    Ok((StatusCode::CREATED, Json(IncidentResponse::from(created))))
}

/// Body for creating an incident. Unknown fields (including `status`) are ignored.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateIncidentRequest {
    #[validate(length(min = 1))]
    pub description: String,
    pub source: IncidentSource,
}

/// List incidents
pub async fn list_incidents(
    State(state): State<AppState>,
    params: std::result::Result<Query<ListIncidentsQuery>, QueryRejection>,
) -> Result<Json<IncidentListResponse>> {
    let Query(params) = params?;

    let page = state
        .service
        .query(
            params.status,
            params.skip.unwrap_or(0),
            params.limit.unwrap_or(Page::DEFAULT_LIMIT as i64),
        )
        .await?;

    Ok(Json(IncidentListResponse {
        incidents: page
            .incidents
            .into_iter()
            .map(IncidentResponse::from)
            .collect(),
        total: page.total,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListIncidentsQuery {
    pub status: Option<IncidentStatus>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// Get an incident by ID
pub async fn get_incident(
    State(state): State<AppState>,
    id: std::result::Result<Path<IncidentId>, PathRejection>,
) -> Result<Json<IncidentResponse>> {
    let Path(id) = id?;
    let incident = state.service.fetch(id).await?;
    Ok(Json(IncidentResponse::from(incident)))
}

/// Update incident status
pub async fn update_incident_status(
    State(state): State<AppState>,
    id: std::result::Result<Path<IncidentId>, PathRejection>,
    payload: std::result::Result<Json<UpdateIncidentStatusRequest>, JsonRejection>,
) -> Result<Json<IncidentResponse>> {
    let Path(id) = id?;
    let Json(request) = payload?;

    let incident = state.service.change_status(id, request.status).await?;
    Ok(Json(IncidentResponse::from(incident)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateIncidentStatusRequest {
    pub status: IncidentStatus,
}

/// Incident response DTO
#[derive(Debug, Serialize)]
pub struct IncidentResponse {
    pub id: IncidentId,
    pub description: String,
    pub source: IncidentSource,
    pub status: IncidentStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Incident> for IncidentResponse {
    fn from(incident: Incident) -> Self {
        Self {
            id: incident.id,
            description: incident.description,
            source: incident.source,
            status: incident.status,
            created_at: incident.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IncidentListResponse {
    pub incidents: Vec<IncidentResponse>,
    pub total: u64,
}

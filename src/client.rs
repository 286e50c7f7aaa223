//! Typed HTTP client for the incident API, used by `incident-cli`.

use crate::models::{Incident, IncidentId, IncidentSource, IncidentStatus};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// The request never produced a usable response
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("API error ({status}): {body}")]
    Api { status: StatusCode, body: String },
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Api { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Listing returned by `GET /incidents/`
#[derive(Debug, Clone, Deserialize)]
pub struct IncidentList {
    pub incidents: Vec<Incident>,
    pub total: u64,
}

/// Query parameters for listing
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub status: Option<IncidentStatus>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl ListOptions {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(status) = self.status {
            query.push(("status", status.to_string()));
        }
        if let Some(skip) = self.skip {
            query.push(("skip", skip.to_string()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        query
    }
}

#[derive(Clone)]
pub struct IncidentClient {
    http: Client,
    endpoint: String,
}

impl IncidentClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    pub async fn create(
        &self,
        description: &str,
        source: IncidentSource,
    ) -> ClientResult<Incident> {
        let response = self
            .http
            .post(self.url("/incidents/"))
            .json(&json!({ "description": description, "source": source }))
            .send()
            .await?;

        Self::decode(response).await
    }

    pub async fn list(&self, options: &ListOptions) -> ClientResult<IncidentList> {
        let response = self
            .http
            .get(self.url("/incidents/"))
            .query(&options.to_query())
            .send()
            .await?;

        Self::decode(response).await
    }

    pub async fn get(&self, id: IncidentId) -> ClientResult<Incident> {
        let response = self
            .http
            .get(self.url(&format!("/incidents/{}", id)))
            .send()
            .await?;

        Self::decode(response).await
    }

    pub async fn update_status(
        &self,
        id: IncidentId,
        status: IncidentStatus,
    ) -> ClientResult<Incident> {
        let response = self
            .http
            .patch(self.url(&format!("/incidents/{}", id)))
            .json(&json!({ "status": status }))
            .send()
            .await?;

        Self::decode(response).await
    }

    pub async fn health(&self) -> ClientResult<serde_json::Value> {
        let response = self.http.get(self.url("/health")).send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api { status, body });
        }

        Ok(response.json().await?)
    }
}

//! Grafana HTTP API client

use std::path::Path;

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use quayside_core::Dashboard;

use crate::error::GrafanaError;

/// Grafana client configuration
#[derive(Clone, Debug)]
pub struct GrafanaClientConfig {
    /// Base URL of the Grafana instance
    pub url: String,
    /// Bearer token for the service account
    pub token: String,
}

/// Read a bearer token from a single-line credential file.
/// A missing or empty file is a fatal precondition.
pub fn read_token_file(path: impl AsRef<Path>) -> Result<String, GrafanaError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| GrafanaError::TokenFile {
        path: path.display().to_string(),
        source,
    })?;

    let token = raw.trim();
    if token.is_empty() {
        return Err(GrafanaError::EmptyToken(path.display().to_string()));
    }
    Ok(token.to_string())
}

/// Envelope returned by `GET /api/dashboards/uid/{uid}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardEnvelope {
    pub dashboard: Dashboard,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// Payload for `POST /api/dashboards/db`
#[derive(Debug, Clone, Serialize)]
struct DashboardUpdate<'a> {
    dashboard: &'a Dashboard,
    overwrite: bool,
    message: &'a str,
}

/// Grafana API client
pub struct GrafanaClient {
    config: GrafanaClientConfig,
    client: Client,
}

impl GrafanaClient {
    /// Create a new Grafana client
    pub fn new(config: GrafanaClientConfig) -> Result<Self, GrafanaError> {
        let client = Client::builder().build()?;

        info!("Created Grafana client for {}", config.url);

        Ok(Self { config, client })
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/api{}", self.config.url.trim_end_matches('/'), endpoint)
    }

    /// Turn a non-2xx response into `GrafanaError::Api`, keeping the body
    /// for diagnosis.
    async fn check(response: Response) -> Result<Response, GrafanaError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        Err(GrafanaError::Api {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        })
    }

    async fn get(&self, endpoint: &str) -> Result<Response, GrafanaError> {
        let url = self.api_url(endpoint);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.token)
            .send()
            .await?;
        Self::check(response).await
    }

    /// Probe `GET /api/health`
    pub async fn health(&self) -> Result<(), GrafanaError> {
        self.get("/health").await?;
        Ok(())
    }

    /// Fetch a datasource by uid; non-2xx (including 404) is an error
    pub async fn datasource_by_uid(&self, uid: &str) -> Result<Value, GrafanaError> {
        let response = self.get(&format!("/datasources/uid/{}", uid)).await?;
        Ok(response.json().await?)
    }

    /// Fetch a dashboard by uid
    pub async fn dashboard_by_uid(&self, uid: &str) -> Result<DashboardEnvelope, GrafanaError> {
        let response = self.get(&format!("/dashboards/uid/{}", uid)).await?;
        Ok(response.json().await?)
    }

    /// Submit a dashboard definition with the overwrite flag set, so
    /// repeated runs converge instead of duplicating.
    pub async fn post_dashboard(
        &self,
        dashboard: &Dashboard,
        message: &str,
    ) -> Result<(), GrafanaError> {
        let url = self.api_url("/dashboards/db");
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.token)
            .json(&DashboardUpdate {
                dashboard,
                overwrite: true,
                message,
            })
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn token_file_is_trimmed_to_a_single_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "glsa_abc123  ").unwrap();

        let token = read_token_file(file.path()).unwrap();
        assert_eq!(token, "glsa_abc123");
    }

    #[test]
    fn missing_token_file_is_fatal() {
        let err = read_token_file("/nonexistent/grafana.token").unwrap_err();
        assert!(matches!(err, GrafanaError::TokenFile { .. }));
    }

    #[test]
    fn blank_token_file_is_fatal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "   ").unwrap();

        let err = read_token_file(file.path()).unwrap_err();
        assert!(matches!(err, GrafanaError::EmptyToken(_)));
    }

    #[test]
    fn dashboard_envelope_keeps_meta() {
        let envelope: DashboardEnvelope = serde_json::from_value(serde_json::json!({
            "dashboard": {"uid": "d1", "title": "t", "panels": []},
            "meta": {"version": 7, "slug": "t"}
        }))
        .unwrap();

        assert_eq!(envelope.dashboard.uid.as_deref(), Some("d1"));
        assert!(envelope.rest.contains_key("meta"));
    }
}

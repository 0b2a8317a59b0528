//! Grafana client and provisioning error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GrafanaError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Grafana returned error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("Credential file {path}: {source}")]
    TokenFile {
        path: String,
        source: std::io::Error,
    },

    #[error("Credential file {0} is empty")]
    EmptyToken(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(#[from] serde_json::Error),
}

/// Provisioning failures, categorized by the verification step that failed.
/// Every variant is fatal: the workflow is run-to-completion-or-abort and
/// is retried wholesale, never per step.
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Grafana never became ready after {attempts} attempts: {last}")]
    ServiceUnready { attempts: u32, last: GrafanaError },

    #[error("Datasource {uid} is missing: {source}")]
    DatasourceMissing { uid: String, source: GrafanaError },

    #[error("Dashboard {uid} is missing: {source}")]
    DashboardMissing { uid: String, source: GrafanaError },

    #[error("Dashboard update rejected: {0}")]
    UpdateRejected(GrafanaError),

    #[error(transparent)]
    Grafana(#[from] GrafanaError),
}

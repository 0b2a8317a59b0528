//! Idempotent dashboard provisioning workflow
//!
//! Sequence: wait for Grafana to become healthy, verify the datasource and
//! the dashboard exist, rebind every panel and query target to the
//! datasource, and re-upload the document with overwrite. Any failure
//! aborts the whole run; the workflow carries no per-step retry and is
//! simply re-invoked wholesale.

use tracing::{error, info};

use quayside_core::{DatasourceRef, PollBudget, RebindReport, poll_until};

use crate::client::GrafanaClient;
use crate::error::ProvisionError;

/// Identifiers and retry budget for a provisioning run
#[derive(Debug, Clone)]
pub struct ProvisionerSettings {
    pub datasource_uid: String,
    pub dashboard_uid: String,
    pub readiness: PollBudget,
}

impl ProvisionerSettings {
    pub fn new(datasource_uid: impl Into<String>, dashboard_uid: impl Into<String>) -> Self {
        Self {
            datasource_uid: datasource_uid.into(),
            dashboard_uid: dashboard_uid.into(),
            readiness: PollBudget::default(),
        }
    }
}

/// What a successful run did, for logging and assertions
#[derive(Debug, Clone)]
pub struct ProvisionOutcome {
    pub report: RebindReport,
}

/// Provisioning workflow runner
pub struct Provisioner {
    client: GrafanaClient,
    settings: ProvisionerSettings,
}

impl Provisioner {
    pub fn new(client: GrafanaClient, settings: ProvisionerSettings) -> Self {
        Self { client, settings }
    }

    /// Run the workflow to completion, or abort on the first failure.
    pub async fn run(&self) -> Result<ProvisionOutcome, ProvisionError> {
        // Step 1: readiness. Constant backoff, fixed attempt budget.
        info!("Waiting for Grafana to become ready");
        poll_until(self.settings.readiness, || self.client.health())
            .await
            .map_err(|e| ProvisionError::ServiceUnready {
                attempts: e.attempts,
                last: e.last,
            })?;
        info!("Grafana is ready");

        // Step 2: both objects must already exist; creation is out of scope.
        let datasource_uid = &self.settings.datasource_uid;
        self.client
            .datasource_by_uid(datasource_uid)
            .await
            .map_err(|source| ProvisionError::DatasourceMissing {
                uid: datasource_uid.clone(),
                source,
            })?;
        info!("Datasource {} verified", datasource_uid);

        let dashboard_uid = &self.settings.dashboard_uid;
        let mut envelope = self
            .client
            .dashboard_by_uid(dashboard_uid)
            .await
            .map_err(|source| ProvisionError::DashboardMissing {
                uid: dashboard_uid.clone(),
                source,
            })?;
        info!(
            "Dashboard {} verified ({} panels)",
            dashboard_uid,
            envelope.dashboard.panels.len()
        );

        // Step 3: pure transformation, total over panels and targets.
        let datasource = DatasourceRef::postgres(datasource_uid.clone());
        let report = envelope.dashboard.rebind_datasources(&datasource);
        for panel in &report.panels {
            info!(
                "Panel '{}': rebound {} query target(s)",
                panel.title, panel.targets
            );
        }
        info!(
            "Rebound {} panels, {} targets to datasource {}",
            report.panel_count(),
            report.target_count(),
            datasource_uid
        );

        // Step 4: persist with overwrite so repeated runs converge.
        self.client
            .post_dashboard(&envelope.dashboard, "Rebound by quayside provision")
            .await
            .map_err(|e| {
                error!("Dashboard update rejected: {}", e);
                ProvisionError::UpdateRejected(e)
            })?;
        info!("Dashboard {} updated", dashboard_uid);

        Ok(ProvisionOutcome { report })
    }
}

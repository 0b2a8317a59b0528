//! Typed Grafana dashboard document
//!
//! The provisioning workflow rewrites every datasource reference in a
//! dashboard. Modelling the document as panels-with-targets (rather than an
//! untyped JSON tree) makes that rewrite statically total: there is no way
//! to miss a panel or a query target. Fields we do not care about are kept
//! verbatim in flattened maps so a parse/serialize round trip is lossless.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reference to a datasource, as embedded in panels and query targets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasourceRef {
    /// Datasource plugin type, e.g. "postgres"
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub uid: String,
}

impl DatasourceRef {
    pub fn postgres(uid: impl Into<String>) -> Self {
        Self {
            kind: Some("postgres".to_string()),
            uid: uid.into(),
        }
    }
}

/// A query target inside a panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Target {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datasource: Option<DatasourceRef>,
    #[serde(rename = "refId", default, skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<String>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// A dashboard panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Panel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub panel_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datasource: Option<DatasourceRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<Target>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// A dashboard document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Dashboard {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub panels: Vec<Panel>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// Per-panel rebind count, for the provisioning log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelRebind {
    pub title: String,
    pub targets: usize,
}

/// Outcome of a datasource rebind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebindReport {
    pub panels: Vec<PanelRebind>,
}

impl RebindReport {
    pub fn panel_count(&self) -> usize {
        self.panels.len()
    }

    pub fn target_count(&self) -> usize {
        self.panels.iter().map(|p| p.targets).sum()
    }
}

impl Dashboard {
    /// Bind every panel and every query target to `datasource`.
    ///
    /// Total over the document and idempotent: re-applying with the same
    /// reference leaves the dashboard unchanged.
    pub fn rebind_datasources(&mut self, datasource: &DatasourceRef) -> RebindReport {
        let mut panels = Vec::with_capacity(self.panels.len());
        for panel in &mut self.panels {
            panel.datasource = Some(datasource.clone());
            for target in &mut panel.targets {
                target.datasource = Some(datasource.clone());
            }
            panels.push(PanelRebind {
                title: panel.title.clone().unwrap_or_default(),
                targets: panel.targets.len(),
            });
        }
        RebindReport { panels }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_dashboard() -> Dashboard {
        serde_json::from_value(json!({
            "uid": "porto-operacional",
            "title": "Port Operations",
            "schemaVersion": 30,
            "refresh": "30s",
            "panels": [
                {
                    "title": "Occupied Berths",
                    "type": "stat",
                    "datasource": {"type": "postgres", "uid": "old-uid"},
                    "gridPos": {"x": 0, "y": 0, "w": 4, "h": 6},
                    "targets": [
                        {"refId": "A", "rawSql": "SELECT count(*) FROM berths", "datasource": {"uid": "old-uid"}},
                        {"refId": "B", "rawSql": "SELECT 1"}
                    ]
                },
                {
                    "title": "Customs",
                    "type": "table",
                    "targets": [
                        {"refId": "A", "rawSql": "SELECT * FROM customs_clearance"}
                    ]
                },
                {
                    "title": "No queries",
                    "type": "text"
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn rebind_covers_every_panel_and_target() {
        let mut dashboard = sample_dashboard();
        let ds = DatasourceRef::postgres("postgres-porto-uid");
        let report = dashboard.rebind_datasources(&ds);

        assert_eq!(report.panel_count(), 3);
        assert_eq!(report.target_count(), 3);
        for panel in &dashboard.panels {
            assert_eq!(panel.datasource.as_ref(), Some(&ds));
            for target in &panel.targets {
                assert_eq!(target.datasource.as_ref(), Some(&ds));
            }
        }
    }

    #[test]
    fn rebind_is_idempotent() {
        let ds = DatasourceRef::postgres("postgres-porto-uid");

        let mut once = sample_dashboard();
        once.rebind_datasources(&ds);

        let mut twice = once.clone();
        let report = twice.rebind_datasources(&ds);

        assert_eq!(once, twice);
        assert_eq!(
            serde_json::to_value(&once).unwrap(),
            serde_json::to_value(&twice).unwrap()
        );
        // Counts are stable across applications as well.
        assert_eq!(report.target_count(), 3);
    }

    #[test]
    fn unknown_fields_survive_a_round_trip() {
        let original = json!({
            "uid": "d1",
            "panels": [{
                "title": "p",
                "fieldConfig": {"defaults": {"unit": "percent"}},
                "targets": [{"refId": "A", "format": "table"}]
            }],
            "templating": {"list": []}
        });

        let dashboard: Dashboard = serde_json::from_value(original.clone()).unwrap();
        let round_tripped = serde_json::to_value(&dashboard).unwrap();
        assert_eq!(original, round_tripped);
    }

    #[test]
    fn per_panel_counts_match_target_lists() {
        let mut dashboard = sample_dashboard();
        let report = dashboard.rebind_datasources(&DatasourceRef::postgres("uid"));

        let counts: Vec<(String, usize)> = report
            .panels
            .iter()
            .map(|p| (p.title.clone(), p.targets))
            .collect();
        assert_eq!(
            counts,
            vec![
                ("Occupied Berths".to_string(), 2),
                ("Customs".to_string(), 1),
                ("No queries".to_string(), 0),
            ]
        );
    }
}

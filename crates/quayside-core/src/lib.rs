//! Quayside Core Domain Logic
//!
//! This crate provides the pure pieces of the port monitor: the crane
//! animation state machine, the readiness polling utility, and the typed
//! Grafana dashboard document used by the provisioning workflow.

pub mod crane;
pub mod dashboard;
pub mod poll;

pub use crane::{BerthOccupancy, Crane, CraneFleet, CranePhase, FleetTransition};
pub use dashboard::{Dashboard, DatasourceRef, Panel, PanelRebind, RebindReport, Target};
pub use poll::{BudgetExhausted, PollBudget, poll_until};

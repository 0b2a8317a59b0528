//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error type for parsing models from strings
#[derive(Debug, Clone)]
pub enum ParseError {
    InvalidBerthStatus(String),
    InvalidOperationStatus(String),
    InvalidQueueStatus(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidBerthStatus(s) => write!(f, "Invalid berth status: {}", s),
            ParseError::InvalidOperationStatus(s) => {
                write!(f, "Invalid operation status: {}", s)
            }
            ParseError::InvalidQueueStatus(s) => write!(f, "Invalid queue status: {}", s),
        }
    }
}

impl std::error::Error for ParseError {}

/// Berth status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BerthStatus {
    Available,
    Occupied,
    Maintenance,
}

impl BerthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BerthStatus::Available => "available",
            BerthStatus::Occupied => "occupied",
            BerthStatus::Maintenance => "maintenance",
        }
    }
}

impl FromStr for BerthStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(BerthStatus::Available),
            "occupied" => Ok(BerthStatus::Occupied),
            "maintenance" => Ok(BerthStatus::Maintenance),
            _ => Err(ParseError::InvalidBerthStatus(s.to_string())),
        }
    }
}

/// Operation status state machine: planned -> in_progress -> completed | cancelled
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    Planned,
    InProgress,
    Completed,
    Cancelled,
}

impl OperationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationStatus::Planned => "planned",
            OperationStatus::InProgress => "in_progress",
            OperationStatus::Completed => "completed",
            OperationStatus::Cancelled => "cancelled",
        }
    }

    /// Whether the state machine permits moving to `next`
    pub fn can_transition_to(&self, next: OperationStatus) -> bool {
        matches!(
            (self, next),
            (OperationStatus::Planned, OperationStatus::InProgress)
                | (OperationStatus::Planned, OperationStatus::Cancelled)
                | (OperationStatus::InProgress, OperationStatus::Completed)
                | (OperationStatus::InProgress, OperationStatus::Cancelled)
        )
    }
}

impl FromStr for OperationStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planned" => Ok(OperationStatus::Planned),
            "in_progress" => Ok(OperationStatus::InProgress),
            "completed" => Ok(OperationStatus::Completed),
            "cancelled" => Ok(OperationStatus::Cancelled),
            _ => Err(ParseError::InvalidOperationStatus(s.to_string())),
        }
    }
}

/// Queue entry status: waiting -> in_service -> completed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Waiting,
    InService,
    Completed,
}

impl QueueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Waiting => "waiting",
            QueueStatus::InService => "in_service",
            QueueStatus::Completed => "completed",
        }
    }
}

impl FromStr for QueueStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(QueueStatus::Waiting),
            "in_service" => Ok(QueueStatus::InService),
            "completed" => Ok(QueueStatus::Completed),
            _ => Err(ParseError::InvalidQueueStatus(s.to_string())),
        }
    }
}

/// Berth model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Berth {
    pub berth_id: i32,
    pub berth_number: i32,
    pub status: BerthStatus,
    pub start_maintenance: Option<DateTime<Utc>>,
    pub end_maintenance: Option<DateTime<Utc>>,
    pub last_updated: DateTime<Utc>,
}

/// Vessel model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vessel {
    pub vessel_id: i32,
    pub vessel_name: String,
    pub vessel_type: String,
    /// 1 (low) to 3 (high)
    pub priority: i32,
    /// Estimated service duration in seconds
    pub estimated_duration: i32,
}

/// New vessel (for insertion, together with its queue and customs rows)
#[derive(Debug, Clone)]
pub struct NewVessel {
    pub vessel_name: String,
    pub vessel_type: String,
    pub priority: i32,
    pub estimated_duration: i32,
    pub customs_status: String,
    pub arrival_time: DateTime<Utc>,
}

/// Operation model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    pub operation_id: i32,
    pub vessel_id: i32,
    pub berth_id: i32,
    pub operation_type: String,
    pub planned_duration: Option<i32>,
    pub actual_duration: Option<i32>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: OperationStatus,
}

/// Vessel queue entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEntry {
    pub queue_id: i32,
    pub vessel_id: i32,
    pub arrival_time: DateTime<Utc>,
    pub service_start: Option<DateTime<Utc>>,
    pub service_end: Option<DateTime<Utc>>,
    /// Seconds spent waiting before service started
    pub waiting_time: Option<i32>,
    pub status: QueueStatus,
}

/// Customs clearance record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomsClearance {
    pub clearance_id: i32,
    pub vessel_id: i32,
    pub status: String,
    pub last_update: DateTime<Utc>,
}

/// Per-berth occupancy as served by `/api/v1/estado-cais`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BerthState {
    pub berth_id: i32,
    pub ocupado: bool,
    pub status: String,
}

/// Waiting vessel at the head of the queue, for berth allocation
#[derive(Debug, Clone)]
pub struct WaitingVessel {
    pub queue_id: i32,
    pub vessel_id: i32,
    pub vessel_name: String,
    pub vessel_type: String,
    pub priority: i32,
    pub estimated_duration: i32,
    pub arrival_time: DateTime<Utc>,
}

/// An operation whose planned duration has elapsed
#[derive(Debug, Clone)]
pub struct CompletedOperation {
    pub operation_id: i32,
    pub vessel_id: i32,
    pub berth_id: i32,
}

/// Aggregated operational statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortStats {
    pub waiting_vessels: i64,
    pub occupied_berths: i64,
    pub total_berths: i64,
    pub occupancy_percent: f64,
    pub efficiency_percent: Option<f64>,
}

/// Customs report row, joined with the vessel name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomsRow {
    pub vessel_name: String,
    pub status: String,
    pub last_update: DateTime<Utc>,
}

/// Berth schedule row for today's operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub berth_number: i32,
    pub vessel_name: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: OperationStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips() {
        for status in ["available", "occupied", "maintenance"] {
            assert_eq!(BerthStatus::from_str(status).unwrap().as_str(), status);
        }
        for status in ["planned", "in_progress", "completed", "cancelled"] {
            assert_eq!(OperationStatus::from_str(status).unwrap().as_str(), status);
        }
        for status in ["waiting", "in_service", "completed"] {
            assert_eq!(QueueStatus::from_str(status).unwrap().as_str(), status);
        }
    }

    #[test]
    fn unknown_statuses_are_rejected() {
        assert!(BerthStatus::from_str("docked").is_err());
        assert!(OperationStatus::from_str("paused").is_err());
        assert!(QueueStatus::from_str("queued").is_err());
    }

    #[test]
    fn operation_transitions_follow_the_state_machine() {
        use OperationStatus::*;

        assert!(Planned.can_transition_to(InProgress));
        assert!(Planned.can_transition_to(Cancelled));
        assert!(InProgress.can_transition_to(Completed));
        assert!(InProgress.can_transition_to(Cancelled));

        assert!(!Planned.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(InProgress));
        assert!(!Cancelled.can_transition_to(Planned));
        assert!(!InProgress.can_transition_to(Planned));
    }

    #[test]
    fn berth_state_serializes_with_wire_field_names() {
        let state = BerthState {
            berth_id: 1,
            ocupado: true,
            status: "occupied".to_string(),
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"berth_id": 1, "ocupado": true, "status": "occupied"})
        );
    }
}

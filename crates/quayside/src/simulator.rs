//! Port traffic simulator
//!
//! Background task that keeps the database lively for the dashboard and
//! the crane view: vessels arrive on an interval, waiting vessels get
//! allocated to free berths, and operations complete once their planned
//! duration has elapsed.

use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use tracing::{error, info};

use quayside_db::{Database, NewVessel};

use crate::config::SimulatorConfig;

/// Vessel type, priority and operation kind, with realistic weights
const VESSEL_TYPES: &[(&str, i32, &str)] = &[
    ("Cargueiro", 1, "import"),
    ("Porta-Container", 2, "import"),
    ("Tanker", 3, "import"),
    ("Bulk Carrier", 1, "export"),
    ("RoRo", 2, "export"),
    ("Frigorifico", 3, "import"),
];

const NAME_PREFIXES: &[&str] = &["MV", "MS", "MT", "SS"];

const NAMES: &[&str] = &[
    "Atlantic", "Pacific", "Mediterranean", "Baltic", "Nordic", "Iberian",
    "Phoenix", "Titan", "Neptune", "Poseidon", "Explorer", "Navigator",
];

/// Weighted customs status pool: mostly approved, some pending/review
const CUSTOMS_STATUSES: &[&str] = &[
    "approved", "approved", "approved", "approved", "approved",
    "pending", "pending", "pending",
    "under_review", "under_review",
];

/// Generate one arriving vessel. Service takes 45-120 s; arrival is
/// backdated up to two hours so waiting times look plausible.
fn generate_vessel(counter: u64) -> (NewVessel, &'static str) {
    let mut rng = rand::thread_rng();

    let (vessel_type, priority, operation_type) = VESSEL_TYPES[rng.gen_range(0..VESSEL_TYPES.len())];
    let prefix = NAME_PREFIXES[rng.gen_range(0..NAME_PREFIXES.len())];
    let name = NAMES[rng.gen_range(0..NAMES.len())];
    let customs_status = CUSTOMS_STATUSES[rng.gen_range(0..CUSTOMS_STATUSES.len())];

    let vessel = NewVessel {
        vessel_name: format!("{} {} {}", prefix, name, counter),
        vessel_type: vessel_type.to_string(),
        priority,
        estimated_duration: rng.gen_range(45..=120),
        customs_status: customs_status.to_string(),
        arrival_time: Utc::now() - chrono::Duration::minutes(rng.gen_range(5..=120)),
    };
    (vessel, operation_type)
}

/// Operation kind for an already-queued vessel, keyed off its type
fn operation_type_for(vessel_type: &str) -> &'static str {
    VESSEL_TYPES
        .iter()
        .find(|(t, _, _)| *t == vessel_type)
        .map(|(_, _, op)| *op)
        .unwrap_or("import")
}

/// Run the simulator until the server shuts down
pub async fn run(db: Database, config: SimulatorConfig) {
    let mut tick = tokio::time::interval(Duration::from_secs(config.tick_seconds.max(1)));
    let mut arrivals =
        tokio::time::interval(Duration::from_secs(config.new_vessel_interval_seconds.max(1)));
    let mut counter: u64 = 0;

    loop {
        tokio::select! {
            _ = arrivals.tick() => {
                counter += 1;
                let (vessel, _) = generate_vessel(counter);
                let name = vessel.vessel_name.clone();
                match db.insert_vessel(vessel).await {
                    Ok(vessel_id) => info!("Vessel {} arrived (id {})", name, vessel_id),
                    Err(e) => error!("Failed to insert vessel: {}", e),
                }
            }
            _ = tick.tick() => {
                if let Err(e) = step(&db).await {
                    error!("Simulator step failed: {}", e);
                }
            }
        }
    }
}

/// One allocation/completion pass
async fn step(db: &Database) -> Result<(), quayside_db::DbError> {
    // Complete whatever is due before handing out berths again.
    for done in db.complete_due_operations().await? {
        info!(
            "Operation {} completed, berth {} released",
            done.operation_id, done.berth_id
        );
    }

    // Allocate waiting vessels to free berths, highest priority first.
    while let Some(berth_id) = db.available_berth().await? {
        let Some(vessel) = db.next_waiting_vessel().await? else {
            break;
        };
        let operation_type = operation_type_for(&vessel.vessel_type);
        let operation_id = db.start_operation(&vessel, berth_id, operation_type).await?;
        info!(
            "Vessel {} berthed at {} ({} operation {})",
            vessel.vessel_name, berth_id, operation_type, operation_id
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_vessels_stay_within_bounds() {
        for i in 0..100 {
            let (vessel, operation_type) = generate_vessel(i);
            assert!((1..=3).contains(&vessel.priority));
            assert!((45..=120).contains(&vessel.estimated_duration));
            assert!(vessel.arrival_time <= Utc::now());
            assert!(["import", "export"].contains(&operation_type));
            assert!(vessel.vessel_name.ends_with(&i.to_string()));
        }
    }

    #[test]
    fn operation_type_matches_the_vessel_type_table() {
        assert_eq!(operation_type_for("Tanker"), "import");
        assert_eq!(operation_type_for("RoRo"), "export");
        // Unknown types fall back to import.
        assert_eq!(operation_type_for("Submarine"), "import");
    }
}

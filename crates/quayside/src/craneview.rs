//! Crane fleet view
//!
//! Polls the berth state endpoint on a fixed interval and drives the crane
//! state machines at their native 60 Hz clock in between, logging phase
//! transitions. A failed poll is logged and swallowed: cranes keep their
//! last known power state rather than flickering off.

use std::time::{Duration, Instant};

use anyhow::Result;
use serde::Deserialize;
use tracing::{info, warn};

use quayside_core::{BerthOccupancy, CraneFleet, PollBudget, poll_until};

use crate::config::Config;

/// Wire format of `GET /api/v1/estado-cais`
#[derive(Debug, Deserialize)]
struct BerthStateDto {
    berth_id: i32,
    ocupado: bool,
    #[allow(dead_code)]
    status: String,
}

async fn fetch_occupancy(
    client: &reqwest::Client,
    url: &str,
) -> Result<Vec<BerthOccupancy>, reqwest::Error> {
    let states: Vec<BerthStateDto> = client.get(url).send().await?.error_for_status()?.json().await?;
    Ok(states
        .into_iter()
        .map(|s| BerthOccupancy {
            berth_id: s.berth_id,
            occupied: s.ocupado,
        })
        .collect())
}

/// Run the crane view until interrupted
pub async fn run(config: Config, server: Option<String>) -> Result<()> {
    let base = server.unwrap_or(config.craneview.server_url);
    let url = format!("{}/api/v1/estado-cais", base.trim_end_matches('/'));
    let client = reqwest::Client::new();

    // First snapshot sizes the fleet; keep probing until the server is up.
    let snapshot = poll_until(PollBudget::default(), || fetch_occupancy(&client, &url))
        .await
        .map_err(|e| anyhow::anyhow!("berth state endpoint never became ready: {}", e))?;

    let mut fleet = CraneFleet::new(snapshot.len());
    fleet.apply_occupancy(snapshot);
    info!("Crane view started with {} cranes", fleet.len());

    let poll_interval = Duration::from_secs(config.craneview.poll_interval_seconds.max(1));
    let mut poll = tokio::time::interval(poll_interval);
    poll.tick().await; // first tick fires immediately; we already have a snapshot

    let mut frame = tokio::time::interval(Duration::from_millis(50));
    let mut last = Instant::now();

    loop {
        tokio::select! {
            _ = frame.tick() => {
                let now = Instant::now();
                for transition in fleet.advance(now - last) {
                    info!(
                        "crane {} -> {}",
                        transition.crane,
                        transition.phase.as_str()
                    );
                }
                last = now;
            }
            _ = poll.tick() => {
                match fetch_occupancy(&client, &url).await {
                    Ok(snapshot) => fleet.apply_occupancy(snapshot),
                    // Degrade to last known state; no state is inferred
                    // from the absence of data.
                    Err(e) => warn!("occupancy poll failed: {}", e),
                }
            }
        }
    }
}

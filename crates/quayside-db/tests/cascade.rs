//! Integration tests against a live PostgreSQL instance.
//!
//! Run with `DATABASE_URL` pointing at a scratch database:
//! `DATABASE_URL=postgres://... cargo test -p quayside-db -- --ignored`

use chrono::Utc;
use quayside_db::{Database, NewVessel};

async fn connect() -> Database {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for this test");
    Database::new(&url).await.expect("database connection")
}

fn test_vessel(name: &str) -> NewVessel {
    NewVessel {
        vessel_name: name.to_string(),
        vessel_type: "Cargueiro".to_string(),
        priority: 2,
        estimated_duration: 60,
        customs_status: "pending".to_string(),
        arrival_time: Utc::now(),
    }
}

async fn count(db: &Database, query: &str, vessel_id: i32) -> i64 {
    sqlx::query_scalar(query)
        .bind(vessel_id)
        .fetch_one(db.pool())
        .await
        .unwrap()
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn deleting_a_vessel_cascades_to_dependents_but_not_berths() {
    let db = connect().await;
    db.seed_berths(4).await.unwrap();

    let berths_before: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM berths")
        .fetch_one(db.pool())
        .await
        .unwrap();

    let vessel_id = db.insert_vessel(test_vessel("MV Cascade Test")).await.unwrap();

    assert_eq!(
        count(&db, "SELECT COUNT(*) FROM vessel_queue WHERE vessel_id = $1", vessel_id).await,
        1
    );
    assert_eq!(
        count(&db, "SELECT COUNT(*) FROM customs_clearance WHERE vessel_id = $1", vessel_id).await,
        1
    );

    // Put the vessel into service so an operation row exists too.
    let waiting = db.next_waiting_vessel().await.unwrap().expect("queued vessel");
    let berth_id = db.available_berth().await.unwrap().expect("free berth");
    db.start_operation(&waiting, berth_id, "import").await.unwrap();
    assert_eq!(
        count(&db, "SELECT COUNT(*) FROM operations WHERE vessel_id = $1", vessel_id).await,
        1
    );

    db.delete_vessel(vessel_id).await.unwrap();

    assert_eq!(
        count(&db, "SELECT COUNT(*) FROM operations WHERE vessel_id = $1", vessel_id).await,
        0
    );
    assert_eq!(
        count(&db, "SELECT COUNT(*) FROM vessel_queue WHERE vessel_id = $1", vessel_id).await,
        0
    );
    assert_eq!(
        count(&db, "SELECT COUNT(*) FROM customs_clearance WHERE vessel_id = $1", vessel_id).await,
        0
    );

    let berths_after: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM berths")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(berths_before, berths_after);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn berth_states_come_back_ordered_by_berth_id() {
    let db = connect().await;
    db.seed_berths(4).await.unwrap();

    let states = db.berth_states().await.unwrap();
    let ids: Vec<i32> = states.iter().map(|s| s.berth_id).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
}

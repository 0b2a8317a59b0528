//! Database repository implementation

use std::str::FromStr;

use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::info;

use crate::error::DbError;
use crate::models::*;

/// Database connection and operations
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection and run migrations
    pub async fn new(database_url: &str) -> Result<Self, DbError> {
        info!("Connecting to database");

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Get the underlying pool for advanced usage
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<(), DbError> {
        info!("Running database migrations");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS berths (
                berth_id SERIAL PRIMARY KEY,
                berth_number INTEGER NOT NULL UNIQUE,
                status TEXT NOT NULL DEFAULT 'available'
                    CHECK (status IN ('available', 'occupied', 'maintenance')),
                start_maintenance TIMESTAMPTZ,
                end_maintenance TIMESTAMPTZ,
                last_updated TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS vessels (
                vessel_id SERIAL PRIMARY KEY,
                vessel_name TEXT NOT NULL,
                vessel_type TEXT NOT NULL,
                priority INTEGER NOT NULL CHECK (priority BETWEEN 1 AND 3),
                estimated_duration INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS operations (
                operation_id SERIAL PRIMARY KEY,
                vessel_id INTEGER NOT NULL
                    REFERENCES vessels(vessel_id) ON DELETE CASCADE,
                berth_id INTEGER NOT NULL REFERENCES berths(berth_id),
                operation_type TEXT NOT NULL,
                planned_duration INTEGER,
                actual_duration INTEGER,
                start_time TIMESTAMPTZ,
                end_time TIMESTAMPTZ,
                status TEXT NOT NULL DEFAULT 'planned'
                    CHECK (status IN ('planned', 'in_progress', 'completed', 'cancelled'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS vessel_queue (
                queue_id SERIAL PRIMARY KEY,
                vessel_id INTEGER NOT NULL
                    REFERENCES vessels(vessel_id) ON DELETE CASCADE,
                arrival_time TIMESTAMPTZ NOT NULL,
                service_start TIMESTAMPTZ,
                service_end TIMESTAMPTZ,
                waiting_time INTEGER,
                status TEXT NOT NULL DEFAULT 'waiting'
                    CHECK (status IN ('waiting', 'in_service', 'completed'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS customs_clearance (
                clearance_id SERIAL PRIMARY KEY,
                vessel_id INTEGER NOT NULL
                    REFERENCES vessels(vessel_id) ON DELETE CASCADE,
                status TEXT NOT NULL,
                last_update TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_operations_start_time ON operations(start_time)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_vessel_queue_status ON vessel_queue(status)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE OR REPLACE VIEW v_operational_efficiency AS
            SELECT
                now() AS "timestamp",
                (ROUND(
                    100.0 * COUNT(*) FILTER (WHERE status = 'completed')
                    / NULLIF(COUNT(*), 0), 2
                ))::float8 AS efficiency_percent
            FROM operations
            WHERE start_time >= now() - INTERVAL '24 hours'
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("Database migrations completed");
        Ok(())
    }

    // ==================== Berth Operations ====================

    /// Seed `count` available berths if the table is empty
    pub async fn seed_berths(&self, count: i32) -> Result<(), DbError> {
        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM berths")
            .fetch_one(&self.pool)
            .await?;
        if existing > 0 {
            return Ok(());
        }

        info!("Seeding {} berths", count);
        for number in 1..=count {
            sqlx::query("INSERT INTO berths (berth_number, status) VALUES ($1, 'available')")
                .bind(number)
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    /// Current occupancy per berth, ordered by berth id
    pub async fn berth_states(&self) -> Result<Vec<BerthState>, DbError> {
        let rows = sqlx::query("SELECT berth_id, status FROM berths ORDER BY berth_id")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| {
                let status: String = row.try_get("status")?;
                Ok(BerthState {
                    berth_id: row.try_get("berth_id")?,
                    ocupado: status == "occupied",
                    status,
                })
            })
            .collect()
    }

    /// Get all berths
    pub async fn berths(&self) -> Result<Vec<Berth>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT berth_id, berth_number, status, start_maintenance, end_maintenance, last_updated
            FROM berths
            ORDER BY berth_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let status: String = row.try_get("status")?;
                Ok(Berth {
                    berth_id: row.try_get("berth_id")?,
                    berth_number: row.try_get("berth_number")?,
                    status: BerthStatus::from_str(&status)?,
                    start_maintenance: row.try_get("start_maintenance")?,
                    end_maintenance: row.try_get("end_maintenance")?,
                    last_updated: row.try_get("last_updated")?,
                })
            })
            .collect()
    }

    /// First available berth, lowest id first
    pub async fn available_berth(&self) -> Result<Option<i32>, DbError> {
        let berth_id = sqlx::query_scalar(
            "SELECT berth_id FROM berths WHERE status = 'available' ORDER BY berth_id LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(berth_id)
    }

    // ==================== Vessel Operations ====================

    /// Insert a vessel together with its queue entry and customs record
    pub async fn insert_vessel(&self, vessel: NewVessel) -> Result<i32, DbError> {
        let mut tx = self.pool.begin().await?;

        let vessel_id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO vessels (vessel_name, vessel_type, priority, estimated_duration)
            VALUES ($1, $2, $3, $4)
            RETURNING vessel_id
            "#,
        )
        .bind(&vessel.vessel_name)
        .bind(&vessel.vessel_type)
        .bind(vessel.priority)
        .bind(vessel.estimated_duration)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO customs_clearance (vessel_id, status, last_update) VALUES ($1, $2, $3)",
        )
        .bind(vessel_id)
        .bind(&vessel.customs_status)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO vessel_queue (vessel_id, arrival_time) VALUES ($1, $2)")
            .bind(vessel_id)
            .bind(vessel.arrival_time)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(vessel_id)
    }

    /// Delete a vessel; its operations, queue entries and customs rows
    /// go with it (cascade). Berths are never touched.
    pub async fn delete_vessel(&self, vessel_id: i32) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM vessels WHERE vessel_id = $1")
            .bind(vessel_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("vessel {}", vessel_id)));
        }
        Ok(())
    }

    /// Highest-priority, longest-waiting vessel still in the queue
    pub async fn next_waiting_vessel(&self) -> Result<Option<WaitingVessel>, DbError> {
        let row = sqlx::query(
            r#"
            SELECT q.queue_id, v.vessel_id, v.vessel_name, v.vessel_type,
                   v.priority, v.estimated_duration, q.arrival_time
            FROM vessel_queue q
            JOIN vessels v ON q.vessel_id = v.vessel_id
            WHERE q.status = 'waiting'
            ORDER BY v.priority DESC, q.arrival_time ASC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(WaitingVessel {
                queue_id: row.try_get("queue_id")?,
                vessel_id: row.try_get("vessel_id")?,
                vessel_name: row.try_get("vessel_name")?,
                vessel_type: row.try_get("vessel_type")?,
                priority: row.try_get("priority")?,
                estimated_duration: row.try_get("estimated_duration")?,
                arrival_time: row.try_get("arrival_time")?,
            })
        })
        .transpose()
    }

    // ==================== Operation Lifecycle ====================

    /// Move a waiting vessel into service on a berth.
    ///
    /// Creates an in-progress operation, marks the berth occupied and the
    /// queue entry in-service, recording the waiting time.
    pub async fn start_operation(
        &self,
        vessel: &WaitingVessel,
        berth_id: i32,
        operation_type: &str,
    ) -> Result<i32, DbError> {
        let mut tx = self.pool.begin().await?;

        let operation_id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO operations
                (vessel_id, berth_id, operation_type, planned_duration, start_time, status)
            VALUES ($1, $2, $3, $4, now(), 'in_progress')
            RETURNING operation_id
            "#,
        )
        .bind(vessel.vessel_id)
        .bind(berth_id)
        .bind(operation_type)
        .bind(vessel.estimated_duration)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE berths SET status = 'occupied', last_updated = now() WHERE berth_id = $1",
        )
        .bind(berth_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE vessel_queue
            SET status = 'in_service',
                service_start = now(),
                waiting_time = EXTRACT(EPOCH FROM now() - arrival_time)::int
            WHERE queue_id = $1
            "#,
        )
        .bind(vessel.queue_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(operation_id)
    }

    /// Complete every in-progress operation whose planned duration has
    /// elapsed. Frees the berth, closes the queue entry and approves the
    /// customs record for each.
    pub async fn complete_due_operations(&self) -> Result<Vec<CompletedOperation>, DbError> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query(
            r#"
            UPDATE operations
            SET status = 'completed',
                end_time = now(),
                actual_duration = EXTRACT(EPOCH FROM now() - start_time)::int
            WHERE status = 'in_progress'
              AND now() - start_time >= planned_duration * INTERVAL '1 second'
            RETURNING operation_id, vessel_id, berth_id
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        let mut completed = Vec::with_capacity(rows.len());
        for row in rows {
            let op = CompletedOperation {
                operation_id: row.try_get("operation_id")?,
                vessel_id: row.try_get("vessel_id")?,
                berth_id: row.try_get("berth_id")?,
            };

            sqlx::query(
                "UPDATE berths SET status = 'available', last_updated = now() WHERE berth_id = $1",
            )
            .bind(op.berth_id)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                r#"
                UPDATE vessel_queue
                SET status = 'completed', service_end = now()
                WHERE vessel_id = $1 AND status = 'in_service'
                "#,
            )
            .bind(op.vessel_id)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                r#"
                UPDATE customs_clearance
                SET status = 'approved', last_update = now()
                WHERE vessel_id = $1 AND status <> 'approved'
                "#,
            )
            .bind(op.vessel_id)
            .execute(&mut *tx)
            .await?;

            completed.push(op);
        }

        tx.commit().await?;
        Ok(completed)
    }

    // ==================== Reporting ====================

    /// Aggregated queue/berth/efficiency statistics
    pub async fn port_stats(&self) -> Result<PortStats, DbError> {
        let waiting_vessels: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM vessel_queue WHERE status = 'waiting'")
                .fetch_one(&self.pool)
                .await?;

        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE status = 'occupied') AS occupied
            FROM berths
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        let total_berths: i64 = row.try_get("total")?;
        let occupied_berths: i64 = row.try_get("occupied")?;

        let occupancy_percent = if total_berths > 0 {
            occupied_berths as f64 * 100.0 / total_berths as f64
        } else {
            0.0
        };

        let efficiency_percent: Option<f64> =
            sqlx::query_scalar("SELECT efficiency_percent FROM v_operational_efficiency")
                .fetch_optional(&self.pool)
                .await?
                .flatten();

        Ok(PortStats {
            waiting_vessels,
            occupied_berths,
            total_berths,
            occupancy_percent,
            efficiency_percent,
        })
    }

    /// Most recent customs clearance states, joined with vessel names
    pub async fn customs_report(&self, limit: i64) -> Result<Vec<CustomsRow>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT v.vessel_name, c.status, c.last_update
            FROM customs_clearance c
            JOIN vessels v ON c.vessel_id = v.vessel_id
            ORDER BY c.last_update DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(CustomsRow {
                    vessel_name: row.try_get("vessel_name")?,
                    status: row.try_get("status")?,
                    last_update: row.try_get("last_update")?,
                })
            })
            .collect()
    }

    /// Today's operations per berth, ordered by berth then start time
    pub async fn berth_schedule(&self) -> Result<Vec<ScheduleRow>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT b.berth_number, v.vessel_name, o.start_time, o.end_time, o.status
            FROM operations o
            JOIN berths b ON o.berth_id = b.berth_id
            JOIN vessels v ON o.vessel_id = v.vessel_id
            WHERE o.start_time >= CURRENT_DATE
            ORDER BY b.berth_number, o.start_time
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let status: String = row.try_get("status")?;
                Ok(ScheduleRow {
                    berth_number: row.try_get("berth_number")?,
                    vessel_name: row.try_get("vessel_name")?,
                    start_time: row.try_get("start_time")?,
                    end_time: row.try_get("end_time")?,
                    status: OperationStatus::from_str(&status)?,
                })
            })
            .collect()
    }
}

//! Quayside Database Layer
//!
//! This crate provides the PostgreSQL persistence layer for the port
//! monitor, using sqlx. It owns the schema (berths, vessels, operations,
//! queue, customs) and the operational queries the API and the simulator
//! run against it.

pub mod error;
pub mod models;
pub mod repository;

pub use error::DbError;
pub use models::*;
pub use repository::Database;

/// Re-export sqlx types for convenience
pub use sqlx::PgPool;

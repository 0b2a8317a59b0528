//! Database error types

use thiserror::Error;

use crate::models::ParseError;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Invalid stored value: {0}")]
    Parse(#[from] ParseError),

    #[error("Migration error: {0}")]
    Migration(String),
}

//! Quayside Grafana Provisioning
//!
//! This crate provides the client for the Grafana HTTP API and the
//! idempotent provisioning workflow that binds the port dashboard to the
//! PostgreSQL datasource.

pub mod client;
pub mod error;
pub mod provision;

pub use client::{GrafanaClient, GrafanaClientConfig, read_token_file};
pub use error::{GrafanaError, ProvisionError};
pub use provision::{ProvisionOutcome, Provisioner, ProvisionerSettings};

//! Quayside - port operations monitor
//!
//! One binary, three jobs: `serve` runs the HTTP API (optionally with the
//! port traffic simulator), `provision` binds the Grafana dashboard to the
//! PostgreSQL datasource, `craneview` animates the quay cranes against the
//! live berth state.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;
mod craneview;
mod simulator;

use config::Config;
use metrics_exporter_prometheus::PrometheusBuilder;
use quayside_api::{AppState, MetricsHandle, create_router};
use quayside_db::Database;
use quayside_grafana::{GrafanaClient, GrafanaClientConfig, Provisioner, ProvisionerSettings, read_token_file};

/// Quayside - port operations monitor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API server (and the simulator, if enabled)
    Serve {
        /// Bind address
        #[arg(long, env = "QUAYSIDE_BIND")]
        bind: Option<String>,

        /// Port
        #[arg(short, long, env = "QUAYSIDE_PORT")]
        port: Option<u16>,
    },
    /// Provision the Grafana dashboard (exit 0 on success, 1 on failure)
    Provision,
    /// Poll berth occupancy and animate the crane fleet
    Craneview {
        /// Server base URL to poll
        #[arg(long, env = "QUAYSIDE_SERVER")]
        server: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load(&args.config)?;

    init_logging(&config.logging.level);

    match args.command {
        Command::Serve { bind, port } => serve(config, bind, port).await,
        Command::Provision => provision(config).await,
        Command::Craneview { server } => craneview::run(config, server).await,
    }
}

/// Run the API server
async fn serve(config: Config, bind: Option<String>, port: Option<u16>) -> Result<()> {
    info!("Starting Quayside v{}", env!("CARGO_PKG_VERSION"));

    let db = Database::new(&config.database.url).await?;
    db.seed_berths(config.simulator.berths).await?;

    if config.simulator.enabled {
        info!("Starting port traffic simulator");
        tokio::spawn(simulator::run(db.clone(), config.simulator.clone()));
    }

    let metrics_handle = PrometheusBuilder::new()
        .install_recorder()
        .map(|handle| Arc::new(MetricsHandle::new(handle)))
        .ok();

    let state = AppState::new(db);
    let app = create_router(state, metrics_handle).layer(TraceLayer::new_for_http());

    let bind_addr = bind.unwrap_or(config.server.bind_address);
    let port = port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind_addr, port).parse()?;

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Run the provisioning workflow once
async fn provision(config: Config) -> Result<()> {
    let token = read_token_file(&config.grafana.token_file)?;
    let client = GrafanaClient::new(GrafanaClientConfig {
        url: config.grafana.url.clone(),
        token,
    })?;

    let settings = ProvisionerSettings::new(
        config.grafana.datasource_uid.clone(),
        config.grafana.dashboard_uid.clone(),
    );

    match Provisioner::new(client, settings).run().await {
        Ok(outcome) => {
            info!(
                "Provisioning complete: {} panels, {} targets bound to {}",
                outcome.report.panel_count(),
                outcome.report.target_count(),
                config.grafana.datasource_uid
            );
            Ok(())
        }
        Err(e) => {
            error!("Provisioning failed: {}", e);
            std::process::exit(1);
        }
    }
}

/// Initialize logging
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    info!("Shutdown signal received");
}

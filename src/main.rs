//! Inventory Service entry point
//!
//! Startup order: config, logging, database (retrying until reachable or
//! shut down), schema, parameter client, gateway.

use std::sync::Arc;

use inventory_service::config::AppConfig;
use inventory_service::db::{ConnectError, Database};
use inventory_service::gateway::{self, state::AppState};
use inventory_service::params::ParamClient;
use inventory_service::{logging, store};
use tokio::sync::watch;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let mut app_config = AppConfig::load(&env);
    if let Some(port) = get_port_override() {
        app_config.gateway.port = port;
    }
    let _log_guard = logging::init_logging(&app_config);

    tracing::info!("Starting inventory service in {} mode", env);

    // Ctrl-C flips the shutdown signal; the connect loop watches it so a
    // process stuck waiting for the database can still exit cleanly.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    let db = match Database::connect_with_retry(&app_config.database, shutdown_rx).await {
        Ok(db) => Arc::new(db),
        Err(ConnectError::Shutdown) => {
            tracing::info!("Shut down before the database became reachable");
            return Ok(());
        }
    };

    store::schema::init_schema(db.pool()).await?;

    let params = Arc::new(ParamClient::new(&app_config.parameter_service)?);
    let state = Arc::new(AppState::new(db, params));

    gateway::serve(&app_config.gateway, state).await
}

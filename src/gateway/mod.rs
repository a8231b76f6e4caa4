//! REST gateway
//!
//! Thin request/response plumbing over the store and parameter client.

pub mod handlers;
pub mod state;
pub mod types;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::GatewayConfig;
use state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/customers/{id}", get(handlers::get_customer))
        .route("/api/v1/customers/{id}/charge", post(handlers::charge_customer))
        .route("/api/v1/users/{id}", get(handlers::get_user))
        .route("/api/v1/warehouses/{id}", get(handlers::get_warehouse))
        .route("/api/v1/products/{id}", get(handlers::get_product))
        .route(
            "/api/v1/stock/{warehouse_id}/{product_id}",
            get(handlers::get_stock_level),
        )
        .route(
            "/api/v1/stock/{warehouse_id}/{product_id}/movements",
            get(handlers::get_movement_history),
        )
        .route("/api/v1/stock/adjust", post(handlers::adjust_stock))
        .route("/api/v1/stock/movements", post(handlers::apply_movements))
        .route("/api/v1/stock/transfer", post(handlers::transfer_stock))
        .route("/api/v1/parameters/{name}", get(handlers::get_parameter))
        .with_state(state)
}

/// Bind the gateway listener and serve until the process exits.
pub async fn serve(config: &GatewayConfig, state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Gateway listening on {}", addr);

    let router = build_router(state);
    axum::serve(listener, router).await?;
    Ok(())
}

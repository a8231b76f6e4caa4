use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use std::sync::Arc;

use super::state::AppState;
use super::types::{
    AdjustStockResponse, BatchMovementRequest, ChargeCustomerRequest, ChargeCustomerResponse,
    ErrorResponse, ParameterResponse, StockLevelResponse, TransferStockRequest,
    TransferStockResponse,
};
use crate::inventory::{InventoryError, MovementLine, MovementReport};
use crate::inventory::models::{Customer, Product, StockMovement, User, Warehouse};
use crate::params::CallError;
use crate::store::StoreError;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn store_error(e: StoreError) -> ApiError {
    match e {
        StoreError::NotFound { entity } => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("NOT_FOUND", format!("{} not found", entity))),
        ),
        StoreError::LockTimeout => (
            StatusCode::CONFLICT,
            Json(ErrorResponse::new(
                "LOCK_TIMEOUT",
                "record is locked by another operation, try again",
            )),
        ),
        StoreError::TransactionState(msg) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("TRANSACTION_STATE", msg)),
        ),
        StoreError::Database(e) => {
            tracing::error!(error = %e, "database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("DATABASE_ERROR", "internal database error")),
            )
        }
    }
}

fn inventory_error(e: InventoryError) -> ApiError {
    match e {
        InventoryError::Store(e) => store_error(e),
        InventoryError::InsufficientStock { .. }
        | InventoryError::CreditLimitExceeded
        | InventoryError::CustomerDisabled => (
            StatusCode::CONFLICT,
            Json(ErrorResponse::new("CONFLICT", e.to_string())),
        ),
        InventoryError::InvalidQuantity | InventoryError::SameWarehouse => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("INVALID_PARAMETER", e.to_string())),
        ),
    }
}

fn call_error(e: CallError) -> ApiError {
    match e {
        CallError::Connectivity(msg) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::new("SERVICE_UNAVAILABLE", msg)),
        ),
        CallError::UpstreamServer { status } => (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse::new(
                "UPSTREAM_ERROR",
                format!("parameter service returned status {}", status),
            )),
        ),
        CallError::UpstreamClient { status } => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_REQUEST),
            Json(ErrorResponse::new(
                "UPSTREAM_CLIENT_ERROR",
                format!("parameter service returned status {}", status),
            )),
        ),
        CallError::Serialization(e) => (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse::new("UPSTREAM_ERROR", e.to_string())),
        ),
        CallError::InvalidMethod(m) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("INVALID_METHOD", m)),
        ),
    }
}

/// GET /api/v1/customers/{id}
pub async fn get_customer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Customer>, ApiError> {
    let customer = state.customers.find_by_key(&id).await.map_err(store_error)?;
    Ok(Json(customer))
}

/// GET /api/v1/users/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    let user = state.users.find_by_key(&id).await.map_err(store_error)?;
    Ok(Json(user))
}

/// GET /api/v1/warehouses/{id}
pub async fn get_warehouse(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Warehouse>, ApiError> {
    let warehouse = state.warehouses.find_by_key(&id).await.map_err(store_error)?;
    Ok(Json(warehouse))
}

/// GET /api/v1/products/{id}
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Product>, ApiError> {
    let product = state.products.find_by_key(&id).await.map_err(store_error)?;
    Ok(Json(product))
}

/// GET /api/v1/stock/{warehouse_id}/{product_id}
pub async fn get_stock_level(
    State(state): State<Arc<AppState>>,
    Path((warehouse_id, product_id)): Path<(i64, i64)>,
) -> Result<Json<StockLevelResponse>, ApiError> {
    let quantity: Option<Decimal> = sqlx::query_scalar(
        "SELECT quantity FROM stock_levels WHERE warehouse_id = $1 AND product_id = $2",
    )
    .bind(warehouse_id)
    .bind(product_id)
    .fetch_optional(state.db.pool())
    .await
    .map_err(|e| store_error(StoreError::from(e)))?;

    Ok(Json(StockLevelResponse {
        warehouse_id,
        product_id,
        quantity: quantity.unwrap_or(Decimal::ZERO),
    }))
}

/// GET /api/v1/stock/{warehouse_id}/{product_id}/movements
pub async fn get_movement_history(
    State(state): State<Arc<AppState>>,
    Path((warehouse_id, product_id)): Path<(i64, i64)>,
) -> Result<Json<Vec<StockMovement>>, ApiError> {
    let movements = state
        .stock
        .movement_history(warehouse_id, product_id)
        .await
        .map_err(inventory_error)?;

    Ok(Json(movements))
}

/// POST /api/v1/stock/adjust
pub async fn adjust_stock(
    State(state): State<Arc<AppState>>,
    Json(line): Json<MovementLine>,
) -> Result<(StatusCode, Json<AdjustStockResponse>), ApiError> {
    let movement_id = state
        .stock
        .adjust_stock(line)
        .await
        .map_err(inventory_error)?;

    Ok((StatusCode::CREATED, Json(AdjustStockResponse { movement_id })))
}

/// POST /api/v1/stock/movements
pub async fn apply_movements(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BatchMovementRequest>,
) -> Result<Json<MovementReport>, ApiError> {
    let report = state
        .stock
        .apply_movements(req.movements)
        .await
        .map_err(inventory_error)?;

    Ok(Json(report))
}

/// POST /api/v1/stock/transfer
pub async fn transfer_stock(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TransferStockRequest>,
) -> Result<(StatusCode, Json<TransferStockResponse>), ApiError> {
    let (out_movement_id, in_movement_id) = state
        .stock
        .transfer_stock(
            req.from_warehouse_id,
            req.to_warehouse_id,
            req.product_id,
            req.quantity,
        )
        .await
        .map_err(inventory_error)?;

    Ok((
        StatusCode::CREATED,
        Json(TransferStockResponse {
            out_movement_id,
            in_movement_id,
        }),
    ))
}

/// POST /api/v1/customers/{id}/charge
pub async fn charge_customer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<ChargeCustomerRequest>,
) -> Result<Json<ChargeCustomerResponse>, ApiError> {
    let balance = state
        .stock
        .charge_customer(id, req.amount)
        .await
        .map_err(inventory_error)?;

    Ok(Json(ChargeCustomerResponse {
        customer_id: id,
        balance,
    }))
}

/// GET /api/v1/parameters/{name}
pub async fn get_parameter(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<ParameterResponse>, ApiError> {
    let value = state
        .params
        .parameter_value(&name)
        .await
        .map_err(call_error)?;

    Ok(Json(ParameterResponse { name, value }))
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    state.db.health_check().await.map_err(|e| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::new("UNHEALTHY", e.to_string())),
        )
    })?;
    Ok(StatusCode::OK)
}

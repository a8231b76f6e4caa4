//! Request/response DTOs for the REST surface

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BatchMovementRequest {
    pub movements: Vec<crate::inventory::MovementLine>,
}

#[derive(Debug, Deserialize)]
pub struct TransferStockRequest {
    pub from_warehouse_id: i64,
    pub to_warehouse_id: i64,
    pub product_id: i64,
    pub quantity: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct ChargeCustomerRequest {
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct AdjustStockResponse {
    pub movement_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct TransferStockResponse {
    pub out_movement_id: Uuid,
    pub in_movement_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ChargeCustomerResponse {
    pub customer_id: i64,
    pub balance: Decimal,
}

#[derive(Debug, Serialize)]
pub struct ParameterResponse {
    pub name: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct StockLevelResponse {
    pub warehouse_id: i64,
    pub product_id: i64,
    pub quantity: Decimal,
}

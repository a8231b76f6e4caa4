//! Data models for inventory and financial records

use crate::store::Record;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// Record status stored as SMALLINT
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i16)]
pub enum RecordStatus {
    Disabled = 0,
    Active = 1,
}

impl From<i16> for RecordStatus {
    fn from(v: i16) -> Self {
        match v {
            0 => RecordStatus::Disabled,
            _ => RecordStatus::Active,
        }
    }
}

/// Customer account with a running balance against a credit limit
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Customer {
    pub customer_id: i64,
    pub name: String,
    pub email: Option<String>,
    pub credit_limit: Decimal,
    pub balance: Decimal,
    pub status: i16,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn is_active(&self) -> bool {
        RecordStatus::from(self.status) == RecordStatus::Active
    }
}

/// Operator account
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub user_id: i64,
    pub username: String,
    pub email: Option<String>,
    pub status: i16,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Warehouse {
    pub warehouse_id: i64,
    pub code: String,
    pub name: String,
    pub status: i16,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub product_id: i64,
    pub sku: String,
    pub name: String,
    pub unit_price: Decimal,
    pub status: i16,
    pub created_at: DateTime<Utc>,
}

/// Append-only journal row for one inventory mutation, written in the same
/// transaction as the stock level change it describes.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StockMovement {
    pub movement_id: Uuid,
    pub warehouse_id: i64,
    pub product_id: i64,
    pub quantity: Decimal,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl Record for Customer {
    type Key = i64;
    const TABLE: &'static str = "customers";
    const KEY_COLUMN: &'static str = "customer_id";
    const COLUMNS: &'static str =
        "customer_id, name, email, credit_limit, balance, status, created_at";
}

impl Record for User {
    type Key = i64;
    const TABLE: &'static str = "users";
    const KEY_COLUMN: &'static str = "user_id";
    const COLUMNS: &'static str = "user_id, username, email, status, created_at";
}

impl Record for Warehouse {
    type Key = i64;
    const TABLE: &'static str = "warehouses";
    const KEY_COLUMN: &'static str = "warehouse_id";
    const COLUMNS: &'static str = "warehouse_id, code, name, status, created_at";
}

impl Record for Product {
    type Key = i64;
    const TABLE: &'static str = "products";
    const KEY_COLUMN: &'static str = "product_id";
    const COLUMNS: &'static str = "product_id, sku, name, unit_price, status, created_at";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_status_from_i16() {
        assert_eq!(RecordStatus::from(0), RecordStatus::Disabled);
        assert_eq!(RecordStatus::from(1), RecordStatus::Active);
        assert_eq!(RecordStatus::from(99), RecordStatus::Active); // default to Active
    }

    #[test]
    fn test_record_metadata() {
        assert_eq!(Customer::TABLE, "customers");
        assert_eq!(Customer::KEY_COLUMN, "customer_id");
        assert_eq!(Warehouse::TABLE, "warehouses");
        assert_eq!(Product::KEY_COLUMN, "product_id");
        assert_eq!(User::KEY_COLUMN, "user_id");
    }
}

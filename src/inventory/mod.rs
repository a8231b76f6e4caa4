//! Inventory and financial records
//!
//! PostgreSQL-backed entities (customers, users, warehouses, products) and
//! the stock mutation service built on the lock-aware store.

pub mod models;
pub mod service;

pub use models::{Customer, Product, RecordStatus, StockMovement, User, Warehouse};
pub use service::{InventoryError, MovementLine, MovementReport, StockService};

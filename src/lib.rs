//! Inventory Service
//!
//! Backend for shared, concurrently-mutated inventory and financial records
//! (customers, users, warehouses, products, stock movements) behind a REST
//! API, with resilient calls to an external parameter service.
//!
//! # Modules
//!
//! - [`config`] - YAML application configuration
//! - [`logging`] - tracing subscriber setup
//! - [`db`] - connection pool and retrying establishment
//! - [`store`] - unit of work with nested savepoints, lock-aware repository
//! - [`inventory`] - entity models and stock/balance operations
//! - [`params`] - circuit-broken client for the parameter service
//! - [`gateway`] - axum REST surface

pub mod config;
pub mod db;
pub mod gateway;
pub mod inventory;
pub mod logging;
pub mod params;
pub mod store;

// Convenient re-exports at crate root
pub use config::AppConfig;
pub use db::{ConnectError, Database};
pub use inventory::{InventoryError, MovementLine, StockService};
pub use params::{BreakerState, CallError, CircuitBreaker, ParamClient};
pub use store::{LockingRepo, Record, StoreError, UnitOfWork};

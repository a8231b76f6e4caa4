//! Concurrency-safe persistence layer
//!
//! Transactions with nested savepoints ([`UnitOfWork`]), a generic lock-aware
//! repository ([`LockingRepo`]), and schema setup.

pub mod error;
pub mod repository;
pub mod schema;
pub mod unit;

pub use error::StoreError;
pub use repository::{LockingRepo, Record};
pub use unit::UnitOfWork;

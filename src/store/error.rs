use thiserror::Error;

/// PostgreSQL SQLSTATE for `lock_not_available`, raised when a row-lock wait
/// exceeds `lock_timeout`.
const LOCK_NOT_AVAILABLE: &str = "55P03";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("transaction state error: {0}")]
    TransactionState(&'static str),

    #[error("row lock wait timed out")]
    LockTimeout,

    /// Driver-level errors pass through unmodified, including schema errors
    /// such as a missing table.
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.code().as_deref() == Some(LOCK_NOT_AVAILABLE) {
                return StoreError::LockTimeout;
            }
        }
        StoreError::Database(e)
    }
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

//! Generic lock-aware repository
//!
//! One repository shape serves every entity that needs concurrency control:
//! a plain read, and a read that takes an exclusive row lock scoped to the
//! caller's [`UnitOfWork`]. Entities describe themselves to the repository
//! through the [`Record`] trait instead of duplicating the pattern per type.

use crate::db::Database;
use crate::store::error::StoreError;
use crate::store::unit::UnitOfWork;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres};
use std::marker::PhantomData;

/// A persisted entity the generic repository can load by primary key.
pub trait Record: for<'r> FromRow<'r, PgRow> + Send + Unpin {
    /// Primary key type, bound as `$1` in the lookup queries.
    type Key: for<'q> sqlx::Encode<'q, Postgres> + sqlx::Type<Postgres> + Sync;

    const TABLE: &'static str;
    const KEY_COLUMN: &'static str;
    /// Comma-separated column list for SELECT.
    const COLUMNS: &'static str;
}

/// Repository bound to a connection pool, parameterized per entity.
///
/// Cloning is cheap and yields an independent handle to the same pool, for
/// callers that need their own repository reference without re-resolving the
/// connection.
pub struct LockingRepo<R: Record> {
    pool: PgPool,
    _marker: PhantomData<fn() -> R>,
}

impl<R: Record> Clone for LockingRepo<R> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _marker: PhantomData,
        }
    }
}

impl<R: Record> LockingRepo<R> {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
            _marker: PhantomData,
        }
    }

    fn select_sql(lock_suffix: &str) -> String {
        format!(
            "SELECT {} FROM {} WHERE {} = $1{}",
            R::COLUMNS,
            R::TABLE,
            R::KEY_COLUMN,
            lock_suffix
        )
    }

    /// Plain read by primary key.
    pub async fn find_by_key(&self, key: &R::Key) -> Result<R, StoreError> {
        let row = sqlx::query_as::<_, R>(&Self::select_sql(""))
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        row.ok_or(StoreError::NotFound { entity: R::TABLE })
    }

    /// Read by primary key and take an exclusive row lock inside the unit's
    /// transaction.
    ///
    /// Concurrent lock reads or updates of the same row block until the unit
    /// commits or rolls back; the wait is bounded by the unit's configured
    /// `lock_timeout`. An absent row reports [`StoreError::NotFound`] — no
    /// lock is ever taken in that case, since `FOR UPDATE` only locks rows the
    /// query returns.
    ///
    /// No lock-ordering policy is imposed here; callers acquiring multiple
    /// locks must adopt a consistent acquisition order themselves.
    pub async fn find_and_lock_by_key(
        &self,
        unit: &mut UnitOfWork,
        key: &R::Key,
    ) -> Result<R, StoreError> {
        let row = sqlx::query_as::<_, R>(&Self::select_sql(" FOR UPDATE"))
            .bind(key)
            .fetch_optional(unit.conn())
            .await?;

        row.ok_or(StoreError::NotFound { entity: R::TABLE })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::models::Product;

    #[test]
    fn test_select_sql_shapes() {
        assert_eq!(
            LockingRepo::<Product>::select_sql(""),
            format!(
                "SELECT {} FROM products WHERE product_id = $1",
                Product::COLUMNS
            )
        );
        assert!(LockingRepo::<Product>::select_sql(" FOR UPDATE").ends_with(" FOR UPDATE"));
    }
}

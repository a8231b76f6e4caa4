//! Unit of work over a single PostgreSQL transaction
//!
//! A [`UnitOfWork`] owns one pooled connection for the duration of one logical
//! operation. On top of the outer transaction it maintains a stack of nested
//! savepoints, so a failing sub-step of a multi-step operation can be undone
//! without discarding the work done before it.
//!
//! Savepoints are named deterministically from their depth (`sp_1`, `sp_2`,
//! ...). `rollback` pops the most recent savepoint while any exist, and only
//! rolls back the whole transaction at depth 0. A finalized unit rejects every
//! further operation instead of silently ignoring it.

use crate::db::Database;
use crate::store::error::StoreError;
use sqlx::pool::PoolConnection;
use sqlx::{PgConnection, Postgres};

pub struct UnitOfWork {
    conn: PoolConnection<Postgres>,
    depth: u32,
    finalized: bool,
}

fn savepoint_name(depth: u32) -> String {
    format!("sp_{}", depth)
}

impl UnitOfWork {
    /// Start a new transaction on a dedicated connection from the pool.
    ///
    /// The database's configured `lock_timeout` is applied with `SET LOCAL`,
    /// so every row-lock wait inside this unit is bounded and surfaces as
    /// [`StoreError::LockTimeout`] instead of blocking indefinitely.
    pub async fn begin(db: &Database) -> Result<Self, StoreError> {
        let mut conn = db.pool().acquire().await?;
        sqlx::query("BEGIN").execute(&mut *conn).await?;

        let lock_timeout_ms = db.lock_timeout_ms();
        if lock_timeout_ms > 0 {
            sqlx::query(&format!("SET LOCAL lock_timeout = '{}ms'", lock_timeout_ms))
                .execute(&mut *conn)
                .await?;
        }

        Ok(Self {
            conn,
            depth: 0,
            finalized: false,
        })
    }

    /// Adopt a connection whose transaction was already opened by the caller,
    /// composing this unit with the outer operation instead of starting a new
    /// transaction.
    pub fn adopt(conn: PoolConnection<Postgres>) -> Self {
        Self {
            conn,
            depth: 0,
            finalized: false,
        }
    }

    /// The connection carrying this unit's transaction. Queries that must see
    /// or extend uncommitted state (lock reads, journal writes) run on it.
    pub fn conn(&mut self) -> &mut PgConnection {
        &mut self.conn
    }

    /// Current savepoint depth. 0 means the next rollback ends the
    /// transaction.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Commit the transaction and finalize the unit.
    ///
    /// A second commit is a reported error, not a no-op.
    pub async fn commit(&mut self) -> Result<(), StoreError> {
        if self.finalized {
            return Err(StoreError::TransactionState(
                "commit on an already-finalized transaction",
            ));
        }
        sqlx::query("COMMIT").execute(&mut *self.conn).await?;
        self.depth = 0;
        self.finalized = true;
        Ok(())
    }

    /// Undo the most recent nested step, or the whole transaction.
    ///
    /// With savepoints on the stack, rolls back to the top savepoint and
    /// releases it — outer work and earlier savepoints stay intact and the
    /// unit remains usable. At depth 0 the whole transaction is rolled back
    /// and the unit is finalized.
    pub async fn rollback(&mut self) -> Result<(), StoreError> {
        if self.finalized {
            return Err(StoreError::TransactionState(
                "rollback on an already-finalized transaction",
            ));
        }

        if self.depth > 0 {
            let name = savepoint_name(self.depth);
            sqlx::query(&format!("ROLLBACK TO SAVEPOINT {}", name))
                .execute(&mut *self.conn)
                .await?;
            sqlx::query(&format!("RELEASE SAVEPOINT {}", name))
                .execute(&mut *self.conn)
                .await?;
            self.depth -= 1;
        } else {
            sqlx::query("ROLLBACK").execute(&mut *self.conn).await?;
            self.finalized = true;
        }
        Ok(())
    }

    /// Create the next savepoint. Depth is only incremented once the backend
    /// accepts it; a driver that rejects savepoints surfaces its error
    /// unmodified and leaves the depth untouched.
    pub async fn savepoint(&mut self) -> Result<(), StoreError> {
        if self.finalized {
            return Err(StoreError::TransactionState(
                "savepoint on an already-finalized transaction",
            ));
        }

        let name = savepoint_name(self.depth + 1);
        sqlx::query(&format!("SAVEPOINT {}", name))
            .execute(&mut *self.conn)
            .await?;
        self.depth += 1;
        Ok(())
    }
}

// Dropping a unit without commit leaves the transaction open on the
// connection; the pool rolls it back when the connection is returned.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_savepoint_names_are_deterministic() {
        assert_eq!(savepoint_name(1), "sp_1");
        assert_eq!(savepoint_name(2), "sp_2");
        assert_eq!(savepoint_name(17), "sp_17");
    }
}

//! Stock and customer-balance operations
//!
//! The multi-step mutations in this module are where the locking repository
//! and savepoint machinery earn their keep: every operation locks the rows it
//! will touch up front, takes a savepoint before each risky sub-step, and
//! undoes only the failing sub-step instead of the whole transaction.
//!
//! Lock acquisition order is warehouse before product, and ascending key
//! order within a kind. Every caller of the store that takes more than one
//! lock must keep to the same order.

use crate::db::Database;
use crate::inventory::models::{Customer, Product, StockMovement, Warehouse};
use crate::store::{LockingRepo, StoreError, UnitOfWork};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("insufficient stock: {available} available, {requested} requested")]
    InsufficientStock {
        available: Decimal,
        requested: Decimal,
    },

    #[error("credit limit exceeded")]
    CreditLimitExceeded,

    #[error("customer account is disabled")]
    CustomerDisabled,

    #[error("invalid quantity: must be non-zero")]
    InvalidQuantity,

    #[error("source and destination warehouses are the same")]
    SameWarehouse,
}

/// One requested inventory mutation. Positive quantity receives stock,
/// negative issues it.
#[derive(Debug, Clone, Deserialize)]
pub struct MovementLine {
    pub warehouse_id: i64,
    pub product_id: i64,
    pub quantity: Decimal,
    pub reason: String,
}

/// Outcome of a batch of movement lines: applied lines carry their journal
/// id, skipped lines the reason they were undone.
#[derive(Debug, Serialize)]
pub struct MovementReport {
    pub applied: Vec<Uuid>,
    pub skipped: Vec<SkippedLine>,
}

#[derive(Debug, Serialize)]
pub struct SkippedLine {
    pub index: usize,
    pub reason: String,
}

pub struct StockService {
    db: Arc<Database>,
    warehouses: LockingRepo<Warehouse>,
    products: LockingRepo<Product>,
    customers: LockingRepo<Customer>,
}

impl StockService {
    pub fn new(db: Arc<Database>) -> Self {
        let warehouses = LockingRepo::new(&db);
        let products = LockingRepo::new(&db);
        let customers = LockingRepo::new(&db);
        Self {
            db,
            warehouses,
            products,
            customers,
        }
    }

    /// Apply a single movement line in its own transaction.
    pub async fn adjust_stock(&self, line: MovementLine) -> Result<Uuid, InventoryError> {
        let mut unit = UnitOfWork::begin(&self.db).await?;

        self.warehouses
            .find_and_lock_by_key(&mut unit, &line.warehouse_id)
            .await?;
        self.products
            .find_and_lock_by_key(&mut unit, &line.product_id)
            .await?;

        unit.savepoint().await?;
        match self.apply_line(&mut unit, &line).await {
            Ok(movement_id) => {
                unit.commit().await?;
                Ok(movement_id)
            }
            Err(e) => {
                // Pop the savepoint, then end the transaction.
                unit.rollback().await?;
                unit.rollback().await?;
                Err(e)
            }
        }
    }

    /// Apply a batch of movement lines in one transaction.
    ///
    /// Each line runs under its own savepoint: a line that fails (absent row,
    /// insufficient stock) is undone locally and reported as skipped, while
    /// every line applied before and after it survives the final commit.
    pub async fn apply_movements(
        &self,
        lines: Vec<MovementLine>,
    ) -> Result<MovementReport, InventoryError> {
        // Lock in a consistent global order so two concurrent batches cannot
        // deadlock each other.
        let mut order: Vec<usize> = (0..lines.len()).collect();
        order.sort_by_key(|&i| (lines[i].warehouse_id, lines[i].product_id));

        let mut unit = UnitOfWork::begin(&self.db).await?;
        let mut applied = Vec::new();
        let mut skipped = Vec::new();

        for &index in &order {
            let line = &lines[index];
            unit.savepoint().await?;

            let result = async {
                self.warehouses
                    .find_and_lock_by_key(&mut unit, &line.warehouse_id)
                    .await?;
                self.products
                    .find_and_lock_by_key(&mut unit, &line.product_id)
                    .await?;
                Ok::<(), InventoryError>(())
            }
            .await;

            let result = match result {
                Ok(()) => self.apply_line(&mut unit, line).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(movement_id) => applied.push(movement_id),
                Err(e) => {
                    tracing::debug!(index, error = %e, "movement line undone");
                    unit.rollback().await?;
                    skipped.push(SkippedLine {
                        index,
                        reason: e.to_string(),
                    });
                }
            }
        }

        unit.commit().await?;
        Ok(MovementReport { applied, skipped })
    }

    /// Move stock of one product between two warehouses atomically.
    pub async fn transfer_stock(
        &self,
        from_warehouse_id: i64,
        to_warehouse_id: i64,
        product_id: i64,
        quantity: Decimal,
    ) -> Result<(Uuid, Uuid), InventoryError> {
        if quantity <= Decimal::ZERO {
            return Err(InventoryError::InvalidQuantity);
        }
        if from_warehouse_id == to_warehouse_id {
            return Err(InventoryError::SameWarehouse);
        }

        let mut unit = UnitOfWork::begin(&self.db).await?;

        // Ascending key order within a kind keeps concurrent transfers
        // between the same pair from deadlocking.
        let (first, second) = if from_warehouse_id < to_warehouse_id {
            (from_warehouse_id, to_warehouse_id)
        } else {
            (to_warehouse_id, from_warehouse_id)
        };
        self.warehouses.find_and_lock_by_key(&mut unit, &first).await?;
        self.warehouses.find_and_lock_by_key(&mut unit, &second).await?;
        self.products.find_and_lock_by_key(&mut unit, &product_id).await?;

        unit.savepoint().await?;

        let out_line = MovementLine {
            warehouse_id: from_warehouse_id,
            product_id,
            quantity: -quantity,
            reason: "transfer_out".to_string(),
        };
        let in_line = MovementLine {
            warehouse_id: to_warehouse_id,
            product_id,
            quantity,
            reason: "transfer_in".to_string(),
        };

        let result = async {
            let out_id = self.apply_line(&mut unit, &out_line).await?;
            let in_id = self.apply_line(&mut unit, &in_line).await?;
            Ok::<(Uuid, Uuid), InventoryError>((out_id, in_id))
        }
        .await;

        match result {
            Ok(ids) => {
                unit.commit().await?;
                Ok(ids)
            }
            Err(e) => {
                unit.rollback().await?;
                unit.rollback().await?;
                Err(e)
            }
        }
    }

    /// Charge an amount against a customer's balance under its row lock.
    pub async fn charge_customer(
        &self,
        customer_id: i64,
        amount: Decimal,
    ) -> Result<Decimal, InventoryError> {
        if amount <= Decimal::ZERO {
            return Err(InventoryError::InvalidQuantity);
        }

        let mut unit = UnitOfWork::begin(&self.db).await?;

        let customer = self
            .customers
            .find_and_lock_by_key(&mut unit, &customer_id)
            .await?;

        if !customer.is_active() {
            unit.rollback().await?;
            return Err(InventoryError::CustomerDisabled);
        }

        let new_balance = customer.balance + amount;
        if new_balance > customer.credit_limit {
            unit.rollback().await?;
            return Err(InventoryError::CreditLimitExceeded);
        }

        sqlx::query("UPDATE customers SET balance = $1 WHERE customer_id = $2")
            .bind(new_balance)
            .bind(customer_id)
            .execute(unit.conn())
            .await
            .map_err(StoreError::from)?;

        unit.commit().await?;
        Ok(new_balance)
    }

    /// Recent movement journal entries for one stock position.
    pub async fn movement_history(
        &self,
        warehouse_id: i64,
        product_id: i64,
    ) -> Result<Vec<StockMovement>, InventoryError> {
        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT movement_id, warehouse_id, product_id, quantity, reason, created_at
            FROM stock_movements
            WHERE warehouse_id = $1 AND product_id = $2
            ORDER BY created_at DESC
            LIMIT 50
            "#,
        )
        .bind(warehouse_id)
        .bind(product_id)
        .fetch_all(self.db.pool())
        .await
        .map_err(StoreError::from)?;

        Ok(movements)
    }

    /// Mutate one stock level and journal the movement. Runs on the unit's
    /// connection; the caller decides savepoint and commit boundaries.
    async fn apply_line(
        &self,
        unit: &mut UnitOfWork,
        line: &MovementLine,
    ) -> Result<Uuid, InventoryError> {
        if line.quantity == Decimal::ZERO {
            return Err(InventoryError::InvalidQuantity);
        }

        let new_quantity: Decimal = sqlx::query_scalar(
            r#"
            INSERT INTO stock_levels (warehouse_id, product_id, quantity, version)
            VALUES ($1, $2, $3, 1)
            ON CONFLICT (warehouse_id, product_id)
            DO UPDATE SET quantity = stock_levels.quantity + EXCLUDED.quantity,
                          version = stock_levels.version + 1
            RETURNING quantity
            "#,
        )
        .bind(line.warehouse_id)
        .bind(line.product_id)
        .bind(line.quantity)
        .fetch_one(unit.conn())
        .await
        .map_err(StoreError::from)?;

        if new_quantity < Decimal::ZERO {
            return Err(InventoryError::InsufficientStock {
                available: new_quantity - line.quantity,
                requested: -line.quantity,
            });
        }

        let movement_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO stock_movements (movement_id, warehouse_id, product_id, quantity, reason)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(movement_id)
        .bind(line.warehouse_id)
        .bind(line.product_id)
        .bind(line.quantity)
        .bind(&line.reason)
        .execute(unit.conn())
        .await
        .map_err(StoreError::from)?;

        Ok(movement_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_line_sort_order_is_warehouse_then_product() {
        let lines = vec![
            MovementLine {
                warehouse_id: 2,
                product_id: 1,
                quantity: Decimal::ONE,
                reason: "a".into(),
            },
            MovementLine {
                warehouse_id: 1,
                product_id: 9,
                quantity: Decimal::ONE,
                reason: "b".into(),
            },
            MovementLine {
                warehouse_id: 1,
                product_id: 3,
                quantity: Decimal::ONE,
                reason: "c".into(),
            },
        ];

        let mut order: Vec<usize> = (0..lines.len()).collect();
        order.sort_by_key(|&i| (lines[i].warehouse_id, lines[i].product_id));
        assert_eq!(order, vec![2, 1, 0]);
    }
}

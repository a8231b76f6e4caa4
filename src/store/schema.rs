//! PostgreSQL schema initialization

use sqlx::PgPool;

const CREATE_CUSTOMERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS customers (
    customer_id  BIGSERIAL PRIMARY KEY,
    name         TEXT NOT NULL,
    email        TEXT,
    credit_limit NUMERIC(20, 4) NOT NULL DEFAULT 0,
    balance      NUMERIC(20, 4) NOT NULL DEFAULT 0,
    status       SMALLINT NOT NULL DEFAULT 1,
    created_at   TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    user_id    BIGSERIAL PRIMARY KEY,
    username   TEXT NOT NULL UNIQUE,
    email      TEXT,
    status     SMALLINT NOT NULL DEFAULT 1,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const CREATE_WAREHOUSES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS warehouses (
    warehouse_id BIGSERIAL PRIMARY KEY,
    code         TEXT NOT NULL UNIQUE,
    name         TEXT NOT NULL,
    status       SMALLINT NOT NULL DEFAULT 1,
    created_at   TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const CREATE_PRODUCTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS products (
    product_id BIGSERIAL PRIMARY KEY,
    sku        TEXT NOT NULL UNIQUE,
    name       TEXT NOT NULL,
    unit_price NUMERIC(20, 4) NOT NULL DEFAULT 0,
    status     SMALLINT NOT NULL DEFAULT 1,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const CREATE_STOCK_LEVELS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS stock_levels (
    warehouse_id BIGINT NOT NULL REFERENCES warehouses (warehouse_id),
    product_id   BIGINT NOT NULL REFERENCES products (product_id),
    quantity     NUMERIC(20, 4) NOT NULL DEFAULT 0,
    version      BIGINT NOT NULL DEFAULT 1,
    PRIMARY KEY (warehouse_id, product_id)
)
"#;

const CREATE_STOCK_MOVEMENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS stock_movements (
    movement_id  UUID PRIMARY KEY,
    warehouse_id BIGINT NOT NULL,
    product_id   BIGINT NOT NULL,
    quantity     NUMERIC(20, 4) NOT NULL,
    reason       TEXT NOT NULL,
    created_at   TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

/// Create all tables if they do not exist yet. Idempotent; called once at
/// startup after the pool is established.
pub async fn init_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Initializing PostgreSQL schema");

    for ddl in [
        CREATE_CUSTOMERS_TABLE,
        CREATE_USERS_TABLE,
        CREATE_WAREHOUSES_TABLE,
        CREATE_PRODUCTS_TABLE,
        CREATE_STOCK_LEVELS_TABLE,
        CREATE_STOCK_MOVEMENTS_TABLE,
    ] {
        sqlx::query(ddl).execute(pool).await?;
    }

    Ok(())
}

//! Postgres-backed sources reading the `sales` and `inventory` tables.
//!
//! Schema (as populated upstream):
//! - `sales(router_id integer, amount double precision, created_at timestamp)`
//! - `inventory(router_id integer, product_name text, stock_level integer)`

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{debug, instrument};

use stockcast_inventory::InventorySnapshot;
use stockcast_sales::SalesRecord;

use super::{DataAccessError, InventorySource, SalesSource};

/// Reads both tables from one connection pool.
#[derive(Debug, Clone)]
pub struct PostgresSource {
    pool: PgPool,
}

impl PostgresSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a small pool; requests fetch both tables concurrently at most.
    pub async fn connect(database_url: &str) -> Result<Self, DataAccessError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }
}

#[async_trait::async_trait]
impl SalesSource for PostgresSource {
    #[instrument(skip(self), err)]
    async fn fetch_sales(&self) -> Result<Vec<SalesRecord>, DataAccessError> {
        let rows = sqlx::query(
            r#"
            SELECT router_id::bigint AS router_id, amount::float8 AS amount, created_at
            FROM sales
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("fetch_sales", e))?;

        let records = rows
            .iter()
            .map(sales_row)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(rows = records.len(), "sales rows loaded");
        Ok(records)
    }
}

#[async_trait::async_trait]
impl InventorySource for PostgresSource {
    #[instrument(skip(self), err)]
    async fn fetch_inventory(&self) -> Result<Vec<InventorySnapshot>, DataAccessError> {
        let rows = sqlx::query(
            r#"
            SELECT router_id::bigint AS router_id, product_name, stock_level::bigint AS stock_level
            FROM inventory
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("fetch_inventory", e))?;

        let snapshots = rows
            .iter()
            .map(inventory_row)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(rows = snapshots.len(), "inventory rows loaded");
        Ok(snapshots)
    }
}

fn sales_row(row: &PgRow) -> Result<SalesRecord, DataAccessError> {
    let router_id: i64 = row
        .try_get("router_id")
        .map_err(|e| map_sqlx_error("decode sales.router_id", e))?;
    let amount: f64 = row
        .try_get("amount")
        .map_err(|e| map_sqlx_error("decode sales.amount", e))?;
    let created_at: NaiveDateTime = row
        .try_get("created_at")
        .map_err(|e| map_sqlx_error("decode sales.created_at", e))?;

    let amount = Decimal::try_from(amount).map_err(|_| {
        DataAccessError::Malformed(format!("sales.amount is not a finite number for router {router_id}"))
    })?;

    Ok(SalesRecord::new(router_id, amount, created_at.and_utc()))
}

fn inventory_row(row: &PgRow) -> Result<InventorySnapshot, DataAccessError> {
    let router_id: i64 = row
        .try_get("router_id")
        .map_err(|e| map_sqlx_error("decode inventory.router_id", e))?;
    let product_name: String = row
        .try_get("product_name")
        .map_err(|e| map_sqlx_error("decode inventory.product_name", e))?;
    let stock_level: i64 = row
        .try_get("stock_level")
        .map_err(|e| map_sqlx_error("decode inventory.stock_level", e))?;

    InventorySnapshot::new(router_id, product_name, stock_level)
        .map_err(|e| DataAccessError::Malformed(format!("inventory row for router {router_id}: {e}")))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> DataAccessError {
    match err {
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::Decode(_)
        | sqlx::Error::TypeNotFound { .. } => {
            DataAccessError::Malformed(format!("{operation}: {err}"))
        }
        sqlx::Error::Database(db_err) => {
            DataAccessError::Unavailable(format!("database error in {operation}: {}", db_err.message()))
        }
        other => DataAccessError::Unavailable(format!("{operation}: {other}")),
    }
}

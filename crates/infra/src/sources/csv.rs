//! CSV exports of the `sales` and `inventory` tables.
//!
//! Sales files carry `router_id,amount,date` (`created_at` is accepted for the
//! date column); inventory files carry `router_id,product_name,stock_level`.
//! Files are re-read on every fetch.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use stockcast_inventory::InventorySnapshot;
use stockcast_sales::SalesRecord;

use super::{DataAccessError, InventorySource, SalesSource};

#[derive(Debug, Deserialize)]
struct SalesCsvRow {
    router_id: i64,
    amount: String,
    #[serde(alias = "created_at")]
    date: String,
}

#[derive(Debug, Deserialize)]
struct InventoryCsvRow {
    router_id: i64,
    product_name: String,
    stock_level: i64,
}

/// File-backed source. Either path may be absent; a missing path yields no rows.
#[derive(Debug, Clone, Default)]
pub struct CsvSource {
    sales_path: Option<PathBuf>,
    inventory_path: Option<PathBuf>,
}

impl CsvSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sales(mut self, path: impl Into<PathBuf>) -> Self {
        self.sales_path = Some(path.into());
        self
    }

    pub fn with_inventory(mut self, path: impl Into<PathBuf>) -> Self {
        self.inventory_path = Some(path.into());
        self
    }
}

#[async_trait::async_trait]
impl SalesSource for CsvSource {
    async fn fetch_sales(&self) -> Result<Vec<SalesRecord>, DataAccessError> {
        let Some(path) = self.sales_path.clone() else {
            return Ok(Vec::new());
        };
        read_blocking(move || load_sales(&path)).await
    }
}

#[async_trait::async_trait]
impl InventorySource for CsvSource {
    async fn fetch_inventory(&self) -> Result<Vec<InventorySnapshot>, DataAccessError> {
        let Some(path) = self.inventory_path.clone() else {
            return Ok(Vec::new());
        };
        read_blocking(move || load_inventory(&path)).await
    }
}

async fn read_blocking<T, F>(f: F) -> Result<T, DataAccessError>
where
    F: FnOnce() -> Result<T, DataAccessError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DataAccessError::Unavailable(format!("csv reader task failed: {e}")))?
}

fn open(path: &Path) -> Result<csv::Reader<std::fs::File>, DataAccessError> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| DataAccessError::Unavailable(format!("{}: {e}", path.display())))
}

/// Load sales rows from a CSV file.
pub fn load_sales(path: &Path) -> Result<Vec<SalesRecord>, DataAccessError> {
    let mut reader = open(path)?;
    let mut records = Vec::new();

    for (i, row) in reader.deserialize::<SalesCsvRow>().enumerate() {
        let line = i + 2;
        let row = row.map_err(|e| malformed(path, line, e))?;
        let amount = parse_amount(&row.amount).map_err(|e| malformed(path, line, e))?;
        let timestamp = parse_timestamp(&row.date).map_err(|e| malformed(path, line, e))?;
        records.push(SalesRecord::new(row.router_id, amount, timestamp));
    }

    debug!(path = %path.display(), rows = records.len(), "sales csv loaded");
    Ok(records)
}

/// Load inventory rows from a CSV file.
pub fn load_inventory(path: &Path) -> Result<Vec<InventorySnapshot>, DataAccessError> {
    let mut reader = open(path)?;
    let mut snapshots = Vec::new();

    for (i, row) in reader.deserialize::<InventoryCsvRow>().enumerate() {
        let line = i + 2;
        let row = row.map_err(|e| malformed(path, line, e))?;
        let snapshot = InventorySnapshot::new(row.router_id, row.product_name, row.stock_level)
            .map_err(|e| malformed(path, line, e))?;
        snapshots.push(snapshot);
    }

    debug!(path = %path.display(), rows = snapshots.len(), "inventory csv loaded");
    Ok(snapshots)
}

fn malformed(path: &Path, line: usize, err: impl std::fmt::Display) -> DataAccessError {
    DataAccessError::Malformed(format!("{} line {line}: {err}", path.display()))
}

fn parse_amount(raw: &str) -> Result<Decimal, String> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| format!("invalid amount {raw:?}"))
}

/// RFC 3339, `YYYY-MM-DD HH:MM:SS[.f]`, `YYYY-MM-DDTHH:MM:SS[.f]` or a bare date
/// (midnight). Naive values are taken as UTC.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(ts.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ts| ts.and_utc())
        .ok_or_else(|| format!("invalid date {raw:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    fn write_tmp(contents: &str) -> PathBuf {
        let n = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "stockcast-csv-{}-{n}.csv",
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn timestamps_accept_common_layouts() {
        let midnight = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-05-02").unwrap(), midnight);
        assert_eq!(parse_timestamp("2024-05-02 00:00:00").unwrap(), midnight);
        assert_eq!(parse_timestamp("2024-05-02T02:00:00+02:00").unwrap(), midnight);
        assert_eq!(
            parse_timestamp("2024-05-02T13:30:00.250").unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 2, 13, 30, 0).unwrap() + chrono::Duration::milliseconds(250)
        );
        assert!(parse_timestamp("02/05/2024").is_err());
    }

    #[test]
    fn amounts_keep_decimal_precision() {
        assert_eq!(parse_amount("19.99").unwrap(), dec!(19.99));
        assert_eq!(parse_amount("-3").unwrap(), dec!(-3));
        assert_eq!(parse_amount("1.5e2").unwrap(), dec!(150));
        assert!(parse_amount("abc").is_err());
    }

    #[tokio::test]
    async fn sales_file_is_loaded() {
        let path = write_tmp("router_id,amount,date\n1,10.5,2024-01-01\n2, 3 ,2024-01-02 08:00:00\n");
        let source = CsvSource::new().with_sales(&path);

        let rows = source.fetch_sales().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].amount, dec!(10.5));
        assert_eq!(rows[1].unit_id.get(), 2);
        assert_eq!(rows[1].timestamp, Utc.with_ymd_and_hms(2024, 1, 2, 8, 0, 0).unwrap());

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn created_at_header_is_accepted() {
        let path = write_tmp("router_id,amount,created_at\n4,1,2024-01-01\n");
        let rows = load_sales(&path).unwrap();
        assert_eq!(rows[0].unit_id.get(), 4);
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn bad_row_fails_the_whole_fetch() {
        let path = write_tmp("router_id,amount,date\n1,10,2024-01-01\n1,ten,2024-01-02\n");
        let err = CsvSource::new().with_sales(&path).fetch_sales().await.unwrap_err();

        match err {
            DataAccessError::Malformed(msg) => assert!(msg.contains("line 3"), "{msg}"),
            other => panic!("unexpected {other:?}"),
        }
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn missing_file_is_unavailable() {
        let source = CsvSource::new().with_inventory("/nonexistent/stockcast/inventory.csv");
        let err = source.fetch_inventory().await.unwrap_err();
        assert!(matches!(err, DataAccessError::Unavailable(_)));
    }

    #[tokio::test]
    async fn unconfigured_paths_yield_no_rows() {
        let source = CsvSource::new();
        assert!(source.fetch_sales().await.unwrap().is_empty());
        assert!(source.fetch_inventory().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn inventory_file_is_loaded_and_validated() {
        let path = write_tmp("router_id,product_name,stock_level\n1,modem,3\n1,antenna,12\n");
        let rows = CsvSource::new().with_inventory(&path).fetch_inventory().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].product_name, "antenna");
        let _ = std::fs::remove_file(&path);

        let bad = write_tmp("router_id,product_name,stock_level\n1, ,3\n");
        assert!(matches!(load_inventory(&bad), Err(DataAccessError::Malformed(_))));
        let _ = std::fs::remove_file(bad);
    }
}

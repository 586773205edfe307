//! Ingestion of a single device reading.
//!
//! `ingest` derives the device namespace, provisions its table and index,
//! then appends the reading with a server-side timestamp. The three storage
//! statements run in sequence without a wrapping transaction.

use std::str::FromStr;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::models::device_label;
use crate::{ensure_device_table, ensure_timestamp_index, ApiError, Config, DeviceNamespace, SensorPayload};

// ---

/// Open the SQLite pool described by `cfg`, creating the database file if
/// needed. The busy timeout lets racing writers wait for the lock.
pub async fn connect_pool(cfg: &Config) -> Result<SqlitePool, sqlx::Error> {
    // ---
    let options = SqliteConnectOptions::from_str(&cfg.db_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(cfg.db_busy_timeout);

    SqlitePoolOptions::new()
        .max_connections(cfg.db_pool_max)
        .connect_with(options)
        .await
}

/// Store one reading for `device_id` and return the namespace it landed in.
///
/// Validation failures return before any storage access. Storage failures
/// are returned as [`ApiError::Internal`]; nothing is retried or rolled back.
pub async fn ingest(
    pool: &SqlitePool,
    device_id: &str,
    label: Option<&str>,
    reading: &SensorPayload,
) -> Result<DeviceNamespace, ApiError> {
    // ---
    if device_id.is_empty() {
        return Err(ApiError::MissingFields);
    }
    let ns = DeviceNamespace::from_device_id(device_id)?;

    debug!("Ensuring schema for {}", ns);
    ensure_device_table(pool, &ns).await?;
    ensure_timestamp_index(pool, &ns).await?;

    let timestamp = Utc::now().timestamp();
    let row_id = insert_reading(pool, &ns, timestamp, device_label(label), reading).await?;

    info!("Stored reading {} for {} at {}", row_id, ns, timestamp);
    Ok(ns)
}

/// Append one row and return its sequence id.
async fn insert_reading(
    pool: &SqlitePool,
    ns: &DeviceNamespace,
    timestamp: i64,
    device_name: &str,
    reading: &SensorPayload,
) -> Result<i64, sqlx::Error> {
    // ---
    let sql = format!(
        r#"
        INSERT INTO {table} (
            timestamp, device_name, temperature, humidity, battery_mv, rssi
        ) VALUES (?, ?, ?, ?, ?, ?)
        "#,
        table = ns.table_name()
    );

    let result = sqlx::query(&sql)
        .bind(timestamp)
        .bind(device_name)
        .bind(reading.temperature)
        .bind(reading.humidity)
        .bind(reading.battery_mv)
        .bind(reading.rssi)
        .execute(pool)
        .await?;

    Ok(result.last_insert_rowid())
}

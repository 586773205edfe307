//! Per-device schema provisioning.
//!
//! Both statements use `IF NOT EXISTS`, so they run on every ingest request
//! and are no-ops once the device table exists. Creation races between
//! concurrent requests are settled by SQLite, not by this module.

use sqlx::SqlitePool;

use crate::DeviceNamespace;

// ---

/// Create the device's reading table if it is absent.
pub async fn ensure_device_table(pool: &SqlitePool, ns: &DeviceNamespace) -> Result<(), sqlx::Error> {
    // ---
    let ddl = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp   INTEGER NOT NULL,
            device_name TEXT,
            temperature REAL,
            humidity    INTEGER,
            battery_mv  INTEGER,
            rssi        INTEGER
        )
        "#,
        table = ns.table_name()
    );

    sqlx::query(&ddl).execute(pool).await?;
    Ok(())
}

/// Create the descending timestamp index on the device table if it is absent.
///
/// A failure here leaves a table without its index; reads get slower but
/// stored data is unaffected.
pub async fn ensure_timestamp_index(
    pool: &SqlitePool,
    ns: &DeviceNamespace,
) -> Result<(), sqlx::Error> {
    // ---
    let ddl = format!(
        "CREATE INDEX IF NOT EXISTS {index} ON {table} (timestamp DESC)",
        index = ns.timestamp_index_name(),
        table = ns.table_name()
    );

    sqlx::query(&ddl).execute(pool).await?;
    Ok(())
}

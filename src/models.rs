//! Data models for the ingestion endpoint.

use serde::{Deserialize, Serialize};

use crate::ApiError;

/// Label stored when a device does not report a name.
pub const UNKNOWN_DEVICE_NAME: &str = "Unknown";

// ---

/// Body of `POST /data`. Every field is optional at the serde level so that
/// missing fields become a `MissingFields` error instead of a parse error.
#[derive(Debug, Default, Deserialize)]
pub struct IngestRequest {
    // ---
    pub mac: Option<String>,
    pub name: Option<String>,
    pub data: Option<SensorPayload>,
}

/// One sensor observation. Absent (or `null`) values stay `None` and are
/// stored as SQL NULL; a reported `0` is stored as `0`.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct SensorPayload {
    // ---
    pub temperature: Option<f64>,
    pub humidity: Option<i64>,
    pub battery_mv: Option<i64>,
    pub rssi: Option<i64>,
}

/// A stored row of a device table.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct ReadingRow {
    // ---
    pub id: i64,
    pub timestamp: i64,
    pub device_name: Option<String>,
    pub temperature: Option<f64>,
    pub humidity: Option<i64>,
    pub battery_mv: Option<i64>,
    pub rssi: Option<i64>,
}

impl IngestRequest {
    // ---
    /// Parse a raw request body.
    pub fn from_slice(body: &[u8]) -> Result<Self, ApiError> {
        serde_json::from_slice(body).map_err(|e| ApiError::InvalidBody(e.to_string()))
    }

    /// Split into `(mac, label, reading)`, rejecting a missing or empty
    /// `mac` and a missing `data` object.
    pub fn into_parts(self) -> Result<(String, Option<String>, SensorPayload), ApiError> {
        // ---
        let mac = self.mac.filter(|m| !m.is_empty()).ok_or(ApiError::MissingFields)?;
        let data = self.data.ok_or(ApiError::MissingFields)?;
        Ok((mac, self.name, data))
    }
}

/// Label to store for a reading: the reported name, or `Unknown` when it is
/// missing or empty.
pub fn device_label(name: Option<&str>) -> &str {
    match name {
        Some(n) if !n.is_empty() => n,
        _ => UNKNOWN_DEVICE_NAME,
    }
}

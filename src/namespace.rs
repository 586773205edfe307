//! Per-device storage namespace.
//!
//! A device id such as `C0:47:C1:A4:3E:42` maps to the table name
//! `device_c047c1a43e42`. The table name is interpolated into DDL, so the
//! derived suffix is checked against a hex-only allow-list before a
//! [`DeviceNamespace`] can exist.

use std::fmt;

use crate::ApiError;

const TABLE_PREFIX: &str = "device_";
const SEPARATORS: [char; 2] = [':', '-'];
/// EUI-64 is the longest hardware address a device reports.
const MAX_HEX_DIGITS: usize = 16;

// ---

/// Validated table name for one device. Only constructible through
/// [`DeviceNamespace::from_device_id`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceNamespace(String);

impl DeviceNamespace {
    // ---
    /// Strip separators, lowercase, and prefix with `device_`.
    ///
    /// Upper- and lowercase spellings of the same address collapse to one
    /// namespace. Anything that is not a hex digit after stripping is
    /// rejected.
    pub fn from_device_id(device_id: &str) -> Result<Self, ApiError> {
        // ---
        let suffix: String = device_id
            .trim()
            .chars()
            .filter(|c| !SEPARATORS.contains(c))
            .map(|c| c.to_ascii_lowercase())
            .collect();

        if suffix.is_empty() {
            return Err(ApiError::InvalidDevice(format!(
                "device id '{device_id}' contains no hex digits"
            )));
        }

        if suffix.len() > MAX_HEX_DIGITS {
            return Err(ApiError::InvalidDevice(format!(
                "device id has {} digits, at most {MAX_HEX_DIGITS} allowed",
                suffix.len()
            )));
        }

        if let Some(bad) = suffix.chars().find(|c| !matches!(c, '0'..='9' | 'a'..='f')) {
            return Err(ApiError::InvalidDevice(format!(
                "device id '{device_id}' contains invalid character '{bad}'"
            )));
        }

        Ok(Self(format!("{TABLE_PREFIX}{suffix}")))
    }

    /// Table name, safe to interpolate into SQL.
    pub fn table_name(&self) -> &str {
        &self.0
    }

    /// Name of the descending timestamp index on this table.
    pub fn timestamp_index_name(&self) -> String {
        format!("idx_{}_timestamp", self.0)
    }
}

impl fmt::Display for DeviceNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

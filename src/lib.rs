//! Sensor reading ingestion service.
//!
//! Devices POST readings keyed by their MAC address; each device gets its own
//! table (`device_<hex>`), created lazily on the first reading and reused
//! afterwards. The crate follows the Explicit Module Boundary Pattern (EMBP):
//! sibling modules only reach each other through the re-exports below.

mod config;
mod error;
mod ingest;
mod models;
mod namespace;
mod routes;
mod schema;

pub use config::{load_from_env, Config};
pub use error::ApiError;
pub use ingest::{connect_pool, ingest};
pub use models::{IngestRequest, ReadingRow, SensorPayload, UNKNOWN_DEVICE_NAME};
pub use namespace::DeviceNamespace;
pub use routes::router;
pub use schema::{ensure_device_table, ensure_timestamp_index};

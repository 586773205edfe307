//! `POST /data`: store one reading for one device.

use axum::{body::Bytes, extract::State, routing::post, Json, Router};
use serde::Serialize;
use tracing::info;

use super::{not_found, AppState};
use crate::{ingest, ApiError, IngestRequest};

// ---

#[derive(Debug, Serialize)]
struct IngestResponse {
    ok: bool,
    message: &'static str,
    table: String,
}

pub(super) fn router() -> Router<AppState> {
    // ---
    Router::new().route("/data", post(handler).fallback(not_found))
}

/// The body is taken as raw bytes so malformed JSON ends up in our error
/// envelope rather than axum's plain-text rejection.
async fn handler(
    State((pool, _)): State<AppState>,
    body: Bytes,
) -> Result<Json<IngestResponse>, ApiError> {
    // ---
    let (mac, name, reading) = IngestRequest::from_slice(&body)?.into_parts()?;
    info!("POST /data - reading from {}", mac);

    let ns = ingest(&pool, &mac, name.as_deref(), &reading).await?;

    Ok(Json(IngestResponse {
        ok: true,
        message: "Data stored successfully",
        table: ns.table_name().to_string(),
    }))
}

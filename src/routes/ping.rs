// src/routes/ping.rs
//! Authenticated liveness check. Does not touch the database, so a 200 here
//! only says the process is up and the caller's token is right.

use axum::{routing::get, Json, Router};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use super::{not_found, AppState};

#[derive(Serialize)]
struct PingResponse {
    ok: bool,
    message: &'static str,
    timestamp: String,
}

/// Handle `GET /ping`.
async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        ok: true,
        message: "Sensor ingest service is running",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

pub(super) fn router() -> Router<AppState> {
    Router::new().route("/ping", get(ping).fallback(not_found))
}

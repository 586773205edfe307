//! End-to-end tests: the router is served on an ephemeral port over an
//! in-memory SQLite pool and driven with `reqwest`.

use std::{net::SocketAddr, time::Duration};

use anyhow::Result;
use chrono::Utc;
use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Value};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tokio::net::TcpListener;

use sensor_ingest::{router, Config, ReadingRow};

const TOKEN: &str = "test-token";

// ---

struct TestApp {
    base: String,
    pool: SqlitePool,
    client: Client,
}

impl TestApp {
    // ---
    async fn spawn() -> Result<Self> {
        // ---
        // One connection, never recycled: every in-memory connection is its
        // own database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = router(pool.clone(), test_config(addr));

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Ok(TestApp {
            base: format!("http://{addr}"),
            pool,
            client: Client::new(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn post_data(&self, body: Value) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(self.url("/data"))
            .header("Authorization", TOKEN)
            .json(&body)
            .send()
            .await?)
    }

    async fn device_tables(&self) -> Result<Vec<String>> {
        // ---
        let names = sqlx::query_scalar::<_, String>(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name LIKE 'device_%' ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    async fn rows(&self, table: &str) -> Result<Vec<ReadingRow>> {
        let sql = format!("SELECT * FROM {table} ORDER BY id");
        Ok(sqlx::query_as::<_, ReadingRow>(&sql).fetch_all(&self.pool).await?)
    }
}

fn test_config(bind_addr: SocketAddr) -> Config {
    Config {
        db_url: "sqlite::memory:".into(),
        db_pool_max: 1,
        db_busy_timeout: Duration::from_secs(5),
        api_token: TOKEN.into(),
        bind_addr,
    }
}

fn assert_cors(resp: &reqwest::Response) {
    // ---
    let h = resp.headers();
    assert_eq!(h["access-control-allow-origin"], "*");
    assert_eq!(h["access-control-allow-methods"], "GET, POST, OPTIONS");
    assert_eq!(h["access-control-allow-headers"], "Content-Type, Authorization");
}

// ---

#[tokio::test]
async fn ingest_creates_table_and_row() -> Result<()> {
    // ---
    let app = TestApp::spawn().await?;

    let before = Utc::now().timestamp();
    let resp = app
        .post_data(json!({
            "mac": "C0:47:C1:A4:3E:42",
            "data": { "temperature": 21.5, "humidity": 40, "battery_mv": 3000, "rssi": -60 }
        }))
        .await?;
    let after = Utc::now().timestamp();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_cors(&resp);
    let body: Value = resp.json().await?;
    assert_eq!(body["ok"], true);
    assert_eq!(body["message"], "Data stored successfully");
    assert_eq!(body["table"], "device_c047c1a43e42");

    let rows = app.rows("device_c047c1a43e42").await?;
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.device_name.as_deref(), Some("Unknown"));
    assert_eq!(row.temperature, Some(21.5));
    assert_eq!(row.humidity, Some(40));
    assert_eq!(row.battery_mv, Some(3000));
    assert_eq!(row.rssi, Some(-60));
    assert!(
        (before..=after).contains(&row.timestamp),
        "timestamp {} outside [{}, {}]",
        row.timestamp,
        before,
        after
    );

    Ok(())
}

#[tokio::test]
async fn timestamp_index_is_created() -> Result<()> {
    // ---
    let app = TestApp::spawn().await?;
    app.post_data(json!({ "mac": "aa:bb:cc:dd:ee:ff", "data": {} })).await?;

    let indexes = sqlx::query_scalar::<_, String>(
        "SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = 'device_aabbccddeeff'",
    )
    .fetch_all(&app.pool)
    .await?;
    assert_eq!(indexes, vec!["idx_device_aabbccddeeff_timestamp".to_string()]);

    Ok(())
}

#[tokio::test]
async fn repeated_ingest_reuses_namespace() -> Result<()> {
    // ---
    let app = TestApp::spawn().await?;

    for temp in [20.0, 21.0, 22.0] {
        let resp = app
            .post_data(json!({ "mac": "AA:BB:CC:00:11:22", "name": "Porch", "data": { "temperature": temp } }))
            .await?;
        assert_eq!(resp.status(), StatusCode::OK);
    }
    // Lowercase spelling of the same address lands in the same table.
    let resp = app
        .post_data(json!({ "mac": "aa:bb:cc:00:11:22", "data": { "temperature": 23.0 } }))
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);

    assert_eq!(app.device_tables().await?, vec!["device_aabbcc001122".to_string()]);

    let rows = app.rows("device_aabbcc001122").await?;
    let temps: Vec<_> = rows.iter().map(|r| r.temperature).collect();
    assert_eq!(temps, vec![Some(20.0), Some(21.0), Some(22.0), Some(23.0)]);
    assert!(rows.windows(2).all(|w| w[0].id < w[1].id));
    assert_eq!(rows[0].device_name.as_deref(), Some("Porch"));
    assert_eq!(rows[3].device_name.as_deref(), Some("Unknown"));

    Ok(())
}

#[tokio::test]
async fn distinct_devices_get_distinct_tables() -> Result<()> {
    // ---
    let app = TestApp::spawn().await?;
    app.post_data(json!({ "mac": "00:00:00:00:00:01", "data": { "rssi": -70 } })).await?;
    app.post_data(json!({ "mac": "00:00:00:00:00:02", "data": { "rssi": -80 } })).await?;

    assert_eq!(
        app.device_tables().await?,
        vec!["device_000000000001".to_string(), "device_000000000002".to_string()]
    );
    assert_eq!(app.rows("device_000000000001").await?[0].rssi, Some(-70));
    assert_eq!(app.rows("device_000000000002").await?[0].rssi, Some(-80));

    Ok(())
}

#[tokio::test]
async fn missing_values_are_stored_as_null() -> Result<()> {
    // ---
    let app = TestApp::spawn().await?;
    let resp = app
        .post_data(json!({
            "mac": "11:22:33:44:55:66",
            "data": { "temperature": 0.0, "humidity": 0, "rssi": -55 }
        }))
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let row = &app.rows("device_112233445566").await?[0];
    assert_eq!(row.battery_mv, None);
    assert_eq!(row.temperature, Some(0.0));
    assert_eq!(row.humidity, Some(0));
    assert_eq!(row.rssi, Some(-55));

    Ok(())
}

#[tokio::test]
async fn concurrent_first_readings_share_one_table() -> Result<()> {
    // ---
    let app = TestApp::spawn().await?;

    let mut handles = Vec::new();
    for i in 0..8 {
        let client = app.client.clone();
        let url = app.url("/data");
        handles.push(tokio::spawn(async move {
            client
                .post(url)
                .header("Authorization", TOKEN)
                .json(&json!({ "mac": "de:ad:be:ef:00:01", "data": { "humidity": i } }))
                .send()
                .await
                .map(|r| r.status())
        }));
    }
    for handle in handles {
        assert_eq!(handle.await??, StatusCode::OK);
    }

    assert_eq!(app.device_tables().await?, vec!["device_deadbeef0001".to_string()]);
    assert_eq!(app.rows("device_deadbeef0001").await?.len(), 8);

    Ok(())
}

#[tokio::test]
async fn empty_body_is_rejected_without_storage() -> Result<()> {
    // ---
    let app = TestApp::spawn().await?;
    let resp = app.post_data(json!({})).await?;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_cors(&resp);
    let body: Value = resp.json().await?;
    assert_eq!(body["error"], "Missing required fields");
    assert!(app.device_tables().await?.is_empty());

    let resp = app.post_data(json!({ "mac": "aa:bb" })).await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(app.device_tables().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn malformed_input_is_rejected_without_storage() -> Result<()> {
    // ---
    let app = TestApp::spawn().await?;

    let resp = app
        .client
        .post(app.url("/data"))
        .header("Authorization", TOKEN)
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await?;
    assert_eq!(body["error"], "Invalid request body");
    assert!(body["message"].is_string());

    let resp = app
        .post_data(json!({ "mac": "x; DROP TABLE y", "data": { "rssi": -1 } }))
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await?;
    assert_eq!(body["error"], "Invalid device id");

    assert!(app.device_tables().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn unauthorized_requests_are_rejected() -> Result<()> {
    // ---
    let app = TestApp::spawn().await?;
    let body = json!({ "mac": "aa:bb", "data": { "rssi": -1 } });

    let cases = [
        (Method::POST, "/data", None),
        (Method::POST, "/data", Some("wrong-token")),
        (Method::POST, "/data", Some("Bearer test-token")),
        (Method::GET, "/ping", None),
        (Method::GET, "/status", None),
        (Method::DELETE, "/data", Some("nope")),
    ];

    for (method, path, token) in cases {
        let mut req = app.client.request(method.clone(), app.url(path)).json(&body);
        if let Some(token) = token {
            req = req.header("Authorization", token);
        }
        let resp = req.send().await?;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{method} {path}");
        assert_cors(&resp);
        let json: Value = resp.json().await?;
        assert_eq!(json["error"], "Unauthorized");
    }

    assert!(app.device_tables().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn preflight_needs_no_auth() -> Result<()> {
    // ---
    let app = TestApp::spawn().await?;

    for path in ["/data", "/ping", "/anything"] {
        let resp = app.client.request(Method::OPTIONS, app.url(path)).send().await?;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_cors(&resp);
        assert!(resp.bytes().await?.is_empty());
    }

    Ok(())
}

#[tokio::test]
async fn ping_reports_running() -> Result<()> {
    // ---
    let app = TestApp::spawn().await?;
    let resp = app
        .client
        .get(app.url("/ping"))
        .header("Authorization", TOKEN)
        .send()
        .await?;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_cors(&resp);
    let body: Value = resp.json().await?;
    assert_eq!(body["ok"], true);
    assert!(body["message"].is_string());
    let ts = body["timestamp"].as_str().unwrap_or_default();
    assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok(), "bad timestamp {ts}");

    Ok(())
}

#[tokio::test]
async fn unknown_routes_are_not_found() -> Result<()> {
    // ---
    let app = TestApp::spawn().await?;

    let cases = [
        (Method::GET, "/status"),
        (Method::GET, "/data"),
        (Method::POST, "/ping"),
        (Method::PUT, "/data"),
    ];
    for (method, path) in cases {
        let resp = app
            .client
            .request(method.clone(), app.url(path))
            .header("Authorization", TOKEN)
            .send()
            .await?;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{method} {path}");
        assert_cors(&resp);
        let body: Value = resp.json().await?;
        assert_eq!(body["error"], "Not found");
    }

    Ok(())
}

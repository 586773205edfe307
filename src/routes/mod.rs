//! Route gateway: assembles the per-endpoint subrouters, the 404 fallback and
//! the auth/CORS middleware into the application router.

use axum::{middleware, Router};
use sqlx::SqlitePool;

use crate::{ApiError, Config};

mod auth;
mod cors;
mod data;
mod ping;

/// State shared by every route: the storage pool and the loaded config.
pub(crate) type AppState = (SqlitePool, Config);

// ---

pub fn router(pool: SqlitePool, config: Config) -> Router {
    // ---
    let state: AppState = (pool, config);

    // Layers added later wrap earlier ones: CORS sees every response,
    // including preflights and auth rejections.
    Router::new()
        .merge(ping::router())
        .merge(data::router())
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), auth::require_token))
        .layer(middleware::from_fn(cors::cors))
        .with_state(state)
}

/// Any path, or any method on a known path, that has no handler.
async fn not_found() -> ApiError {
    ApiError::NotFound
}

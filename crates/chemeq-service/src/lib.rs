//! HTTP REST API for chemical equipment datasets.
//!
//! This crate provides a service that:
//! - Accepts CSV uploads and validates them before anything is stored
//! - Keeps the most recent uploads (5 by default) in a local database
//! - Serves upload history, statistics, paginated records, reports and exports
//! - Optional API key authentication
//!
//! # REST API Endpoints
//!
//! - `GET /api/health` - Service health check (no auth required)
//! - `POST /api/upload` - Upload a CSV dataset (multipart field `file`)
//! - `GET /api/history` - Most recent uploads, newest first
//! - `GET /api/summary?upload_id=` - Statistics of an upload (latest by default)
//! - `GET /api/uploads/{id}` - One upload with its records
//! - `GET /api/uploads/{id}/records` - Paginated records (`limit`, `offset`, `type`)
//! - `GET /api/uploads/{id}/report` - Plain-text report download
//! - `GET /api/uploads/{id}/export?format=csv|json` - Dataset export
//!
//! # Configuration
//!
//! The service reads configuration from `~/.config/chemeq/server.toml`:
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:8080"
//!
//! [storage]
//! path = "/var/lib/chemeq/data.db"
//! retention = 5
//!
//! [ingest]
//! max_rows = 10000
//! max_bytes = 10485760
//!
//! [security]
//! # Require X-API-Key header for all requests (except /api/health)
//! api_key_enabled = true
//! api_key = "your-secure-random-key-at-least-16-chars"
//! ```

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod middleware;
pub mod state;

pub use config::{
    Config, ConfigError, IngestConfig, SecurityConfig, ServerConfig, StorageConfig,
    ValidationError,
};
pub use state::AppState;

/// Allowance for multipart boundaries and part headers on top of `max_bytes`.
pub const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the full application: routes, body limit, authentication and tracing.
pub fn app(state: Arc<AppState>) -> Router {
    let security = Arc::new(state.config.security.clone());
    let body_limit = state
        .config
        .ingest
        .max_bytes
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .merge(api::router())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum::middleware::from_fn_with_state(
            security,
            middleware::api_key_auth,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

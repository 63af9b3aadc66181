//! slat-server library - Sentence Labeling & Assignment Tracker service
//!
//! HTTP service over the SLAT database: CSV sentence ingestion, batch
//! assignment reconciliation, annotation recording, and progress reporting.

pub mod api;
pub mod config;
pub mod error;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Hard ceiling on request body size. The effective CSV upload cap is the
/// `csv_max_upload_bytes` runtime setting, checked per upload; this limit
/// only has to be at least as large as any sane value of that setting.
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// HS256 signing secret for bearer tokens; empty disables auth checking
    pub jwt_secret: String,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, jwt_secret: String) -> Self {
        Self { db, jwt_secret }
    }
}

/// Build application router
///
/// Admin routes require an admin-role bearer token, user routes a
/// user-role token; the health endpoint is unauthenticated. CORS is
/// permissive because the frontend is served from another origin.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};

    let admin = Router::new()
        .route("/api/admin/upload-csv", post(api::upload_csv))
        .route("/api/admin/assign", post(api::assign_batch))
        .route("/api/admin/progress/:user_id", get(api::user_progress))
        .route("/api/admin/users", get(api::list_users))
        .route("/api/admin/assignments", get(api::all_assignments))
        .route("/api/admin/assignments/:user_id", get(api::user_assignment_detail))
        .layer(middleware::from_fn_with_state(state.clone(), api::admin_auth));

    let user = Router::new()
        .route("/api/user/assigned-sentences/:user_id", get(api::assigned_sentences))
        .route("/api/user/annotate/:sentence_id", post(api::annotate_sentence))
        .layer(middleware::from_fn_with_state(state.clone(), api::user_auth));

    Router::new()
        .merge(admin)
        .merge(user)
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! Widget-facing try-on endpoints

pub mod demo;
pub mod handlers;

use axum::{extract::DefaultBodyLimit, routing::post, Router};

use super::state::AppState;
use crate::infrastructure::services::MAX_DEMO_UPLOAD_BYTES;

/// Body limit for the demo route: a base64 upload at the decoded cap plus JSON framing
pub const DEMO_BODY_LIMIT_BYTES: usize = MAX_DEMO_UPLOAD_BYTES / 3 * 4 + 64 * 1024;

/// Routes nested under `/api`
pub fn create_tryon_router() -> Router<AppState> {
    Router::new()
        .route(
            "/virtual-try-on",
            post(handlers::virtual_try_on).get(handlers::quota_status),
        )
        .route(
            "/generate-demo",
            post(demo::generate_demo).layer(DefaultBodyLimit::max(DEMO_BODY_LIMIT_BYTES)),
        )
}

//! Landing-page demo handler

use axum::extract::State;
use tracing::debug;

use crate::api::middleware::{truncate_for_log, ClientIp};
use crate::api::state::AppState;
use crate::api::types::{ApiError, DemoRequest, Json, TryOnResponse};

/// POST /api/generate-demo
pub async fn generate_demo(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(request): Json<DemoRequest>,
) -> Result<Json<TryOnResponse>, ApiError> {
    debug!(
        user_image = %truncate_for_log(&request.user_image_url, 64),
        ip = %ip,
        "Demo generation requested"
    );

    let result = state
        .tryon_service
        .demo(request.into_command(ip))
        .await
        .map_err(ApiError::from)?;

    Ok(Json(TryOnResponse::from(result)))
}

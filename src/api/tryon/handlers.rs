//! Try-on endpoint handlers

use axum::extract::{Query, State};
use tracing::debug;

use crate::api::middleware::ClientIp;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, QuotaQuery, TryOnRequest, TryOnResponse};
use crate::infrastructure::services::QuotaStatus;

/// POST /api/virtual-try-on
pub async fn virtual_try_on(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(request): Json<TryOnRequest>,
) -> Result<Json<TryOnResponse>, ApiError> {
    debug!(product_id = ?request.product_id, ip = %ip, "Try-on requested");

    let result = state
        .tryon_service
        .try_on(request.into_command(ip))
        .await
        .map_err(ApiError::from)?;

    Ok(Json(TryOnResponse::from(result)))
}

/// GET /api/virtual-try-on?productId=
pub async fn quota_status(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Query(query): Query<QuotaQuery>,
) -> Result<Json<QuotaStatus>, ApiError> {
    let product_id = query
        .product_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Product ID required"))?;

    let status = state
        .tryon_service
        .quota(&product_id, &ip)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(status))
}

//! Email verification endpoints used by merchant signup and password reset

use axum::{extract::State, routing::post, Router};

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, SendCodeRequest, SuccessResponse, VerifyCodeRequest};

/// Routes nested under `/api/auth`
pub fn create_auth_router() -> Router<AppState> {
    Router::new()
        .route("/otp/send", post(send_code))
        .route("/otp/verify", post(verify_code))
}

/// POST /api/auth/otp/send
pub async fn send_code(
    State(state): State<AppState>,
    Json(request): Json<SendCodeRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state
        .verification_service
        .send_code(&request.email)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(SuccessResponse::ok()))
}

/// POST /api/auth/otp/verify
pub async fn verify_code(
    State(state): State<AppState>,
    Json(request): Json<VerifyCodeRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state
        .verification_service
        .verify_code(&request.email, &request.code)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(SuccessResponse::ok()))
}

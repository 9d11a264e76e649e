//! API wire types

pub mod auth;
pub mod error;
pub mod json;
pub mod tryon;

pub use auth::{SendCodeRequest, SuccessResponse, VerifyCodeRequest};
pub use error::{ApiError, ApiErrorResponse};
pub use json::Json;
pub use tryon::{DemoRequest, QuotaQuery, TryOnRequest, TryOnResponse};

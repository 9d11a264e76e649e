//! Embeddable widget loader script

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};

use super::state::AppState;

const WIDGET_SOURCE: &str = include_str!("../../public/widget.js");
const ORIGIN_PLACEHOLDER: &str = "__DROUTFIT_ORIGIN__";

/// GET /widget.js
pub async fn widget_script(State(state): State<AppState>) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "application/javascript; charset=utf-8"),
            (header::CACHE_CONTROL, "public, max-age=300"),
        ],
        render_widget(state.public_url.as_deref()),
    )
}

/// Loader source with the configured origin baked in; without one the script
/// uses the origin it was served from
pub fn render_widget(public_url: Option<&str>) -> String {
    match public_url {
        Some(origin) => WIDGET_SOURCE.replace(ORIGIN_PLACEHOLDER, origin),
        None => WIDGET_SOURCE.to_string(),
    }
}

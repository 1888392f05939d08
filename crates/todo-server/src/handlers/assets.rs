//! Built client assets.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;

use crate::state::AppState;

/// Handle GET /client.js.
pub(crate) async fn get_client(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        state.client.clone(),
    )
}

/// Handle GET /styles.css.
///
/// Always serves the latest snapshot held by the style broadcaster, so a
/// `loadStyles` notification followed by a refetch sees the new rules.
pub(crate) async fn get_styles(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/css; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        state.styles.current().to_string(),
    )
}

//! Document endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;

use crate::page::PageContext;
use crate::render::{self, FailureSignal};
use crate::state::AppState;

/// Handle GET /.
pub(crate) async fn get_index(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let ctx = PageContext {
        db: Arc::clone(&state.db),
        build_id: state.live_reload_enabled().then_some(state.build_id),
    };
    render::stream_page(FailureSignal::for_request(&headers), || {
        state.page.build(&ctx)
    })
}

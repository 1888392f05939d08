//! Streaming page responses.
//!
//! A page view moves through these states:
//!
//! ```text
//! START ──shell ready──► STREAMING ──► COMPLETE      (x-render-status: 200)
//!   │                              └─► STREAM_ERROR  (trailer 500, or aborted body)
//!   └──shell failed──► START_FAILED  (500 + fallback document)
//! ```
//!
//! The status line is committed once the shell is ready: 200, or 500 if an
//! error was already reported while building it. Errors after that point
//! cannot change the status line. Clients that send `TE: trailers` get the
//! final outcome as the `x-render-status` trailer. Everyone else gets a body
//! that ends with an error instead of the terminating chunk, so the response
//! is visibly incomplete rather than a clean 200.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::body::Body;
use axum::http::header::{self, HeaderName};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use http_body::Frame;
use http_body_util::StreamBody;
use todo_render::{ErrorCallback, Node, RenderError, RenderOptions, RenderStream, render_to_stream};
use tokio_util::sync::{CancellationToken, DropGuard};

/// Document served when the page cannot be rendered at all.
pub const FALLBACK_HTML: &str =
    r#"<!doctype html><p>Loading...</p><script src="clientrender.js"></script>"#;

/// Trailer carrying the final render status.
pub const RENDER_STATUS: HeaderName = HeaderName::from_static("x-render-status");

const HTML: &str = "text/html; charset=utf-8";

/// Body error ending a response whose render failed after the status was sent.
#[derive(Debug, thiserror::Error)]
#[error("page render failed after the response started")]
pub(crate) struct RenderAborted;

/// How a failure after the status line is reported to the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FailureSignal {
    /// Send the final status as the `x-render-status` trailer.
    Trailer,
    /// End the body with an error so the response never completes.
    Abort,
}

impl FailureSignal {
    /// Pick the signal for a request.
    ///
    /// HTTP/1.1 only delivers trailers to clients that ask for them with
    /// `TE: trailers`.
    pub(crate) fn for_request(headers: &HeaderMap) -> Self {
        let accepts_trailers = headers
            .get_all(header::TE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(','))
            .filter_map(|coding| coding.split(';').next())
            .any(|coding| coding.trim().eq_ignore_ascii_case("trailers"));

        if accepts_trailers {
            Self::Trailer
        } else {
            Self::Abort
        }
    }
}

/// Whether any render error has been reported for a response.
#[derive(Default)]
struct ErrorFlag(AtomicBool);

impl ErrorFlag {
    fn record(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    fn occurred(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn status(&self) -> StatusCode {
        if self.occurred() {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            StatusCode::OK
        }
    }
}

/// Render the page produced by `build` as a streaming response.
///
/// The render gets a fresh cancellation token that fires when the response
/// body is dropped before completion, i.e. when the client goes away.
pub(crate) fn stream_page(
    signal: FailureSignal,
    build: impl FnOnce() -> Result<Node, RenderError>,
) -> Response {
    let errors = Arc::new(ErrorFlag::default());
    let on_error: ErrorCallback = {
        let errors = Arc::clone(&errors);
        Arc::new(move |err: &RenderError| {
            errors.record();
            tracing::error!(error = %err, "Render error");
        })
    };
    let cancel = CancellationToken::new();

    let started = build().and_then(|node| {
        render_to_stream(
            node,
            RenderOptions {
                signal: cancel.clone(),
                on_error: Arc::clone(&on_error),
            },
        )
    });

    let stream = match started {
        Ok(stream) => stream,
        Err(err) => {
            on_error(&err);
            return fallback_response();
        }
    };

    let status = errors.status();
    // A 500 status line already tells the client; only a committed 200 needs
    // the body aborted.
    let abort_on_error = signal == FailureSignal::Abort && status == StatusCode::OK;
    let body = Body::new(StreamBody::new(body_frames(
        stream,
        errors,
        abort_on_error,
        cancel.drop_guard(),
    )));

    let mut response = (status, [(header::CONTENT_TYPE, HTML)], body).into_response();
    if signal == FailureSignal::Trailer {
        response
            .headers_mut()
            .insert(header::TRAILER, HeaderValue::from_static("x-render-status"));
    }
    response
}

/// Minimal document for when rendering cannot start.
fn fallback_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, HTML)],
        FALLBACK_HTML,
    )
        .into_response()
}

/// Forward rendered chunks as body frames, then the status trailer.
///
/// With `abort_on_error` set, a recorded error ends the body with
/// [`RenderAborted`] instead of the trailer.
fn body_frames(
    mut stream: RenderStream,
    errors: Arc<ErrorFlag>,
    abort_on_error: bool,
    cancel_on_drop: DropGuard,
) -> impl Stream<Item = Result<Frame<Bytes>, RenderAborted>> + Send {
    async_stream::stream! {
        while let Some(chunk) = stream.next().await {
            yield Ok(Frame::data(chunk));
        }

        // Finished normally, nothing left to cancel.
        cancel_on_drop.disarm();

        let status = errors.status();
        if status != StatusCode::OK {
            tracing::warn!(status = status.as_u16(), "Page streamed with render errors");
            if abort_on_error {
                yield Err(RenderAborted);
                return;
            }
        }
        let mut trailers = HeaderMap::new();
        trailers.insert(RENDER_STATUS, HeaderValue::from(status.as_u16()));
        yield Ok(Frame::trailers(trailers));
    }
}

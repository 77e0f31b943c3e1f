//! HTTP router and handlers.
//!
//! Two routes: the dispatch endpoint (`POST /`, operation selected by the
//! target header) and a liveness probe. All failure kinds share one
//! response shape, `{ "msg": "<reason>" }`, with the status taken from the
//! error taxonomy.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use super::dispatch::Dispatcher;
use crate::codec::encode_response;
use crate::Error;

/// Request header naming the target operation.
pub const TARGET_HEADER: &str = "x-certgate-target";

/// Shared application state
pub struct AppState {
    /// Dispatch pipeline
    pub dispatcher: Arc<Dispatcher>,
}

/// Create the router
pub fn create_router(state: Arc<AppState>, max_body_size: usize) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/", post(dispatch_handler))
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - liveness probe
async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// POST / - dispatch endpoint
async fn dispatch_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(operation) = headers.get(TARGET_HEADER).and_then(|v| v.to_str().ok()) else {
        return error_response(&Error::UnsupportedOperation(
            "request carries no target header".to_owned(),
        ));
    };

    match state.dispatcher.dispatch(operation, &body).await {
        Ok(result) => match encode_response(&result) {
            Ok(bytes) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                bytes,
            )
                .into_response(),
            Err(e) => error_response(&e),
        },
        Err(e) => error_response(&e),
    }
}

/// Uniform error envelope, applied to every failure kind.
fn error_response(err: &Error) -> Response {
    (err.status(), Json(json!({ "msg": err.to_string() }))).into_response()
}

//! `/update_rpc` handler and router.

use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use shadow_core::constants::{SUCCESS_BODY, UPDATE_ROUTE};
use shadow_core::{Dispatcher, LogSink};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// Shared state accessible from handlers.
#[derive(Clone)]
pub struct AppState {
    /// Normalizes and publishes.
    pub dispatcher: Dispatcher,
    /// User-visible log.
    pub log: Arc<dyn LogSink>,
}

/// Build the router: `POST /update_rpc`, 405 for everything else.
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route(UPDATE_ROUTE, post(update_rpc))
        .fallback(method_not_allowed)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// POST /update_rpc
async fn update_rpc(State(state): State<AppState>, body: Result<Bytes, BytesRejection>) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!(error = %rejection, error_kind = "body_read", "failed to read request body");
            state.log.append(&format!("Error handling request: {rejection}"));
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    // Detached so a caller hanging up cannot cancel a publish halfway.
    let handled = tokio::spawn(handle_update(state.clone(), body)).await;
    match handled {
        Ok(status) if status == StatusCode::OK => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            SUCCESS_BODY,
        )
            .into_response(),
        Ok(status) => status.into_response(),
        Err(e) => {
            error!(error = %e, error_kind = "task", "update task failed");
            state.log.append(&format!("Error handling request: {e}"));
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Normalize, publish and log one update. Runs to completion even if the
/// request that started it is gone.
async fn handle_update(state: AppState, body: Bytes) -> StatusCode {
    match state.dispatcher.dispatch(&body).await {
        Ok(update) => {
            info!(
                state = %update.state,
                details = %update.details,
                link_count = update.link_count(),
                "presence updated"
            );
            state.log.append(&update.summary());
            StatusCode::OK
        }
        Err(e) => {
            warn!(error = %e, error_kind = e.error_kind(), "error handling request");
            state.log.append(&format!("Error handling request: {e}"));
            StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Any other method or path. Expected traffic, so not logged as an error.
async fn method_not_allowed() -> StatusCode {
    debug!("rejecting request outside POST /update_rpc");
    StatusCode::METHOD_NOT_ALLOWED
}

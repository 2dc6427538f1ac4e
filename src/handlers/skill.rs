use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::warn;

use crate::skill::RequestEnvelope;
use crate::state::AppState;

/// Handles one skill request envelope and returns the response envelope.
///
/// Requests for a different skill id are rejected with 400 when
/// `ALEXA_APP_ID` is configured.
pub async fn skill_handler(
    State(state): State<Arc<AppState>>,
    Json(envelope): Json<RequestEnvelope>,
) -> Response {
    if let Err(e) = state.dispatcher.verify_application(&envelope) {
        warn!(error = %e, "Rejected skill request");
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response();
    }

    Json(state.dispatcher.handle(&envelope).await).into_response()
}

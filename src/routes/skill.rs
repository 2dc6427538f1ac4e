use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{api, skill};
use crate::state::AppState;
use std::sync::Arc;

/// Skill endpoints plus the public health check.
pub fn create_skill_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(skill::skill_handler))
        .route("/alexa", post(skill::skill_handler))
        .route("/health", get(api::health_check))
        .layer(TraceLayer::new_for_http())
}

//! Plain HTTP routes.

use std::sync::Arc;

use axum::routing::{any, get};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::api::{health_check, incoming_call};
use crate::state::AppState;

/// Health check and the telephony call webhook. The webhook accepts any
/// method; telephony providers POST it by default but can be configured
/// to GET.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health_check))
        .route("/incoming-call", any(incoming_call))
        .layer(TraceLayer::new_for_http())
}

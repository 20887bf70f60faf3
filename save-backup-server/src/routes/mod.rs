pub mod games;
pub mod health;
pub mod webhook;

use crate::state::AppState;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(games::router())
        .merge(webhook::router())
        .route("/health", axum::routing::get(health::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

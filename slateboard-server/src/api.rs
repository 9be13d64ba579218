//! API routes definition

use crate::handlers;
use crate::state::AppState;
use axum::{routing::post, Router};
use std::sync::Arc;

/// Build the document store API router
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/get", post(handlers::get_board))
        .route("/api/set", post(handlers::set_board))
        .with_state(state)
}

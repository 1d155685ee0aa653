use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::state::AppState;

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(handlers::health::health_check))
        .route("/api/properties", get(handlers::transform::list_properties))
        .route("/api/transform", post(handlers::transform::transform_document))
}

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use nemo_core::FlowFileTransform;

use crate::state::AppState;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub processor_version: String,
    pub nim_host: String,
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    info!("Health check requested");

    let response = HealthResponse {
        status: "ok".to_string(),
        version: VERSION.to_string(),
        processor_version: state.processor.details().version,
        nim_host: state.config.nim_host.clone(),
    };

    (StatusCode::OK, Json(response))
}

use axum::{
    body::Bytes,
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use nemo_core::{FlowFile, FlowFileTransform, ProcessorDetails, PropertyDescriptor, TransformResult};

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct PropertiesResponse {
    pub processor: ProcessorDetails,
    pub properties: Vec<PropertyDescriptor>,
}

pub async fn list_properties(State(state): State<AppState>) -> impl IntoResponse {
    Json(PropertiesResponse {
        processor: state.processor.details(),
        properties: state.processor.property_descriptors().to_vec(),
    })
}

/// Success maps to 200, failure to 502.
pub fn status_for(result: &TransformResult) -> StatusCode {
    if result.is_success() {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    }
}

#[instrument(skip(state, body), fields(bytes = body.len()))]
pub async fn transform_document(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    info!("Received document for extraction");

    let flowfile = FlowFile::new(body.to_vec());
    let result = state.processor.transform(&state.context, &flowfile).await;

    let status = status_for(&result);
    if !result.is_success() {
        warn!("Document routed to failure");
    }

    (status, Json(result))
}

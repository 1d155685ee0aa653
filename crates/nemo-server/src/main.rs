use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use nemo_core::{FlowFileTransform, ProcessContext};
use nemo_extraction::NvIngestService;
use nemo_processor::processor::{NemoRetrieverExtraction, HANDWRITING_THRESHOLD, NIM_HOST};
use nemo_server::routes;
use nemo_server::state::AppState;

const MAX_DOCUMENT_BYTES: usize = 256 * 1024 * 1024;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("nemo=info".parse()?))
        .init();

    let config = nemo_core::AppConfig::from_env();
    let host = config.server_host.clone();
    let port = config.server_port;

    let service = Arc::new(NvIngestService::new(config.client.clone()));
    let processor = Arc::new(NemoRetrieverExtraction::new(service));

    let context = ProcessContext::new()
        .with_property(NIM_HOST, config.nim_host.clone())
        .with_property(HANDWRITING_THRESHOLD, config.handwriting_threshold.clone());
    context.validate(processor.property_descriptors())?;

    tracing::info!(
        nim_host = %config.nim_host,
        nim_port = config.client.port,
        threshold = %config.handwriting_threshold,
        "NeMo Retriever processor configured"
    );

    let state = AppState {
        config,
        processor,
        context: Arc::new(context),
    };

    let app = routes::create_router()
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_DOCUMENT_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = format!("{host}:{port}");
    tracing::info!("NeMo extraction server listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

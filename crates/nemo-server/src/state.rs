use std::sync::Arc;

use nemo_core::{AppConfig, ProcessContext};
use nemo_processor::NemoRetrieverExtraction;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub processor: Arc<NemoRetrieverExtraction>,
    pub context: Arc<ProcessContext>,
}

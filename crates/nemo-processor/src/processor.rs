use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use nemo_core::config::{ProcessContext, PropertyDescriptor, Validator};
use nemo_core::error::{NemoError, Result};
use nemo_core::extraction::{ExtractMethod, ExtractOptions, ExtractionRequest, ExtractionService};
use nemo_core::transform::{FlowFile, FlowFileTransform, ProcessorDetails, TransformResult};

use crate::escalation::needs_escalation;

pub const NIM_HOST: &str = "NIM Host";
pub const HANDWRITING_THRESHOLD: &str = "Handwriting Confidence Threshold";

pub const ATTR_EXTRACTION_SUCCESS: &str = "nemo.extraction.success";
pub const ATTR_NEEDS_ESCALATION: &str = "nemo.needs.escalation";
pub const ATTR_MIME_TYPE: &str = "mime.type";
pub const JSON_MIME_TYPE: &str = "application/json";

/// Sends each flow file to NeMo Retriever and flags results that contain
/// handwriting or low-confidence blocks for escalation.
pub struct NemoRetrieverExtraction {
    service: Arc<dyn ExtractionService>,
    descriptors: Vec<PropertyDescriptor>,
}

impl NemoRetrieverExtraction {
    pub fn new(service: Arc<dyn ExtractionService>) -> Self {
        let host = PropertyDescriptor::new(NIM_HOST)
            .description("IP/Hostname of the NeMo Retriever NIM.")
            .required(true)
            .default_value("localhost")
            .validator(Validator::NonEmpty);
        let threshold = PropertyDescriptor::new(HANDWRITING_THRESHOLD)
            .description(
                "The score (0-1) below which we flag a document for 'Thinking' escalation.",
            )
            .required(true)
            .default_value("0.75")
            .validator(Validator::NonEmpty);

        Self {
            service,
            descriptors: vec![host, threshold],
        }
    }

    fn host_descriptor(&self) -> &PropertyDescriptor {
        &self.descriptors[0]
    }

    fn threshold_descriptor(&self) -> &PropertyDescriptor {
        &self.descriptors[1]
    }

    fn parse_threshold(raw: &str) -> Result<f64> {
        let threshold: f64 = raw.trim().parse().map_err(|e| {
            NemoError::Config(format!("invalid {HANDWRITING_THRESHOLD} '{raw}': {e}"))
        })?;
        if !(0.0..=1.0).contains(&threshold) {
            tracing::warn!(threshold, "Handwriting threshold outside [0, 1], using as-is");
        }
        Ok(threshold)
    }

    async fn run(&self, context: &ProcessContext, flowfile: &FlowFile) -> Result<TransformResult> {
        let host = context.require(self.host_descriptor())?;
        let threshold = Self::parse_threshold(context.require(self.threshold_descriptor())?)?;

        let request = ExtractionRequest::new(host)
            .files(vec![flowfile.contents().to_vec()])
            .extract(ExtractOptions {
                method: ExtractMethod::NemoretrieverParse,
                extract_text: true,
                extract_tables: true,
            });

        tracing::debug!(
            host = %host,
            threshold,
            bytes = flowfile.size(),
            "Requesting NeMo Retriever extraction"
        );

        let result = self.service.extract(&request).await?;
        let escalate = needs_escalation(&result, threshold);
        let contents = serde_json::to_string(&result)?;

        tracing::info!(
            pages = result.pages.len(),
            needs_escalation = escalate,
            "NeMo Retriever extraction succeeded"
        );

        let mut attributes = BTreeMap::new();
        attributes.insert(ATTR_EXTRACTION_SUCCESS.to_string(), "true".to_string());
        attributes.insert(ATTR_NEEDS_ESCALATION.to_string(), escalate.to_string());
        attributes.insert(ATTR_MIME_TYPE.to_string(), JSON_MIME_TYPE.to_string());

        Ok(TransformResult::success(contents, attributes))
    }
}

#[async_trait]
impl FlowFileTransform for NemoRetrieverExtraction {
    fn details(&self) -> ProcessorDetails {
        ProcessorDetails {
            version: "2.0.0".to_string(),
            description: "Extracts structured Markdown and metadata using NVIDIA NeMo Retriever."
                .to_string(),
            tags: ["nvidia", "nemo", "ocr", "ai", "agentic"]
                .into_iter()
                .map(String::from)
                .collect(),
            dependencies: vec!["nv-ingest".to_string()],
        }
    }

    fn property_descriptors(&self) -> &[PropertyDescriptor] {
        &self.descriptors
    }

    async fn transform(&self, context: &ProcessContext, flowfile: &FlowFile) -> TransformResult {
        match self.run(context, flowfile).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("NeMo NIM Error: {e}");
                TransformResult::failure()
            }
        }
    }
}

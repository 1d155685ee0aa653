use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use uuid::Uuid;

use nemo_core::extraction::{ExtractOptions, ExtractionRequest};

pub const DEFAULT_DOCUMENT_TYPE: &str = "pdf";

// ── nv-ingest job spec wire types ──────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct JobSpec {
    pub job_id: String,
    pub job_payload: JobPayload,
    pub tasks: Vec<Task>,
    pub tracing_options: TracingOptions,
}

#[derive(Debug, Serialize)]
pub struct JobPayload {
    pub source_name: Vec<String>,
    pub source_id: Vec<String>,
    pub content: Vec<String>,
    pub document_type: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct Task {
    #[serde(rename = "type")]
    pub task_type: String,
    pub task_properties: ExtractTaskProperties,
}

#[derive(Debug, Serialize)]
pub struct ExtractTaskProperties {
    pub method: String,
    pub document_type: String,
    pub params: ExtractParams,
}

#[derive(Debug, Serialize)]
pub struct ExtractParams {
    pub extract_text: bool,
    pub extract_tables: bool,
}

#[derive(Debug, Default, Serialize)]
pub struct TracingOptions {
    pub trace: bool,
}

/// Body of `POST /v1/submit_job`: the job spec travels as a JSON string.
#[derive(Debug, Serialize)]
pub struct SubmitJobRequest {
    pub payload: String,
}

impl JobSpec {
    pub fn from_request(request: &ExtractionRequest) -> Self {
        let count = request.files.len();
        let names: Vec<String> = (0..count).map(|i| format!("document_{i}")).collect();

        Self {
            job_id: Uuid::new_v4().to_string(),
            job_payload: JobPayload {
                source_name: names.clone(),
                source_id: names,
                content: request.files.iter().map(|f| STANDARD.encode(f)).collect(),
                document_type: vec![DEFAULT_DOCUMENT_TYPE.to_string(); count],
            },
            tasks: vec![Task::extract(&request.options)],
            tracing_options: TracingOptions::default(),
        }
    }

    pub fn to_submit_request(&self) -> serde_json::Result<SubmitJobRequest> {
        Ok(SubmitJobRequest {
            payload: serde_json::to_string(self)?,
        })
    }
}

impl Task {
    fn extract(options: &ExtractOptions) -> Self {
        Self {
            task_type: "extract".to_string(),
            task_properties: ExtractTaskProperties {
                method: options.method.as_str().to_string(),
                document_type: DEFAULT_DOCUMENT_TYPE.to_string(),
                params: ExtractParams {
                    extract_text: options.extract_text,
                    extract_tables: options.extract_tables,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nemo_core::extraction::ExtractMethod;

    fn parse_request() -> ExtractionRequest {
        ExtractionRequest::new("localhost")
            .files(vec![b"hello".to_vec()])
            .extract(ExtractOptions {
                method: ExtractMethod::NemoretrieverParse,
                extract_text: true,
                extract_tables: true,
            })
    }

    #[test]
    fn job_spec_carries_single_encoded_document() {
        let spec = JobSpec::from_request(&parse_request());

        assert_eq!(spec.job_payload.content, vec!["aGVsbG8=".to_string()]);
        assert_eq!(spec.job_payload.source_name, vec!["document_0".to_string()]);
        assert_eq!(spec.job_payload.document_type, vec!["pdf".to_string()]);
        assert!(Uuid::parse_str(&spec.job_id).is_ok());
    }

    #[test]
    fn extract_task_uses_requested_method_and_flags() {
        let spec = JobSpec::from_request(&parse_request());
        let json = serde_json::to_value(&spec).unwrap();

        let task = &json["tasks"][0];
        assert_eq!(task["type"], "extract");
        assert_eq!(task["task_properties"]["method"], "nemoretriever_parse");
        assert_eq!(task["task_properties"]["params"]["extract_text"], true);
        assert_eq!(task["task_properties"]["params"]["extract_tables"], true);
    }

    #[test]
    fn empty_document_is_passed_through() {
        let request = ExtractionRequest::new("localhost").files(vec![Vec::new()]);
        let spec = JobSpec::from_request(&request);
        assert_eq!(spec.job_payload.content, vec![String::new()]);
    }

    #[test]
    fn submit_request_wraps_spec_as_string() {
        let spec = JobSpec::from_request(&parse_request());
        let submit = spec.to_submit_request().unwrap();
        let inner: serde_json::Value = serde_json::from_str(&submit.payload).unwrap();
        assert_eq!(inner["job_id"], spec.job_id.as_str());
    }
}

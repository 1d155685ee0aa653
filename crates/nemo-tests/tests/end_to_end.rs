use std::sync::Arc;
use std::time::Duration;

use nemo_core::config::{ClientConfig, ProcessContext};
use nemo_core::transform::{FlowFile, FlowFileTransform, TransformResult};
use nemo_extraction::NvIngestService;
use nemo_processor::processor::{
    NemoRetrieverExtraction, ATTR_NEEDS_ESCALATION, HANDWRITING_THRESHOLD, NIM_HOST,
};
use nemo_tests::capture_errors;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn processor() -> NemoRetrieverExtraction {
    let service = NvIngestService::new(ClientConfig {
        port: 7670,
        poll_interval: Duration::from_millis(10),
        fetch_timeout: Some(Duration::from_secs(5)),
    });
    NemoRetrieverExtraction::new(Arc::new(service))
}

fn context(host: &str) -> ProcessContext {
    ProcessContext::new()
        .with_property(NIM_HOST, host)
        .with_property(HANDWRITING_THRESHOLD, "0.75")
}

async fn mount_job(server: &MockServer, job_id: &str, result: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/v1/submit_job"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_id))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/v1/fetch_job/{job_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(result))
        .mount(server)
        .await;
}

#[tokio::test]
async fn handwritten_page_over_http_escalates() {
    let server = MockServer::start().await;
    mount_job(
        &server,
        "job-hw",
        json!({
            "status": "success",
            "data": [
                {"metadata": [
                    {"class": "header", "confidence": 0.98},
                    {"class": "handwritten", "confidence": 0.91}
                ]}
            ]
        }),
    )
    .await;

    let result = processor()
        .transform(&context(&server.uri()), &FlowFile::new(b"%PDF-1.4".to_vec()))
        .await;

    assert!(result.is_success());
    assert_eq!(result.attribute(ATTR_NEEDS_ESCALATION), Some("true"));

    let contents: serde_json::Value =
        serde_json::from_str(result.contents.as_deref().unwrap()).unwrap();
    assert_eq!(contents[0]["metadata"][1]["class"], "handwritten");
}

#[tokio::test]
async fn submitted_job_encodes_the_document() {
    let server = MockServer::start().await;
    mount_job(&server, "job-enc", json!({"data": []})).await;

    let result = processor()
        .transform(&context(&server.uri()), &FlowFile::new(b"hello".to_vec()))
        .await;
    assert_eq!(result.contents.as_deref(), Some("[]"));

    let requests: Vec<Request> = server.received_requests().await.unwrap();
    let submit = requests
        .iter()
        .find(|r| r.url.path() == "/v1/submit_job")
        .expect("job was submitted");
    let body: serde_json::Value = serde_json::from_slice(&submit.body).unwrap();
    let spec: serde_json::Value =
        serde_json::from_str(body["payload"].as_str().unwrap()).unwrap();

    assert_eq!(spec["job_payload"]["content"][0], "aGVsbG8=");
    assert_eq!(spec["tasks"][0]["task_properties"]["method"], "nemoretriever_parse");
}

#[tokio::test]
async fn service_error_status_routes_to_failure() {
    let (errors, _guard) = capture_errors();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/submit_job"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let result = processor()
        .transform(&context(&server.uri()), &FlowFile::new(b"doc".to_vec()))
        .await;

    assert_eq!(result, TransformResult::failure());
    assert_eq!(errors.count(), 1);
}

#[tokio::test]
async fn unreachable_host_routes_to_failure() {
    let (errors, _guard) = capture_errors();

    // Nothing listens on port 1.
    let result = processor()
        .transform(&context("127.0.0.1:1"), &FlowFile::new(b"doc".to_vec()))
        .await;

    assert_eq!(result, TransformResult::failure());
    assert_eq!(errors.count(), 1);
}

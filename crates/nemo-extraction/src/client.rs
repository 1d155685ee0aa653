use std::time::Instant;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

use nemo_core::config::ClientConfig;
use nemo_core::error::{NemoError, Result};
use nemo_core::extraction::{ExtractedPage, ExtractionRequest, ExtractionResult, ExtractionService};

use crate::job::JobSpec;

/// Extraction over the nv-ingest REST API: submit one job, then fetch its
/// result until the service reports it ready.
pub struct NvIngestService {
    client: reqwest::Client,
    config: ClientConfig,
}

/// Value of `status` on a completed job.
const JOB_SUCCESS: &str = "success";

#[derive(Debug, Deserialize)]
struct FetchEnvelope {
    data: Vec<ExtractedPage>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    description: Option<serde_json::Value>,
}

/// Status-only body, sent when a job ends without data.
#[derive(Debug, Deserialize)]
struct FetchStatus {
    status: String,
    #[serde(default)]
    description: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FetchBody {
    Pages(Vec<ExtractedPage>),
    Envelope(FetchEnvelope),
    Status(FetchStatus),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SubmitResponse {
    JobId(String),
    Object { job_id: String },
}

impl NvIngestService {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Resolve a configured host into the service base URL. Bare hosts get
    /// `http://` and the configured port; URLs with a scheme are kept as-is.
    pub fn base_url(&self, host: &str) -> Result<Url> {
        let host = host.trim();
        if host.is_empty() {
            return Err(NemoError::Config("extraction service host is empty".into()));
        }

        let mut url = if host.contains("://") {
            Url::parse(host)
        } else {
            Url::parse(&format!("http://{host}"))
        }
        .map_err(|e| NemoError::Config(format!("invalid extraction service host '{host}': {e}")))?;

        if !host.contains("://") && url.port().is_none() {
            url.set_port(Some(self.config.port)).map_err(|_| {
                NemoError::Config(format!("cannot set port on extraction service host '{host}'"))
            })?;
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    fn endpoint(base: &Url, path: &str) -> Result<Url> {
        base.join(path)
            .map_err(|e| NemoError::Config(format!("invalid endpoint path '{path}': {e}")))
    }

    async fn submit_job(&self, base: &Url, spec: &JobSpec) -> Result<String> {
        let url = Self::endpoint(base, "v1/submit_job")?;
        let body = spec.to_submit_request()?;

        tracing::debug!(
            url = %url,
            job_id = %spec.job_id,
            files = spec.job_payload.content.len(),
            "Submitting extraction job"
        );

        let response = self.client.post(url).json(&body).send().await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(NemoError::Service {
                status: status.as_u16(),
                body: text,
            });
        }

        Self::parse_job_id(&text)
    }

    fn parse_job_id(text: &str) -> Result<String> {
        let job_id = match serde_json::from_str::<SubmitResponse>(text) {
            Ok(SubmitResponse::JobId(id)) | Ok(SubmitResponse::Object { job_id: id }) => id,
            Err(e) => {
                return Err(NemoError::Extraction(format!(
                    "Unexpected submit response '{text}': {e}"
                )))
            }
        };
        if job_id.trim().is_empty() {
            return Err(NemoError::Extraction(
                "Extraction service returned an empty job id".to_string(),
            ));
        }
        Ok(job_id)
    }

    async fn fetch_job(&self, base: &Url, job_id: &str) -> Result<ExtractionResult> {
        let url = Self::endpoint(base, &format!("v1/fetch_job/{job_id}"))?;
        let started = Instant::now();

        loop {
            let response = self.client.get(url.clone()).send().await?;

            match response.status() {
                StatusCode::OK => {
                    let text = response.text().await?;
                    let body: FetchBody = serde_json::from_str(&text).map_err(|e| {
                        NemoError::Extraction(format!("Unexpected job result shape: {e}"))
                    })?;
                    return Self::into_result(job_id, body);
                }
                StatusCode::ACCEPTED => {
                    if let Some(limit) = self.config.fetch_timeout {
                        if started.elapsed() >= limit {
                            return Err(NemoError::Extraction(format!(
                                "Job {job_id} not ready after {}s",
                                limit.as_secs()
                            )));
                        }
                    }
                    tracing::debug!(job_id = %job_id, "Job not ready yet");
                    tokio::time::sleep(self.config.poll_interval).await;
                }
                status => {
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "<failed to read body>".to_string());
                    return Err(NemoError::Service {
                        status: status.as_u16(),
                        body,
                    });
                }
            }
        }
    }

    fn into_result(job_id: &str, body: FetchBody) -> Result<ExtractionResult> {
        let pages = match body {
            FetchBody::Pages(pages) => pages,
            FetchBody::Envelope(envelope) => match envelope.status.as_deref() {
                None | Some(JOB_SUCCESS) => envelope.data,
                Some(status) => {
                    return Err(Self::job_failed(job_id, status, envelope.description))
                }
            },
            FetchBody::Status(body) if body.status == JOB_SUCCESS => {
                return Err(NemoError::Extraction(format!(
                    "Job {job_id} reported success without data"
                )))
            }
            FetchBody::Status(body) => {
                return Err(Self::job_failed(job_id, &body.status, body.description))
            }
        };
        Ok(ExtractionResult::new(pages))
    }

    fn job_failed(
        job_id: &str,
        status: &str,
        description: Option<serde_json::Value>,
    ) -> NemoError {
        let description = match description {
            Some(serde_json::Value::String(text)) => text,
            Some(other) => other.to_string(),
            None => "no description".to_string(),
        };
        NemoError::Extraction(format!("Job {job_id} {status}: {description}"))
    }
}

#[async_trait]
impl ExtractionService for NvIngestService {
    async fn extract(&self, request: &ExtractionRequest) -> Result<ExtractionResult> {
        let base = self.base_url(&request.host)?;
        let spec = JobSpec::from_request(request);

        let job_id = self.submit_job(&base, &spec).await?;
        let result = self.fetch_job(&base, &job_id).await?;

        tracing::info!(
            job_id = %job_id,
            pages = result.pages.len(),
            method = request.options.method.as_str(),
            "Extraction job complete"
        );

        Ok(result)
    }
}

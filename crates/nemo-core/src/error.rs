use thiserror::Error;

#[derive(Error, Debug)]
pub enum NemoError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Extraction service returned status {status}: {body}")]
    Service { status: u16, body: String },
}

pub type Result<T> = std::result::Result<T, NemoError>;

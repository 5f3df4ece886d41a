use std::io;

use thiserror::Error;

/// Crate-wide error for everything outside the fetch layer.
#[derive(Debug, Error)]
pub enum LeadError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("text generation failed: {0}")]
    Generation(String),
    #[error("mail transport failed: {0}")]
    Mail(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("source worker '{0}' panicked")]
    WorkerPanicked(String),
}

pub type Result<T> = std::result::Result<T, LeadError>;

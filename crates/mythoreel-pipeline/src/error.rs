//! Pipeline error types.
//!
//! Every variant is fatal to the current build; nothing is silently
//! downgraded. Segment-level stream validation failures are handled
//! inside the concatenator (logged and excluded) and only surface
//! here once all segments are exhausted.

use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Forced alignment failed: {0}")]
    Alignment(String),

    #[error("Media error: {0}")]
    Media(#[from] mythoreel_media::MediaError),

    #[error("Manifest error: {0}")]
    Manifest(#[from] mythoreel_models::ManifestError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    pub fn alignment(msg: impl Into<String>) -> Self {
        Self::Alignment(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

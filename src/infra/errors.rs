// src/infra/errors.rs — Error types for HealthMate

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HealthMateError {
    // Upload validation (local, user must re-upload)
    #[error("Image is {size} bytes, over the {limit} byte upload limit")]
    TooLarge { size: u64, limit: u64 },

    #[error("Unsupported image format: {detail} (expected png, jpg or jpeg)")]
    UnsupportedFormat { detail: String },

    // Session preconditions (local, user must upload first)
    #[error("No X-ray image uploaded yet. Upload an image before chatting.")]
    NoImageUploaded,

    #[error("No analysis report available yet. Run an analysis first.")]
    NoReportAvailable,

    // Provider errors (abort the in-flight turn only)
    #[error("Provider '{provider}' error: {message}")]
    Provider {
        provider: String,
        message: String,
        retriable: bool,
    },

    #[error("Rate limited by '{provider}', retry after {retry_after_ms}ms")]
    RateLimited {
        provider: String,
        retry_after_ms: u64,
    },

    // Speech (isolated from conversational state)
    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    // Infra
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HealthMateError {
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            HealthMateError::Provider {
                retriable: true,
                ..
            } | HealthMateError::RateLimited { .. }
        )
    }
}

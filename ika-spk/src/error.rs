//! Error types for ika-spk

use ika_core::Error as CoreError;
use thiserror::Error;

/// Audio cache and speech synthesis errors.
///
/// None of these are retried inside the crate.
#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider rejected our credentials (401/403) or none are configured
    #[error("Synthesis denied by {provider}: {detail}")]
    SynthesisDenied { provider: String, detail: String },

    #[error("Synthesis quota exceeded at {provider}: {detail}")]
    QuotaExceeded { provider: String, detail: String },

    #[error("Synthesis timed out after {0} ms")]
    Timeout(u64),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpeechError {
    /// Caller must fix credentials or quota before trying again
    pub fn is_denied(&self) -> bool {
        matches!(self, SpeechError::SynthesisDenied { .. } | SpeechError::QuotaExceeded { .. })
    }
}

impl From<SpeechError> for CoreError {
    fn from(err: SpeechError) -> Self {
        match err {
            SpeechError::Validation(msg) => CoreError::Validation(msg),
            SpeechError::Config(msg) => CoreError::Configuration(msg),
            SpeechError::SynthesisDenied { provider, detail } => CoreError::SynthesisDenied { provider, detail },
            SpeechError::QuotaExceeded { provider, detail } => CoreError::QuotaExceeded { provider, detail },
            SpeechError::Timeout(ms) => CoreError::SynthesisTimeout(ms),
            SpeechError::Engine(msg) => CoreError::Synthesis(msg),
            SpeechError::Storage(msg) => CoreError::Storage(msg),
            SpeechError::Io(e) => CoreError::Storage(e.to_string()),
        }
    }
}

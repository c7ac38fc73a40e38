use thiserror::Error;

/// How a caller should react to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The request itself is malformed; do not retry.
    Validation,
    /// Deployment problem (catalog, templates, settings). The service must not serve.
    Configuration,
    /// Transient collaborator failure; the caller may try again later.
    TryAgain,
    /// The external provider rejected our credentials or quota.
    FixCredentials,
    /// The feature is not available in this deployment.
    Unavailable,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Lexicon lookup unavailable: {0}")]
    LookupUnavailable(String),

    #[error("Speech synthesis denied by {provider}: {detail}")]
    SynthesisDenied { provider: String, detail: String },

    #[error("Speech synthesis quota exceeded at {provider}: {detail}")]
    QuotaExceeded { provider: String, detail: String },

    #[error("Speech synthesis timed out after {0} ms")]
    SynthesisTimeout(u64),

    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Feature unavailable: {0}")]
    Unavailable(String),
}

impl Error {
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::Validation(_) => ErrorClass::Validation,
            Error::Configuration(_) | Error::Serialization(_) => ErrorClass::Configuration,
            Error::SynthesisDenied { .. } | Error::QuotaExceeded { .. } => ErrorClass::FixCredentials,
            Error::Unavailable(_) => ErrorClass::Unavailable,
            Error::Io(_)
            | Error::LookupUnavailable(_)
            | Error::SynthesisTimeout(_)
            | Error::Synthesis(_)
            | Error::Storage(_) => ErrorClass::TryAgain,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::TryAgain
    }
}

pub type Result<T> = std::result::Result<T, Error>;

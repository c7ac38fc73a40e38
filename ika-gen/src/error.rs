//! Error types for ika-gen

use ika_core::Error as CoreError;
use thiserror::Error;

/// Failures of the external lexicon store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store unreachable: {0}")]
    Unavailable(String),

    #[error("store returned malformed data: {0}")]
    Malformed(String),
}

/// Catalog load failures. Always fatal at startup.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Cannot read catalog file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse catalog file {path}: {detail}")]
    Parse { path: String, detail: String },

    #[error("Catalog validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Invalid(Vec<String>),
}

/// Generation errors
#[derive(Error, Debug)]
pub enum GenError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Lexicon lookup unavailable: {0}")]
    LookupUnavailable(#[from] StoreError),
}

impl From<CoreError> for GenError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => GenError::Validation(msg),
            CoreError::LookupUnavailable(msg) => GenError::LookupUnavailable(StoreError::Unavailable(msg)),
            other => GenError::Configuration(other.to_string()),
        }
    }
}

impl From<GenError> for CoreError {
    fn from(err: GenError) -> Self {
        match err {
            GenError::Validation(msg) => CoreError::Validation(msg),
            GenError::Configuration(msg) => CoreError::Configuration(msg),
            GenError::Catalog(e) => CoreError::Configuration(e.to_string()),
            GenError::LookupUnavailable(e) => CoreError::LookupUnavailable(e.to_string()),
        }
    }
}

impl GenError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, GenError::Configuration(_) | GenError::Catalog(_))
    }
}

//! ika-core: shared types, error taxonomy and configuration for the Ika
//! generation engine and audio cache.

pub mod config;
pub mod error;
pub mod types;

pub use config::{AudioConfig, CatalogConfig, ConfigError, IkaConfig, LexiconConfig, StoreKind, SynthesisConfig};
pub use error::{Error, ErrorClass, Result};
pub use types::{
    GenerationKind, GenerationMeta, GenerationRequest, GenerationResult, LexiconEntry, Length, PartOfSpeech,
    Tense, Tone, TranslateRequest, UsedEntry,
};

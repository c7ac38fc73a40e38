//! ika-gen: rule-based translation and text generation for Ika
//!
//! Provides:
//! - Lexicon access with exact lookup and near-miss suggestions
//! - A validated, immutable pattern catalog (patterns, rules, pronouns, connectors, templates)
//! - Tense, negation and question marking
//! - Slot filling with graceful per-slot fallback
//! - Single-sentence translation and poem/story/lecture composition

pub mod catalog;
pub mod error;
pub mod generator;
pub mod lexicon;
pub mod rules;
pub mod slot_filler;

pub use catalog::{CatalogHandle, CatalogSource, GrammarPattern, PatternCatalog, Template};
pub use error::{CatalogError, GenError, StoreError};
pub use generator::Generator;
pub use lexicon::{InMemoryLexiconStore, LexiconAccessor, LexiconStore, LookupResult, SuggestionRanker};
pub use rules::{GrammarRules, RuleEngine, RuleOptions};
pub use slot_filler::{Concept, FillContext, FilledPattern, SlotFiller};

use ika_core::IkaConfig;
use std::sync::Arc;

/// Load the lexicon export and catalog named by `config` and wire up a generator.
///
/// Catalog validation failures are returned, never served around.
pub fn open(config: &IkaConfig) -> Result<Generator, GenError> {
    let store = InMemoryLexiconStore::load(config.data_path(&config.lexicon.export_file))
        .map_err(|e| GenError::Configuration(format!("cannot load lexicon export: {}", e)))?;
    let lexicon = Arc::new(LexiconAccessor::new(Arc::new(store), config.lexicon.clone()));
    let catalog = PatternCatalog::load_dir(&config.data_dir, &config.catalog)?;
    Ok(Generator::new(Arc::new(CatalogHandle::new(catalog)), lexicon))
}

//! Shared fixtures for ika-gen integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use ika_core::{CatalogConfig, LexiconConfig, LexiconEntry};
use ika_gen::catalog::CatalogSource;
use ika_gen::{
    CatalogHandle, Generator, InMemoryLexiconStore, LexiconAccessor, LexiconStore, PatternCatalog, StoreError,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../data")
}

pub fn data_store() -> InMemoryLexiconStore {
    InMemoryLexiconStore::load(data_dir().join("lexicon.json")).expect("reference lexicon loads")
}

pub fn data_source() -> CatalogSource {
    CatalogSource::from_dir(data_dir()).expect("reference catalog reads")
}

pub fn data_catalog() -> PatternCatalog {
    PatternCatalog::load(data_source(), &CatalogConfig::default()).expect("reference catalog validates")
}

pub fn generator_with_store(store: Arc<dyn LexiconStore>) -> Generator {
    let lexicon = Arc::new(LexiconAccessor::new(store, LexiconConfig::default()));
    Generator::new(Arc::new(CatalogHandle::new(data_catalog())), lexicon)
}

pub fn generator() -> Generator {
    generator_with_store(Arc::new(data_store()))
}

pub fn entry(id: &str, source: &str, target: &str) -> LexiconEntry {
    LexiconEntry {
        id: id.to_string(),
        source_text: source.to_string(),
        target_text: target.to_string(),
        pos: None,
        domain: None,
        audio_url: None,
    }
}

/// Store whose backend is always down
pub struct FailingStore;

#[async_trait]
impl LexiconStore for FailingStore {
    async fn query(&self, _source_text: &str) -> Result<Vec<LexiconEntry>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn query_prefix(&self, _prefix: &str, _limit: usize) -> Result<Vec<LexiconEntry>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn query_target(&self, _target_text: &str) -> Result<Vec<LexiconEntry>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn list(&self, _domain: Option<&str>, _limit: usize) -> Result<Vec<LexiconEntry>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn get(&self, _id: &str) -> Result<Option<LexiconEntry>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

/// Wraps a store and counts exact queries
pub struct CountingStore {
    pub inner: InMemoryLexiconStore,
    pub queries: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: InMemoryLexiconStore) -> Self {
        Self {
            inner,
            queries: AtomicUsize::new(0),
        }
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LexiconStore for CountingStore {
    async fn query(&self, source_text: &str) -> Result<Vec<LexiconEntry>, StoreError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.inner.query(source_text).await
    }

    async fn query_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<LexiconEntry>, StoreError> {
        self.inner.query_prefix(prefix, limit).await
    }

    async fn query_target(&self, target_text: &str) -> Result<Vec<LexiconEntry>, StoreError> {
        self.inner.query_target(target_text).await
    }

    async fn list(&self, domain: Option<&str>, limit: usize) -> Result<Vec<LexiconEntry>, StoreError> {
        self.inner.list(domain, limit).await
    }

    async fn get(&self, id: &str) -> Result<Option<LexiconEntry>, StoreError> {
        self.inner.get(id).await
    }
}

/// Small in-memory catalog source. Tests mutate the JSON before parsing.
pub fn minimal_source_json() -> serde_json::Value {
    serde_json::json!({
        "patterns": {
            "version": "test-1",
            "patterns": [
                {
                    "pattern_id": "simple",
                    "slots": [{"name": "phrase", "source": "phrase"}],
                    "template": "{phrase}",
                    "example": "ya"
                },
                {
                    "pattern_id": "subject_verb",
                    "slots": [
                        {"name": "subject", "kind": "subject"},
                        {"name": "verb", "kind": "verb"}
                    ],
                    "template": "{subject} {verb}",
                    "example": "nne je"
                }
            ]
        },
        "rules": {
            "tense_markers": {"past": "ka"},
            "negation": {"marker": "e"},
            "questions": {"yes_no_marker": "ma"}
        },
        "pronouns": {
            "subject_pronouns": [{"english": "I", "ika": "mi"}],
            "object_pronouns": []
        },
        "connectors": {
            "connectors": [{"id": "and", "english": "and", "ika": "na"}]
        },
        "templates": {
            "templates": [
                {
                    "template_id": "poem_test",
                    "kind": "poem",
                    "sections": [{"name": "stanza", "pattern_pool": ["subject_verb"]}],
                    "connectors": ["and"]
                }
            ]
        }
    })
}

pub fn source_from_json(value: serde_json::Value) -> CatalogSource {
    CatalogSource {
        patterns: serde_json::from_value(value["patterns"].clone()).expect("patterns parse"),
        rules: serde_json::from_value(value["rules"].clone()).expect("rules parse"),
        pronouns: serde_json::from_value(value["pronouns"].clone()).expect("pronouns parse"),
        connectors: serde_json::from_value(value["connectors"].clone()).expect("connectors parse"),
        templates: serde_json::from_value(value["templates"].clone()).expect("templates parse"),
    }
}

//! ika-spk: content-addressed audio cache for Ika text
//!
//! Audio is produced only through [`AudioCacheManager::get_or_synthesize`].
//! Text generation never triggers synthesis.

pub mod cache;
pub mod config;
pub mod engines;
pub mod error;
pub mod key;
pub mod ssml;
pub mod storage;

pub use cache::{AudioCacheManager, AudioOutcome, AudioRef, CacheStats, MAX_TEXT_BYTES};
pub use config::VoiceParams;
pub use engines::api::HttpTtsEngine;
pub use engines::custom::CustomTtsEngine;
pub use engines::TtsEngine;
pub use error::SpeechError;
pub use key::{normalize_text, AudioCacheKey};
pub use ssml::{text_to_ssml, IpaDictionary};
pub use storage::{AudioCacheEntry, FsObjectStore, MemoryObjectStore, ObjectStore};

use ika_core::{IkaConfig, StoreKind};
use std::sync::Arc;
use tracing::{info, warn};

/// Object store described by `config.audio`
pub fn open_store(config: &IkaConfig) -> Result<Arc<dyn ObjectStore>, SpeechError> {
    let audio = &config.audio;
    let store: Arc<dyn ObjectStore> = match audio.store {
        StoreKind::Memory => Arc::new(MemoryObjectStore::new(audio.cache_prefix.clone())),
        StoreKind::Filesystem => Arc::new(FsObjectStore::new(
            &audio.cache_dir,
            audio.cache_prefix.clone(),
            audio.public_base_url.as_deref(),
        )?),
    };
    Ok(store)
}

/// HTTP synthesis engine described by `config.synthesis`
pub fn open_engine(config: &IkaConfig) -> Result<HttpTtsEngine, SpeechError> {
    let synthesis = &config.synthesis;
    let mut engine = HttpTtsEngine::from_config(synthesis)?;

    if synthesis.use_ssml_phonemes {
        match &synthesis.ipa_dictionary {
            Some(path) => {
                let dictionary = IpaDictionary::load(config.data_path(path))?;
                engine = engine.with_phonemes(dictionary);
            }
            None => warn!("SSML phonemes enabled but no IPA dictionary configured, sending plain text"),
        }
    }

    if !engine.is_available() {
        warn!("No synthesis API key configured; cache misses will be denied");
    }
    Ok(engine)
}

/// Cache manager wired to the configured store and HTTP engine
pub fn open(config: &IkaConfig) -> Result<AudioCacheManager, SpeechError> {
    let store = open_store(config)?;
    let engine = open_engine(config)?;
    info!("Audio cache using {} store and {} engine", store.name(), engine.name());
    Ok(AudioCacheManager::from_config(&config.audio, store, Arc::new(engine)))
}

//! Content-addressed audio cache in front of a synthesis engine
//!
//! Identical requests collapse onto one key. Concurrent misses for the same
//! key are serialized by a per-key guard, so the engine is called at most once
//! per key at a time and later callers find the stored object.

use crate::config::VoiceParams;
use crate::engines::TtsEngine;
use crate::error::SpeechError;
use crate::key::{normalize_text, AudioCacheKey};
use crate::storage::{AudioCacheEntry, ObjectStore};
use bytes::Bytes;
use dashmap::DashMap;
use ika_core::AudioConfig;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Largest text accepted for synthesis, in bytes
pub const MAX_TEXT_BYTES: usize = 5_000;
const DEFAULT_TIMEOUT_MS: u64 = 15_000;
const DEFAULT_MAX_AUDIO_BYTES: usize = 10 * 1024 * 1024;

/// Where the caller finds the audio
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioRef {
    /// Reference into the object store
    Stored(String),
    /// Store write failed; the synthesized bytes are handed back directly
    Unpersisted(Bytes),
}

impl AudioRef {
    pub fn storage_ref(&self) -> Option<&str> {
        match self {
            AudioRef::Stored(reference) => Some(reference),
            AudioRef::Unpersisted(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AudioOutcome {
    pub key: AudioCacheKey,
    pub audio_ref: AudioRef,
    pub cache_hit: bool,
    /// False only when synthesis succeeded but the store write did not
    pub cache_persisted: bool,
    pub entry: Option<AudioCacheEntry>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub synth_calls: u64,
    pub persist_failures: u64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    synth_calls: AtomicU64,
    persist_failures: AtomicU64,
}

type FlightMap = DashMap<AudioCacheKey, Arc<Mutex<()>>>;

/// Drops a key's map slot once no caller holds its guard, even if the
/// waiting future is cancelled. Must be declared before the `Arc` it covers.
struct FlightSlot<'a> {
    map: &'a FlightMap,
    key: AudioCacheKey,
}

impl<'a> FlightSlot<'a> {
    fn new(map: &'a FlightMap, key: &AudioCacheKey) -> Self {
        Self { map, key: key.clone() }
    }

    fn lock(&self) -> Arc<Mutex<()>> {
        self.map
            .entry(self.key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl Drop for FlightSlot<'_> {
    fn drop(&mut self) {
        self.map.remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

pub struct AudioCacheManager {
    store: Arc<dyn ObjectStore>,
    engine: Arc<dyn TtsEngine>,
    in_flight: FlightMap,
    default_timeout: Duration,
    max_audio_bytes: usize,
    counters: Counters,
}

impl AudioCacheManager {
    pub fn new(store: Arc<dyn ObjectStore>, engine: Arc<dyn TtsEngine>) -> Self {
        Self {
            store,
            engine,
            in_flight: DashMap::new(),
            default_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            max_audio_bytes: DEFAULT_MAX_AUDIO_BYTES,
            counters: Counters::default(),
        }
    }

    pub fn from_config(config: &AudioConfig, store: Arc<dyn ObjectStore>, engine: Arc<dyn TtsEngine>) -> Self {
        Self::new(store, engine)
            .with_timeout(Duration::from_millis(config.synthesis_timeout_ms))
            .with_max_audio_bytes(config.max_audio_bytes)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_max_audio_bytes(mut self, max_audio_bytes: usize) -> Self {
        self.max_audio_bytes = max_audio_bytes;
        self
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub fn engine(&self) -> &Arc<dyn TtsEngine> {
        &self.engine
    }

    /// Validate inputs and derive the cache key without touching the store.
    /// The voice id is replaced by the engine's fingerprint of it.
    pub fn key_for(&self, text: &str, voice: &VoiceParams) -> Result<AudioCacheKey, SpeechError> {
        validate_text(text)?;
        voice.validate()?;
        let rendered = VoiceParams {
            voice_id: self.engine.voice_fingerprint(&voice.voice_id),
            ..voice.clone()
        };
        Ok(AudioCacheKey::derive(text, &rendered))
    }

    pub async fn get_or_synthesize(&self, text: &str, voice: &VoiceParams) -> Result<AudioOutcome, SpeechError> {
        self.get_or_synthesize_with_timeout(text, voice, self.default_timeout)
            .await
    }

    /// Return the stored audio for `(text, voice)`, synthesizing and storing
    /// it on a miss. `timeout` bounds the engine call only.
    pub async fn get_or_synthesize_with_timeout(
        &self,
        text: &str,
        voice: &VoiceParams,
        timeout: Duration,
    ) -> Result<AudioOutcome, SpeechError> {
        let key = self.key_for(text, voice)?;

        if let Some(entry) = self.store.head(&key).await? {
            return Ok(self.hit(key, entry));
        }

        let slot = FlightSlot::new(&self.in_flight, &key);
        let lock = slot.lock();
        let _guard = lock.lock().await;

        // another caller may have stored it while we waited
        if let Some(entry) = self.store.head(&key).await? {
            return Ok(self.hit(key, entry));
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        let normalized = normalize_text(text);
        let audio = self.synthesize(&normalized, voice, timeout).await?;

        match self.store.put(&key, audio.clone()).await {
            Ok(entry) => {
                info!(
                    "Cached {} bytes of audio under {} via {}",
                    audio.len(),
                    key,
                    self.store.name()
                );
                Ok(AudioOutcome {
                    key,
                    audio_ref: AudioRef::Stored(entry.storage_ref.clone()),
                    cache_hit: false,
                    cache_persisted: true,
                    entry: Some(entry),
                })
            }
            Err(e) => {
                self.counters.persist_failures.fetch_add(1, Ordering::Relaxed);
                warn!("Audio for {} synthesized but not cached: {}", key, e);
                Ok(AudioOutcome {
                    key,
                    audio_ref: AudioRef::Unpersisted(audio),
                    cache_hit: false,
                    cache_persisted: false,
                    entry: None,
                })
            }
        }
    }

    /// Stored audio bytes for a key
    pub async fn fetch(&self, key: &AudioCacheKey) -> Result<Option<Bytes>, SpeechError> {
        self.store.get(key).await
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            synth_calls: self.counters.synth_calls.load(Ordering::Relaxed),
            persist_failures: self.counters.persist_failures.load(Ordering::Relaxed),
        }
    }

    /// Keys with a miss currently being resolved
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    fn hit(&self, key: AudioCacheKey, entry: AudioCacheEntry) -> AudioOutcome {
        self.counters.hits.fetch_add(1, Ordering::Relaxed);
        debug!("Audio cache hit for {}", key);
        AudioOutcome {
            key,
            audio_ref: AudioRef::Stored(entry.storage_ref.clone()),
            cache_hit: true,
            cache_persisted: true,
            entry: Some(entry),
        }
    }

    async fn synthesize(&self, text: &str, voice: &VoiceParams, timeout: Duration) -> Result<Bytes, SpeechError> {
        self.counters.synth_calls.fetch_add(1, Ordering::Relaxed);
        debug!("Synthesizing {} chars with {}", text.len(), self.engine.name());

        let audio = match tokio::time::timeout(timeout, self.engine.synthesize(text, voice)).await {
            Ok(Ok(audio)) => audio,
            Ok(Err(e)) => {
                if e.is_denied() {
                    error!("Synthesis refused by {}: {}", self.engine.name(), e);
                } else {
                    warn!("Synthesis failed on {}: {}", self.engine.name(), e);
                }
                return Err(e);
            }
            Err(_) => {
                let ms = timeout.as_millis() as u64;
                warn!("Synthesis on {} timed out after {} ms", self.engine.name(), ms);
                return Err(SpeechError::Timeout(ms));
            }
        };

        if audio.is_empty() {
            return Err(SpeechError::Engine(format!("{} returned no audio", self.engine.name())));
        }
        if audio.len() > self.max_audio_bytes {
            return Err(SpeechError::Engine(format!(
                "Generated audio too large ({} bytes, max {} bytes)",
                audio.len(),
                self.max_audio_bytes
            )));
        }
        Ok(audio)
    }
}

fn validate_text(text: &str) -> Result<(), SpeechError> {
    if text.trim().is_empty() {
        return Err(SpeechError::Validation("Text cannot be empty".to_string()));
    }
    if text.contains('\0') {
        return Err(SpeechError::Validation("Text contains null bytes".to_string()));
    }
    if text.len() > MAX_TEXT_BYTES {
        return Err(SpeechError::Validation(format!(
            "Text too long (max {} bytes)",
            MAX_TEXT_BYTES
        )));
    }
    Ok(())
}

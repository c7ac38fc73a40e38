//! Shared fixtures for ika-spk integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use ika_spk::{
    AudioCacheEntry, AudioCacheKey, AudioCacheManager, MemoryObjectStore, ObjectStore, SpeechError, TtsEngine,
    VoiceParams,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// What a scripted engine does on every call
#[derive(Clone)]
pub enum Script {
    Audio,
    Empty,
    Fail(fn() -> SpeechError),
}

/// Engine that counts calls and answers with fake MP3 bytes derived from
/// the request, optionally after a delay
pub struct ScriptedEngine {
    calls: AtomicUsize,
    delay: Duration,
    script: Script,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
            script: Script::Audio,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_script(mut self, script: Script) -> Self {
        self.script = script;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn fake_audio(text: &str, voice: &VoiceParams) -> Bytes {
    Bytes::from(format!("ID3|{}|{}|{}|{}", text, voice.voice_id, voice.rate, voice.pitch))
}

#[async_trait]
impl TtsEngine for ScriptedEngine {
    async fn synthesize(&self, text: &str, voice: &VoiceParams) -> Result<Bytes, SpeechError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.script {
            Script::Audio => Ok(fake_audio(text, voice)),
            Script::Empty => Ok(Bytes::new()),
            Script::Fail(make) => Err(make()),
        }
    }

    async fn list_voices(&self) -> Result<Vec<String>, SpeechError> {
        Ok(vec!["default".to_string()])
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Store that reads fine but refuses every write
pub struct ReadOnlyStore {
    inner: MemoryObjectStore,
    puts: AtomicUsize,
}

impl ReadOnlyStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryObjectStore::default(),
            puts: AtomicUsize::new(0),
        }
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for ReadOnlyStore {
    async fn get(&self, key: &AudioCacheKey) -> Result<Option<Bytes>, SpeechError> {
        self.inner.get(key).await
    }

    async fn put(&self, _key: &AudioCacheKey, _audio: Bytes) -> Result<AudioCacheEntry, SpeechError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        Err(SpeechError::Storage("bucket is read-only".to_string()))
    }

    async fn head(&self, key: &AudioCacheKey) -> Result<Option<AudioCacheEntry>, SpeechError> {
        self.inner.head(key).await
    }

    fn name(&self) -> &str {
        "read-only"
    }
}

pub fn manager(engine: Arc<ScriptedEngine>) -> (AudioCacheManager, Arc<MemoryObjectStore>) {
    let store = Arc::new(MemoryObjectStore::default());
    let manager = AudioCacheManager::new(store.clone(), engine);
    (manager, store)
}

pub fn voice() -> VoiceParams {
    VoiceParams::new("default", 1.0, 0.0)
}

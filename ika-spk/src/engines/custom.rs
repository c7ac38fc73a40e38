//! Closure-backed TTS engine
//! Lets callers plug in their own synthesizer without implementing the trait

use crate::config::VoiceParams;
use crate::engines::TtsEngine;
use crate::error::SpeechError;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

type SynthesizeFn = dyn Fn(&str, &VoiceParams) -> Result<Bytes, SpeechError> + Send + Sync;

pub struct CustomTtsEngine {
    name: String,
    synthesize_fn: Arc<SynthesizeFn>,
    voices: Vec<String>,
}

impl CustomTtsEngine {
    pub fn new<F>(name: impl Into<String>, synthesize_fn: F) -> Self
    where
        F: Fn(&str, &VoiceParams) -> Result<Bytes, SpeechError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            synthesize_fn: Arc::new(synthesize_fn),
            voices: vec!["default".to_string()],
        }
    }

    pub fn with_voices(mut self, voices: Vec<String>) -> Self {
        self.voices = voices;
        self
    }
}

#[async_trait]
impl TtsEngine for CustomTtsEngine {
    async fn synthesize(&self, text: &str, voice: &VoiceParams) -> Result<Bytes, SpeechError> {
        if text.is_empty() {
            return Err(SpeechError::Validation("Text cannot be empty".to_string()));
        }
        (self.synthesize_fn)(text, voice)
    }

    async fn list_voices(&self) -> Result<Vec<String>, SpeechError> {
        Ok(self.voices.clone())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        &self.name
    }
}

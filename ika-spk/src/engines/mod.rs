//! Speech synthesis engines

pub mod api;
pub mod custom;

use crate::config::VoiceParams;
use crate::error::SpeechError;
use async_trait::async_trait;
use bytes::Bytes;

/// External speech synthesis collaborator
#[async_trait]
pub trait TtsEngine: Send + Sync {
    /// Synthesize text to encoded audio (MP3)
    async fn synthesize(&self, text: &str, voice: &VoiceParams) -> Result<Bytes, SpeechError>;

    /// Voice identifiers this engine accepts
    async fn list_voices(&self) -> Result<Vec<String>, SpeechError>;

    /// Check if engine is usable (credentials present, binary found, ...)
    fn is_available(&self) -> bool;

    /// Identity of the voice actually rendered for `voice_id`. Enters the
    /// cache key in place of the caller's voice id, so remapping an alias
    /// or changing the input format yields new keys.
    fn voice_fingerprint(&self, voice_id: &str) -> String {
        voice_id.to_string()
    }

    fn name(&self) -> &str;
}

//! Content-addressed cache keys

use crate::config::VoiceParams;
use crate::error::SpeechError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Bumped whenever the canonical encoding below changes
const KEY_DOMAIN: &[u8] = b"ika-audio-key/v1";

/// Trim and collapse internal whitespace. Case is kept: it can change
/// pronunciation.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `-0.0` and `0.0` must hash alike
fn canonical_bits(value: f64) -> u64 {
    if value == 0.0 {
        0.0f64.to_bits()
    } else {
        value.to_bits()
    }
}

fn update_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}

/// SHA-256 of the normalized text and voice parameters, lowercase hex
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AudioCacheKey(String);

impl AudioCacheKey {
    pub fn derive(text: &str, voice: &VoiceParams) -> Self {
        let mut hasher = Sha256::new();
        update_field(&mut hasher, KEY_DOMAIN);
        update_field(&mut hasher, normalize_text(text).as_bytes());
        update_field(&mut hasher, voice.voice_id.as_bytes());
        update_field(&mut hasher, &canonical_bits(voice.rate).to_be_bytes());
        update_field(&mut hasher, &canonical_bits(voice.pitch).to_be_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Accept only 64 lowercase hex characters
    pub fn parse(value: &str) -> Result<Self, SpeechError> {
        let valid = value.len() == 64 && value.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'));
        if !valid {
            return Err(SpeechError::Validation(format!("'{}' is not an audio cache key", value)));
        }
        Ok(Self(value.to_string()))
    }

    /// Key from a stored object name such as `<key>.mp3`
    pub fn from_file_name(name: &str) -> Result<Self, SpeechError> {
        let stem = name
            .strip_suffix(".mp3")
            .ok_or_else(|| SpeechError::Validation(format!("'{}' is not an mp3 object", name)))?;
        Self::parse(stem)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn file_name(&self) -> String {
        format!("{}.mp3", self.0)
    }
}

impl fmt::Display for AudioCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AudioCacheKey {
    type Error = SpeechError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AudioCacheKey> for String {
    fn from(key: AudioCacheKey) -> Self {
        key.0
    }
}

//! Voice parameters for synthesis requests

use crate::error::SpeechError;
use serde::{Deserialize, Serialize};

pub const MIN_RATE: f64 = 0.25;
pub const MAX_RATE: f64 = 4.0;
pub const MIN_PITCH: f64 = -20.0;
pub const MAX_PITCH: f64 = 20.0;
const MAX_VOICE_ID_LEN: usize = 64;

/// Voice identifier, speaking rate and pitch (semitones)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceParams {
    pub voice_id: String,
    #[serde(default = "default_rate")]
    pub rate: f64,
    #[serde(default)]
    pub pitch: f64,
}

fn default_rate() -> f64 {
    1.0
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self {
            voice_id: "default".to_string(),
            rate: 1.0,
            pitch: 0.0,
        }
    }
}

impl VoiceParams {
    pub fn new(voice_id: impl Into<String>, rate: f64, pitch: f64) -> Self {
        Self {
            voice_id: voice_id.into(),
            rate,
            pitch,
        }
    }

    pub fn validate(&self) -> Result<(), SpeechError> {
        if self.voice_id.is_empty() {
            return Err(SpeechError::Validation("voice_id cannot be empty".to_string()));
        }
        if self.voice_id.len() > MAX_VOICE_ID_LEN {
            return Err(SpeechError::Validation(format!(
                "voice_id too long (max {} chars)",
                MAX_VOICE_ID_LEN
            )));
        }
        if !self
            .voice_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(SpeechError::Validation(format!(
                "voice_id '{}' may only contain ASCII letters, digits, '-' and '_'",
                self.voice_id
            )));
        }
        if !self.rate.is_finite() || !(MIN_RATE..=MAX_RATE).contains(&self.rate) {
            return Err(SpeechError::Validation(format!(
                "rate must be between {} and {}",
                MIN_RATE, MAX_RATE
            )));
        }
        if !self.pitch.is_finite() || !(MIN_PITCH..=MAX_PITCH).contains(&self.pitch) {
            return Err(SpeechError::Validation(format!(
                "pitch must be between {} and {}",
                MIN_PITCH, MAX_PITCH
            )));
        }
        Ok(())
    }
}

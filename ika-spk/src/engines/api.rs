//! REST speech synthesis engine (Google Cloud Text-to-Speech wire format)

use crate::config::VoiceParams;
use crate::engines::TtsEngine;
use crate::error::SpeechError;
use crate::ssml::{text_to_ssml, IpaDictionary};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;
use ika_core::SynthesisConfig;
use reqwest::{Client, StatusCode};
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, error, warn};

pub const PROVIDER: &str = "google-tts";
const FALLBACK_VOICE: &str = "en-GB-Standard-A";
const MAX_ERROR_DETAIL: usize = 200;

pub struct HttpTtsEngine {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
    voices: BTreeMap<String, String>,
    phonemes: Option<IpaDictionary>,
}

impl HttpTtsEngine {
    pub fn new(
        endpoint: &str,
        api_key: Option<String>,
        timeout_secs: u64,
        voices: BTreeMap<String, String>,
    ) -> Result<Self, SpeechError> {
        let timeout = Duration::from_secs(timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SpeechError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.is_empty()),
            timeout,
            voices,
            phonemes: None,
        })
    }

    pub fn from_config(config: &SynthesisConfig) -> Result<Self, SpeechError> {
        Self::new(
            &config.endpoint,
            config.api_key.clone(),
            config.timeout_secs,
            config.voices.clone(),
        )
    }

    /// Send SSML with IPA phoneme hints for words in `dictionary`
    pub fn with_phonemes(mut self, dictionary: IpaDictionary) -> Self {
        self.phonemes = Some(dictionary);
        self
    }

    /// Map a voice alias to the provider's voice name. Unknown aliases use
    /// the default voice.
    pub fn resolve_voice(&self, alias: &str) -> &str {
        self.voices
            .get(alias)
            .or_else(|| self.voices.get("default"))
            .map(String::as_str)
            .unwrap_or(FALLBACK_VOICE)
    }

    /// Request payload for one synthesis call
    pub fn request_body(&self, text: &str, voice: &VoiceParams) -> serde_json::Value {
        let voice_name = self.resolve_voice(&voice.voice_id);
        let input = match &self.phonemes {
            Some(dictionary) => json!({ "ssml": text_to_ssml(text, dictionary) }),
            None => json!({ "text": text }),
        };
        json!({
            "input": input,
            "voice": {
                "languageCode": language_code(voice_name),
                "name": voice_name,
            },
            "audioConfig": {
                "audioEncoding": "MP3",
                "speakingRate": voice.rate,
                "pitch": voice.pitch,
            }
        })
    }

    fn classify(&self, status: StatusCode, body: &str) -> SpeechError {
        let detail = format!("HTTP {}: {}", status.as_u16(), truncate(body, MAX_ERROR_DETAIL));
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SpeechError::SynthesisDenied {
                provider: PROVIDER.to_string(),
                detail,
            },
            StatusCode::TOO_MANY_REQUESTS => SpeechError::QuotaExceeded {
                provider: PROVIDER.to_string(),
                detail,
            },
            _ => SpeechError::Engine(format!("{} error ({})", PROVIDER, detail)),
        }
    }
}

/// `en-GB-Standard-A` -> `en-GB`
fn language_code(voice_name: &str) -> String {
    let parts: Vec<&str> = voice_name.split('-').collect();
    if parts.len() >= 2 {
        format!("{}-{}", parts[0], parts[1])
    } else {
        "en-GB".to_string()
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        trimmed.to_string()
    } else {
        format!("{}...", trimmed.chars().take(max_chars).collect::<String>())
    }
}

#[async_trait]
impl TtsEngine for HttpTtsEngine {
    async fn synthesize(&self, text: &str, voice: &VoiceParams) -> Result<Bytes, SpeechError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| SpeechError::SynthesisDenied {
            provider: PROVIDER.to_string(),
            detail: "no API key configured".to_string(),
        })?;

        let url = format!("{}/v1/text:synthesize", self.endpoint);
        debug!("Requesting synthesis of {} chars from {}", text.len(), PROVIDER);

        // key travels in a header so it never shows up in URLs or error text
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&self.request_body(text, voice))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SpeechError::Timeout(self.timeout.as_millis() as u64)
                } else {
                    SpeechError::Engine(format!("{} request failed: {}", PROVIDER, e.without_url()))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = self.classify(status, &body);
            if err.is_denied() {
                error!("{} refused synthesis: {}", PROVIDER, err);
            } else {
                warn!("{} synthesis failed: {}", PROVIDER, err);
            }
            return Err(err);
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SpeechError::Engine(format!("Failed to parse {} response: {}", PROVIDER, e.without_url())))?;

        let audio_content = response_json
            .get("audioContent")
            .and_then(|v| v.as_str())
            .ok_or_else(|| SpeechError::Engine(format!("Missing audioContent in {} response", PROVIDER)))?;

        let audio = general_purpose::STANDARD
            .decode(audio_content)
            .map_err(|e| SpeechError::Engine(format!("Failed to decode base64 audio: {}", e)))?;

        Ok(Bytes::from(audio))
    }

    async fn list_voices(&self) -> Result<Vec<String>, SpeechError> {
        Ok(self.voices.keys().cloned().collect())
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    fn voice_fingerprint(&self, voice_id: &str) -> String {
        let name = self.resolve_voice(voice_id);
        if self.phonemes.is_some() {
            format!("{}+ssml", name)
        } else {
            name.to_string()
        }
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

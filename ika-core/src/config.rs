// Layered configuration for the Ika engine: defaults, then a config file, then IKA_* environment variables

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Tokens that must never appear in illustrative pattern examples.
pub const DEFAULT_BANNED_TOKENS: &[&str] = &["akwukwo", "anyi", "umunna", "ga eje", "ya mere", "mgbe"];

/// Pattern fields that describe the example's language and are not allowed in the catalog.
pub const DEFAULT_DISALLOWED_FIELDS: &[&str] = &["example_language"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IkaConfig {
    /// Directory holding catalog files and the lexicon export
    pub data_dir: PathBuf,
    pub lexicon: LexiconConfig,
    pub catalog: CatalogConfig,
    pub audio: AudioConfig,
    pub synthesis: SynthesisConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconConfig {
    /// Lexicon export file, relative to `data_dir` unless absolute
    pub export_file: PathBuf,
    /// Upper bound on near-miss suggestions returned for one lookup
    pub max_suggestions: usize,
    /// Upper bound on store candidates fetched to rank suggestions
    pub candidate_pool: usize,
    /// Maximum Levenshtein distance for a non-prefix suggestion
    pub max_edit_distance: usize,
    /// Longest multi-word phrase tried when tokenizing input
    pub max_phrase_words: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub banned_tokens: Vec<String>,
    pub disallowed_fields: Vec<String>,
    /// Pattern used for translation when no better fit is found
    pub default_pattern: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Memory,
    Filesystem,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub store: StoreKind,
    /// Root directory for the filesystem object store
    pub cache_dir: PathBuf,
    /// Object-name prefix for cached audio
    pub cache_prefix: String,
    /// When set, stored references are `<public_base_url>/<object name>`
    pub public_base_url: Option<String>,
    /// Default caller timeout for one synthesis call
    pub synthesis_timeout_ms: u64,
    /// Largest audio payload accepted from the synthesis provider
    pub max_audio_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    pub endpoint: String,
    /// Provider API key. Prefer `IKA_TTS_API_KEY`; never logged.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// Voice alias -> provider voice name
    pub voices: BTreeMap<String, String>,
    /// Send SSML with IPA phoneme hints instead of plain text
    pub use_ssml_phonemes: bool,
    /// IPA dictionary file, relative to `data_dir` unless absolute
    pub ipa_dictionary: Option<PathBuf>,
}

impl Default for IkaConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            lexicon: LexiconConfig::default(),
            catalog: CatalogConfig::default(),
            audio: AudioConfig::default(),
            synthesis: SynthesisConfig::default(),
        }
    }
}

impl Default for LexiconConfig {
    fn default() -> Self {
        Self {
            export_file: PathBuf::from("lexicon.json"),
            max_suggestions: 10,
            candidate_pool: 200,
            max_edit_distance: 2,
            max_phrase_words: 3,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            banned_tokens: DEFAULT_BANNED_TOKENS.iter().map(|t| t.to_string()).collect(),
            disallowed_fields: DEFAULT_DISALLOWED_FIELDS.iter().map(|t| t.to_string()).collect(),
            default_pattern: "simple".to_string(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            store: StoreKind::Filesystem,
            cache_dir: PathBuf::from("./data/audio_cache"),
            cache_prefix: "audio-cache".to_string(),
            public_base_url: None,
            synthesis_timeout_ms: 15_000,
            max_audio_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        let mut voices = BTreeMap::new();
        voices.insert("default".to_string(), "en-GB-Standard-A".to_string());
        voices.insert("uk_male".to_string(), "en-GB-Standard-D".to_string());
        voices.insert("us_female".to_string(), "en-US-Standard-C".to_string());
        voices.insert("us_male".to_string(), "en-US-Standard-B".to_string());

        Self {
            endpoint: "https://texttospeech.googleapis.com".to_string(),
            api_key: None,
            timeout_secs: 30,
            voices,
            use_ssml_phonemes: false,
            ipa_dictionary: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<ConfigError> for crate::Error {
    fn from(err: ConfigError) -> Self {
        crate::Error::Configuration(err.to_string())
    }
}

impl IkaConfig {
    /// Load configuration from a JSON, TOML or YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;
        Self::from_str(&content)
    }

    /// Load configuration from string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        if let Ok(config) = serde_json::from_str::<IkaConfig>(content) {
            return Ok(config);
        }

        if let Ok(config) = toml::from_str::<IkaConfig>(content) {
            return Ok(config);
        }

        if let Ok(config) = serde_yaml::from_str::<IkaConfig>(content) {
            return Ok(config);
        }

        Err(ConfigError::ParseError("Unknown format (expected JSON, TOML or YAML)".to_string()))
    }

    /// Override settings from IKA_* environment variables
    pub fn apply_env(&mut self) {
        self.apply_vars(|name| std::env::var(name).ok());
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = var("IKA_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = var("IKA_AUDIO_CACHE_DIR") {
            self.audio.cache_dir = PathBuf::from(dir);
        }
        if let Some(url) = var("IKA_AUDIO_PUBLIC_URL") {
            self.audio.public_base_url = Some(url);
        }
        if let Some(ms) = var("IKA_SYNTHESIS_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.audio.synthesis_timeout_ms = ms;
        }
        if let Some(endpoint) = var("IKA_TTS_ENDPOINT") {
            self.synthesis.endpoint = endpoint;
        }
        if let Some(key) = var("IKA_TTS_API_KEY") {
            if !key.is_empty() {
                self.synthesis.api_key = Some(key);
            }
        }
    }

    /// Resolve a path that may be relative to `data_dir`
    pub fn data_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let lexicon = &self.lexicon;
        if lexicon.max_suggestions == 0 || lexicon.max_suggestions > 100 {
            return Err(ConfigError::Invalid("lexicon.max_suggestions must be between 1 and 100".to_string()));
        }
        if lexicon.candidate_pool < lexicon.max_suggestions || lexicon.candidate_pool > 10_000 {
            return Err(ConfigError::Invalid(
                "lexicon.candidate_pool must be at least max_suggestions and at most 10000".to_string(),
            ));
        }
        if lexicon.max_edit_distance > 8 {
            return Err(ConfigError::Invalid("lexicon.max_edit_distance too large (max 8)".to_string()));
        }
        if lexicon.max_phrase_words == 0 || lexicon.max_phrase_words > 8 {
            return Err(ConfigError::Invalid("lexicon.max_phrase_words must be between 1 and 8".to_string()));
        }

        if self.catalog.default_pattern.trim().is_empty() {
            return Err(ConfigError::Invalid("catalog.default_pattern cannot be empty".to_string()));
        }
        if self.catalog.banned_tokens.iter().any(|t| t.trim().is_empty()) {
            return Err(ConfigError::Invalid("catalog.banned_tokens cannot contain blank tokens".to_string()));
        }

        let audio = &self.audio;
        if audio.cache_prefix.is_empty()
            || audio.cache_prefix.contains("..")
            || audio.cache_prefix.starts_with('/')
        {
            return Err(ConfigError::Invalid(
                "audio.cache_prefix must be a non-empty relative name without '..'".to_string(),
            ));
        }
        if audio.cache_dir.to_string_lossy().contains("..") {
            return Err(ConfigError::Invalid("audio.cache_dir cannot contain '..'".to_string()));
        }
        if audio.synthesis_timeout_ms == 0 || audio.synthesis_timeout_ms > 300_000 {
            return Err(ConfigError::Invalid(
                "audio.synthesis_timeout_ms must be between 1 and 300000".to_string(),
            ));
        }
        if audio.max_audio_bytes == 0 || audio.max_audio_bytes > 100 * 1024 * 1024 {
            return Err(ConfigError::Invalid("audio.max_audio_bytes must be between 1 byte and 100 MB".to_string()));
        }

        let synthesis = &self.synthesis;
        if !synthesis.endpoint.starts_with("https://") && !synthesis.endpoint.starts_with("http://") {
            return Err(ConfigError::Invalid("synthesis.endpoint must be an http(s) URL".to_string()));
        }
        if synthesis.timeout_secs == 0 || synthesis.timeout_secs > 300 {
            return Err(ConfigError::Invalid("synthesis.timeout_secs must be between 1 and 300".to_string()));
        }
        if !synthesis.voices.contains_key("default") {
            return Err(ConfigError::Invalid("synthesis.voices must define a 'default' alias".to_string()));
        }

        Ok(())
    }
}

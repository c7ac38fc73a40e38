//! Shared request, result and lexicon types

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Part of speech attached to a lexicon entry.
///
/// The lexicon export is curated by hand, so unknown tags are kept verbatim
/// in `Other` instead of being rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PartOfSpeech {
    Noun,
    Verb,
    Adjective,
    Adverb,
    Pronoun,
    Interjection,
    Other(String),
}

impl From<String> for PartOfSpeech {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "noun" | "n" => PartOfSpeech::Noun,
            "verb" | "v" => PartOfSpeech::Verb,
            "adjective" | "adj" => PartOfSpeech::Adjective,
            "adverb" | "adv" => PartOfSpeech::Adverb,
            "pronoun" | "pron" => PartOfSpeech::Pronoun,
            "interjection" | "intj" => PartOfSpeech::Interjection,
            other => PartOfSpeech::Other(other.to_string()),
        }
    }
}

impl From<PartOfSpeech> for String {
    fn from(value: PartOfSpeech) -> Self {
        value.as_str().to_string()
    }
}

impl PartOfSpeech {
    pub fn as_str(&self) -> &str {
        match self {
            PartOfSpeech::Noun => "noun",
            PartOfSpeech::Verb => "verb",
            PartOfSpeech::Adjective => "adjective",
            PartOfSpeech::Adverb => "adverb",
            PartOfSpeech::Pronoun => "pronoun",
            PartOfSpeech::Interjection => "interjection",
            PartOfSpeech::Other(tag) => tag,
        }
    }
}

/// A published lexicon entry. Read-only for this workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexiconEntry {
    #[serde(alias = "doc_id", alias = "_doc_id")]
    pub id: String,
    pub source_text: String,
    pub target_text: String,
    #[serde(default)]
    pub pos: Option<PartOfSpeech>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
}

macro_rules! keyword_enum {
    ($(#[$meta:meta])* $name:ident, $label:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    other => Err(Error::Validation(format!(
                        "unknown {} '{}' (expected one of: {})",
                        $label,
                        other,
                        [$($text),+].join(", ")
                    ))),
                }
            }
        }
    };
}

keyword_enum!(
    /// Target tense for realization.
    Tense, "tense" {
        Present => "present",
        Past => "past",
        Future => "future",
        Progressive => "progressive",
    }
);

keyword_enum!(
    /// Generation kind. `Sentence` is the single-sentence kind.
    GenerationKind, "kind" {
        Sentence => "sentence",
        Poem => "poem",
        Story => "story",
        Lecture => "lecture",
    }
);

keyword_enum!(
    Tone, "tone" {
        Neutral => "neutral",
        Formal => "formal",
        Poetic => "poetic",
    }
);

keyword_enum!(
    Length, "length" {
        Short => "short",
        Medium => "medium",
        Long => "long",
    }
);

impl Default for Tense {
    fn default() -> Self {
        Tense::Present
    }
}

impl Default for Tone {
    fn default() -> Self {
        Tone::Neutral
    }
}

impl Default for Length {
    fn default() -> Self {
        Length::Medium
    }
}

impl Length {
    /// Number of sentences/stanzas realized for this length.
    pub fn unit_count(&self) -> usize {
        match self {
            Length::Short => 2,
            Length::Medium => 4,
            Length::Long => 6,
        }
    }
}

/// Single-sentence translation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    #[serde(default)]
    pub tense: Tense,
    #[serde(default)]
    pub negate: bool,
    #[serde(default)]
    pub question: bool,
}

impl TranslateRequest {
    pub fn new(text: impl Into<String>, tense: Tense) -> Self {
        Self {
            text: text.into(),
            tense,
            negate: false,
            question: false,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        validate_free_text("text", &self.text)
    }
}

/// Multi-sentence generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub kind: GenerationKind,
    pub topic: String,
    #[serde(default)]
    pub tone: Tone,
    #[serde(default)]
    pub length: Length,
    #[serde(default)]
    pub tense: Tense,
    #[serde(default)]
    pub negate: bool,
    #[serde(default)]
    pub question: bool,
}

impl GenerationRequest {
    pub fn new(kind: GenerationKind, topic: impl Into<String>, tone: Tone, length: Length) -> Self {
        Self {
            kind,
            topic: topic.into(),
            tone,
            length,
            tense: Tense::Present,
            negate: false,
            question: false,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        validate_free_text("topic", &self.topic)
    }
}

/// Maximum accepted request text, in bytes.
pub const MAX_REQUEST_TEXT: usize = 4_096;

fn validate_free_text(field: &str, value: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{} cannot be empty", field)));
    }
    if value.len() > MAX_REQUEST_TEXT {
        return Err(Error::Validation(format!(
            "{} too long (max {} bytes)",
            field, MAX_REQUEST_TEXT
        )));
    }
    if value.chars().any(|c| c == '\0') {
        return Err(Error::Validation(format!("{} contains null bytes", field)));
    }
    Ok(())
}

/// A lexicon entry consumed while realizing a slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsedEntry {
    pub id: String,
    pub source: String,
    pub target: String,
    pub slot: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GenerationMeta {
    pub kind: Option<GenerationKind>,
    pub topic: Option<String>,
    pub tone: Option<Tone>,
    pub length: Option<Length>,
    pub tense: Tense,
    pub negate: bool,
    pub question: bool,
    pub pattern_ids: Vec<String>,
    pub lexicon_entries: Vec<UsedEntry>,
    pub missing_concepts: Vec<String>,
    /// Pattern-supplied filler words with no lexicon entry
    pub unresolved_fillers: Vec<String>,
    pub catalog_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub text: String,
    pub meta: GenerationMeta,
}

//! Grammar rule engine
//!
//! Markers are applied in a fixed order: tense, then negation, then question.

use ika_core::Tense;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where a marker attaches relative to the slot text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    #[default]
    Prefix,
    Suffix,
}

/// A marker word with its placement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Marker {
    #[serde(default)]
    pub marker: String,
    #[serde(default)]
    pub placement: Placement,
}

impl Marker {
    pub fn prefix(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            placement: Placement::Prefix,
        }
    }

    pub fn suffix(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            placement: Placement::Suffix,
        }
    }

    fn apply(&self, text: &str) -> String {
        let marker = self.marker.trim();
        if marker.is_empty() {
            return text.to_string();
        }
        if text.is_empty() {
            return marker.to_string();
        }
        match self.placement {
            Placement::Prefix => format!("{} {}", marker, text),
            Placement::Suffix => format!("{} {}", text, marker),
        }
    }
}

/// `"na"` or `{"marker": "na", "placement": "suffix"}`
#[derive(Deserialize)]
#[serde(untagged)]
enum MarkerForm {
    Bare(String),
    Full(Marker),
}

impl From<MarkerForm> for Marker {
    fn from(form: MarkerForm) -> Self {
        match form {
            MarkerForm::Bare(marker) => Marker::prefix(marker),
            MarkerForm::Full(marker) => marker,
        }
    }
}

fn marker_form<'de, D>(deserializer: D) -> Result<Marker, D::Error>
where
    D: serde::Deserializer<'de>,
{
    MarkerForm::deserialize(deserializer).map(Marker::from)
}

fn marker_map<'de, D>(deserializer: D) -> Result<BTreeMap<Tense, Marker>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = BTreeMap::<Tense, MarkerForm>::deserialize(deserializer)?;
    Ok(raw.into_iter().map(|(tense, form)| (tense, form.into())).collect())
}

/// Question-form rule as stored in `grammar_rules.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct QuestionRule {
    #[serde(default, alias = "marker")]
    pub yes_no_marker: String,
    #[serde(default)]
    pub placement: Placement,
}

/// Static grammar rules loaded with the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GrammarRules {
    #[serde(default, deserialize_with = "marker_map")]
    pub tense_markers: BTreeMap<Tense, Marker>,
    #[serde(default, deserialize_with = "marker_form")]
    pub negation: Marker,
    #[serde(default, alias = "question")]
    pub questions: QuestionRule,
}

impl GrammarRules {
    /// Problems that make the rule set unusable
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for (tense, marker) in &self.tense_markers {
            if marker.marker.trim() != marker.marker {
                errors.push(format!("Tense marker for {} has surrounding whitespace", tense));
            }
        }
        if self.negation.marker.trim().is_empty() {
            errors.push("Negation marker is empty".to_string());
        }
        if self.questions.yes_no_marker.trim().is_empty() {
            errors.push("Question marker is empty".to_string());
        }
        errors
    }
}

/// Per-call rule selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RuleOptions {
    pub tense: Tense,
    pub negate: bool,
    pub question: bool,
}

impl RuleOptions {
    pub fn new(tense: Tense) -> Self {
        Self {
            tense,
            negate: false,
            question: false,
        }
    }

    pub fn negated(mut self, negate: bool) -> Self {
        self.negate = negate;
        self
    }

    pub fn questioned(mut self, question: bool) -> Self {
        self.question = question;
        self
    }
}

#[derive(Debug, Clone)]
pub struct RuleEngine {
    rules: GrammarRules,
}

impl RuleEngine {
    pub fn new(rules: GrammarRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &GrammarRules {
        &self.rules
    }

    /// Tense marker, then negation, then question form. A tense without a
    /// marker (usually present) leaves the text as is.
    pub fn apply(&self, text: &str, options: RuleOptions) -> String {
        let mut out = match self.rules.tense_markers.get(&options.tense) {
            Some(marker) => marker.apply(text),
            None => text.to_string(),
        };
        if options.negate {
            out = self.rules.negation.apply(&out);
        }
        if options.question {
            let question = Marker {
                marker: self.rules.questions.yes_no_marker.clone(),
                placement: self.rules.questions.placement,
            };
            out = question.apply(&out);
        }
        out
    }
}

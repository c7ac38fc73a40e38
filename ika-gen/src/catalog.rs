//! Pattern catalog: grammar patterns, rules, pronouns, connectors and templates
//!
//! The catalog is loaded once from a versioned source, validated, and then
//! shared as an immutable snapshot. A catalog that fails validation is never
//! served; `CatalogHandle::reload` keeps the previous snapshot in that case.

use crate::error::CatalogError;
use crate::rules::{GrammarRules, RuleEngine};
use ika_core::{CatalogConfig, GenerationKind, PartOfSpeech, Tense, Tone};
use parking_lot::RwLock;
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

pub const PATTERNS_FILE: &str = "grammar_patterns.json";
pub const RULES_FILE: &str = "grammar_rules.json";
pub const PRONOUNS_FILE: &str = "pronouns.json";
pub const CONNECTORS_FILE: &str = "connectors.json";
pub const TEMPLATES_FILE: &str = "templates.json";

/// Grammatical role of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    Subject,
    Verb,
    Object,
    Noun,
    Adjective,
    Adverb,
    #[default]
    Any,
}

impl SlotKind {
    /// Whether a concept with this part of speech may fill the slot
    pub fn accepts(&self, pos: &PartOfSpeech) -> bool {
        match self {
            SlotKind::Any => true,
            SlotKind::Subject | SlotKind::Object | SlotKind::Noun => {
                matches!(pos, PartOfSpeech::Noun | PartOfSpeech::Pronoun)
            }
            SlotKind::Verb => matches!(pos, PartOfSpeech::Verb),
            SlotKind::Adjective => matches!(pos, PartOfSpeech::Adjective),
            SlotKind::Adverb => matches!(pos, PartOfSpeech::Adverb),
        }
    }
}

/// Where a slot's content comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SlotSource {
    /// Next requested concept
    #[default]
    Concept,
    /// Every remaining requested concept, in order
    Phrase,
    /// Subject or object pronoun table, chosen by slot kind
    Pronoun,
    /// Fixed source concepts, one per unit, resolved through the lexicon
    Choices(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotSpec {
    pub name: String,
    #[serde(default)]
    pub kind: SlotKind,
    #[serde(default)]
    pub source: SlotSource,
    /// Pass the realized text through the rule engine. Defaults to verb and phrase slots.
    #[serde(default)]
    pub inflect: Option<bool>,
}

impl SlotSpec {
    pub fn inflects(&self) -> bool {
        self.inflect
            .unwrap_or(self.kind == SlotKind::Verb || self.source == SlotSource::Phrase)
    }
}

/// Pattern record as stored in `grammar_patterns.json`
#[derive(Debug, Clone, Deserialize)]
pub struct PatternRecord {
    #[serde(default)]
    pub pattern_id: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub slots: Vec<SlotSpec>,
    #[serde(default)]
    pub template: String,
    #[serde(default = "all_tenses")]
    pub tenses: Vec<Tense>,
    #[serde(default)]
    pub tone: Option<Tone>,
    #[serde(default)]
    pub example: Option<String>,
}

/// A pattern record together with the field names it was written with.
/// Modeled fields are consumed by serde, so the disallowed field check runs
/// against the raw object keys.
#[derive(Debug, Clone)]
pub struct RawPattern {
    pub fields: Vec<String>,
    pub record: PatternRecord,
}

impl<'de> Deserialize<'de> for RawPattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let object = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
        let fields = object.keys().cloned().collect();
        let record = serde_json::from_value(serde_json::Value::Object(object)).map_err(de::Error::custom)?;
        Ok(Self { fields, record })
    }
}

fn all_tenses() -> Vec<Tense> {
    Tense::ALL.to_vec()
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatternFile {
    #[serde(default = "unversioned")]
    pub version: String,
    pub patterns: Vec<RawPattern>,
}

fn unversioned() -> String {
    "unversioned".to_string()
}

/// One piece of a realization template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart {
    Literal(String),
    Slot(String),
}

/// Parse `"{subject} na {verb}"` into literal and slot parts
pub fn parse_template(template: &str) -> Result<Vec<TemplatePart>, String> {
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut chars = template.chars();

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                if !literal.is_empty() {
                    parts.push(TemplatePart::Literal(std::mem::take(&mut literal)));
                }
                let mut name = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                if !closed {
                    return Err(format!("unclosed '{{' in template '{}'", template));
                }
                let name = name.trim().to_string();
                if name.is_empty() {
                    return Err(format!("empty slot placeholder in template '{}'", template));
                }
                parts.push(TemplatePart::Slot(name));
            }
            '}' => return Err(format!("unmatched '}}' in template '{}'", template)),
            other => literal.push(other),
        }
    }
    if !literal.is_empty() {
        parts.push(TemplatePart::Literal(literal));
    }
    Ok(parts)
}

/// A validated grammar pattern
#[derive(Debug, Clone, PartialEq)]
pub struct GrammarPattern {
    pub id: String,
    pub category: Option<String>,
    pub slots: Vec<SlotSpec>,
    pub template: Vec<TemplatePart>,
    pub tenses: Vec<Tense>,
    pub tone: Option<Tone>,
    pub example: Option<String>,
}

impl GrammarPattern {
    pub fn supports(&self, tense: Tense) -> bool {
        self.tenses.contains(&tense)
    }

    pub fn is_neutral(&self) -> bool {
        matches!(self.tone, None | Some(Tone::Neutral))
    }

    /// Usable for single-sentence translation: every slot binds input concepts
    pub fn is_translatable(&self) -> bool {
        !self.slots.is_empty() && self.slots.iter().all(|s| s.source == SlotSource::Concept)
    }

    /// Substitute slot texts into the template. Empty slots collapse cleanly.
    pub fn realize(&self, slot_texts: &HashMap<String, String>) -> String {
        let mut out = String::new();
        for part in &self.template {
            match part {
                TemplatePart::Literal(text) => out.push_str(text),
                TemplatePart::Slot(name) => {
                    if let Some(text) = slot_texts.get(name) {
                        out.push_str(text);
                    }
                }
            }
        }
        out.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pronoun {
    pub english: String,
    pub ika: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PronounTable {
    #[serde(default)]
    pub subject_pronouns: Vec<Pronoun>,
    #[serde(default)]
    pub object_pronouns: Vec<Pronoun>,
}

impl PronounTable {
    pub fn for_kind(&self, kind: SlotKind) -> &[Pronoun] {
        match kind {
            SlotKind::Object => &self.object_pronouns,
            _ => &self.subject_pronouns,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    #[serde(default)]
    pub id: String,
    pub english: String,
    pub ika: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectorFile {
    #[serde(default)]
    pub connectors: Vec<Connector>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSection {
    pub name: String,
    pub pattern_pool: Vec<String>,
}

/// Ordered composition of patterns and connectors for one generation kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub template_id: String,
    pub kind: GenerationKind,
    pub sections: Vec<TemplateSection>,
    /// Connector ids used between consecutive units, cycled in order
    #[serde(default)]
    pub connectors: Vec<String>,
    /// Text placed between units before the connector
    #[serde(default = "default_separator")]
    pub separator: String,
}

fn default_separator() -> String {
    " ".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateFile {
    #[serde(default)]
    pub templates: Vec<Template>,
}

/// Raw catalog inputs, before validation
#[derive(Debug, Clone)]
pub struct CatalogSource {
    pub patterns: PatternFile,
    pub rules: GrammarRules,
    pub pronouns: PronounTable,
    pub connectors: ConnectorFile,
    pub templates: TemplateFile,
}

impl CatalogSource {
    /// Read the five catalog files from a data directory. Patterns and rules
    /// are required; pronouns, connectors and templates default to empty.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let dir = dir.as_ref();
        Ok(Self {
            patterns: read_json(&dir.join(PATTERNS_FILE))?,
            rules: read_json(&dir.join(RULES_FILE))?,
            pronouns: read_optional_json(&dir.join(PRONOUNS_FILE))?,
            connectors: read_optional_json(&dir.join(CONNECTORS_FILE))?,
            templates: read_optional_json(&dir.join(TEMPLATES_FILE))?,
        })
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CatalogError> {
    let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|e| CatalogError::Parse {
        path: path.display().to_string(),
        detail: e.to_string(),
    })
}

fn read_optional_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, CatalogError> {
    if path.exists() {
        read_json(path)
    } else {
        Ok(T::default())
    }
}

/// Immutable, validated catalog snapshot
#[derive(Debug)]
pub struct PatternCatalog {
    version: String,
    patterns: Vec<GrammarPattern>,
    pattern_index: HashMap<String, usize>,
    rule_engine: RuleEngine,
    pronouns: PronounTable,
    connectors: Vec<Connector>,
    connector_index: HashMap<String, usize>,
    templates: Vec<Template>,
    default_pattern: String,
}

impl PatternCatalog {
    /// Validate `source` and build a snapshot. Every violation is collected
    /// and reported together.
    pub fn load(source: CatalogSource, config: &CatalogConfig) -> Result<Self, CatalogError> {
        let mut errors = Vec::new();

        let disallowed: HashSet<&str> = config.disallowed_fields.iter().map(String::as_str).collect();
        let banned: Vec<String> = config.banned_tokens.iter().map(|t| t.to_lowercase()).collect();

        let mut patterns = Vec::with_capacity(source.patterns.patterns.len());
        let mut pattern_index = HashMap::new();

        for RawPattern { fields, record } in source.patterns.patterns {
            let id = record.pattern_id.trim().to_string();
            let label = if id.is_empty() { "<missing id>".to_string() } else { id.clone() };

            if id.is_empty() {
                errors.push("Pattern missing pattern_id".to_string());
            }

            for field in &fields {
                if disallowed.contains(field.as_str()) {
                    errors.push(format!("Pattern {} contains '{}' field (not allowed)", label, field));
                }
            }

            if let Some(example) = &record.example {
                let example_lower = example.to_lowercase();
                for token in &banned {
                    if example_lower.contains(token.as_str()) {
                        errors.push(format!("Pattern {} example contains banned token: {}", label, token));
                    }
                }
            }

            if record.slots.is_empty() {
                errors.push(format!("Pattern {} declares no slots", label));
            }
            if record.tenses.is_empty() {
                errors.push(format!("Pattern {} supports no tenses", label));
            }

            let mut slot_names = HashSet::new();
            for slot in &record.slots {
                if !slot_names.insert(slot.name.as_str()) {
                    errors.push(format!("Pattern {} declares slot '{}' twice", label, slot.name));
                }
                if let SlotSource::Choices(choices) = &slot.source {
                    if choices.is_empty() {
                        errors.push(format!("Pattern {} slot '{}' has an empty choice list", label, slot.name));
                    }
                }
            }

            let template = match parse_template(&record.template) {
                Ok(parts) => parts,
                Err(e) => {
                    errors.push(format!("Pattern {}: {}", label, e));
                    Vec::new()
                }
            };
            let placeholders: HashSet<&str> = template
                .iter()
                .filter_map(|part| match part {
                    TemplatePart::Slot(name) => Some(name.as_str()),
                    TemplatePart::Literal(_) => None,
                })
                .collect();
            for name in &placeholders {
                if !slot_names.contains(name) {
                    errors.push(format!("Pattern {} template references undeclared slot '{}'", label, name));
                }
            }
            for name in &slot_names {
                if !placeholders.contains(name) {
                    errors.push(format!("Pattern {} slot '{}' never appears in its template", label, name));
                }
            }

            if !id.is_empty() {
                if pattern_index.contains_key(&id) {
                    errors.push(format!("Duplicate pattern_id: {}", id));
                    continue;
                }
                pattern_index.insert(id.clone(), patterns.len());
            }
            patterns.push(GrammarPattern {
                id,
                category: record.category,
                slots: record.slots,
                template,
                tenses: record.tenses,
                tone: record.tone,
                example: record.example,
            });
        }

        for pattern in &patterns {
            for slot in &pattern.slots {
                if slot.source == SlotSource::Pronoun && source.pronouns.for_kind(slot.kind).is_empty() {
                    errors.push(format!(
                        "Pattern {} slot '{}' draws from an empty pronoun table",
                        pattern.id, slot.name
                    ));
                }
            }
        }

        match pattern_index.get(&config.default_pattern) {
            None => errors.push(format!(
                "Default pattern '{}' not found in catalog",
                config.default_pattern
            )),
            Some(&idx) => {
                let pattern = &patterns[idx];
                if !pattern.slots.iter().any(|s| s.source == SlotSource::Phrase) {
                    errors.push(format!(
                        "Default pattern '{}' must contain a phrase slot",
                        pattern.id
                    ));
                }
                if Tense::ALL.iter().any(|t| !pattern.supports(*t)) {
                    errors.push(format!("Default pattern '{}' must support every tense", pattern.id));
                }
            }
        }

        let mut connectors = source.connectors.connectors;
        let mut connector_index = HashMap::new();
        for (idx, connector) in connectors.iter_mut().enumerate() {
            if connector.id.trim().is_empty() {
                connector.id = connector.english.trim().to_lowercase();
            }
            if connector.ika.trim().is_empty() {
                errors.push(format!("Connector '{}' has no target text", connector.id));
            }
            if connector_index.insert(connector.id.clone(), idx).is_some() {
                errors.push(format!("Duplicate connector id: {}", connector.id));
            }
        }

        for (t_idx, template) in source.templates.templates.iter().enumerate() {
            let context = format!("{}[{}] ({})", template.kind, t_idx, template.template_id);
            if template.sections.is_empty() {
                errors.push(format!("Template {} has no sections", context));
            }
            for section in &template.sections {
                if section.pattern_pool.is_empty() {
                    errors.push(format!("Template {}.{} has an empty pattern pool", context, section.name));
                }
                for pattern_id in &section.pattern_pool {
                    if !pattern_index.contains_key(pattern_id) {
                        errors.push(format!(
                            "Template {}.{} references invalid pattern_id: {}",
                            context, section.name, pattern_id
                        ));
                    }
                }
            }
            if template.kind != GenerationKind::Sentence && template.connectors.is_empty() {
                errors.push(format!("Template {} declares no connectors", context));
            }
            for connector in &template.connectors {
                if !connector_index.contains_key(connector) {
                    errors.push(format!("Template {} references unknown connector: {}", context, connector));
                }
            }
        }

        errors.extend(source.rules.validate());

        if !errors.is_empty() {
            error!("Catalog validation failed with {} error(s)", errors.len());
            return Err(CatalogError::Invalid(errors));
        }

        info!(
            "Loaded catalog {}: {} patterns, {} templates, {} connectors",
            source.patterns.version,
            patterns.len(),
            source.templates.templates.len(),
            connectors.len()
        );

        Ok(Self {
            version: source.patterns.version,
            patterns,
            pattern_index,
            rule_engine: RuleEngine::new(source.rules),
            pronouns: source.pronouns,
            connectors,
            connector_index,
            templates: source.templates.templates,
            default_pattern: config.default_pattern.clone(),
        })
    }

    /// Read and validate a catalog directory
    pub fn load_dir(dir: impl AsRef<Path>, config: &CatalogConfig) -> Result<Self, CatalogError> {
        Self::load(CatalogSource::from_dir(dir)?, config)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn get_pattern(&self, id: &str) -> Option<&GrammarPattern> {
        self.pattern_index.get(id).map(|&idx| &self.patterns[idx])
    }

    pub fn patterns(&self) -> &[GrammarPattern] {
        &self.patterns
    }

    /// First template declared for `kind`
    pub fn get_template(&self, kind: GenerationKind) -> Option<&Template> {
        self.templates.iter().find(|t| t.kind == kind)
    }

    pub fn default_pattern(&self) -> &GrammarPattern {
        // presence is checked in `load`
        &self.patterns[self.pattern_index[&self.default_pattern]]
    }

    pub fn connector(&self, id: &str) -> Option<&Connector> {
        self.connector_index.get(id).map(|&idx| &self.connectors[idx])
    }

    pub fn pronouns(&self, kind: SlotKind) -> &[Pronoun] {
        self.pronouns.for_kind(kind)
    }

    pub fn rules(&self) -> &RuleEngine {
        &self.rule_engine
    }
}

/// Read-only handle to the current catalog snapshot.
///
/// Readers clone the inner `Arc` and never hold the lock while working.
pub struct CatalogHandle {
    current: RwLock<Arc<PatternCatalog>>,
}

impl CatalogHandle {
    pub fn new(catalog: PatternCatalog) -> Self {
        Self {
            current: RwLock::new(Arc::new(catalog)),
        }
    }

    pub fn snapshot(&self) -> Arc<PatternCatalog> {
        self.current.read().clone()
    }

    /// Validate a new source and swap it in atomically. On failure the
    /// current snapshot stays in place.
    pub fn reload(&self, source: CatalogSource, config: &CatalogConfig) -> Result<Arc<PatternCatalog>, CatalogError> {
        let next = Arc::new(PatternCatalog::load(source, config)?);
        *self.current.write() = next.clone();
        info!("Catalog reloaded, now at version {}", next.version());
        Ok(next)
    }
}

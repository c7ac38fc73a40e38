//! Slot filling: binds pattern slots to lexicon entries and rule output

use crate::catalog::{GrammarPattern, PatternCatalog, SlotSource, SlotSpec};
use crate::error::GenError;
use crate::lexicon::{normalize, LexiconAccessor};
use crate::rules::RuleOptions;
use ika_core::{LexiconEntry, UsedEntry};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// A requested concept: the words as the caller wrote them plus the
/// normalized lookup key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Concept {
    pub surface: String,
    pub key: String,
}

impl Concept {
    pub fn new(surface: impl Into<String>) -> Self {
        let surface = surface.into();
        let key = normalize(&surface);
        Self { surface, key }
    }
}

/// Hands out requested concepts to `concept` and `phrase` slots
#[derive(Debug, Clone)]
pub struct ConceptCursor {
    concepts: Vec<Concept>,
    pos: usize,
    cycle: bool,
}

impl ConceptCursor {
    /// Each concept is bound at most once, in order
    pub fn linear(concepts: Vec<Concept>) -> Self {
        Self {
            concepts,
            pos: 0,
            cycle: false,
        }
    }

    /// Concepts are reused round-robin once exhausted
    pub fn cycling(concepts: Vec<Concept>) -> Self {
        Self {
            concepts,
            pos: 0,
            cycle: true,
        }
    }

    pub fn next_concept(&mut self) -> Option<Concept> {
        if self.concepts.is_empty() {
            return None;
        }
        if self.pos >= self.concepts.len() {
            if !self.cycle {
                return None;
            }
            self.pos = 0;
        }
        let concept = self.concepts[self.pos].clone();
        self.pos += 1;
        Some(concept)
    }

    /// Everything not yet bound. A cycling cursor that is exhausted starts
    /// over from the first concept.
    pub fn take_rest(&mut self) -> Vec<Concept> {
        if self.cycle && self.pos >= self.concepts.len() {
            self.pos = 0;
        }
        let start = self.pos.min(self.concepts.len());
        self.pos = self.concepts.len();
        self.concepts[start..].to_vec()
    }
}

/// Per-request state: the lookup memo and aggregated bookkeeping
#[derive(Debug, Default)]
pub struct FillContext {
    memo: HashMap<String, Option<LexiconEntry>>,
}

impl FillContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookups(&self) -> usize {
        self.memo.len()
    }
}

/// One realized pattern
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilledPattern {
    pub pattern_id: String,
    pub text: String,
    pub used_entries: Vec<UsedEntry>,
    pub missing_concepts: Vec<String>,
    pub unresolved_fillers: Vec<String>,
}

impl FilledPattern {
    fn use_entry(&mut self, entry: &LexiconEntry, slot: &SlotSpec) {
        if self.used_entries.iter().any(|used| used.id == entry.id) {
            return;
        }
        self.used_entries.push(UsedEntry {
            id: entry.id.clone(),
            source: entry.source_text.clone(),
            target: entry.target_text.clone(),
            slot: slot.name.clone(),
        });
    }

    fn miss(&mut self, key: &str) {
        if !self.missing_concepts.iter().any(|m| m == key) {
            self.missing_concepts.push(key.to_string());
        }
    }
}

pub struct SlotFiller {
    lexicon: Arc<LexiconAccessor>,
}

impl SlotFiller {
    pub fn new(lexicon: Arc<LexiconAccessor>) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &LexiconAccessor {
        &self.lexicon
    }

    /// Resolve one concept through the lexicon, once per request. The first
    /// exact match in store order wins.
    pub async fn resolve(&self, key: &str, ctx: &mut FillContext) -> Result<Option<LexiconEntry>, GenError> {
        if let Some(cached) = ctx.memo.get(key) {
            return Ok(cached.clone());
        }
        let entry = self.lexicon.exact(key).await?.into_iter().next();
        if entry.is_none() {
            debug!("Concept '{}' has no lexicon entry", key);
        }
        ctx.memo.insert(key.to_string(), entry.clone());
        Ok(entry)
    }

    /// Realize `pattern` for unit `unit_index`. Unresolved concepts fall back
    /// to their source words; only a store failure aborts.
    pub async fn fill(
        &self,
        catalog: &PatternCatalog,
        pattern: &GrammarPattern,
        concepts: &mut ConceptCursor,
        options: RuleOptions,
        unit_index: usize,
        ctx: &mut FillContext,
    ) -> Result<FilledPattern, GenError> {
        let mut filled = FilledPattern {
            pattern_id: pattern.id.clone(),
            ..FilledPattern::default()
        };
        let mut slot_texts = HashMap::with_capacity(pattern.slots.len());

        for slot in &pattern.slots {
            let text = match &slot.source {
                SlotSource::Concept => match concepts.next_concept() {
                    Some(concept) => self.realize_concept(&concept, slot, &mut filled, ctx).await?,
                    None => String::new(),
                },
                SlotSource::Phrase => {
                    let mut words = Vec::new();
                    for concept in concepts.take_rest() {
                        words.push(self.realize_concept(&concept, slot, &mut filled, ctx).await?);
                    }
                    words.join(" ")
                }
                SlotSource::Pronoun => {
                    let table = catalog.pronouns(slot.kind);
                    if table.is_empty() {
                        String::new()
                    } else {
                        table[unit_index % table.len()].ika.clone()
                    }
                }
                SlotSource::Choices(choices) => {
                    if choices.is_empty() {
                        String::new()
                    } else {
                        let choice = &choices[unit_index % choices.len()];
                        let key = normalize(choice);
                        match self.resolve(&key, ctx).await? {
                            Some(entry) => {
                                filled.use_entry(&entry, slot);
                                entry.target_text
                            }
                            None => {
                                if !filled.unresolved_fillers.contains(&key) {
                                    filled.unresolved_fillers.push(key);
                                }
                                choice.clone()
                            }
                        }
                    }
                }
            };

            let text = if slot.inflects() && !text.is_empty() {
                catalog.rules().apply(&text, options)
            } else {
                text
            };
            slot_texts.insert(slot.name.clone(), text);
        }

        filled.text = pattern.realize(&slot_texts);
        Ok(filled)
    }

    async fn realize_concept(
        &self,
        concept: &Concept,
        slot: &SlotSpec,
        filled: &mut FilledPattern,
        ctx: &mut FillContext,
    ) -> Result<String, GenError> {
        match self.resolve(&concept.key, ctx).await? {
            Some(entry) => {
                filled.use_entry(&entry, slot);
                Ok(entry.target_text)
            }
            None => {
                filled.miss(&concept.key);
                Ok(concept.surface.clone())
            }
        }
    }
}

//! Translation and multi-sentence composition
//!
//! Both entry points are deterministic for a fixed catalog snapshot and
//! lexicon: pattern choice is by declaration order and unit index, never
//! random.

use crate::catalog::{CatalogHandle, GrammarPattern, PatternCatalog, SlotKind};
use crate::error::GenError;
use crate::lexicon::LexiconAccessor;
use crate::rules::RuleOptions;
use crate::slot_filler::{Concept, ConceptCursor, FillContext, FilledPattern, SlotFiller};
use ika_core::{
    GenerationKind, GenerationMeta, GenerationRequest, GenerationResult, Tense, Tone, TranslateRequest,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct Generator {
    catalog: Arc<CatalogHandle>,
    filler: SlotFiller,
}

impl Generator {
    pub fn new(catalog: Arc<CatalogHandle>, lexicon: Arc<LexiconAccessor>) -> Self {
        Self {
            catalog,
            filler: SlotFiller::new(lexicon),
        }
    }

    pub fn catalog(&self) -> &CatalogHandle {
        &self.catalog
    }

    pub fn lexicon(&self) -> &LexiconAccessor {
        self.filler.lexicon()
    }

    /// Translate one English sentence into a single realized pattern
    pub async fn translate(&self, request: &TranslateRequest) -> Result<GenerationResult, GenError> {
        request.validate()?;
        let catalog = self.catalog.snapshot();
        let mut ctx = FillContext::new();

        let tokens = tokenize(&request.text);
        if tokens.is_empty() {
            return Err(GenError::Validation("text contains no words".to_string()));
        }
        let options = RuleOptions::new(request.tense)
            .negated(request.negate)
            .questioned(request.question || request.text.trim_end().ends_with('?'));

        let concepts = self.segment(&tokens, &mut ctx).await?;
        let pattern = self.translation_pattern(&catalog, &concepts, request.tense, &mut ctx).await?;
        debug!(
            "Translating {} concept(s) with pattern {}",
            concepts.len(),
            pattern.id
        );

        let mut cursor = ConceptCursor::linear(concepts);
        let filled = self
            .filler
            .fill(&catalog, pattern, &mut cursor, options, 0, &mut ctx)
            .await?;

        let mut meta = GenerationMeta {
            kind: Some(GenerationKind::Sentence),
            tense: options.tense,
            negate: options.negate,
            question: options.question,
            catalog_version: catalog.version().to_string(),
            ..GenerationMeta::default()
        };
        let text = filled.text.clone();
        absorb(&mut meta, filled);

        Ok(GenerationResult { text, meta })
    }

    /// Compose a poem, story or lecture from the template for `request.kind`.
    /// The single-sentence kind is a translation of the topic.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, GenError> {
        request.validate()?;

        if request.kind == GenerationKind::Sentence {
            let translate = TranslateRequest {
                text: request.topic.clone(),
                tense: request.tense,
                negate: request.negate,
                question: request.question,
            };
            let mut result = self.translate(&translate).await?;
            result.meta.topic = Some(request.topic.clone());
            result.meta.tone = Some(request.tone);
            result.meta.length = Some(request.length);
            return Ok(result);
        }

        let catalog = self.catalog.snapshot();
        let template = catalog.get_template(request.kind).ok_or_else(|| {
            GenError::Configuration(format!("no template configured for kind '{}'", request.kind))
        })?;

        let tokens = tokenize(&request.topic);
        if tokens.is_empty() {
            return Err(GenError::Validation("topic contains no words".to_string()));
        }

        let mut ctx = FillContext::new();
        let concepts = self.segment(&tokens, &mut ctx).await?;
        let options = RuleOptions::new(request.tense)
            .negated(request.negate)
            .questioned(request.question);

        let mut meta = GenerationMeta {
            kind: Some(request.kind),
            topic: Some(request.topic.clone()),
            tone: Some(request.tone),
            length: Some(request.length),
            tense: request.tense,
            negate: request.negate,
            question: request.question,
            catalog_version: catalog.version().to_string(),
            ..GenerationMeta::default()
        };

        // topic words that never make it into a slot are still reported
        for concept in &concepts {
            if self.filler.resolve(&concept.key, &mut ctx).await?.is_none()
                && !meta.missing_concepts.contains(&concept.key)
            {
                meta.missing_concepts.push(concept.key.clone());
            }
        }

        let count = request.length.unit_count();
        let sections = &template.sections;
        let mut cursor = ConceptCursor::cycling(concepts);
        let mut units = Vec::with_capacity(count);

        for unit in 0..count {
            let section = &sections[unit * sections.len() / count];
            let candidates = select_by_tone(
                section
                    .pattern_pool
                    .iter()
                    .filter_map(|id| catalog.get_pattern(id))
                    .filter(|p| p.supports(request.tense))
                    .collect(),
                request.tone,
            );
            if candidates.is_empty() {
                return Err(GenError::Configuration(format!(
                    "template '{}' section '{}' has no pattern compatible with tense '{}'",
                    template.template_id, section.name, request.tense
                )));
            }
            let pattern = candidates[unit % candidates.len()];

            let filled = self
                .filler
                .fill(&catalog, pattern, &mut cursor, options, unit, &mut ctx)
                .await?;
            units.push(filled.text.clone());
            absorb(&mut meta, filled);
        }

        let mut text = String::new();
        for (idx, unit) in units.iter().enumerate() {
            if idx > 0 {
                text.push_str(&template.separator);
                if !template.connectors.is_empty() {
                    let id = &template.connectors[(idx - 1) % template.connectors.len()];
                    let connector = catalog.connector(id).ok_or_else(|| {
                        GenError::Configuration(format!("connector '{}' is not in the catalog", id))
                    })?;
                    text.push_str(&connector.ika);
                    text.push(' ');
                }
            }
            text.push_str(unit);
        }

        if !meta.missing_concepts.is_empty() {
            warn!(
                "Generated {} with {} missing concept(s): {:?}",
                request.kind,
                meta.missing_concepts.len(),
                meta.missing_concepts
            );
        }
        info!(
            "Generated {} from template {} ({} units, {} lexicon lookups)",
            request.kind,
            template.template_id,
            units.len(),
            ctx.lookups()
        );

        Ok(GenerationResult { text, meta })
    }

    /// Greedy longest-match segmentation: multi-word lexicon phrases win over
    /// their individual words.
    async fn segment(&self, tokens: &[String], ctx: &mut FillContext) -> Result<Vec<Concept>, GenError> {
        let max_words = self.lexicon().config().max_phrase_words.max(1);
        let mut concepts = Vec::new();
        let mut i = 0;

        while i < tokens.len() {
            let longest = max_words.min(tokens.len() - i);
            let mut taken = 1;
            for len in (2..=longest).rev() {
                let phrase = tokens[i..i + len].join(" ");
                let key = crate::lexicon::normalize(&phrase);
                if self.filler.resolve(&key, ctx).await?.is_some() {
                    taken = len;
                    break;
                }
            }
            concepts.push(Concept::new(tokens[i..i + taken].join(" ")));
            i += taken;
        }
        Ok(concepts)
    }

    /// Best translatable pattern for the part-of-speech shape of `concepts`,
    /// or the default pattern when nothing scores.
    async fn translation_pattern<'c>(
        &self,
        catalog: &'c PatternCatalog,
        concepts: &[Concept],
        tense: Tense,
        ctx: &mut FillContext,
    ) -> Result<&'c GrammarPattern, GenError> {
        let mut entries = Vec::with_capacity(concepts.len());
        for concept in concepts {
            entries.push(self.filler.resolve(&concept.key, ctx).await?);
        }

        let mut best: Option<(&GrammarPattern, usize)> = None;
        'patterns: for pattern in catalog.patterns() {
            if !pattern.is_translatable() || !pattern.supports(tense) || pattern.slots.len() != concepts.len() {
                continue;
            }
            let mut score = 0;
            for (slot, entry) in pattern.slots.iter().zip(&entries) {
                if slot.kind == SlotKind::Any {
                    continue;
                }
                match entry.as_ref().and_then(|e| e.pos.as_ref()) {
                    Some(pos) if slot.kind.accepts(pos) => score += 1,
                    Some(_) => continue 'patterns,
                    None => {}
                }
            }
            if score > 0 && best.map_or(true, |(_, top)| score > top) {
                best = Some((pattern, score));
            }
        }

        Ok(match best {
            Some((pattern, _)) => pattern,
            None => catalog.default_pattern(),
        })
    }
}

/// Tonal variants first, then neutral ones, then whatever is left
fn select_by_tone(candidates: Vec<&GrammarPattern>, tone: Tone) -> Vec<&GrammarPattern> {
    let tonal: Vec<&GrammarPattern> = candidates
        .iter()
        .copied()
        .filter(|p| p.tone == Some(tone))
        .collect();
    if !tonal.is_empty() {
        return tonal;
    }
    let neutral: Vec<&GrammarPattern> = candidates.iter().copied().filter(|p| p.is_neutral()).collect();
    if !neutral.is_empty() {
        return neutral;
    }
    candidates
}

/// Split on whitespace and strip surrounding punctuation. Apostrophes and
/// hyphens inside a word are kept.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|token| {
            token
                .trim_matches(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '-'))
                .trim_matches(|c: char| c == '\'' || c == '-')
                .to_string()
        })
        .filter(|token| !token.is_empty())
        .collect()
}

fn absorb(meta: &mut GenerationMeta, filled: FilledPattern) {
    meta.pattern_ids.push(filled.pattern_id);
    for entry in filled.used_entries {
        if !meta.lexicon_entries.iter().any(|used| used.id == entry.id) {
            meta.lexicon_entries.push(entry);
        }
    }
    for concept in filled.missing_concepts {
        if !meta.missing_concepts.contains(&concept) {
            meta.missing_concepts.push(concept);
        }
    }
    for filler in filled.unresolved_fillers {
        if !meta.unresolved_fillers.contains(&filler) {
            meta.unresolved_fillers.push(filler);
        }
    }
}

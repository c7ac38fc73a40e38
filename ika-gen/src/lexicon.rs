//! Lexicon access: normalization, exact lookup and near-miss suggestions
//!
//! The lexicon itself lives in an external document store reached through
//! [`LexiconStore`]. Store failures are reported as
//! [`GenError::LookupUnavailable`] and are never folded into an empty result.

use crate::error::{GenError, StoreError};
use async_trait::async_trait;
use ika_core::{LexiconConfig, LexiconEntry};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Query interface of the external lexicon store
#[async_trait]
pub trait LexiconStore: Send + Sync {
    /// Entries whose source text equals `source_text` (store-side normalization)
    async fn query(&self, source_text: &str) -> Result<Vec<LexiconEntry>, StoreError>;

    /// Entries whose source text starts with `prefix`, in source order
    async fn query_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<LexiconEntry>, StoreError>;

    /// Entries whose target text equals `target_text`
    async fn query_target(&self, target_text: &str) -> Result<Vec<LexiconEntry>, StoreError>;

    /// Entries in source order, optionally restricted to a domain
    async fn list(&self, domain: Option<&str>, limit: usize) -> Result<Vec<LexiconEntry>, StoreError>;

    /// Entry by id
    async fn get(&self, id: &str) -> Result<Option<LexiconEntry>, StoreError>;
}

/// Lowercase, fold typographic quotes to `'` and collapse whitespace.
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .trim()
        .chars()
        .map(|c| match c {
            '\u{201c}' | '\u{201d}' | '\u{2018}' | '\u{2019}' | '\u{2032}' | '\u{2033}' => '\'',
            other => other,
        })
        .collect::<String>()
        .to_lowercase();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Classic Levenshtein distance over chars
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Orders near-miss candidates for a query with no exact match
pub trait SuggestionRanker: Send + Sync {
    fn rank(&self, query: &str, candidates: Vec<LexiconEntry>, limit: usize) -> Vec<LexiconEntry>;
}

/// Prefix matches first (shortest completion first), then entries within
/// `max_distance` edits. Ties break on source text, then id.
#[derive(Debug, Clone)]
pub struct PrefixThenEditDistance {
    pub max_distance: usize,
}

impl SuggestionRanker for PrefixThenEditDistance {
    fn rank(&self, query: &str, candidates: Vec<LexiconEntry>, limit: usize) -> Vec<LexiconEntry> {
        let mut scored: Vec<(u8, usize, String, LexiconEntry)> = candidates
            .into_iter()
            .filter_map(|entry| {
                let key = normalize(&entry.source_text);
                if key.starts_with(query) {
                    let extra = key.chars().count().saturating_sub(query.chars().count());
                    Some((0, extra, key, entry))
                } else {
                    let distance = levenshtein(query, &key);
                    (distance <= self.max_distance).then_some((1, distance, key, entry))
                }
            })
            .collect();
        scored.sort_by(|a, b| {
            (a.0, a.1, &a.2, &a.3.id).cmp(&(b.0, b.1, &b.2, &b.3.id))
        });

        let mut seen = HashSet::new();
        scored
            .into_iter()
            .filter(|(_, _, _, entry)| seen.insert(entry.id.clone()))
            .map(|(_, _, _, entry)| entry)
            .take(limit)
            .collect()
    }
}

/// Result of a lexicon lookup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LookupResult {
    /// Normalized query text
    pub query: String,
    pub exact_matches: Vec<LexiconEntry>,
    /// Near misses, only populated when there is no exact match
    pub suggestions: Vec<LexiconEntry>,
}

impl LookupResult {
    pub fn found(&self) -> bool {
        !self.exact_matches.is_empty()
    }
}

/// Ranked access to the lexicon store
pub struct LexiconAccessor {
    store: Arc<dyn LexiconStore>,
    ranker: Arc<dyn SuggestionRanker>,
    config: LexiconConfig,
}

impl LexiconAccessor {
    pub fn new(store: Arc<dyn LexiconStore>, config: LexiconConfig) -> Self {
        let ranker = Arc::new(PrefixThenEditDistance {
            max_distance: config.max_edit_distance,
        });
        Self { store, ranker, config }
    }

    /// Replace the suggestion ranking strategy
    pub fn with_ranker(mut self, ranker: Arc<dyn SuggestionRanker>) -> Self {
        self.ranker = ranker;
        self
    }

    pub fn config(&self) -> &LexiconConfig {
        &self.config
    }

    /// Case-insensitive exact matches for `source_text`, without suggestions
    pub async fn exact(&self, source_text: &str) -> Result<Vec<LexiconEntry>, GenError> {
        let query = normalize(source_text);
        if query.is_empty() {
            return Ok(Vec::new());
        }
        self.exact_normalized(&query).await
    }

    async fn exact_normalized(&self, query: &str) -> Result<Vec<LexiconEntry>, GenError> {
        let entries = self.store.query(query).await?;
        Ok(entries
            .into_iter()
            .filter(|entry| normalize(&entry.source_text) == query)
            .collect())
    }

    /// Exact matches first; bounded near-miss suggestions when there are none
    pub async fn lookup(&self, source_text: &str) -> Result<LookupResult, GenError> {
        let query = normalize(source_text);
        if query.is_empty() {
            return Err(GenError::Validation("lookup text cannot be empty".to_string()));
        }

        let exact_matches = self.exact_normalized(&query).await?;
        if !exact_matches.is_empty() {
            return Ok(LookupResult {
                query,
                exact_matches,
                suggestions: Vec::new(),
            });
        }

        debug!("No exact lexicon match for '{}', collecting suggestions", query);
        let candidates = self.candidate_pool(&query).await?;
        let suggestions = self.ranker.rank(&query, candidates, self.config.max_suggestions);

        Ok(LookupResult {
            query,
            exact_matches: Vec::new(),
            suggestions,
        })
    }

    /// Fetch candidates by progressively shorter prefixes of the query,
    /// never more than `candidate_pool` entries in total.
    async fn candidate_pool(&self, query: &str) -> Result<Vec<LexiconEntry>, GenError> {
        let chars: Vec<char> = query.chars().collect();
        let pool_limit = self.config.candidate_pool;
        let mut pool: Vec<LexiconEntry> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        let mut prefix_len = chars.len().min(3);
        while prefix_len > 0 && pool.len() < pool_limit {
            let prefix: String = chars[..prefix_len].iter().collect();
            let remaining = pool_limit - pool.len();
            for entry in self.store.query_prefix(&prefix, remaining).await? {
                if seen.insert(entry.id.clone()) {
                    pool.push(entry);
                }
            }
            prefix_len -= 1;
        }

        pool.truncate(pool_limit);
        Ok(pool)
    }

    /// Ika -> English: entries whose target text matches
    pub async fn reverse_lookup(&self, target_text: &str) -> Result<Vec<LexiconEntry>, GenError> {
        let query = normalize(target_text);
        if query.is_empty() {
            return Err(GenError::Validation("lookup text cannot be empty".to_string()));
        }
        let entries = self.store.query_target(&query).await?;
        Ok(entries
            .into_iter()
            .filter(|entry| normalize(&entry.target_text) == query)
            .collect())
    }

    /// Alphabetical listing, optionally filtered by domain
    pub async fn dictionary(&self, domain: Option<&str>, limit: usize) -> Result<Vec<LexiconEntry>, GenError> {
        Ok(self.store.list(domain, limit).await?)
    }

    pub async fn entry(&self, id: &str) -> Result<Option<LexiconEntry>, GenError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(GenError::Validation("entry id cannot be empty".to_string()));
        }
        Ok(self.store.get(id).await?)
    }

    /// Prerecorded audio location for an entry. `None` when the id is unknown
    /// or the entry has no recording.
    pub async fn entry_audio_url(&self, id: &str) -> Result<Option<String>, GenError> {
        let url = self
            .entry(id)
            .await?
            .and_then(|entry| entry.audio_url)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        if url.is_none() {
            debug!("No recorded audio for lexicon entry '{}'", id.trim());
        }
        Ok(url)
    }
}

/// Lexicon export file: either a bare array or `{"entries": [...]}`
#[derive(Deserialize)]
#[serde(untagged)]
enum ExportFile {
    Bare(Vec<LexiconEntry>),
    Wrapped { entries: Vec<LexiconEntry> },
}

/// Lexicon store backed by an in-memory copy of the JSON export
#[derive(Debug, Default)]
pub struct InMemoryLexiconStore {
    entries: Vec<LexiconEntry>,
    by_source: BTreeMap<String, Vec<usize>>,
    by_target: HashMap<String, Vec<usize>>,
    by_id: HashMap<String, usize>,
}

impl InMemoryLexiconStore {
    pub fn from_entries(entries: Vec<LexiconEntry>) -> Self {
        let mut by_source: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        let mut by_target: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_id: HashMap<String, usize> = HashMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            by_source.entry(normalize(&entry.source_text)).or_default().push(idx);
            by_target.entry(normalize(&entry.target_text)).or_default().push(idx);
            // first entry wins on duplicate ids
            by_id.entry(entry.id.trim().to_string()).or_insert(idx);
        }
        Self {
            entries,
            by_source,
            by_target,
            by_id,
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self, StoreError> {
        let export: ExportFile = serde_json::from_str(content)
            .map_err(|e| StoreError::Malformed(format!("lexicon export: {}", e)))?;
        let entries = match export {
            ExportFile::Bare(entries) => entries,
            ExportFile::Wrapped { entries } => entries,
        };
        Ok(Self::from_entries(entries))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Unavailable(format!("{}: {}", path.display(), e)))?;
        let store = Self::from_json_str(&content)?;
        info!(
            "Loaded {} lexicon entries ({} source keys) from {}",
            store.entries.len(),
            store.by_source.len(),
            path.display()
        );
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn collect(&self, indexes: &[usize]) -> Vec<LexiconEntry> {
        indexes.iter().map(|&idx| self.entries[idx].clone()).collect()
    }
}

#[async_trait]
impl LexiconStore for InMemoryLexiconStore {
    async fn query(&self, source_text: &str) -> Result<Vec<LexiconEntry>, StoreError> {
        Ok(self
            .by_source
            .get(&normalize(source_text))
            .map(|idx| self.collect(idx))
            .unwrap_or_default())
    }

    async fn query_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<LexiconEntry>, StoreError> {
        let prefix = normalize(prefix);
        let mut out = Vec::new();
        for (key, indexes) in self.by_source.range(prefix.clone()..) {
            if !key.starts_with(&prefix) {
                break;
            }
            for &idx in indexes {
                if out.len() >= limit {
                    return Ok(out);
                }
                out.push(self.entries[idx].clone());
            }
        }
        Ok(out)
    }

    async fn query_target(&self, target_text: &str) -> Result<Vec<LexiconEntry>, StoreError> {
        Ok(self
            .by_target
            .get(&normalize(target_text))
            .map(|idx| self.collect(idx))
            .unwrap_or_default())
    }

    async fn list(&self, domain: Option<&str>, limit: usize) -> Result<Vec<LexiconEntry>, StoreError> {
        Ok(self
            .by_source
            .values()
            .flatten()
            .map(|&idx| &self.entries[idx])
            .filter(|entry| match domain {
                Some(domain) => entry.domain.as_deref() == Some(domain),
                None => true,
            })
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get(&self, id: &str) -> Result<Option<LexiconEntry>, StoreError> {
        Ok(self.by_id.get(id.trim()).map(|&idx| self.entries[idx].clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, source: &str, target: &str) -> LexiconEntry {
        LexiconEntry {
            id: id.to_string(),
            source_text: source.to_string(),
            target_text: target.to_string(),
            pos: None,
            domain: None,
            audio_url: None,
        }
    }

    #[test]
    fn normalize_folds_case_quotes_and_spaces() {
        assert_eq!(normalize("  Don\u{2019}t   GO  "), "don't go");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn levenshtein_basics() {
        assert_eq!(levenshtein("helo", "hello"), 1);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
    }

    #[test]
    fn ranker_puts_prefix_before_edit_distance() {
        let ranker = PrefixThenEditDistance { max_distance: 2 };
        let ranked = ranker.rank(
            "wat",
            vec![entry("1", "what", "x"), entry("2", "water", "y"), entry("3", "wattle", "z")],
            10,
        );
        let ids: Vec<_> = ranked.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3", "1"]);
    }

    #[test]
    fn ranker_drops_distant_candidates() {
        let ranker = PrefixThenEditDistance { max_distance: 1 };
        let ranked = ranker.rank("cat", vec![entry("1", "dog", "x")], 10);
        assert!(ranked.is_empty());
    }
}

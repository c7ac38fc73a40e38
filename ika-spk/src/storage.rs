//! Object storage for synthesized audio
//!
//! Objects are written once and never overwritten: the key is a content hash,
//! so any second write carries the same audio.

use crate::error::SpeechError;
use crate::key::AudioCacheKey;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// A persisted audio object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioCacheEntry {
    pub key: AudioCacheKey,
    /// Stable reference handed to callers (URL or path)
    pub storage_ref: String,
    pub created_at: DateTime<Utc>,
}

/// External object storage collaborator
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Audio bytes for `key`, if stored
    async fn get(&self, key: &AudioCacheKey) -> Result<Option<Bytes>, SpeechError>;

    /// Store `audio` under `key`. An existing object is kept as is.
    async fn put(&self, key: &AudioCacheKey, audio: Bytes) -> Result<AudioCacheEntry, SpeechError>;

    /// Entry metadata without the bytes
    async fn head(&self, key: &AudioCacheKey) -> Result<Option<AudioCacheEntry>, SpeechError>;

    fn name(&self) -> &str;
}

/// Process-local store, mostly for tests and the CLI's `memory` mode
pub struct MemoryObjectStore {
    prefix: String,
    objects: DashMap<AudioCacheKey, (Bytes, DateTime<Utc>)>,
}

impl MemoryObjectStore {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            objects: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn storage_ref(&self, key: &AudioCacheKey) -> String {
        format!("memory://{}/{}", self.prefix, key.file_name())
    }

    fn entry(&self, key: &AudioCacheKey, created_at: DateTime<Utc>) -> AudioCacheEntry {
        AudioCacheEntry {
            key: key.clone(),
            storage_ref: self.storage_ref(key),
            created_at,
        }
    }
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new("audio-cache")
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get(&self, key: &AudioCacheKey) -> Result<Option<Bytes>, SpeechError> {
        Ok(self.objects.get(key).map(|object| object.0.clone()))
    }

    async fn put(&self, key: &AudioCacheKey, audio: Bytes) -> Result<AudioCacheEntry, SpeechError> {
        let created_at = self
            .objects
            .entry(key.clone())
            .or_insert_with(|| (audio, Utc::now()))
            .1;
        Ok(self.entry(key, created_at))
    }

    async fn head(&self, key: &AudioCacheKey) -> Result<Option<AudioCacheEntry>, SpeechError> {
        Ok(self.objects.get(key).map(|object| self.entry(key, object.1)))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Directory-backed store: `<root>/<prefix>/<key>.mp3`
pub struct FsObjectStore {
    dir: PathBuf,
    prefix: String,
    public_base_url: Option<Url>,
}

impl FsObjectStore {
    /// `public_base_url`, when set, is used to build references such as
    /// `https://cdn.example/audio-cache/<key>.mp3`. Otherwise references are
    /// file paths.
    pub fn new(
        root: impl AsRef<Path>,
        prefix: impl Into<String>,
        public_base_url: Option<&str>,
    ) -> Result<Self, SpeechError> {
        let prefix = prefix.into();
        if prefix.contains("..") || prefix.starts_with('/') {
            return Err(SpeechError::Config(format!("invalid cache prefix '{}'", prefix)));
        }
        let public_base_url = public_base_url
            .map(|raw| {
                Url::parse(raw).map_err(|e| SpeechError::Config(format!("invalid public base URL '{}': {}", raw, e)))
            })
            .transpose()?;
        Ok(Self {
            dir: root.as_ref().join(&prefix),
            prefix,
            public_base_url,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &AudioCacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    fn storage_ref(&self, key: &AudioCacheKey) -> String {
        match &self.public_base_url {
            Some(base) => format!(
                "{}/{}/{}",
                base.as_str().trim_end_matches('/'),
                self.prefix,
                key.file_name()
            ),
            None => self.path(key).display().to_string(),
        }
    }

    fn entry_from_metadata(&self, key: &AudioCacheKey, metadata: &std::fs::Metadata) -> AudioCacheEntry {
        let created_at = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        AudioCacheEntry {
            key: key.clone(),
            storage_ref: self.storage_ref(key),
            created_at,
        }
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn get(&self, key: &AudioCacheKey) -> Result<Option<Bytes>, SpeechError> {
        match tokio::fs::read(self.path(key)).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SpeechError::Storage(format!("read {}: {}", key, e))),
        }
    }

    async fn put(&self, key: &AudioCacheKey, audio: Bytes) -> Result<AudioCacheEntry, SpeechError> {
        if let Some(existing) = self.head(key).await? {
            debug!("Object {} already stored, keeping it", key);
            return Ok(existing);
        }

        let dir = self.dir.clone();
        let path = self.path(key);
        let metadata = tokio::task::spawn_blocking(move || write_new(&dir, &path, &audio))
            .await
            .map_err(|e| SpeechError::Storage(format!("write task failed: {}", e)))?
            .map_err(|e| SpeechError::Storage(format!("write {}: {}", key, e)))?;

        Ok(self.entry_from_metadata(key, &metadata))
    }

    async fn head(&self, key: &AudioCacheKey) -> Result<Option<AudioCacheEntry>, SpeechError> {
        match tokio::fs::metadata(self.path(key)).await {
            Ok(metadata) => Ok(Some(self.entry_from_metadata(key, &metadata))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SpeechError::Storage(format!("stat {}: {}", key, e))),
        }
    }

    fn name(&self) -> &str {
        "filesystem"
    }
}

/// Write `audio` to a temp file in `dir` and link it into place at `path`.
/// An object that appeared at `path` in the meantime is kept.
fn write_new(dir: &Path, path: &Path, audio: &[u8]) -> std::io::Result<std::fs::Metadata> {
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(audio)?;
    tmp.as_file().sync_all()?;
    match tmp.persist_noclobber(path) {
        Ok(_) => {}
        Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => {
            debug!("{} appeared during write, keeping it", path.display());
        }
        Err(e) => return Err(e.error),
    }
    std::fs::metadata(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_new_keeps_existing_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("object.mp3");
        std::fs::write(&path, b"first").unwrap();

        let metadata = write_new(dir.path(), &path, b"second").unwrap();
        assert_eq!(metadata.len(), 5);
        assert_eq!(std::fs::read(&path).unwrap(), b"first");
        // temp file cleaned up
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn write_new_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("audio");
        let path = nested.join("object.mp3");

        write_new(&nested, &path, b"mp3").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"mp3");
    }
}

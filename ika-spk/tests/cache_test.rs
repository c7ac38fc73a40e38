//! Tests for the audio cache manager

mod common;

use common::{fake_audio, manager, voice, ReadOnlyStore, ScriptedEngine};
use ika_spk::{
    AudioCacheManager, AudioRef, FsObjectStore, HttpTtsEngine, IpaDictionary, MemoryObjectStore, SpeechError, VoiceParams,
};
use std::sync::Arc;

#[tokio::test]
async fn test_second_call_is_a_hit_with_same_ref() {
    let engine = Arc::new(ScriptedEngine::new());
    let (manager, _store) = manager(engine.clone());

    let first = manager.get_or_synthesize("ya", &voice()).await.unwrap();
    assert!(!first.cache_hit);
    assert!(first.cache_persisted);

    let second = manager.get_or_synthesize("ya", &voice()).await.unwrap();
    assert!(second.cache_hit);
    assert_eq!(second.audio_ref, first.audio_ref);
    assert_eq!(second.key, first.key);
    assert_eq!(engine.calls(), 1);
}

#[tokio::test]
async fn test_rate_change_is_a_new_entry() {
    let engine = Arc::new(ScriptedEngine::new());
    let (manager, store) = manager(engine.clone());

    let first = manager.get_or_synthesize("ya", &voice()).await.unwrap();
    let again = manager.get_or_synthesize("ya", &voice()).await.unwrap();
    let faster = manager
        .get_or_synthesize("ya", &VoiceParams::new("default", 1.2, 0.0))
        .await
        .unwrap();

    assert!(!first.cache_hit);
    assert!(again.cache_hit);
    assert_eq!(again.audio_ref, first.audio_ref);
    assert!(!faster.cache_hit);
    assert_ne!(faster.audio_ref, first.audio_ref);
    assert_eq!(engine.calls(), 2);
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn test_whitespace_variants_share_an_entry() {
    let engine = Arc::new(ScriptedEngine::new());
    let (manager, _store) = manager(engine.clone());

    manager.get_or_synthesize("ututu oma", &voice()).await.unwrap();
    let outcome = manager.get_or_synthesize("  ututu   oma ", &voice()).await.unwrap();
    assert!(outcome.cache_hit);
    assert_eq!(engine.calls(), 1);
}

#[tokio::test]
async fn test_engine_receives_normalized_text() {
    let engine = Arc::new(ScriptedEngine::new());
    let (manager, _store) = manager(engine.clone());

    let outcome = manager.get_or_synthesize(" ya \n oma ", &voice()).await.unwrap();
    let stored = manager.fetch(&outcome.key).await.unwrap().unwrap();
    assert_eq!(stored, fake_audio("ya oma", &voice()));
}

#[tokio::test]
async fn test_invalid_requests_never_reach_the_engine() {
    let engine = Arc::new(ScriptedEngine::new());
    let (manager, _store) = manager(engine.clone());

    let cases = vec![
        ("", voice()),
        ("   ", voice()),
        ("ya\0", voice()),
        ("ya", VoiceParams::new("", 1.0, 0.0)),
        ("ya", VoiceParams::new("default", 9.0, 0.0)),
        ("ya", VoiceParams::new("default", 1.0, f64::NAN)),
    ];
    for (text, params) in cases {
        match manager.get_or_synthesize(text, &params).await {
            Err(SpeechError::Validation(_)) => {}
            other => panic!("Expected validation error for {:?}, got {:?}", text, other),
        }
    }
    assert_eq!(engine.calls(), 0);
}

#[tokio::test]
async fn test_store_write_failure_still_returns_audio() {
    let engine = Arc::new(ScriptedEngine::new());
    let store = Arc::new(ReadOnlyStore::new());
    let manager = AudioCacheManager::new(store.clone(), engine.clone());

    let outcome = manager.get_or_synthesize("ya", &voice()).await.unwrap();
    assert!(!outcome.cache_hit);
    assert!(!outcome.cache_persisted);
    assert!(outcome.entry.is_none());
    match outcome.audio_ref {
        AudioRef::Unpersisted(bytes) => assert_eq!(bytes, fake_audio("ya", &voice())),
        other => panic!("Expected unpersisted audio, got {:?}", other),
    }
    assert_eq!(store.puts(), 1);
    assert_eq!(manager.stats().persist_failures, 1);
}

#[tokio::test]
async fn test_stats_track_hits_and_misses() {
    let engine = Arc::new(ScriptedEngine::new());
    let (manager, _store) = manager(engine);

    manager.get_or_synthesize("ya", &voice()).await.unwrap();
    manager.get_or_synthesize("ya", &voice()).await.unwrap();
    manager.get_or_synthesize("dalu", &voice()).await.unwrap();

    let stats = manager.stats();
    assert_eq!(stats.misses, 2);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.synth_calls, 2);
    assert_eq!(manager.in_flight(), 0);
}

#[tokio::test]
async fn test_filesystem_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Arc::new(ScriptedEngine::new());
    let store = Arc::new(FsObjectStore::new(dir.path(), "audio-cache", None).unwrap());
    let manager = AudioCacheManager::new(store.clone(), engine.clone());

    let first = manager.get_or_synthesize("mmiri", &voice()).await.unwrap();
    let path = store.dir().join(first.key.file_name());
    assert!(path.exists());
    assert_eq!(first.audio_ref, AudioRef::Stored(path.display().to_string()));

    // a fresh manager over the same directory sees the stored object
    let restarted = AudioCacheManager::new(store, engine.clone());
    let second = restarted.get_or_synthesize("mmiri", &voice()).await.unwrap();
    assert!(second.cache_hit);
    assert_eq!(second.audio_ref, first.audio_ref);
    assert_eq!(engine.calls(), 1);
}

#[tokio::test]
async fn test_public_base_url_references() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FsObjectStore::new(dir.path(), "audio-cache", Some("https://cdn.example.org/")).unwrap());
    let manager = AudioCacheManager::new(store, Arc::new(ScriptedEngine::new()));

    let outcome = manager.get_or_synthesize("ya", &voice()).await.unwrap();
    let expected = format!("https://cdn.example.org/audio-cache/{}.mp3", outcome.key);
    assert_eq!(outcome.audio_ref.storage_ref(), Some(expected.as_str()));
}

#[test]
fn test_key_follows_resolved_provider_voice() {
    fn keyed(config: &ika_core::SynthesisConfig, phonemes: bool) -> AudioCacheManager {
        let mut engine = HttpTtsEngine::from_config(config).unwrap();
        if phonemes {
            engine = engine.with_phonemes(IpaDictionary::default());
        }
        AudioCacheManager::new(Arc::new(MemoryObjectStore::new("tests")), Arc::new(engine))
    }

    let config = ika_core::SynthesisConfig::default();
    let plain = keyed(&config, false);
    let uk = VoiceParams::new("uk_male", 1.0, 0.0);

    // unknown alias renders the default voice, so it shares the default's key
    assert_eq!(
        plain.key_for("ya", &VoiceParams::new("default", 1.0, 0.0)).unwrap(),
        plain.key_for("ya", &VoiceParams::new("klingon", 1.0, 0.0)).unwrap()
    );

    let mut remapped = config.clone();
    remapped
        .voices
        .insert("uk_male".to_string(), "en-GB-Wavenet-B".to_string());
    assert_ne!(
        plain.key_for("ya", &uk).unwrap(),
        keyed(&remapped, false).key_for("ya", &uk).unwrap()
    );

    assert_ne!(
        plain.key_for("ya", &uk).unwrap(),
        keyed(&config, true).key_for("ya", &uk).unwrap()
    );
}

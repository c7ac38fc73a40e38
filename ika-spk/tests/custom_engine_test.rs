//! Tests for the closure-backed TTS engine

use bytes::Bytes;
use ika_spk::{AudioCacheManager, CustomTtsEngine, MemoryObjectStore, SpeechError, TtsEngine, VoiceParams};
use std::sync::Arc;

#[tokio::test]
async fn test_custom_engine_calls_closure() {
    let engine = CustomTtsEngine::new("echo", |text, voice| {
        Ok(Bytes::from(format!("{}@{}", text, voice.voice_id)))
    });

    let audio = engine.synthesize("ya", &VoiceParams::default()).await.unwrap();
    assert_eq!(&audio[..], b"ya@default");
    assert_eq!(engine.name(), "echo");
    assert!(engine.is_available());
}

#[tokio::test]
async fn test_custom_engine_rejects_empty_text() {
    let engine = CustomTtsEngine::new("echo", |_, _| Ok(Bytes::from_static(b"x")));
    match engine.synthesize("", &VoiceParams::default()).await {
        Err(SpeechError::Validation(_)) => {}
        other => panic!("Expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_custom_engine_voices() {
    let engine = CustomTtsEngine::new("echo", |_, _| Ok(Bytes::from_static(b"x")))
        .with_voices(vec!["default".to_string(), "elder".to_string()]);
    assert_eq!(engine.list_voices().await.unwrap(), vec!["default", "elder"]);
}

#[tokio::test]
async fn test_custom_engine_behind_cache() {
    let engine = Arc::new(CustomTtsEngine::new("echo", |text, _| Ok(Bytes::from(text.to_string()))));
    let store = Arc::new(MemoryObjectStore::new("tests"));
    let manager = AudioCacheManager::new(store.clone(), engine);

    let outcome = manager.get_or_synthesize("dalu", &VoiceParams::default()).await.unwrap();
    let expected = format!("memory://tests/{}.mp3", outcome.key);
    assert_eq!(outcome.audio_ref.storage_ref(), Some(expected.as_str()));
    assert_eq!(manager.fetch(&outcome.key).await.unwrap(), Some(Bytes::from("dalu")));
}

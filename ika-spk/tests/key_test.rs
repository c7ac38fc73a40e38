//! Tests for audio cache key derivation

use ika_spk::{AudioCacheKey, VoiceParams};
use proptest::prelude::*;

fn voice_strategy() -> impl Strategy<Value = VoiceParams> {
    ("[a-z][a-z0-9_-]{0,15}", 0.25f64..=4.0, -20.0f64..=20.0)
        .prop_map(|(voice_id, rate, pitch)| VoiceParams::new(voice_id, rate, pitch))
}

proptest! {
    #[test]
    fn test_key_is_pure(text in "\\PC{1,40}", voice in voice_strategy()) {
        let first = AudioCacheKey::derive(&text, &voice);
        let second = AudioCacheKey::derive(&text, &voice.clone());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_changing_text_changes_key(text in "[a-z]{1,20}", suffix in "[a-z]{1,5}", voice in voice_strategy()) {
        let other = format!("{}{}", text, suffix);
        prop_assert_ne!(AudioCacheKey::derive(&text, &voice), AudioCacheKey::derive(&other, &voice));
    }

    #[test]
    fn test_changing_voice_changes_key(text in "[a-z ]{1,20}", voice in voice_strategy(), other_id in "[A-Z]{1,8}") {
        prop_assume!(!text.trim().is_empty());
        let mut other = voice.clone();
        other.voice_id = other_id;
        prop_assert_ne!(AudioCacheKey::derive(&text, &voice), AudioCacheKey::derive(&text, &other));
    }

    #[test]
    fn test_changing_rate_changes_key(voice in voice_strategy(), delta in 0.01f64..1.0) {
        let mut other = voice.clone();
        other.rate = voice.rate + delta;
        prop_assert_ne!(AudioCacheKey::derive("ya", &voice), AudioCacheKey::derive("ya", &other));
    }

    #[test]
    fn test_changing_pitch_changes_key(voice in voice_strategy(), delta in 0.01f64..5.0) {
        let mut other = voice.clone();
        other.pitch = voice.pitch + delta;
        prop_assert_ne!(AudioCacheKey::derive("ya", &voice), AudioCacheKey::derive("ya", &other));
    }

    #[test]
    fn test_key_parses_back(text in "\\PC{1,40}", voice in voice_strategy()) {
        let key = AudioCacheKey::derive(&text, &voice);
        prop_assert_eq!(AudioCacheKey::parse(key.as_str()).unwrap(), key);
    }
}

#[test]
fn test_case_is_significant() {
    let voice = VoiceParams::default();
    assert_ne!(AudioCacheKey::derive("Ya", &voice), AudioCacheKey::derive("ya", &voice));
}

#[test]
fn test_key_serializes_as_string() {
    let key = AudioCacheKey::derive("ya", &VoiceParams::default());
    let json = serde_json::to_string(&key).unwrap();
    assert_eq!(json, format!("\"{}\"", key));
    let back: AudioCacheKey = serde_json::from_str(&json).unwrap();
    assert_eq!(back, key);
    assert!(serde_json::from_str::<AudioCacheKey>("\"not-a-key\"").is_err());
}

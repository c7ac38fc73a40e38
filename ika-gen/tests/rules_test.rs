//! Tests for rule application order

mod common;

use ika_core::Tense;
use ika_gen::rules::{GrammarRules, Marker, QuestionRule, RuleEngine, RuleOptions};
use std::collections::BTreeMap;

fn prefix_engine() -> RuleEngine {
    RuleEngine::new(common::data_catalog().rules().rules().clone())
}

fn suffix_engine() -> RuleEngine {
    let mut tense_markers = BTreeMap::new();
    tense_markers.insert(Tense::Past, Marker::suffix("ka"));
    RuleEngine::new(GrammarRules {
        tense_markers,
        negation: Marker::suffix("e"),
        questions: QuestionRule {
            yes_no_marker: "ma".to_string(),
            placement: ika_gen::rules::Placement::Suffix,
        },
    })
}

#[test]
fn test_tense_marker_only() {
    let engine = prefix_engine();
    assert_eq!(engine.apply("je", RuleOptions::new(Tense::Past)), "ka je");
    assert_eq!(engine.apply("je", RuleOptions::new(Tense::Future)), "ga je");
    assert_eq!(engine.apply("je", RuleOptions::new(Tense::Progressive)), "na je");
    assert_eq!(engine.apply("je", RuleOptions::new(Tense::Present)), "je");
}

#[test]
fn test_negated_question_applies_tense_then_negation_then_question() {
    let engine = prefix_engine();
    let options = RuleOptions::new(Tense::Past).negated(true).questioned(true);
    // innermost marker was applied first
    assert_eq!(engine.apply("je", options), "ma e ka je");
}

#[test]
fn test_order_holds_for_suffix_markers() {
    let engine = suffix_engine();
    let options = RuleOptions::new(Tense::Past).negated(true).questioned(true);
    assert_eq!(engine.apply("je", options), "je ka e ma");
}

#[test]
fn test_order_is_consistent_across_tenses() {
    let engine = prefix_engine();
    for tense in Tense::ALL {
        let plain = engine.apply("hu", RuleOptions::new(*tense));
        let full = engine.apply("hu", RuleOptions::new(*tense).negated(true).questioned(true));
        assert_eq!(full, format!("ma e {}", plain));
    }
}

#[test]
fn test_negation_without_question() {
    let engine = prefix_engine();
    assert_eq!(engine.apply("je", RuleOptions::new(Tense::Present).negated(true)), "e je");
}

#[test]
fn test_multi_word_slot_text() {
    let engine = prefix_engine();
    assert_eq!(
        engine.apply("hu n'anya", RuleOptions::new(Tense::Future).negated(true)),
        "e ga hu n'anya"
    );
}

#[test]
fn test_apply_is_deterministic() {
    let engine = prefix_engine();
    let options = RuleOptions::new(Tense::Past).questioned(true);
    let first = engine.apply("ri", options);
    for _ in 0..10 {
        assert_eq!(engine.apply("ri", options), first);
    }
}

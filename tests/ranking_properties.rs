//! Property-based tests for candidate ranking
//!
//! The similarity metric must be a true similarity: 1 for identical
//! labels, symmetric, case-insensitive, and always within [0, 1].

use proptest::prelude::*;

use fathom_analysis::{compare_ranked, score_against, similarity, SIMILARITY_THRESHOLD};

fn label_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9]{0,11}"
}

proptest! {
    #[test]
    fn prop_identical_labels_score_one(label in label_strategy()) {
        prop_assert_eq!(similarity(&label, &label), 1.0);
    }

    #[test]
    fn prop_similarity_is_symmetric(a in label_strategy(), b in label_strategy()) {
        let forward = similarity(&a, &b);
        let backward = similarity(&b, &a);
        prop_assert!((forward - backward).abs() < 1e-9);
    }

    #[test]
    fn prop_similarity_ignores_case(a in label_strategy(), b in label_strategy()) {
        let mixed = similarity(&a, &b);
        let folded = similarity(&a.to_lowercase(), &b.to_uppercase());
        prop_assert!((mixed - folded).abs() < 1e-9);
    }

    #[test]
    fn prop_similarity_stays_in_unit_interval(a in label_strategy(), b in label_strategy()) {
        let score = similarity(&a, &b);
        prop_assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn prop_empty_prefix_keeps_everything(label in label_strategy()) {
        prop_assert_eq!(score_against(&label, ""), Some(1.0));
    }

    #[test]
    fn prop_survivors_meet_the_threshold(a in label_strategy(), b in label_strategy()) {
        if let Some(score) = score_against(&a, &b) {
            prop_assert!(score >= SIMILARITY_THRESHOLD);
        }
    }
}

#[test]
fn test_presentation_order_is_score_then_label() {
    let mut ranked = vec![("beta", 0.8), ("alpha", 0.8), ("gamma", 0.95)];
    ranked.sort_by(|a, b| compare_ranked(*a, *b));
    let labels: Vec<&str> = ranked.iter().map(|(label, _)| *label).collect();
    assert_eq!(labels, vec!["gamma", "alpha", "beta"]);
}

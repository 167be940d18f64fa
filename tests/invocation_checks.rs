//! Argument classification at call sites
//!
//! Every parameter/argument slot must land in exactly one of the four
//! lists: valid, invalid, missing, or extraneous.

use std::collections::HashMap;

use tokio_util::sync::CancellationToken;

use fathom_analysis::{inspect, InspectionOutcome};
use fathom_syntax::{lex, parse, LexerSnapshot, Position, Type};

async fn inspect_at(text: &str, position: Position) -> InspectionOutcome {
    let state = lex(text).expect("lex");
    let snapshot = LexerSnapshot::new(&state, text);
    let outcome = parse(&snapshot);
    let externals = HashMap::new();
    inspect(
        &outcome,
        &snapshot,
        position,
        &externals,
        &CancellationToken::new(),
    )
    .await
    .expect("inspect")
}

#[tokio::test]
async fn test_every_slot_lands_in_exactly_one_list() {
    // two required params, called with one good and one bad argument
    // plus one extra
    let text = "let f = (a as number, b as text) => a in f(1, 2, 3)";
    let outcome = inspect_at(text, Position::new(0, 44)).await;
    let inspection = outcome.invocation.expect("invocation");
    let checks = inspection.checks.expect("checks");

    let mut counted = vec![0usize; 3];
    for index in 0..3 {
        if checks.valid.contains(&index) {
            counted[index] += 1;
        }
        if checks.invalid.iter().any(|inv| inv.index == index) {
            counted[index] += 1;
        }
        if checks.missing.contains(&index) {
            counted[index] += 1;
        }
        if checks.extraneous.contains(&index) {
            counted[index] += 1;
        }
    }
    assert_eq!(counted, vec![1, 1, 1]);
    assert_eq!(checks.valid, vec![0]);
    assert_eq!(checks.invalid[0].index, 1);
    assert_eq!(checks.extraneous, vec![2]);
}

#[tokio::test]
async fn test_zero_parameter_function_rejects_any_argument() {
    let text = "let f = () => 1 in f(2)";
    let outcome = inspect_at(text, Position::new(0, 22)).await;
    let checks = outcome
        .invocation
        .expect("invocation")
        .checks
        .expect("checks");
    assert_eq!(checks.extraneous, vec![0]);
    assert!(checks.valid.is_empty());
    assert!(checks.invalid.is_empty());
    assert!(checks.missing.is_empty());
}

#[tokio::test]
async fn test_required_parameter_without_argument_is_missing() {
    let text = "let f = (a as number) => a in f()";
    let outcome = inspect_at(text, Position::new(0, 32)).await;
    let checks = outcome
        .invocation
        .expect("invocation")
        .checks
        .expect("checks");
    assert_eq!(checks.missing, vec![0]);
    assert!(checks.valid.is_empty());
    assert!(checks.invalid.is_empty());
    assert!(checks.extraneous.is_empty());
}

#[tokio::test]
async fn test_nullable_parameter_accepts_null() {
    let text = "let f = (a as nullable number) => a in f(null)";
    let outcome = inspect_at(text, Position::new(0, 42)).await;
    let checks = outcome
        .invocation
        .expect("invocation")
        .checks
        .expect("checks");
    assert_eq!(checks.valid, vec![0]);
    assert!(checks.invalid.is_empty());
}

#[tokio::test]
async fn test_non_nullable_parameter_rejects_null() {
    let text = "let f = (a as number) => a in f(null)";
    let outcome = inspect_at(text, Position::new(0, 33)).await;
    let checks = outcome
        .invocation
        .expect("invocation")
        .checks
        .expect("checks");
    assert!(checks.valid.is_empty());
    assert_eq!(checks.invalid.len(), 1);
    assert_eq!(checks.invalid[0].expected, Type::Number);
    assert_eq!(checks.invalid[0].actual, Type::Null);
}

#[tokio::test]
async fn test_incomplete_trailing_argument_is_not_counted() {
    // `f(1, ` parses as a single-argument call; the dangling slot must
    // not show up as an extraneous or invalid argument
    let text = "let f = (a as number, optional b as text) => a in f(1, ";
    let outcome = inspect_at(text, Position::new(0, 54)).await;
    let inspection = outcome.invocation.expect("invocation");
    let checks = inspection.checks.expect("checks");
    assert_eq!(checks.valid, vec![0]);
    assert!(checks.invalid.is_empty());
    assert!(checks.extraneous.is_empty());
    // the cursor still sits in the second slot
    assert_eq!(inspection.argument_ordinal, 1);
}

#[tokio::test]
async fn test_unknown_argument_types_are_compatible() {
    let text = "let f = (a as number) => a in f(mystery)";
    let outcome = inspect_at(text, Position::new(0, 38)).await;
    let checks = outcome
        .invocation
        .expect("invocation")
        .checks
        .expect("checks");
    assert_eq!(checks.valid, vec![0]);
}

//! Invocation inspection
//!
//! When the cursor sits inside a call expression, the inspector gathers
//! what signature help and diagnostics need: the callee's inferred type,
//! argument compatibility against the signature, and the ordinal of the
//! argument slot under the cursor.

use std::collections::HashMap;

use tokio_util::sync::CancellationToken;

use fathom_syntax::{
    infer_type, FunctionSignature, InferenceContext, LexerSnapshot, NodeId, NodeKind, SyntaxTree,
    TokenKind, Type,
};

use crate::active_node::ActiveNode;
use crate::error::AnalysisResult;
use crate::scope::scope_for;
use crate::type_cache::TypeCache;

/// One argument whose inferred type fails the parameter's compatibility
/// rule
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidArgument {
    pub index: usize,
    pub expected: Type,
    pub actual: Type,
}

/// Categorized compatibility result for every argument slot
///
/// Indices are parameter positions. A slot appears in exactly one list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArgumentChecks {
    pub valid: Vec<usize>,
    pub invalid: Vec<InvalidArgument>,
    /// Required parameters with no argument supplied
    pub missing: Vec<usize>,
    /// Arguments beyond the signature's maximum arity
    pub extraneous: Vec<usize>,
}

/// Everything the inspector learned about the invocation under the cursor
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationInspection {
    pub invocation: NodeId,
    pub callee_type: Type,
    /// The callee's name when it is a plain identifier reference
    pub invoked_name: Option<String>,
    /// Whether that name resolves in the scope at the invocation
    pub name_in_local_scope: bool,
    /// Present only when the callee's type carries a signature
    pub checks: Option<ArgumentChecks>,
    /// Zero-based argument slot the cursor sits in
    pub argument_ordinal: usize,
}

/// Inspect the nearest invocation enclosing the active node, if any
pub async fn inspect_invocation(
    tree: &SyntaxTree,
    snapshot: &LexerSnapshot,
    active: &ActiveNode,
    externals: &HashMap<String, Type>,
    cache: &TypeCache,
    cancel: &CancellationToken,
) -> AnalysisResult<Option<InvocationInspection>> {
    let invocation = active
        .ancestry
        .iter()
        .copied()
        .find(|node| matches!(tree.kind(*node), NodeKind::Invocation));
    let Some(invocation) = invocation else {
        return Ok(None);
    };
    inspect_invocation_at(
        tree,
        snapshot,
        invocation,
        active.offset,
        externals,
        cache,
        cancel,
    )
    .await
    .map(Some)
}

/// Inspect a specific invocation node with the cursor at `offset`
pub async fn inspect_invocation_at(
    tree: &SyntaxTree,
    snapshot: &LexerSnapshot,
    invocation: NodeId,
    offset: u32,
    externals: &HashMap<String, Type>,
    cache: &TypeCache,
    cancel: &CancellationToken,
) -> AnalysisResult<InvocationInspection> {
    let children = tree.children(invocation);
    let callee = children.first().copied();
    let argument_list = children.get(1).copied();

    let ctx = InferenceContext { tree, externals };
    let callee_type = match callee {
        Some(callee) => infer_type(&ctx, callee, &cache.types(), cancel).await?,
        None => Type::Unknown,
    };

    let invoked_name = callee
        .and_then(|callee| tree.kind(callee).identifier_name())
        .map(str::to_string);
    let name_in_local_scope = match &invoked_name {
        Some(name) => {
            let scope = scope_for(tree, invocation, cache, cancel).await?;
            scope.contains_key(name)
        }
        None => false,
    };

    let checks = match (&callee_type, argument_list) {
        (Type::Function(signature), Some(list)) => {
            Some(check_arguments(&ctx, signature, tree.children(list), cache, cancel).await?)
        }
        _ => None,
    };

    let argument_ordinal = match argument_list {
        Some(list) => argument_ordinal(tree, snapshot, list, offset),
        None => 0,
    };

    Ok(InvocationInspection {
        invocation,
        callee_type,
        invoked_name,
        name_in_local_scope,
        checks,
        argument_ordinal,
    })
}

async fn check_arguments(
    ctx: &InferenceContext<'_>,
    signature: &FunctionSignature,
    arguments: &[NodeId],
    cache: &TypeCache,
    cancel: &CancellationToken,
) -> AnalysisResult<ArgumentChecks> {
    let mut checks = ArgumentChecks::default();
    let slots = signature.parameters.len().max(arguments.len());
    for index in 0..slots {
        match (signature.parameters.get(index), arguments.get(index)) {
            (Some(parameter), Some(argument)) => {
                let actual = infer_type(ctx, *argument, &cache.types(), cancel).await?;
                if Type::is_compatible(&parameter.ty, &actual, parameter.nullable) {
                    checks.valid.push(index);
                } else {
                    checks.invalid.push(InvalidArgument {
                        index,
                        expected: parameter.ty.clone(),
                        actual,
                    });
                }
            }
            (Some(parameter), None) => {
                if !parameter.optional {
                    checks.missing.push(index);
                }
            }
            (None, Some(_)) => checks.extraneous.push(index),
            (None, None) => {}
        }
    }
    Ok(checks)
}

/// The argument slot the cursor occupies: the count of top-level commas
/// in the argument list that end at or before the cursor
fn argument_ordinal(
    tree: &SyntaxTree,
    snapshot: &LexerSnapshot,
    argument_list: NodeId,
    offset: u32,
) -> usize {
    let span = tree.span(argument_list);
    let mut depth = 0u32;
    let mut ordinal = 0;
    for token in snapshot.tokens() {
        // strictly inside the list, past its own open delimiter
        if token.span.start <= span.start || token.span.end > span.end {
            continue;
        }
        match token.kind {
            TokenKind::LeftParen | TokenKind::LeftBracket => depth += 1,
            TokenKind::RightParen | TokenKind::RightBracket => depth = depth.saturating_sub(1),
            TokenKind::Comma if depth == 0 && token.span.end <= offset => ordinal += 1,
            _ => {}
        }
    }
    ordinal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::active_node::{resolve, ActiveNodeOutcome};
    use fathom_syntax::{lex, parse, ParseOutcome, Position};

    fn setup(text: &str) -> (ParseOutcome, LexerSnapshot) {
        let state = lex(text).expect("lex");
        let snapshot = LexerSnapshot::new(&state, text);
        let outcome = parse(&snapshot);
        (outcome, snapshot)
    }

    async fn inspect_at(text: &str, position: Position) -> Option<InvocationInspection> {
        let (outcome, snapshot) = setup(text);
        let ActiveNodeOutcome::Positioned(active) = resolve(&outcome.tree, &snapshot, position)
        else {
            panic!("expected a positioned cursor");
        };
        let externals = HashMap::new();
        let cache = TypeCache::new();
        inspect_invocation(
            &outcome.tree,
            &snapshot,
            &active,
            &externals,
            &cache,
            &CancellationToken::new(),
        )
        .await
        .expect("inspect")
    }

    #[tokio::test]
    async fn test_no_enclosing_invocation() {
        assert_eq!(inspect_at("1 + 2", Position::new(0, 2)).await, None);
    }

    #[tokio::test]
    async fn test_valid_and_invalid_arguments() {
        let text = "let f = (a as number, b as text) => a in f(1, 2)";
        // cursor inside the argument list
        let inspection = inspect_at(text, Position::new(0, 44)).await.expect("call");
        assert_eq!(inspection.invoked_name.as_deref(), Some("f"));
        assert!(inspection.name_in_local_scope);
        let checks = inspection.checks.expect("signature known");
        assert_eq!(checks.valid, vec![0]);
        assert_eq!(checks.invalid.len(), 1);
        assert_eq!(checks.invalid[0].index, 1);
        assert_eq!(checks.invalid[0].expected, Type::Text);
        assert_eq!(checks.invalid[0].actual, Type::Number);
    }

    #[tokio::test]
    async fn test_missing_required_and_optional_arguments() {
        let text = "let f = (a as number, optional b as text) => a in f(1)";
        let inspection = inspect_at(text, Position::new(0, 53)).await.expect("call");
        let checks = inspection.checks.expect("signature known");
        assert_eq!(checks.valid, vec![0]);
        assert!(checks.missing.is_empty());
        assert!(checks.extraneous.is_empty());

        let text = "let f = (a as number, b as text) => a in f(1)";
        let inspection = inspect_at(text, Position::new(0, 44)).await.expect("call");
        let checks = inspection.checks.expect("signature known");
        assert_eq!(checks.missing, vec![1]);
    }

    #[tokio::test]
    async fn test_extraneous_arguments() {
        let text = "let f = (a as number) => a in f(1, 2, 3)";
        let inspection = inspect_at(text, Position::new(0, 33)).await.expect("call");
        let checks = inspection.checks.expect("signature known");
        assert_eq!(checks.valid, vec![0]);
        assert_eq!(checks.extraneous, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_argument_ordinal_counts_top_level_commas() {
        let text = "let f = (a, b, c) => a in f(1, g(2, 3), 4)";
        // cursor at the end of the first argument
        let inspection = inspect_at(text, Position::new(0, 29)).await.expect("call");
        assert_eq!(inspection.argument_ordinal, 0);

        // cursor in the last slot; the commas of the nested call are not
        // top-level and do not count
        let inspection = inspect_at(text, Position::new(0, 41)).await.expect("call");
        assert_eq!(inspection.argument_ordinal, 2);
    }

    #[tokio::test]
    async fn test_unknown_callee_has_no_checks() {
        let inspection = inspect_at("mystery(1)", Position::new(0, 9))
            .await
            .expect("call");
        assert_eq!(inspection.callee_type, Type::Unknown);
        assert!(inspection.checks.is_none());
        assert!(!inspection.name_in_local_scope);
    }
}

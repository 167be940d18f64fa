//! Position inspection
//!
//! One inspection session resolves everything the providers need at a
//! cursor position: the active node, the scope visible there, and the
//! enclosing invocation if any. The session owns a fresh [`TypeCache`]
//! that scope resolution and type inference fill as they go; the cache
//! travels with the outcome so providers can read resolved types without
//! re-running inference.

use std::collections::HashMap;

use tokio_util::sync::CancellationToken;

use fathom_syntax::{LexerSnapshot, ParseOutcome, Position, Type};

use crate::active_node::{self, ActiveNode, ActiveNodeOutcome};
use crate::error::AnalysisResult;
use crate::invocation::{inspect_invocation, InvocationInspection};
use crate::scope::NodeScope;
use crate::type_cache::TypeCache;

/// Everything learned about one (document, position) pair
#[derive(Debug, Clone)]
pub struct InspectionOutcome {
    pub position: Position,
    pub active: ActiveNodeOutcome,
    /// Names visible at the active node; `None` when out of bounds
    pub scope: Option<NodeScope>,
    pub invocation: Option<InvocationInspection>,
    /// The session's accumulated scopes and inferred types
    pub type_cache: TypeCache,
}

impl InspectionOutcome {
    pub fn active_node(&self) -> Option<&ActiveNode> {
        self.active.positioned()
    }
}

/// Run a full inspection session at `position`
///
/// An out-of-bounds cursor is not an error: the outcome simply carries
/// no scope and no invocation.
pub async fn inspect(
    parse: &ParseOutcome,
    snapshot: &LexerSnapshot,
    position: Position,
    externals: &HashMap<String, Type>,
    cancel: &CancellationToken,
) -> AnalysisResult<InspectionOutcome> {
    let cache = TypeCache::new();
    let active = active_node::resolve(&parse.tree, snapshot, position);

    let (scope, invocation) = match active.positioned() {
        Some(active_node) => {
            let scope = crate::scope::scope_for(
                &parse.tree,
                active_node.leaf(),
                &cache,
                cancel,
            )
            .await?;
            let invocation = inspect_invocation(
                &parse.tree,
                snapshot,
                active_node,
                externals,
                &cache,
                cancel,
            )
            .await?;
            (Some(scope), invocation)
        }
        None => (None, None),
    };

    Ok(InspectionOutcome {
        position,
        active,
        scope,
        invocation,
        type_cache: cache,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fathom_syntax::{lex, parse};

    async fn inspect_text(text: &str, position: Position) -> InspectionOutcome {
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
    async fn test_out_of_bounds_is_an_empty_outcome() {
        let outcome = inspect_text("", Position::new(5, 0)).await;
        assert_eq!(outcome.active, ActiveNodeOutcome::OutOfBounds);
        assert!(outcome.scope.is_none());
        assert!(outcome.invocation.is_none());
    }

    #[tokio::test]
    async fn test_positioned_outcome_carries_scope() {
        let outcome = inspect_text("let alpha = 1 in alpha", Position::new(0, 22)).await;
        let scope = outcome.scope.expect("scope");
        assert!(scope.contains_key("alpha"));
        assert!(outcome.invocation.is_none());
    }

    #[tokio::test]
    async fn test_invocation_present_inside_call() {
        let outcome =
            inspect_text("let f = (a as number) => a in f(1)", Position::new(0, 33)).await;
        let inspection = outcome.invocation.expect("invocation");
        assert_eq!(inspection.invoked_name.as_deref(), Some("f"));
        // the session cache accumulated scopes along the way
        assert!(outcome.type_cache.scope_count() > 0);
    }
}

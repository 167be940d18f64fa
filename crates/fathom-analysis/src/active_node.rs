//! Active-node resolution
//!
//! Turns a cursor position into the ordered ancestry of syntax nodes that
//! contain it, innermost first. Containment follows the
//! half-open-left, closed-right rule from [`fathom_syntax::Span`]: a cursor
//! immediately after a token belongs to it, a cursor immediately before it
//! does not.

use fathom_syntax::{LexerSnapshot, NodeId, NodeKind, Position, SyntaxTree};

/// Result of positioning the cursor inside a document
///
/// Every downstream consumer treats [`ActiveNodeOutcome::OutOfBounds`] as
/// "skip inspection, answer with empty results"; it is not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum ActiveNodeOutcome {
    /// Empty document, or the cursor touches no token
    OutOfBounds,
    Positioned(ActiveNode),
}

impl ActiveNodeOutcome {
    pub fn positioned(&self) -> Option<&ActiveNode> {
        match self {
            ActiveNodeOutcome::Positioned(active) => Some(active),
            ActiveNodeOutcome::OutOfBounds => None,
        }
    }
}

/// The ancestry containing a cursor, with derived cursor facts
///
/// Immutable once created; one is resolved per (document, position) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveNode {
    /// Containing nodes, closest first, root last
    pub ancestry: Vec<NodeId>,
    /// Absolute UTF-16 offset of the cursor
    pub offset: u32,
    /// Whether the cursor sits in the key of the nearest key-value
    /// construct (let binding, record field, section member)
    pub is_in_key: bool,
    /// The identifier node directly under the cursor, if any
    pub identifier_under_cursor: Option<NodeId>,
}

impl ActiveNode {
    /// The innermost containing node
    pub fn leaf(&self) -> NodeId {
        self.ancestry[0]
    }
}

/// Resolve the active node for a position
pub fn resolve(
    tree: &SyntaxTree,
    snapshot: &LexerSnapshot,
    position: Position,
) -> ActiveNodeOutcome {
    let Some(offset) = snapshot.line_index().offset_at(position) else {
        return ActiveNodeOutcome::OutOfBounds;
    };
    let Some(root) = tree.root() else {
        return ActiveNodeOutcome::OutOfBounds;
    };
    if !tree.span(root).contains(offset) {
        return ActiveNodeOutcome::OutOfBounds;
    }

    // walk from the root toward the cursor, taking the first child whose
    // span contains it at every level
    let mut path = vec![root];
    let mut current = root;
    loop {
        let next = tree
            .children(current)
            .iter()
            .copied()
            .find(|child| tree.span(*child).contains(offset));
        match next {
            Some(child) => {
                path.push(child);
                current = child;
            }
            None => break,
        }
    }
    path.reverse();

    let identifier_under_cursor = path
        .first()
        .copied()
        .filter(|leaf| {
            matches!(
                tree.kind(*leaf),
                NodeKind::Identifier(_) | NodeKind::InclusiveIdentifier(_)
            )
        });

    let is_in_key = path
        .iter()
        .find(|node| {
            matches!(
                tree.kind(**node),
                NodeKind::LetBinding | NodeKind::RecordField | NodeKind::SectionMember { .. }
            )
        })
        .and_then(|kv| tree.children(*kv).first().copied())
        .map(|key| tree.span(key).contains(offset))
        .unwrap_or(false);

    ActiveNodeOutcome::Positioned(ActiveNode {
        ancestry: path,
        offset,
        is_in_key,
        identifier_under_cursor,
    })
}

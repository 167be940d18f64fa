//! Id-indexed syntax tree
//!
//! Nodes are identified by integer ids; kinds and spans live in a flat
//! arena, and parent/child relationships are kept in id-indexed maps rather
//! than in-node references. This keeps the tree free of cyclic ownership
//! while still allowing walks in either direction.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::text::Span;

/// Identifier of a syntax node within one tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Binary operator classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Concat,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    NotEqual,
    And,
    Or,
}

/// Unary operator classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Negate,
    Not,
}

/// Syntax node kinds
///
/// Child layout conventions, where relevant:
/// - `LetExpression`: bindings then an optional trailing body
/// - `LetBinding` / `RecordField` / `SectionMember`: key identifier, value
/// - `FunctionExpression`: parameters then the body
/// - `Parameter`: name identifier, then an optional `TypeName`
/// - `Invocation`: callee, then an `ArgumentList`
/// - `Section`: name identifier, then members
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Document,
    Section,
    SectionMember { shared: bool },
    LetExpression,
    LetBinding,
    EachExpression,
    FunctionExpression,
    Parameter { optional: bool, nullable: bool },
    TypeName(String),
    RecordExpression,
    RecordField,
    Invocation,
    ArgumentList,
    IfExpression,
    BinaryExpression(BinaryOp),
    UnaryExpression(UnaryOp),
    ParenExpression,
    Identifier(String),
    InclusiveIdentifier(String),
    NumberLiteral,
    TextLiteral,
    LogicalLiteral(bool),
    NullLiteral,
}

impl NodeKind {
    /// The name this node refers to, for identifier-like kinds
    pub fn identifier_name(&self) -> Option<&str> {
        match self {
            NodeKind::Identifier(name) | NodeKind::InclusiveIdentifier(name) => Some(name),
            _ => None,
        }
    }
}

/// An arena-backed syntax tree
#[derive(Debug, Clone, Default)]
pub struct SyntaxTree {
    kinds: Vec<NodeKind>,
    spans: Vec<Span>,
    parents: HashMap<NodeId, NodeId>,
    children: HashMap<NodeId, Vec<NodeId>>,
    root: Option<NodeId>,
}

impl SyntaxTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a node; parents are attached via [`SyntaxTree::set_children`]
    pub fn push(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.kinds.len() as u32);
        self.kinds.push(kind);
        self.spans.push(span);
        id
    }

    /// Attach children to a node, recording the inverse parent links
    pub fn set_children(&mut self, parent: NodeId, children: Vec<NodeId>) {
        for child in &children {
            self.parents.insert(*child, parent);
        }
        self.children.insert(parent, children);
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.kinds[id.0 as usize]
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.spans[id.0 as usize]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents.get(&id).copied()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ancestors of a node, nearest first, excluding the node itself
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            out.push(parent);
            current = parent;
        }
        out
    }

    /// All node ids in allocation order
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.kinds.len() as u32).map(NodeId)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// First child with the given predicate on its kind
    pub fn child_where(&self, id: NodeId, pred: impl Fn(&NodeKind) -> bool) -> Option<NodeId> {
        self.children(id).iter().copied().find(|c| pred(self.kind(*c)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_links_follow_children() {
        let mut tree = SyntaxTree::new();
        let leaf = tree.push(NodeKind::Identifier("a".into()), Span::new(0, 1));
        let root = tree.push(NodeKind::Document, Span::new(0, 1));
        tree.set_children(root, vec![leaf]);
        tree.set_root(root);

        assert_eq!(tree.parent(leaf), Some(root));
        assert_eq!(tree.parent(root), None);
        assert_eq!(tree.children(root), &[leaf]);
        assert_eq!(tree.ancestors(leaf), vec![root]);
    }

    #[test]
    fn test_children_default_empty() {
        let mut tree = SyntaxTree::new();
        let node = tree.push(NodeKind::NullLiteral, Span::new(0, 4));
        assert!(tree.children(node).is_empty());
    }
}

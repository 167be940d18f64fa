//! Scope resolution
//!
//! A node's scope is the map of names visible at that node, resolved by
//! layering binding constructs from the document root down to the node.
//! Each step derives the child scope by cloning the parent scope and
//! overlaying the names the enclosing construct introduces, so inner
//! bindings shadow outer ones by plain map insertion. Resolved scopes are
//! memoized per node in the session's [`TypeCache`].
//!
//! Recursive-capable constructs (let, record, section) additionally expose
//! every binding under an `@`-prefixed alias. The alias refers to the same
//! binding but is always marked recursive, matching how an `@name`
//! reference bypasses shadowing inside the binding's own value.

use std::collections::HashMap;

use tokio_util::sync::CancellationToken;

use fathom_syntax::{NodeId, NodeKind, SyntaxTree, Type};

use crate::error::{AnalysisError, AnalysisResult};
use crate::type_cache::TypeCache;

/// A name visible at some node, and where it came from
#[derive(Debug, Clone, PartialEq)]
pub enum ScopeItem {
    /// The implicit `_` parameter of an each-expression
    Each { each_expression: NodeId },
    LetVariable {
        binding: NodeId,
        key: NodeId,
        value: Option<NodeId>,
        /// Whether this entry may be referenced from its own value
        recursive: bool,
    },
    Parameter {
        parameter: NodeId,
        name: NodeId,
        optional: bool,
        nullable: bool,
        declared_type: Option<Type>,
    },
    RecordField {
        field: NodeId,
        key: NodeId,
        value: Option<NodeId>,
        recursive: bool,
    },
    SectionMember {
        member: NodeId,
        key: NodeId,
        value: Option<NodeId>,
        shared: bool,
        recursive: bool,
    },
    /// A reference that no enclosing construct binds; inserted by
    /// consumers that want unresolved names represented explicitly
    Undefined { reference: NodeId },
}

impl ScopeItem {
    /// The node that introduced this name
    pub fn introducing_node(&self) -> NodeId {
        match self {
            ScopeItem::Each { each_expression } => *each_expression,
            ScopeItem::LetVariable { binding, .. } => *binding,
            ScopeItem::Parameter { parameter, .. } => *parameter,
            ScopeItem::RecordField { field, .. } => *field,
            ScopeItem::SectionMember { member, .. } => *member,
            ScopeItem::Undefined { reference } => *reference,
        }
    }

    /// The key identifier node, where the construct has one
    pub fn key_node(&self) -> Option<NodeId> {
        match self {
            ScopeItem::LetVariable { key, .. }
            | ScopeItem::RecordField { key, .. }
            | ScopeItem::SectionMember { key, .. } => Some(*key),
            ScopeItem::Parameter { name, .. } => Some(*name),
            ScopeItem::Each { .. } | ScopeItem::Undefined { .. } => None,
        }
    }

    /// The bound value expression, where one was parsed
    pub fn value_node(&self) -> Option<NodeId> {
        match self {
            ScopeItem::LetVariable { value, .. }
            | ScopeItem::RecordField { value, .. }
            | ScopeItem::SectionMember { value, .. } => *value,
            _ => None,
        }
    }

    pub fn is_recursive(&self) -> bool {
        match self {
            ScopeItem::LetVariable { recursive, .. }
            | ScopeItem::RecordField { recursive, .. }
            | ScopeItem::SectionMember { recursive, .. } => *recursive,
            _ => false,
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            ScopeItem::Each { .. } => "each parameter",
            ScopeItem::LetVariable { .. } => "let variable",
            ScopeItem::Parameter { .. } => "parameter",
            ScopeItem::RecordField { .. } => "record field",
            ScopeItem::SectionMember { .. } => "section member",
            ScopeItem::Undefined { .. } => "undefined",
        }
    }
}

/// The names visible at one node
pub type NodeScope = HashMap<String, ScopeItem>;

/// Resolve the scope visible at `node`, memoizing every scope along the
/// root-to-node path into the session cache
pub async fn scope_for(
    tree: &SyntaxTree,
    node: NodeId,
    cache: &TypeCache,
    cancel: &CancellationToken,
) -> AnalysisResult<NodeScope> {
    if let Some(scope) = cache.scope_of(node) {
        return Ok(scope);
    }
    let Some(_root) = tree.root() else {
        return Ok(NodeScope::new());
    };

    // root-first path down to the node
    let mut path = tree.ancestors(node);
    path.reverse();
    path.push(node);

    let mut current = NodeScope::new();
    for (index, step) in path.iter().copied().enumerate() {
        if cancel.is_cancelled() {
            return Err(AnalysisError::Canceled);
        }
        if let Some(scope) = cache.scope_of(step) {
            current = scope;
            continue;
        }
        if index > 0 {
            let parent = path[index - 1];
            let mut derived = current.clone();
            layer_contributions(tree, parent, step, &mut derived);
            current = derived;
        }
        cache.set_scope(step, current.clone());
    }
    Ok(current)
}

/// Overlay onto `scope` the names `parent` makes visible inside `child`
fn layer_contributions(tree: &SyntaxTree, parent: NodeId, child: NodeId, scope: &mut NodeScope) {
    match tree.kind(parent) {
        // bindings are visible throughout the construct: in every
        // binding's value and in the body alike
        NodeKind::LetExpression => {
            for binding in tree.children(parent) {
                if !matches!(tree.kind(*binding), NodeKind::LetBinding) {
                    continue;
                }
                let Some((name, key, value)) = key_value_of(tree, *binding) else {
                    continue;
                };
                scope.insert(
                    name.clone(),
                    ScopeItem::LetVariable {
                        binding: *binding,
                        key,
                        value,
                        recursive: false,
                    },
                );
                scope.insert(
                    format!("@{name}"),
                    ScopeItem::LetVariable {
                        binding: *binding,
                        key,
                        value,
                        recursive: true,
                    },
                );
            }
        }
        NodeKind::RecordExpression => {
            for field in tree.children(parent) {
                if !matches!(tree.kind(*field), NodeKind::RecordField) {
                    continue;
                }
                let Some((name, key, value)) = key_value_of(tree, *field) else {
                    continue;
                };
                scope.insert(
                    name.clone(),
                    ScopeItem::RecordField {
                        field: *field,
                        key,
                        value,
                        recursive: false,
                    },
                );
                scope.insert(
                    format!("@{name}"),
                    ScopeItem::RecordField {
                        field: *field,
                        key,
                        value,
                        recursive: true,
                    },
                );
            }
        }
        NodeKind::Section => {
            for member in tree.children(parent) {
                let NodeKind::SectionMember { shared } = tree.kind(*member) else {
                    continue;
                };
                let shared = *shared;
                let Some((name, key, value)) = key_value_of(tree, *member) else {
                    continue;
                };
                let item = ScopeItem::SectionMember {
                    member: *member,
                    key,
                    value,
                    shared,
                    recursive: true,
                };
                scope.insert(name.clone(), item.clone());
                scope.insert(format!("@{name}"), item);
            }
        }
        NodeKind::FunctionExpression => {
            // parameters are in scope in the body only
            if matches!(tree.kind(child), NodeKind::Parameter { .. }) {
                return;
            }
            for parameter in tree.children(parent) {
                let NodeKind::Parameter { optional, nullable } = tree.kind(*parameter) else {
                    continue;
                };
                let (optional, nullable) = (*optional, *nullable);
                let children = tree.children(*parameter);
                let Some(name_node) = children.first().copied() else {
                    continue;
                };
                let Some(name) = tree.kind(name_node).identifier_name() else {
                    continue;
                };
                let declared_type = children.iter().find_map(|c| match tree.kind(*c) {
                    NodeKind::TypeName(type_name) => Some(Type::from_name(type_name)),
                    _ => None,
                });
                scope.insert(
                    name.to_string(),
                    ScopeItem::Parameter {
                        parameter: *parameter,
                        name: name_node,
                        optional,
                        nullable,
                        declared_type,
                    },
                );
            }
        }
        NodeKind::EachExpression => {
            scope.insert(
                "_".to_string(),
                ScopeItem::Each {
                    each_expression: parent,
                },
            );
        }
        _ => {}
    }
}

fn key_value_of(tree: &SyntaxTree, binding: NodeId) -> Option<(String, NodeId, Option<NodeId>)> {
    let children = tree.children(binding);
    let key = children.first().copied()?;
    let name = tree.kind(key).identifier_name()?.to_string();
    Some((name, key, children.get(1).copied()))
}

//! Session-scoped accumulator of per-node scopes and inferred types
//!
//! One `TypeCache` lives for the duration of a single inspection session.
//! Cloning shares the underlying maps: the scope resolver and the type
//! inference collaborator both write into the same accumulator. It is never
//! reset mid-session; a new session starts with a fresh cache.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use fathom_syntax::{NodeId, Type, TypeMap};

use crate::scope::NodeScope;

#[derive(Debug, Clone, Default)]
pub struct TypeCache {
    scopes: Arc<RwLock<HashMap<NodeId, NodeScope>>>,
    types: TypeMap,
}

impl TypeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached scope for a node, if one was resolved this session
    pub fn scope_of(&self, node: NodeId) -> Option<NodeScope> {
        self.scopes.read().unwrap().get(&node).cloned()
    }

    pub fn set_scope(&self, node: NodeId, scope: NodeScope) {
        self.scopes.write().unwrap().insert(node, scope);
    }

    /// The shared node-id→type map, in the shape inference consumes
    pub fn types(&self) -> TypeMap {
        Arc::clone(&self.types)
    }

    /// The cached inferred type for a node, if any
    pub fn type_of(&self, node: NodeId) -> Option<Type> {
        self.types.read().unwrap().get(&node).cloned()
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.read().unwrap().len()
    }
}

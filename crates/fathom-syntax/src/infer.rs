//! Best-effort structural type inference
//!
//! Inference is deliberately shallow: it resolves literals, records,
//! function expressions, and identifier references through their
//! syntactic bindings, and defaults to [`Type::Unknown`] everywhere it
//! cannot commit. Results accumulate in a shared node-id→type map for the
//! lifetime of one inspection session.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, RwLock};

use tokio_util::sync::CancellationToken;

use crate::error::{SyntaxError, SyntaxResult};
use crate::tree::{BinaryOp, NodeId, NodeKind, SyntaxTree, UnaryOp};
use crate::types::{FunctionSignature, ParameterSpec, Type};

/// Session-shared node-id→type accumulator
pub type TypeMap = Arc<RwLock<HashMap<NodeId, Type>>>;

/// Everything inference needs besides the node itself
pub struct InferenceContext<'a> {
    pub tree: &'a SyntaxTree,
    /// Types of names the document does not bind itself (library values)
    pub externals: &'a HashMap<String, Type>,
}

/// Infer the type of a node, memoizing into `types`
///
/// Writes happen under the map's lock with no suspension point in between,
/// so concurrent tasks within one inspection session never observe a
/// half-written entry.
pub async fn infer_type(
    ctx: &InferenceContext<'_>,
    node: NodeId,
    types: &TypeMap,
    cancel: &CancellationToken,
) -> SyntaxResult<Type> {
    if cancel.is_cancelled() {
        return Err(SyntaxError::Canceled);
    }
    let mut memo = types.write().unwrap();
    let mut visiting = HashSet::new();
    infer_node(ctx, node, &mut memo, &mut visiting, cancel)
}

fn infer_node(
    ctx: &InferenceContext<'_>,
    node: NodeId,
    memo: &mut HashMap<NodeId, Type>,
    visiting: &mut HashSet<NodeId>,
    cancel: &CancellationToken,
) -> SyntaxResult<Type> {
    if cancel.is_cancelled() {
        return Err(SyntaxError::Canceled);
    }
    if let Some(ty) = memo.get(&node) {
        return Ok(ty.clone());
    }
    if !visiting.insert(node) {
        // self-referential binding; bottom out instead of recursing forever
        return Ok(Type::Unknown);
    }
    let ty = compute(ctx, node, memo, visiting, cancel)?;
    visiting.remove(&node);
    memo.insert(node, ty.clone());
    Ok(ty)
}

fn compute(
    ctx: &InferenceContext<'_>,
    node: NodeId,
    memo: &mut HashMap<NodeId, Type>,
    visiting: &mut HashSet<NodeId>,
    cancel: &CancellationToken,
) -> SyntaxResult<Type> {
    let tree = ctx.tree;
    Ok(match tree.kind(node) {
        NodeKind::NumberLiteral => Type::Number,
        NodeKind::TextLiteral => Type::Text,
        NodeKind::LogicalLiteral(_) => Type::Logical,
        NodeKind::NullLiteral => Type::Null,
        NodeKind::TypeName(name) => Type::from_name(name),
        NodeKind::ParenExpression | NodeKind::Document => match tree.children(node).first() {
            Some(child) => infer_node(ctx, *child, memo, visiting, cancel)?,
            None => Type::Unknown,
        },
        NodeKind::UnaryExpression(UnaryOp::Negate) => Type::Number,
        NodeKind::UnaryExpression(UnaryOp::Not) => Type::Logical,
        NodeKind::BinaryExpression(op) => match op {
            BinaryOp::Add | BinaryOp::Subtract | BinaryOp::Multiply | BinaryOp::Divide => {
                Type::Number
            }
            BinaryOp::Concat => Type::Text,
            _ => Type::Logical,
        },
        NodeKind::IfExpression => {
            let children = tree.children(node);
            if children.len() == 3 {
                let then_ty = infer_node(ctx, children[1], memo, visiting, cancel)?;
                let else_ty = infer_node(ctx, children[2], memo, visiting, cancel)?;
                if then_ty == else_ty {
                    then_ty
                } else {
                    Type::Any
                }
            } else {
                Type::Unknown
            }
        }
        NodeKind::RecordExpression => {
            let mut fields = BTreeMap::new();
            for field in tree.children(node) {
                let children = tree.children(*field);
                let (Some(key), Some(value)) = (children.first(), children.get(1)) else {
                    continue;
                };
                if let Some(name) = tree.kind(*key).identifier_name() {
                    let ty = infer_node(ctx, *value, memo, visiting, cancel)?;
                    fields.insert(name.to_string(), ty);
                }
            }
            Type::Record(fields)
        }
        NodeKind::LetBinding | NodeKind::RecordField | NodeKind::SectionMember { .. } => {
            match tree.children(node).get(1) {
                Some(value) => infer_node(ctx, *value, memo, visiting, cancel)?,
                None => Type::Unknown,
            }
        }
        NodeKind::LetExpression => {
            // the body is the only child that is not a binding
            let body = tree
                .children(node)
                .iter()
                .copied()
                .find(|child| !matches!(tree.kind(*child), NodeKind::LetBinding));
            match body {
                Some(body) => infer_node(ctx, body, memo, visiting, cancel)?,
                None => Type::Unknown,
            }
        }
        NodeKind::EachExpression => {
            let body_ty = match tree.children(node).first() {
                Some(body) => infer_node(ctx, *body, memo, visiting, cancel)?,
                None => Type::Unknown,
            };
            Type::Function(FunctionSignature {
                parameters: vec![ParameterSpec {
                    name: "_".to_string(),
                    ty: Type::Any,
                    optional: false,
                    nullable: false,
                }],
                return_type: Box::new(body_ty),
            })
        }
        NodeKind::FunctionExpression => {
            let mut parameters = Vec::new();
            let mut body = None;
            for child in tree.children(node) {
                match tree.kind(*child) {
                    NodeKind::Parameter { optional, nullable } => {
                        parameters.push(parameter_spec(tree, *child, *optional, *nullable));
                    }
                    _ => body = Some(*child),
                }
            }
            let return_type = match body {
                Some(body) => infer_node(ctx, body, memo, visiting, cancel)?,
                None => Type::Unknown,
            };
            Type::Function(FunctionSignature {
                parameters,
                return_type: Box::new(return_type),
            })
        }
        NodeKind::Invocation => {
            let callee = match tree.children(node).first() {
                Some(callee) => *callee,
                None => return Ok(Type::Unknown),
            };
            match infer_node(ctx, callee, memo, visiting, cancel)? {
                Type::Function(signature) => *signature.return_type,
                _ => Type::Unknown,
            }
        }
        NodeKind::Identifier(name) | NodeKind::InclusiveIdentifier(name) => {
            let name = name.clone();
            match resolve_reference(tree, node, &name) {
                Some(Resolution::Value(value)) => {
                    infer_node(ctx, value, memo, visiting, cancel)?
                }
                Some(Resolution::Declared(ty)) => ty,
                None => ctx.externals.get(&name).cloned().unwrap_or(Type::Unknown),
            }
        }
        NodeKind::Section
        | NodeKind::Parameter { .. }
        | NodeKind::ArgumentList => Type::Unknown,
    })
}

fn parameter_spec(
    tree: &SyntaxTree,
    parameter: NodeId,
    optional: bool,
    nullable: bool,
) -> ParameterSpec {
    let mut name = String::new();
    let mut ty = Type::Any;
    for child in tree.children(parameter) {
        match tree.kind(*child) {
            NodeKind::Identifier(param_name) => name = param_name.clone(),
            NodeKind::TypeName(type_name) => ty = Type::from_name(type_name),
            _ => {}
        }
    }
    ParameterSpec {
        name,
        ty,
        optional,
        nullable,
    }
}

enum Resolution {
    /// The reference is bound to this value expression
    Value(NodeId),
    /// The reference is a parameter with this declared type
    Declared(Type),
}

/// Resolve an identifier syntactically: walk outward through the binding
/// constructs that could introduce the name
fn resolve_reference(tree: &SyntaxTree, reference: NodeId, name: &str) -> Option<Resolution> {
    for ancestor in tree.ancestors(reference) {
        match tree.kind(ancestor) {
            NodeKind::LetExpression | NodeKind::RecordExpression | NodeKind::Section => {
                for child in tree.children(ancestor) {
                    if !matches!(
                        tree.kind(*child),
                        NodeKind::LetBinding
                            | NodeKind::RecordField
                            | NodeKind::SectionMember { .. }
                    ) {
                        continue;
                    }
                    let binding_children = tree.children(*child);
                    let (Some(key), value) = (binding_children.first(), binding_children.get(1))
                    else {
                        continue;
                    };
                    if tree.kind(*key).identifier_name() == Some(name) && *key != reference {
                        return value.map(|value| Resolution::Value(*value));
                    }
                }
            }
            NodeKind::FunctionExpression => {
                for child in tree.children(ancestor) {
                    let NodeKind::Parameter { optional, nullable } = tree.kind(*child) else {
                        continue;
                    };
                    let spec = parameter_spec(tree, *child, *optional, *nullable);
                    if spec.name == name {
                        return Some(Resolution::Declared(spec.ty));
                    }
                }
            }
            NodeKind::EachExpression if name == "_" => {
                return Some(Resolution::Declared(Type::Any));
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{lex, LexerSnapshot};
    use crate::parser::parse;

    async fn infer_root(text: &str) -> Type {
        let state = lex(text).expect("lex");
        let snapshot = LexerSnapshot::new(&state, text);
        let outcome = parse(&snapshot);
        let externals = HashMap::new();
        let ctx = InferenceContext {
            tree: &outcome.tree,
            externals: &externals,
        };
        let types: TypeMap = Arc::default();
        infer_type(
            &ctx,
            outcome.tree.root().expect("root"),
            &types,
            &CancellationToken::new(),
        )
        .await
        .expect("infer")
    }

    #[tokio::test]
    async fn test_infer_literals_and_operators() {
        assert_eq!(infer_root("1 + 2").await, Type::Number);
        assert_eq!(infer_root("\"a\" & \"b\"").await, Type::Text);
        assert_eq!(infer_root("1 < 2").await, Type::Logical);
    }

    #[tokio::test]
    async fn test_infer_let_body_through_binding() {
        assert_eq!(infer_root("let a = 1 in a").await, Type::Number);
    }

    #[tokio::test]
    async fn test_infer_record_type() {
        let ty = infer_root("[a = 1, b = \"x\"]").await;
        let Type::Record(fields) = ty else {
            panic!("expected record type");
        };
        assert_eq!(fields.get("a"), Some(&Type::Number));
        assert_eq!(fields.get("b"), Some(&Type::Text));
    }

    #[tokio::test]
    async fn test_infer_function_signature() {
        let ty = infer_root("(x as number, optional y) => x").await;
        let Type::Function(signature) = ty else {
            panic!("expected function type");
        };
        assert_eq!(signature.min_arity(), 1);
        assert_eq!(signature.parameters[0].ty, Type::Number);
        assert_eq!(*signature.return_type, Type::Number);
    }

    #[tokio::test]
    async fn test_infer_invocation_return_type() {
        assert_eq!(infer_root("((x) => 1)(2)").await, Type::Number);
    }

    #[tokio::test]
    async fn test_infer_self_reference_bottoms_out() {
        assert_eq!(infer_root("let a = a in a").await, Type::Unknown);
    }

    #[tokio::test]
    async fn test_infer_cancellation() {
        let text = "1";
        let state = lex(text).expect("lex");
        let snapshot = LexerSnapshot::new(&state, text);
        let outcome = parse(&snapshot);
        let externals = HashMap::new();
        let ctx = InferenceContext {
            tree: &outcome.tree,
            externals: &externals,
        };
        let types: TypeMap = Arc::default();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = infer_type(&ctx, outcome.tree.root().unwrap(), &types, &cancel).await;
        assert_eq!(result, Err(SyntaxError::Canceled));
    }
}

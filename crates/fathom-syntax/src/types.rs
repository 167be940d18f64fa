//! Structural type model for Fathom values

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A parameter of a function signature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub ty: Type,
    pub optional: bool,
    pub nullable: bool,
}

/// A function signature: parameters plus a return type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSignature {
    pub parameters: Vec<ParameterSpec>,
    pub return_type: Box<Type>,
}

impl FunctionSignature {
    /// Number of required (non-optional) parameters
    pub fn min_arity(&self) -> usize {
        self.parameters.iter().filter(|p| !p.optional).count()
    }

    pub fn max_arity(&self) -> usize {
        self.parameters.len()
    }

    /// Render as `(a: number, optional b: text) -> any`
    pub fn label(&self) -> String {
        let parameters = self
            .parameters
            .iter()
            .map(|p| {
                let mut out = String::new();
                if p.optional {
                    out.push_str("optional ");
                }
                out.push_str(&p.name);
                out.push_str(": ");
                if p.nullable {
                    out.push_str("nullable ");
                }
                out.push_str(&p.ty.label());
                out
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("({parameters}) -> {}", self.return_type.label())
    }
}

/// Inferred or declared type of an expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Type {
    /// Compatible with everything, in both directions
    Any,
    /// Not yet determined; treated as compatible to stay useful mid-edit
    Unknown,
    Number,
    Text,
    Logical,
    Null,
    Record(BTreeMap<String, Type>),
    Function(FunctionSignature),
}

impl Type {
    /// Resolve a declared type name, as written after `as`
    pub fn from_name(name: &str) -> Type {
        match name {
            "number" => Type::Number,
            "text" => Type::Text,
            "logical" => Type::Logical,
            "record" => Type::Record(BTreeMap::new()),
            "any" => Type::Any,
            _ => Type::Unknown,
        }
    }

    /// Whether an argument of type `actual` satisfies a parameter declared
    /// as `expected` (optionally nullable)
    pub fn is_compatible(expected: &Type, actual: &Type, nullable: bool) -> bool {
        match (expected, actual) {
            (Type::Any, _) | (_, Type::Any) => true,
            (_, Type::Unknown) | (Type::Unknown, _) => true,
            (_, Type::Null) if nullable => true,
            // records check structurally: every expected field must be
            // present and compatible
            (Type::Record(expected_fields), Type::Record(actual_fields)) => {
                expected_fields.iter().all(|(name, expected_ty)| {
                    actual_fields
                        .get(name)
                        .map(|actual_ty| Type::is_compatible(expected_ty, actual_ty, false))
                        .unwrap_or(false)
                })
            }
            (Type::Function(_), Type::Function(_)) => true,
            _ => expected == actual,
        }
    }

    /// Short display name for hovers and diagnostics
    pub fn label(&self) -> String {
        match self {
            Type::Any => "any".to_string(),
            Type::Unknown => "unknown".to_string(),
            Type::Number => "number".to_string(),
            Type::Text => "text".to_string(),
            Type::Logical => "logical".to_string(),
            Type::Null => "null".to_string(),
            Type::Record(fields) => {
                let fields = fields
                    .iter()
                    .map(|(name, ty)| format!("{name}: {}", ty.label()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("[{fields}]")
            }
            Type::Function(signature) => signature.label(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_is_bidirectionally_compatible() {
        assert!(Type::is_compatible(&Type::Any, &Type::Number, false));
        assert!(Type::is_compatible(&Type::Number, &Type::Any, false));
    }

    #[test]
    fn test_null_requires_nullable() {
        assert!(!Type::is_compatible(&Type::Number, &Type::Null, false));
        assert!(Type::is_compatible(&Type::Number, &Type::Null, true));
    }

    #[test]
    fn test_record_structural_compatibility() {
        let expected = Type::Record(BTreeMap::from([("a".to_string(), Type::Number)]));
        let actual = Type::Record(BTreeMap::from([
            ("a".to_string(), Type::Number),
            ("b".to_string(), Type::Text),
        ]));
        assert!(Type::is_compatible(&expected, &actual, false));
        assert!(!Type::is_compatible(&actual, &expected, false));
    }

    #[test]
    fn test_signature_arity_and_label() {
        let signature = FunctionSignature {
            parameters: vec![
                ParameterSpec {
                    name: "a".to_string(),
                    ty: Type::Number,
                    optional: false,
                    nullable: false,
                },
                ParameterSpec {
                    name: "b".to_string(),
                    ty: Type::Text,
                    optional: true,
                    nullable: false,
                },
            ],
            return_type: Box::new(Type::Any),
        };
        assert_eq!(signature.min_arity(), 1);
        assert_eq!(signature.max_arity(), 2);
        assert_eq!(signature.label(), "(a: number, optional b: text) -> any");
    }
}

//! Standard library surface
//!
//! The built-in definitions live in a lazily-initialized static table.
//! Hosts can register additional definitions at runtime (connector
//! libraries, workspace-level helpers); those share the same lookup path
//! and shadow nothing, since built-in names win.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use fathom_analysis::{compare_ranked, score_against};
use fathom_syntax::{FunctionSignature, ParameterSpec, Type};

use crate::error::ServiceResult;
use crate::providers::{
    AutocompleteProvider, HoverProvider, Provider, ProviderContext, SignatureHelpProvider,
};
use crate::types::{
    AutocompleteItem, Hover, ItemKind, ParameterInfo, SignatureHelp, SignatureInfo,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LibraryItemKind {
    Constant,
    Function,
    Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LibraryDefinition {
    pub name: String,
    pub kind: LibraryItemKind,
    pub ty: Type,
    pub documentation: String,
}

impl LibraryDefinition {
    pub fn new(
        name: impl Into<String>,
        kind: LibraryItemKind,
        ty: Type,
        documentation: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            ty,
            documentation: documentation.into(),
        }
    }
}

fn function(params: &[(&str, Type)], optional_from: usize, ret: Type) -> Type {
    Type::Function(FunctionSignature {
        parameters: params
            .iter()
            .enumerate()
            .map(|(i, (name, ty))| ParameterSpec {
                name: (*name).to_string(),
                ty: ty.clone(),
                optional: i >= optional_from,
                nullable: false,
            })
            .collect(),
        return_type: Box::new(ret),
    })
}

static BUILTINS: Lazy<Vec<LibraryDefinition>> = Lazy::new(|| {
    vec![
        LibraryDefinition::new("pi", LibraryItemKind::Constant, Type::Number, "The ratio of a circle's circumference to its diameter."),
        LibraryDefinition::new("e", LibraryItemKind::Constant, Type::Number, "Euler's number, the base of natural logarithms."),
        LibraryDefinition::new(
            "abs",
            LibraryItemKind::Function,
            function(&[("value", Type::Number)], 1, Type::Number),
            "Returns the absolute value of a number.",
        ),
        LibraryDefinition::new(
            "sqrt",
            LibraryItemKind::Function,
            function(&[("value", Type::Number)], 1, Type::Number),
            "Returns the square root of a number.",
        ),
        LibraryDefinition::new(
            "floor",
            LibraryItemKind::Function,
            function(&[("value", Type::Number)], 1, Type::Number),
            "Rounds a number down to the nearest integer.",
        ),
        LibraryDefinition::new(
            "ceiling",
            LibraryItemKind::Function,
            function(&[("value", Type::Number)], 1, Type::Number),
            "Rounds a number up to the nearest integer.",
        ),
        LibraryDefinition::new(
            "min",
            LibraryItemKind::Function,
            function(&[("first", Type::Number), ("second", Type::Number)], 2, Type::Number),
            "Returns the smaller of two numbers.",
        ),
        LibraryDefinition::new(
            "max",
            LibraryItemKind::Function,
            function(&[("first", Type::Number), ("second", Type::Number)], 2, Type::Number),
            "Returns the larger of two numbers.",
        ),
        LibraryDefinition::new(
            "length",
            LibraryItemKind::Function,
            function(&[("value", Type::Text)], 1, Type::Number),
            "Returns the number of characters in a text value.",
        ),
        LibraryDefinition::new(
            "upper",
            LibraryItemKind::Function,
            function(&[("value", Type::Text)], 1, Type::Text),
            "Converts a text value to upper case.",
        ),
        LibraryDefinition::new(
            "lower",
            LibraryItemKind::Function,
            function(&[("value", Type::Text)], 1, Type::Text),
            "Converts a text value to lower case.",
        ),
        LibraryDefinition::new(
            "trim",
            LibraryItemKind::Function,
            function(&[("value", Type::Text)], 1, Type::Text),
            "Removes leading and trailing whitespace from a text value.",
        ),
        LibraryDefinition::new(
            "contains",
            LibraryItemKind::Function,
            function(&[("value", Type::Text), ("substring", Type::Text)], 2, Type::Logical),
            "Whether a text value contains the given substring.",
        ),
        LibraryDefinition::new(
            "round",
            LibraryItemKind::Function,
            function(&[("value", Type::Number), ("digits", Type::Number)], 1, Type::Number),
            "Rounds a number, optionally to a given number of digits.",
        ),
        LibraryDefinition::new("number", LibraryItemKind::Type, Type::Number, "The number type."),
        LibraryDefinition::new("text", LibraryItemKind::Type, Type::Text, "The text type."),
        LibraryDefinition::new("logical", LibraryItemKind::Type, Type::Logical, "The logical type."),
        LibraryDefinition::new("any", LibraryItemKind::Type, Type::Any, "The type of every value."),
    ]
});

/// Library lookup over the built-ins plus host-registered definitions
#[derive(Debug, Default)]
pub struct Library {
    registered: RwLock<Vec<LibraryDefinition>>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a host-supplied definition; built-in names are not replaced
    pub fn register(&self, definition: LibraryDefinition) {
        if self.lookup(&definition.name).is_some() {
            return;
        }
        self.registered.write().unwrap().push(definition);
    }

    pub fn lookup(&self, name: &str) -> Option<LibraryDefinition> {
        BUILTINS
            .iter()
            .find(|def| def.name == name)
            .cloned()
            .or_else(|| {
                self.registered
                    .read()
                    .unwrap()
                    .iter()
                    .find(|def| def.name == name)
                    .cloned()
            })
    }

    pub fn definitions(&self) -> Vec<LibraryDefinition> {
        let mut all: Vec<LibraryDefinition> = BUILTINS.clone();
        all.extend(self.registered.read().unwrap().iter().cloned());
        all
    }

    /// Name→type map handed to inference for unbound identifiers
    pub fn externals(&self) -> HashMap<String, Type> {
        self.definitions()
            .into_iter()
            .map(|def| (def.name, def.ty))
            .collect()
    }
}

/// The lowest-priority provider: answers from the library surface for
/// names the document and environment do not claim
pub struct LibraryProvider {
    library: std::sync::Arc<Library>,
}

impl LibraryProvider {
    pub fn new(library: std::sync::Arc<Library>) -> Self {
        Self { library }
    }

    fn identifier_under_cursor(&self, ctx: &ProviderContext) -> Option<String> {
        let active = ctx.inspection.active_node()?;
        let identifier = active.identifier_under_cursor?;
        ctx.parse
            .tree
            .kind(identifier)
            .identifier_name()
            .map(str::to_string)
    }
}

fn completion_kind(kind: LibraryItemKind) -> ItemKind {
    match kind {
        LibraryItemKind::Constant => ItemKind::Constant,
        LibraryItemKind::Function => ItemKind::Function,
        LibraryItemKind::Type => ItemKind::Type,
    }
}

impl Provider for LibraryProvider {
    fn name(&self) -> &'static str {
        "library"
    }
}

#[async_trait]
impl AutocompleteProvider for LibraryProvider {
    async fn autocomplete(&self, ctx: &ProviderContext) -> ServiceResult<Vec<AutocompleteItem>> {
        let Some(active) = ctx.inspection.active_node() else {
            return Ok(Vec::new());
        };
        if active.is_in_key {
            return Ok(Vec::new());
        }
        let prefix = ctx.prefix();
        let mut items: Vec<AutocompleteItem> = self
            .library
            .definitions()
            .into_iter()
            .filter_map(|def| {
                let score = score_against(&def.name, &prefix)?;
                Some(
                    AutocompleteItem::new(def.name, completion_kind(def.kind))
                        .with_detail(def.ty.label())
                        .with_documentation(def.documentation)
                        .with_score(score),
                )
            })
            .collect();
        items.sort_by(|a, b| {
            compare_ranked((a.label.as_str(), a.score), (b.label.as_str(), b.score))
        });
        Ok(items)
    }
}

#[async_trait]
impl HoverProvider for LibraryProvider {
    async fn hover(&self, ctx: &ProviderContext) -> ServiceResult<Option<Hover>> {
        let Some(name) = self.identifier_under_cursor(ctx) else {
            return Ok(None);
        };
        // locally-bound names belong to the document provider
        if let Some(scope) = &ctx.inspection.scope {
            if scope.contains_key(&name) {
                return Ok(None);
            }
        }
        let Some(def) = self.library.lookup(&name) else {
            return Ok(None);
        };
        Ok(Some(Hover {
            contents: format!("`{}`: {}\n\n{}", def.name, def.ty.label(), def.documentation),
            range: ctx.token_span().map(|span| ctx.range_of(span)),
        }))
    }
}

#[async_trait]
impl SignatureHelpProvider for LibraryProvider {
    async fn signature_help(&self, ctx: &ProviderContext) -> ServiceResult<Option<SignatureHelp>> {
        let Some(inspection) = &ctx.inspection.invocation else {
            return Ok(None);
        };
        if inspection.name_in_local_scope {
            return Ok(None);
        }
        let Some(name) = &inspection.invoked_name else {
            return Ok(None);
        };
        let Some(def) = self.library.lookup(name) else {
            return Ok(None);
        };
        let Type::Function(signature) = &def.ty else {
            return Ok(None);
        };
        let parameters = signature
            .parameters
            .iter()
            .map(|p| ParameterInfo {
                label: format!("{}: {}", p.name, p.ty.label()),
                documentation: None,
            })
            .collect();
        let active_parameter = if signature.parameters.is_empty() {
            0
        } else {
            inspection
                .argument_ordinal
                .min(signature.parameters.len() - 1) as u32
        };
        Ok(Some(SignatureHelp {
            signatures: vec![SignatureInfo {
                label: format!("{name}{}", signature.label()),
                parameters,
                documentation: Some(def.documentation.clone()),
            }],
            active_signature: 0,
            active_parameter,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let library = Library::new();
        let abs = library.lookup("abs").expect("abs is built in");
        assert_eq!(abs.kind, LibraryItemKind::Function);
        assert!(matches!(abs.ty, Type::Function(_)));
    }

    #[test]
    fn test_registered_definitions_are_found() {
        let library = Library::new();
        library.register(LibraryDefinition::new(
            "workspaceRoot",
            LibraryItemKind::Constant,
            Type::Text,
            "Path of the current workspace.",
        ));
        assert!(library.lookup("workspaceRoot").is_some());
        assert!(library
            .definitions()
            .iter()
            .any(|def| def.name == "workspaceRoot"));
    }

    #[test]
    fn test_builtins_are_not_replaced() {
        let library = Library::new();
        library.register(LibraryDefinition::new(
            "abs",
            LibraryItemKind::Constant,
            Type::Text,
            "An impostor.",
        ));
        let abs = library.lookup("abs").expect("abs");
        assert_eq!(abs.kind, LibraryItemKind::Function);
    }

    #[test]
    fn test_externals_cover_every_definition() {
        let library = Library::new();
        let externals = library.externals();
        assert_eq!(externals.get("pi"), Some(&Type::Number));
        assert!(matches!(externals.get("min"), Some(Type::Function(_))));
    }
}

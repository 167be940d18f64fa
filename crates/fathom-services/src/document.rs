//! Document provider
//!
//! The highest-priority provider: answers from what the current document
//! itself binds. Completions come from the scope at the active node,
//! hover from the binding an identifier resolves to, and signature help
//! from the inspected invocation. It is also the only provider for the
//! whole-document capabilities: definition, folding ranges, and semantic
//! tokens all read the document's own tree.

use async_trait::async_trait;

use fathom_analysis::{compare_ranked, scope_for, score_against, ScopeItem};
use fathom_syntax::{NodeKind, Type};

use crate::error::ServiceResult;
use crate::providers::{
    AutocompleteProvider, DefinitionProvider, FoldingRangeProvider, HoverProvider, Provider,
    ProviderContext, SemanticTokensProvider, SignatureHelpProvider,
};
use crate::types::{
    AutocompleteItem, FoldingRange, Hover, ItemKind, Location, ParameterInfo, SemanticToken,
    SignatureHelp, SignatureInfo,
};

pub struct DocumentProvider;

fn item_kind(item: &ScopeItem) -> ItemKind {
    match item {
        ScopeItem::Each { .. } | ScopeItem::LetVariable { .. } | ScopeItem::Undefined { .. } => {
            ItemKind::Variable
        }
        ScopeItem::Parameter { .. } => ItemKind::Parameter,
        ScopeItem::RecordField { .. } => ItemKind::Field,
        ScopeItem::SectionMember { .. } => ItemKind::SectionMember,
    }
}

impl Provider for DocumentProvider {
    fn name(&self) -> &'static str {
        "document"
    }
}

#[async_trait]
impl AutocompleteProvider for DocumentProvider {
    async fn autocomplete(&self, ctx: &ProviderContext) -> ServiceResult<Vec<AutocompleteItem>> {
        let Some(active) = ctx.inspection.active_node() else {
            return Ok(Vec::new());
        };
        // a cursor in a binding key names something new; nothing in
        // scope is a useful completion there
        if active.is_in_key {
            return Ok(Vec::new());
        }
        let Some(scope) = &ctx.inspection.scope else {
            return Ok(Vec::new());
        };
        let prefix = ctx.prefix();
        let mut items: Vec<AutocompleteItem> = scope
            .iter()
            .filter(|(name, _)| !name.starts_with('@'))
            .filter_map(|(name, item)| {
                let score = score_against(name, &prefix)?;
                let mut out = AutocompleteItem::new(name.clone(), item_kind(item))
                    .with_detail(item.kind_label())
                    .with_score(score);
                if let Some(ty) = resolved_type(ctx, item) {
                    out = out.with_detail(format!("{}: {}", item.kind_label(), ty.label()));
                }
                Some(out)
            })
            .collect();
        items.sort_by(|a, b| compare_ranked((a.label.as_str(), a.score), (b.label.as_str(), b.score)));
        Ok(items)
    }
}

#[async_trait]
impl HoverProvider for DocumentProvider {
    async fn hover(&self, ctx: &ProviderContext) -> ServiceResult<Option<Hover>> {
        let Some(active) = ctx.inspection.active_node() else {
            return Ok(None);
        };
        let Some(identifier) = active.identifier_under_cursor else {
            return Ok(None);
        };
        let Some((key, item)) = ctx.identifier_scope_entry() else {
            return Ok(None);
        };
        let mut contents = format!("`{}`: {}", key.trim_start_matches('@'), item.kind_label());
        if let Some(ty) = resolved_type(ctx, &item) {
            contents.push_str(&format!(" of type `{}`", ty.label()));
        }
        Ok(Some(Hover {
            contents,
            range: Some(ctx.range_of(ctx.parse.tree.span(identifier))),
        }))
    }
}

#[async_trait]
impl SignatureHelpProvider for DocumentProvider {
    async fn signature_help(&self, ctx: &ProviderContext) -> ServiceResult<Option<SignatureHelp>> {
        let Some(inspection) = &ctx.inspection.invocation else {
            return Ok(None);
        };
        let Type::Function(signature) = &inspection.callee_type else {
            return Ok(None);
        };
        let name = inspection.invoked_name.as_deref().unwrap_or("");
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
                documentation: None,
            }],
            active_signature: 0,
            active_parameter,
        }))
    }
}

#[async_trait]
impl DefinitionProvider for DocumentProvider {
    /// Where the name under the cursor is introduced, if the document
    /// itself binds it
    async fn definition(&self, ctx: &ProviderContext) -> ServiceResult<Vec<Location>> {
        let Some((_, item)) = ctx.identifier_scope_entry() else {
            return Ok(Vec::new());
        };
        let Some(key) = item.key_node() else {
            return Ok(Vec::new());
        };
        Ok(vec![Location {
            uri: ctx.document.uri.clone(),
            range: ctx.range_of(ctx.parse.tree.span(key)),
        }])
    }
}

#[async_trait]
impl FoldingRangeProvider for DocumentProvider {
    /// Foldable regions: every multi-line binding construct
    async fn folding_ranges(&self, ctx: &ProviderContext) -> ServiceResult<Vec<FoldingRange>> {
        let tree = &ctx.parse.tree;
        let ranges = tree
            .node_ids()
            .filter(|id| {
                matches!(
                    tree.kind(*id),
                    NodeKind::LetExpression
                        | NodeKind::RecordExpression
                        | NodeKind::Section
                        | NodeKind::FunctionExpression
                        | NodeKind::IfExpression
                )
            })
            .filter_map(|id| {
                let range = ctx.range_of(tree.span(id));
                (range.end.line > range.start.line).then_some(FoldingRange {
                    start_line: range.start.line,
                    end_line: range.end.line,
                })
            })
            .collect();
        Ok(ranges)
    }
}

#[async_trait]
impl SemanticTokensProvider for DocumentProvider {
    /// Identifier tokens classified by the binding their name resolves
    /// to; unresolved names are not reported
    async fn semantic_tokens(&self, ctx: &ProviderContext) -> ServiceResult<Vec<SemanticToken>> {
        let tree = &ctx.parse.tree;
        let cache = &ctx.inspection.type_cache;

        let mut tokens = Vec::new();
        for node in tree.node_ids() {
            let key = match tree.kind(node) {
                NodeKind::Identifier(name) => name.clone(),
                NodeKind::InclusiveIdentifier(name) => format!("@{name}"),
                _ => continue,
            };
            let scope = scope_for(tree, node, cache, &ctx.cancel).await?;
            let Some(item) = scope.get(&key) else {
                continue;
            };
            if matches!(item, ScopeItem::Undefined { .. }) {
                continue;
            }
            tokens.push(SemanticToken {
                range: ctx.range_of(tree.span(node)),
                kind: item_kind(item),
            });
        }
        Ok(tokens)
    }
}

/// The item's type as far as this session resolved it: declared types
/// first, then whatever inference already memoized for the bound value
fn resolved_type(ctx: &ProviderContext, item: &ScopeItem) -> Option<Type> {
    if let ScopeItem::Parameter { declared_type, .. } = item {
        return declared_type.clone();
    }
    let value = item.value_node()?;
    ctx.inspection.type_cache.type_of(value)
}

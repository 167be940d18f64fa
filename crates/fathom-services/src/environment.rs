//! Environment provider
//!
//! Answers from the language itself rather than the document: keyword
//! completions, and hover text when the cursor rests on a keyword token.

use async_trait::async_trait;

use fathom_analysis::{compare_ranked, score_against};
use fathom_syntax::{Keyword, TokenKind};

use crate::error::ServiceResult;
use crate::providers::{AutocompleteProvider, HoverProvider, Provider, ProviderContext};
use crate::types::{AutocompleteItem, Hover, ItemKind};

pub struct EnvironmentProvider;

fn keyword_doc(keyword: Keyword) -> &'static str {
    match keyword {
        Keyword::Let => "Introduces a list of bindings followed by `in` and a body expression.",
        Keyword::In => "Separates the bindings of a let-expression from its body.",
        Keyword::Each => "Shorthand for a one-parameter function; the parameter is named `_`.",
        Keyword::If => "Starts a conditional expression: `if c then a else b`.",
        Keyword::Then => "Separates the condition of an if-expression from its first branch.",
        Keyword::Else => "Separates the branches of an if-expression.",
        Keyword::Section => "Declares a section document with named members.",
        Keyword::Shared => "Marks a section member as visible outside the section.",
        Keyword::Optional => "Marks a function parameter that may be omitted at the call site.",
        Keyword::Nullable => "Marks a parameter type that also accepts `null`.",
        Keyword::As => "Ascribes a type to a function parameter.",
        Keyword::True => "The logical value true.",
        Keyword::False => "The logical value false.",
        Keyword::Null => "The absent value.",
        Keyword::And => "Logical conjunction; short-circuits.",
        Keyword::Or => "Logical disjunction; short-circuits.",
        Keyword::Not => "Logical negation.",
    }
}

impl Provider for EnvironmentProvider {
    fn name(&self) -> &'static str {
        "environment"
    }
}

#[async_trait]
impl AutocompleteProvider for EnvironmentProvider {
    async fn autocomplete(&self, ctx: &ProviderContext) -> ServiceResult<Vec<AutocompleteItem>> {
        let prefix = ctx.prefix();
        let mut items: Vec<AutocompleteItem> = Keyword::all()
            .iter()
            .filter_map(|keyword| {
                let label = keyword.as_str();
                score_against(label, &prefix).map(|score| {
                    AutocompleteItem::new(label, ItemKind::Keyword)
                        .with_detail("keyword")
                        .with_score(score)
                })
            })
            .collect();
        items.sort_by(|a, b| compare_ranked((a.label.as_str(), a.score), (b.label.as_str(), b.score)));
        Ok(items)
    }
}

#[async_trait]
impl HoverProvider for EnvironmentProvider {
    async fn hover(&self, ctx: &ProviderContext) -> ServiceResult<Option<Hover>> {
        let Some(active) = ctx.inspection.active_node() else {
            return Ok(None);
        };
        let Some(token) = ctx.snapshot.token_at(active.offset) else {
            return Ok(None);
        };
        let TokenKind::Keyword(keyword) = token.kind else {
            return Ok(None);
        };
        Ok(Some(Hover {
            contents: format!("`{}`: {}", keyword.as_str(), keyword_doc(keyword)),
            range: Some(ctx.range_of(token.span)),
        }))
    }
}

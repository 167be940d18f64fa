//! Pluggable language providers
//!
//! Each capability is its own trait; a provider implements exactly the
//! capabilities it can answer, so the capability sets of the three
//! provider kinds overlap without being identical. The composer queries
//! every provider registered for a capability concurrently and merges by
//! registration order, so a provider never needs to know about the
//! others.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use fathom_analysis::{Document, InspectionOutcome, ScopeItem};
use fathom_syntax::{LexerSnapshot, NodeKind, ParseOutcome, Position, Range, Span, TokenKind};

use crate::error::ServiceResult;
use crate::types::{
    AutocompleteItem, FoldingRange, Hover, Location, SemanticToken, SignatureHelp,
};

/// Everything a provider may consult for one request
#[derive(Clone)]
pub struct ProviderContext {
    pub document: Document,
    pub position: Position,
    pub inspection: Arc<InspectionOutcome>,
    pub snapshot: Arc<LexerSnapshot>,
    pub parse: Arc<ParseOutcome>,
    pub cancel: CancellationToken,
}

impl ProviderContext {
    /// The partial word typed before the cursor, or empty at a bare
    /// trigger position
    pub fn prefix(&self) -> String {
        let Some(active) = self.inspection.active_node() else {
            return String::new();
        };
        let Some(token) = self.snapshot.token_at(active.offset) else {
            return String::new();
        };
        match token.kind {
            TokenKind::Identifier | TokenKind::InclusiveIdentifier | TokenKind::Keyword(_) => {
                // the cursor distance is in UTF-16 code units, so the cut
                // must count units, not chars
                let typed = (active.offset - token.span.start) as usize;
                let mut prefix = String::new();
                let mut units = 0usize;
                for ch in token.text.chars() {
                    if units >= typed {
                        break;
                    }
                    prefix.push(ch);
                    units += ch.len_utf16();
                }
                prefix
            }
            _ => String::new(),
        }
    }

    /// The span of the token under the cursor, if any
    pub fn token_span(&self) -> Option<Span> {
        let active = self.inspection.active_node()?;
        self.snapshot.token_at(active.offset).map(|token| token.span)
    }

    pub fn range_of(&self, span: Span) -> Range {
        let index = self.snapshot.line_index();
        Range::new(index.position_at(span.start), index.position_at(span.end))
    }

    /// The scope entry the identifier under the cursor resolves to
    pub fn identifier_scope_entry(&self) -> Option<(String, ScopeItem)> {
        let active = self.inspection.active_node()?;
        let identifier = active.identifier_under_cursor?;
        let scope = self.inspection.scope.as_ref()?;
        let key = match self.parse.tree.kind(identifier) {
            NodeKind::Identifier(name) => name.clone(),
            NodeKind::InclusiveIdentifier(name) => format!("@{name}"),
            _ => return None,
        };
        let item = scope.get(&key)?.clone();
        Some((key, item))
    }
}

/// Base identity every capability trait builds on
///
/// Implementations must be cheap to query: the composer runs them under
/// a shared timeout and drops the slow ones.
pub trait Provider: Send + Sync {
    fn name(&self) -> &'static str;
}

#[async_trait]
pub trait AutocompleteProvider: Provider {
    async fn autocomplete(&self, ctx: &ProviderContext) -> ServiceResult<Vec<AutocompleteItem>>;
}

#[async_trait]
pub trait HoverProvider: Provider {
    async fn hover(&self, ctx: &ProviderContext) -> ServiceResult<Option<Hover>>;
}

#[async_trait]
pub trait SignatureHelpProvider: Provider {
    async fn signature_help(&self, ctx: &ProviderContext) -> ServiceResult<Option<SignatureHelp>>;
}

#[async_trait]
pub trait DefinitionProvider: Provider {
    async fn definition(&self, ctx: &ProviderContext) -> ServiceResult<Vec<Location>>;
}

#[async_trait]
pub trait FoldingRangeProvider: Provider {
    async fn folding_ranges(&self, ctx: &ProviderContext) -> ServiceResult<Vec<FoldingRange>>;
}

#[async_trait]
pub trait SemanticTokensProvider: Provider {
    async fn semantic_tokens(&self, ctx: &ProviderContext) -> ServiceResult<Vec<SemanticToken>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use fathom_analysis::WorkspaceCache;
    use std::collections::HashMap;

    async fn context_at(text: &str, position: Position) -> ProviderContext {
        let cache = WorkspaceCache::new();
        let document = Document::new("file:///ctx.fm", text);
        let cancel = CancellationToken::new();
        let externals = HashMap::new();
        let inspection = cache
            .get_or_inspect(&document, position, &externals, &cancel)
            .await
            .expect("inspect");
        ProviderContext {
            snapshot: cache.get_or_snapshot(&document).expect("snapshot"),
            parse: cache.get_or_parse(&document).expect("parse"),
            document,
            position,
            inspection,
            cancel,
        }
    }

    #[tokio::test]
    async fn test_prefix_is_the_typed_part_of_the_word() {
        let ctx = context_at("let alpha = 1 in alph", Position::new(0, 20)).await;
        assert_eq!(ctx.prefix(), "alp");
    }

    #[tokio::test]
    async fn test_prefix_after_wide_characters_counts_utf16_units() {
        // '𐐀' occupies two UTF-16 code units, so every absolute offset
        // after the literal is shifted relative to the char count
        let ctx = context_at("let alpha = \"\u{10400}\u{10400}\" in alph", Position::new(0, 25)).await;
        assert_eq!(ctx.prefix(), "alp");
    }

    #[tokio::test]
    async fn test_prefix_is_empty_outside_identifiers() {
        let ctx = context_at("1 + 2", Position::new(0, 3)).await;
        assert_eq!(ctx.prefix(), "");
    }
}

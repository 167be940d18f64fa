//! The language-service facade
//!
//! One [`LanguageService`] owns the open-document table, the staged
//! workspace cache, and the provider stack. Front ends call its
//! `get_*` operations with a uri, a position, and an optional
//! cancellation token; "no answer" comes back as `Ok(None)` or an empty
//! collection, never as an error.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use fathom_analysis::{scope_for, AnalysisError, Document, WorkspaceCache};
use fathom_syntax::{NodeKind, Position, Type};

use crate::composer::Composer;
use crate::document::DocumentProvider;
use crate::environment::EnvironmentProvider;
use crate::error::{ServiceError, ServiceResult};
use crate::library::{Library, LibraryProvider};
use crate::providers::ProviderContext;
use crate::types::{
    AutocompleteItem, FoldingRange, Hover, Location, SemanticToken, SignatureHelp, TextEdit,
};

pub struct LanguageService {
    cache: WorkspaceCache,
    composer: Composer,
    library: Arc<Library>,
    documents: RwLock<HashMap<String, Document>>,
    externals: HashMap<String, Type>,
}

impl LanguageService {
    pub fn new() -> Self {
        Self::with_library(Arc::new(Library::new()))
    }

    /// Build a service over a specific library surface. Each provider is
    /// registered for the capabilities it implements, in priority order:
    /// document, environment, library.
    pub fn with_library(library: Arc<Library>) -> Self {
        let document = Arc::new(DocumentProvider);
        let environment = Arc::new(EnvironmentProvider);
        let host_library = Arc::new(LibraryProvider::new(library.clone()));
        let composer = Composer::new()
            .with_autocomplete(document.clone())
            .with_autocomplete(environment.clone())
            .with_autocomplete(host_library.clone())
            .with_hover(document.clone())
            .with_hover(environment)
            .with_hover(host_library.clone())
            .with_signature_help(document.clone())
            .with_signature_help(host_library)
            .with_definition(document.clone())
            .with_folding_ranges(document.clone())
            .with_semantic_tokens(document);
        let externals = library.externals();
        Self {
            cache: WorkspaceCache::new(),
            composer,
            library,
            documents: RwLock::new(HashMap::new()),
            externals,
        }
    }

    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.composer = self.composer.with_timeout(timeout);
        self
    }

    pub fn library(&self) -> &Arc<Library> {
        &self.library
    }

    pub fn open_document(&self, uri: impl Into<String>, text: impl Into<Arc<str>>) {
        let uri = uri.into();
        debug!(uri = %uri, "document opened");
        self.cache.invalidate(&uri);
        self.documents
            .write()
            .unwrap()
            .insert(uri.clone(), Document::new(uri, text));
    }

    /// Replace a document's text wholesale, dropping every cached stage
    pub fn update_document(
        &self,
        uri: &str,
        text: impl Into<Arc<str>>,
    ) -> ServiceResult<()> {
        let mut documents = self.documents.write().unwrap();
        let Some(document) = documents.get_mut(uri) else {
            return Err(ServiceError::DocumentNotOpen(uri.to_string()));
        };
        document.text = text.into();
        self.cache.invalidate(uri);
        Ok(())
    }

    pub fn close_document(&self, uri: &str) {
        debug!(uri, "document closed");
        self.documents.write().unwrap().remove(uri);
        self.cache.close(uri);
    }

    /// Drop every document and cached result
    pub fn dispose(&self) {
        self.documents.write().unwrap().clear();
        self.cache.clear();
    }

    async fn context(
        &self,
        uri: &str,
        position: Position,
        cancel: Option<CancellationToken>,
    ) -> ServiceResult<ProviderContext> {
        let document = self
            .documents
            .read()
            .unwrap()
            .get(uri)
            .cloned()
            .ok_or_else(|| ServiceError::DocumentNotOpen(uri.to_string()))?;
        let cancel = cancel.unwrap_or_default();
        let inspection = self
            .cache
            .get_or_inspect(&document, position, &self.externals, &cancel)
            .await?;
        let snapshot = self
            .cache
            .get_or_snapshot(&document)
            .map_err(AnalysisError::from)?;
        let parse = self
            .cache
            .get_or_parse(&document)
            .map_err(AnalysisError::from)?;
        Ok(ProviderContext {
            document,
            position,
            inspection,
            snapshot,
            parse,
            cancel,
        })
    }

    pub async fn get_autocomplete_items(
        &self,
        uri: &str,
        position: Position,
        cancel: Option<CancellationToken>,
    ) -> ServiceResult<Vec<AutocompleteItem>> {
        let ctx = self.context(uri, position, cancel).await?;
        self.composer.autocomplete(&ctx).await
    }

    pub async fn get_hover(
        &self,
        uri: &str,
        position: Position,
        cancel: Option<CancellationToken>,
    ) -> ServiceResult<Option<Hover>> {
        let ctx = self.context(uri, position, cancel).await?;
        self.composer.hover(&ctx).await
    }

    pub async fn get_signature_help(
        &self,
        uri: &str,
        position: Position,
        cancel: Option<CancellationToken>,
    ) -> ServiceResult<Option<SignatureHelp>> {
        let ctx = self.context(uri, position, cancel).await?;
        self.composer.signature_help(&ctx).await
    }

    /// Locations where the name under the cursor is introduced; empty
    /// when nothing in the document binds it
    pub async fn get_definition(
        &self,
        uri: &str,
        position: Position,
        cancel: Option<CancellationToken>,
    ) -> ServiceResult<Vec<Location>> {
        let ctx = self.context(uri, position, cancel).await?;
        self.composer.definition(&ctx).await
    }

    /// Foldable regions: every multi-line binding construct
    pub async fn get_folding_ranges(
        &self,
        uri: &str,
        cancel: Option<CancellationToken>,
    ) -> ServiceResult<Vec<FoldingRange>> {
        let ctx = self.context(uri, Position::new(0, 0), cancel).await?;
        self.composer.folding_ranges(&ctx).await
    }

    /// Edits renaming the binding under the cursor and every reference
    /// that resolves to it
    pub async fn get_rename_edits(
        &self,
        uri: &str,
        position: Position,
        new_name: &str,
        cancel: Option<CancellationToken>,
    ) -> ServiceResult<Vec<TextEdit>> {
        let ctx = self.context(uri, position, cancel).await?;
        let Some((_, target)) = ctx.identifier_scope_entry() else {
            return Ok(Vec::new());
        };
        let target_node = target.introducing_node();
        let tree = &ctx.parse.tree;
        let cache = &ctx.inspection.type_cache;

        let mut edits = Vec::new();
        for node in tree.node_ids() {
            let (key, replacement) = match tree.kind(node) {
                NodeKind::Identifier(name) => (name.clone(), new_name.to_string()),
                NodeKind::InclusiveIdentifier(name) => {
                    (format!("@{name}"), format!("@{new_name}"))
                }
                _ => continue,
            };
            let scope = scope_for(tree, node, cache, &ctx.cancel).await?;
            let resolves_here = scope
                .get(&key)
                .map(|item| item.introducing_node() == target_node)
                .unwrap_or(false);
            if resolves_here {
                edits.push(TextEdit {
                    range: ctx.range_of(tree.span(node)),
                    new_text: replacement,
                });
            }
        }
        Ok(edits)
    }

    /// Identifier tokens classified by the binding their name resolves
    /// to; unresolved names are not reported
    pub async fn get_semantic_tokens(
        &self,
        uri: &str,
        cancel: Option<CancellationToken>,
    ) -> ServiceResult<Vec<SemanticToken>> {
        let ctx = self.context(uri, Position::new(0, 0), cancel).await?;
        self.composer.semantic_tokens(&ctx).await
    }
}

impl Default for LanguageService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URI: &str = "file:///service.fm";

    #[tokio::test]
    async fn test_requests_against_unopened_document_fail() {
        let service = LanguageService::new();
        let result = service.get_hover(URI, Position::new(0, 1), None).await;
        assert!(matches!(result, Err(ServiceError::DocumentNotOpen(_))));
    }

    #[tokio::test]
    async fn test_update_replaces_text_and_answers_change() {
        let service = LanguageService::new();
        service.open_document(URI, "let alpha = 1 in alph");
        let items = service
            .get_autocomplete_items(URI, Position::new(0, 21), None)
            .await
            .expect("items");
        assert!(items.iter().any(|item| item.label == "alpha"));

        service
            .update_document(URI, "let omega = 1 in omeg")
            .expect("update");
        let items = service
            .get_autocomplete_items(URI, Position::new(0, 21), None)
            .await
            .expect("items");
        assert!(items.iter().any(|item| item.label == "omega"));
        assert!(!items.iter().any(|item| item.label == "alpha"));
    }

    #[tokio::test]
    async fn test_close_forgets_the_document() {
        let service = LanguageService::new();
        service.open_document(URI, "1");
        service.close_document(URI);
        let result = service.get_hover(URI, Position::new(0, 1), None).await;
        assert!(matches!(result, Err(ServiceError::DocumentNotOpen(_))));
    }

    #[tokio::test]
    async fn test_definition_points_at_the_binding_key() {
        let service = LanguageService::new();
        service.open_document(URI, "let alpha = 1 in alpha");
        let locations = service
            .get_definition(URI, Position::new(0, 22), None)
            .await
            .expect("definition");
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].uri, URI);
        assert_eq!(locations[0].range.start, Position::new(0, 4));
        assert_eq!(locations[0].range.end, Position::new(0, 9));
    }

    #[tokio::test]
    async fn test_definition_of_an_unbound_name_is_empty() {
        let service = LanguageService::new();
        service.open_document(URI, "mystery");
        let locations = service
            .get_definition(URI, Position::new(0, 7), None)
            .await
            .expect("definition");
        assert!(locations.is_empty());
    }

    #[tokio::test]
    async fn test_folding_ranges_cover_multiline_constructs() {
        let service = LanguageService::new();
        service.open_document(URI, "let\n  a = [\n    b = 1\n  ]\nin a");
        let ranges = service.get_folding_ranges(URI, None).await.expect("ranges");
        assert!(ranges.contains(&FoldingRange {
            start_line: 0,
            end_line: 4
        }));
        assert!(ranges.contains(&FoldingRange {
            start_line: 1,
            end_line: 3
        }));
    }

    #[tokio::test]
    async fn test_semantic_tokens_classify_resolved_identifiers() {
        use crate::types::ItemKind;

        let service = LanguageService::new();
        service.open_document(URI, "let a = 1 in a");
        let tokens = service
            .get_semantic_tokens(URI, None)
            .await
            .expect("tokens");
        // the binding key and the body reference both resolve
        assert_eq!(tokens.len(), 2);
        assert!(tokens.iter().all(|token| token.kind == ItemKind::Variable));
        assert_eq!(tokens[0].range.start, Position::new(0, 4));
        assert_eq!(tokens[1].range.start, Position::new(0, 13));
    }

    #[tokio::test]
    async fn test_semantic_tokens_skip_names_nothing_binds() {
        use crate::types::ItemKind;

        let service = LanguageService::new();
        service.open_document(URI, "(x as number) => x + y");
        let tokens = service
            .get_semantic_tokens(URI, None)
            .await
            .expect("tokens");
        // only the body `x` resolves: the declaration occurrence is not a
        // reference, and `y` is unbound
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, ItemKind::Parameter);
        assert_eq!(tokens[0].range.start, Position::new(0, 17));
    }

    #[tokio::test]
    async fn test_rename_touches_definition_and_references_only() {
        let service = LanguageService::new();
        service.open_document(URI, "let a = 1 in let a = a in a");
        // cursor on the inner trailing reference
        let edits = service
            .get_rename_edits(URI, Position::new(0, 27), "b", None)
            .await
            .expect("edits");
        // inner key, inner value (lets are recursive, so the plain `a`
        // in the value resolves to the inner binding), and the body
        // reference; the outer binding stays untouched
        assert_eq!(edits.len(), 3);
        assert!(edits.iter().all(|edit| edit.new_text == "b"));
        assert!(!edits
            .iter()
            .any(|edit| edit.range.start == Position::new(0, 4)));
    }
}

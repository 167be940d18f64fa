//! Provider composition
//!
//! The composer is the strategy object over the capability traits: each
//! capability has its own registry, and a provider is registered once per
//! capability it implements. For every request the providers registered
//! for that capability are queried concurrently under one shared timeout,
//! then merged in registration order. Registration order is the priority
//! order: for completions the first provider to claim a label wins, and
//! for hover, signature help, and definition the first non-empty answer
//! wins. A provider that errors or times out contributes nothing; the
//! failure is logged and the remaining providers still answer.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::warn;

use crate::error::{ServiceError, ServiceResult};
use crate::providers::{
    AutocompleteProvider, DefinitionProvider, FoldingRangeProvider, HoverProvider, Provider,
    ProviderContext, SemanticTokensProvider, SignatureHelpProvider,
};
use crate::types::{
    AutocompleteItem, FoldingRange, Hover, Location, SemanticToken, SignatureHelp,
};

pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_millis(500);

pub struct Composer {
    autocomplete: Vec<Arc<dyn AutocompleteProvider>>,
    hover: Vec<Arc<dyn HoverProvider>>,
    signature_help: Vec<Arc<dyn SignatureHelpProvider>>,
    definition: Vec<Arc<dyn DefinitionProvider>>,
    folding: Vec<Arc<dyn FoldingRangeProvider>>,
    semantic_tokens: Vec<Arc<dyn SemanticTokensProvider>>,
    timeout: Duration,
}

impl Composer {
    pub fn new() -> Self {
        Self {
            autocomplete: Vec::new(),
            hover: Vec::new(),
            signature_help: Vec::new(),
            definition: Vec::new(),
            folding: Vec::new(),
            semantic_tokens: Vec::new(),
            timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    // Registration order within a capability is its priority order,
    // highest first.

    pub fn with_autocomplete(mut self, provider: Arc<dyn AutocompleteProvider>) -> Self {
        self.autocomplete.push(provider);
        self
    }

    pub fn with_hover(mut self, provider: Arc<dyn HoverProvider>) -> Self {
        self.hover.push(provider);
        self
    }

    pub fn with_signature_help(mut self, provider: Arc<dyn SignatureHelpProvider>) -> Self {
        self.signature_help.push(provider);
        self
    }

    pub fn with_definition(mut self, provider: Arc<dyn DefinitionProvider>) -> Self {
        self.definition.push(provider);
        self
    }

    pub fn with_folding_ranges(mut self, provider: Arc<dyn FoldingRangeProvider>) -> Self {
        self.folding.push(provider);
        self
    }

    pub fn with_semantic_tokens(mut self, provider: Arc<dyn SemanticTokensProvider>) -> Self {
        self.semantic_tokens.push(provider);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fan one call out to every provider in a capability registry,
    /// collapsing timeouts and provider errors to `None`
    async fn fan_out<'a, P, T, F, Fut>(
        &'a self,
        providers: &'a [Arc<P>],
        ctx: &'a ProviderContext,
        call: F,
    ) -> Vec<Option<T>>
    where
        P: Provider + ?Sized,
        F: Fn(Arc<P>, &'a ProviderContext) -> Fut,
        Fut: std::future::Future<Output = ServiceResult<T>> + 'a,
    {
        let calls = providers.iter().map(|provider| {
            let name = provider.name();
            let fut = call(provider.clone(), ctx);
            let timeout = self.timeout;
            async move {
                match tokio::time::timeout(timeout, fut).await {
                    Ok(Ok(value)) => Some(value),
                    Ok(Err(err)) => {
                        warn!(provider = name, %err, "provider failed");
                        None
                    }
                    Err(_) => {
                        warn!(provider = name, timeout_ms = timeout.as_millis() as u64, "provider timed out");
                        None
                    }
                }
            }
        });
        join_all(calls).await
    }

    /// Merge completions from all providers; the first provider to
    /// produce a label keeps it
    pub async fn autocomplete(
        &self,
        ctx: &ProviderContext,
    ) -> ServiceResult<Vec<AutocompleteItem>> {
        let answers = self
            .fan_out(&self.autocomplete, ctx, |provider, ctx| async move {
                provider.autocomplete(ctx).await
            })
            .await;
        if ctx.cancel.is_cancelled() {
            return Err(ServiceError::Canceled);
        }
        let mut seen = HashSet::new();
        let mut merged = Vec::new();
        for items in answers.into_iter().flatten() {
            for item in items {
                if seen.insert(item.label.clone()) {
                    merged.push(item);
                }
            }
        }
        Ok(merged)
    }

    /// The highest-priority non-empty hover
    pub async fn hover(&self, ctx: &ProviderContext) -> ServiceResult<Option<Hover>> {
        let answers = self
            .fan_out(&self.hover, ctx, |provider, ctx| async move {
                provider.hover(ctx).await
            })
            .await;
        if ctx.cancel.is_cancelled() {
            return Err(ServiceError::Canceled);
        }
        Ok(answers.into_iter().flatten().flatten().next())
    }

    /// The highest-priority non-empty signature help
    pub async fn signature_help(
        &self,
        ctx: &ProviderContext,
    ) -> ServiceResult<Option<SignatureHelp>> {
        let answers = self
            .fan_out(&self.signature_help, ctx, |provider, ctx| async move {
                provider.signature_help(ctx).await
            })
            .await;
        if ctx.cancel.is_cancelled() {
            return Err(ServiceError::Canceled);
        }
        Ok(answers.into_iter().flatten().flatten().next())
    }

    /// The highest-priority non-empty definition answer
    pub async fn definition(&self, ctx: &ProviderContext) -> ServiceResult<Vec<Location>> {
        let answers = self
            .fan_out(&self.definition, ctx, |provider, ctx| async move {
                provider.definition(ctx).await
            })
            .await;
        if ctx.cancel.is_cancelled() {
            return Err(ServiceError::Canceled);
        }
        Ok(answers
            .into_iter()
            .flatten()
            .find(|locations| !locations.is_empty())
            .unwrap_or_default())
    }

    /// Folding ranges from every provider, merged and deduplicated
    pub async fn folding_ranges(&self, ctx: &ProviderContext) -> ServiceResult<Vec<FoldingRange>> {
        let answers = self
            .fan_out(&self.folding, ctx, |provider, ctx| async move {
                provider.folding_ranges(ctx).await
            })
            .await;
        if ctx.cancel.is_cancelled() {
            return Err(ServiceError::Canceled);
        }
        let mut ranges: Vec<FoldingRange> = answers.into_iter().flatten().flatten().collect();
        ranges.sort();
        ranges.dedup();
        Ok(ranges)
    }

    /// Semantic tokens from every provider, in document order
    pub async fn semantic_tokens(
        &self,
        ctx: &ProviderContext,
    ) -> ServiceResult<Vec<SemanticToken>> {
        let answers = self
            .fan_out(&self.semantic_tokens, ctx, |provider, ctx| async move {
                provider.semantic_tokens(ctx).await
            })
            .await;
        if ctx.cancel.is_cancelled() {
            return Err(ServiceError::Canceled);
        }
        let mut tokens: Vec<SemanticToken> = answers.into_iter().flatten().flatten().collect();
        tokens.sort_by_key(|token| (token.range.start.line, token.range.start.character));
        Ok(tokens)
    }
}

impl Default for Composer {
    fn default() -> Self {
        Self::new()
    }
}

//! Language-service surface for the Fathom expression language
//!
//! Three providers answer every request: the document provider (names
//! the current document binds), the environment provider (the language's
//! keywords), and the library provider (the standard library surface).
//! Each capability is its own trait, and a provider implements the
//! capabilities it can answer. The [`composer::Composer`] queries the
//! providers registered for a capability concurrently under a shared
//! timeout and merges answers in priority order. [`service::LanguageService`]
//! is the facade front ends hold: it owns the open-document table and the
//! staged analysis cache behind the providers.

pub mod composer;
pub mod document;
pub mod environment;
pub mod error;
pub mod library;
pub mod providers;
pub mod service;
pub mod types;

pub use composer::{Composer, DEFAULT_PROVIDER_TIMEOUT};
pub use document::DocumentProvider;
pub use environment::EnvironmentProvider;
pub use error::{ServiceError, ServiceResult};
pub use library::{Library, LibraryDefinition, LibraryItemKind, LibraryProvider};
pub use providers::{
    AutocompleteProvider, DefinitionProvider, FoldingRangeProvider, HoverProvider, Provider,
    ProviderContext, SemanticTokensProvider, SignatureHelpProvider,
};
pub use service::LanguageService;
pub use types::{
    AutocompleteItem, FoldingRange, Hover, ItemKind, Location, ParameterInfo, SemanticToken,
    SignatureHelp, SignatureInfo, TextEdit,
};

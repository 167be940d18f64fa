//! Semantic-analysis core for the Fathom expression language
//!
//! The crate sits between the syntax collaborator and the language-service
//! providers. Its pieces, in dependency order:
//!
//! - [`workspace`]: the staged per-document memoizing cache
//!   (lex → snapshot → parse → inspect)
//! - [`active_node`]: cursor position → containing-node ancestry
//! - [`scope`]: layered name resolution with per-node memoization
//! - [`invocation`]: argument checking and signature context at a call
//! - [`inspect`]: one session tying the above together per position
//! - [`ranker`]: Jaro–Winkler scoring for completion candidates

pub mod active_node;
pub mod error;
pub mod inspect;
pub mod invocation;
pub mod ranker;
pub mod scope;
pub mod type_cache;
pub mod workspace;

pub use active_node::{resolve, ActiveNode, ActiveNodeOutcome};
pub use error::{AnalysisError, AnalysisResult, StageFailure};
pub use inspect::{inspect, InspectionOutcome};
pub use invocation::{
    inspect_invocation, inspect_invocation_at, ArgumentChecks, InvalidArgument,
    InvocationInspection,
};
pub use ranker::{compare_ranked, score_against, similarity, SIMILARITY_THRESHOLD};
pub use scope::{scope_for, NodeScope, ScopeItem};
pub use type_cache::TypeCache;
pub use workspace::{CacheStage, Document, WorkspaceCache};

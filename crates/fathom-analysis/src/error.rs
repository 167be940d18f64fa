//! Analysis error types
//!
//! "Nothing to show" is never an error: operations that legitimately
//! produce no answer return `Ok(None)` or an empty collection. Errors are
//! execution failures, with cancellation kept distinguishable so front
//! ends can suppress it from user-facing diagnostics.

use std::sync::Arc;

use fathom_syntax::SyntaxError;

use crate::workspace::CacheStage;

/// Result type for analysis operations
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Execution failures inside the analysis core
#[derive(Debug, Clone, thiserror::Error)]
pub enum AnalysisError {
    /// Cooperative cancellation was requested
    #[error("analysis canceled")]
    Canceled,

    /// A workspace-cache stage failed; the tag names the furthest stage
    /// that was reached
    #[error(transparent)]
    Stage(#[from] StageFailure),

    /// An internal invariant did not hold; fatal for this inspection only
    #[error("internal analysis error: {0}")]
    Internal(String),
}

impl From<SyntaxError> for AnalysisError {
    fn from(err: SyntaxError) -> Self {
        match err {
            SyntaxError::Canceled => AnalysisError::Canceled,
            other => AnalysisError::Internal(other.to_string()),
        }
    }
}

impl AnalysisError {
    /// Whether this error only reports cooperative cancellation
    pub fn is_canceled(&self) -> bool {
        matches!(self, AnalysisError::Canceled)
    }
}

/// A failure wrapped with the cache stage that produced it
///
/// Later stage accessors return this unchanged rather than attempting to
/// proceed past a broken prerequisite.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{stage:?} stage failed: {source}")]
pub struct StageFailure {
    pub stage: CacheStage,
    #[source]
    pub source: Arc<SyntaxError>,
}

impl StageFailure {
    pub fn new(stage: CacheStage, source: SyntaxError) -> Self {
        Self {
            stage,
            source: Arc::new(source),
        }
    }
}

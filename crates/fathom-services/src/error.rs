//! Service error types

use fathom_analysis::AnalysisError;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failures surfaced by the language-service facade
#[derive(Debug, Clone, thiserror::Error)]
pub enum ServiceError {
    /// The request's cancellation token fired
    #[error("request canceled")]
    Canceled,

    /// The uri was never opened, or was closed
    #[error("document not open: {0}")]
    DocumentNotOpen(String),

    #[error(transparent)]
    Analysis(AnalysisError),
}

impl From<AnalysisError> for ServiceError {
    fn from(err: AnalysisError) -> Self {
        if err.is_canceled() {
            ServiceError::Canceled
        } else {
            ServiceError::Analysis(err)
        }
    }
}

impl ServiceError {
    pub fn is_canceled(&self) -> bool {
        matches!(self, ServiceError::Canceled)
    }
}

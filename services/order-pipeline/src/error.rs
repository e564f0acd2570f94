//! Pipeline error taxonomy

use crate::report::ReportError;
use thiserror::Error;
use types::errors::OrderError;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Caller-correctable; raised before any file I/O or process launch
    #[error("Invalid orders data: {0}")]
    InvalidInput(String),

    /// The engine could not be launched, exited non-zero or timed out
    #[error("Failed to execute trading engine: {reason}")]
    EngineExecutionFailed {
        reason: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Failed to read execution report: {0}")]
    ReportUnreadable(#[from] ReportError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Which stage-level failure ended a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InvalidInput,
    EngineExecutionFailed,
    MalformedRecord,
    Internal,
}

impl PipelineError {
    pub fn kind(&self) -> FailureKind {
        match self {
            PipelineError::InvalidInput(_) => FailureKind::InvalidInput,
            PipelineError::EngineExecutionFailed { .. } => FailureKind::EngineExecutionFailed,
            PipelineError::ReportUnreadable(_) => FailureKind::MalformedRecord,
            PipelineError::Internal(_) => FailureKind::Internal,
        }
    }

    pub(crate) fn engine_failed(
        reason: impl Into<String>,
        exit_code: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        PipelineError::EngineExecutionFailed {
            reason: reason.into(),
            exit_code,
            stderr: stderr.into(),
        }
    }
}

impl From<OrderError> for PipelineError {
    fn from(err: OrderError) -> Self {
        PipelineError::InvalidInput(err.to_string())
    }
}

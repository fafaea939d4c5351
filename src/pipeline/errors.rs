//! # Pipeline Errors

use thiserror::Error;

use super::transport::TransportError;
use crate::assembler::AssemblyError;
use crate::planner::PlannerError;

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Failures of a compile or run cycle
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Planner(#[from] PlannerError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error("Transport returned {actual} results for {expected} statements")]
    ResultCountMismatch { expected: usize, actual: usize },
}

impl PipelineError {
    /// Stable error code for logs
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::Planner(e) => e.code().code(),
            PipelineError::Transport(TransportError::Execution(_)) => "BQL_TRANSPORT_EXECUTION",
            PipelineError::Transport(TransportError::Decode(_)) => "BQL_TRANSPORT_DECODE",
            PipelineError::Assembly(e) => e.code(),
            PipelineError::ResultCountMismatch { .. } => "BQL_RESULT_COUNT_MISMATCH",
        }
    }
}

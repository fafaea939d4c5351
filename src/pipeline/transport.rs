//! Execution transport seam
//!
//! The transport owns connections, auth and retries. The pipeline only
//! hands it one batch text plus its parameters and expects one raw result
//! per statement, in statement order.

use serde_json::Value;
use thiserror::Error;

use crate::compiler::ParamBag;

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Transport failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Execution failed: {0}")]
    Execution(String),

    #[error("Response could not be decoded: {0}")]
    Decode(String),
}

/// Sends a batch to the database in one round trip
pub trait Transport {
    /// Raw results, one per statement of `text`
    fn execute(&self, text: &str, params: &ParamBag) -> TransportResult<Vec<Value>>;
}

impl<F> Transport for F
where
    F: Fn(&str, &ParamBag) -> TransportResult<Vec<Value>>,
{
    fn execute(&self, text: &str, params: &ParamBag) -> TransportResult<Vec<Value>> {
        self(text, params)
    }
}

//! Observable compiler events

use std::fmt;

use super::logger::Severity;

/// Events emitted along the compile pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Schema file loaded and validated
    SchemaLoaded,
    /// Logical plan built for one query
    QueryPlanned,
    /// Plan rewritten by the optimizer
    QueryOptimized,
    /// Query rejected by the builder
    QueryRejected,
    /// Batch rendered into one transaction
    BatchCompiled,
    /// Batch sent to the transport and answered
    BatchExecuted,
    /// Transport or assembly failure
    BatchFailed,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::SchemaLoaded => "BQL_SCHEMA_LOADED",
            Event::QueryPlanned => "BQL_QUERY_PLANNED",
            Event::QueryOptimized => "BQL_QUERY_OPTIMIZED",
            Event::QueryRejected => "BQL_QUERY_REJECTED",
            Event::BatchCompiled => "BQL_BATCH_COMPILED",
            Event::BatchExecuted => "BQL_BATCH_EXECUTED",
            Event::BatchFailed => "BQL_BATCH_FAILED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::QueryPlanned | Event::QueryOptimized => Severity::Trace,
            Event::SchemaLoaded | Event::BatchCompiled | Event::BatchExecuted => Severity::Info,
            Event::QueryRejected => Severity::Warn,
            Event::BatchFailed => Severity::Error,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

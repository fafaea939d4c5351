//! Batch pipeline subsystem
//!
//! Wires the four stages together: build, optimize, compile, assemble.
//!
//! # Design Principles
//!
//! - One round trip: a batch is one transaction sent in one transport call
//! - Positional: result `i` belongs to query `i`
//! - Fresh state: every compile owns its plans and parameter bag

mod batch;
mod config;
mod errors;
mod transport;

pub use batch::{CompiledBatch, QueryPipeline};
pub use config::CompilerConfig;
pub use errors::{PipelineError, PipelineResult};
pub use transport::{Transport, TransportError, TransportResult};

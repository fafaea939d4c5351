//! Result assembly subsystem
//!
//! Turns raw rows returned for a compiled statement into the nested
//! response value of the original query.
//!
//! # Design Principles
//!
//! - Caller-facing: shaped from the declarative query, not the plan
//! - Pure: no I/O, same rows and query give the same value
//! - Order-preserving: fields appear in selection (or declaration) order

mod assembler;
mod errors;

pub use assembler::ResultAssembler;
pub use errors::{AssemblyError, AssemblyResult};

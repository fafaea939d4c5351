//! bqlc - BQL query compiler
//!
//! Compiles declarative nested BQL queries to parameterized SurrealQL and
//! shapes the returned rows back into nested responses.
//!
//! Stages: `planner` (logical query builder), `optimizer`, `compiler`,
//! `assembler`. `pipeline` batches them into one transaction per round trip.

pub mod assembler;
pub mod compiler;
pub mod executor;
pub mod observability;
pub mod optimizer;
pub mod pipeline;
pub mod planner;
pub mod schema;

//! Reference executor subsystem
//!
//! Runs logical plans over in-memory JSON records. This is not a database:
//! it exists so plan rewrites can be checked for row-set equivalence.
//!
//! # Execution Flow (strict order)
//!
//! 1. Fetch candidate rows from the data source
//! 2. Filter rows
//! 3. Project, sort, then apply offset and limit
//! 4. Shape as an array (MANY) or a single row or null (ONE)

mod executor;
mod filters;
mod result;
mod sorter;
mod store;

pub use executor::MemoryExecutor;
pub use filters::PredicateFilter;
pub use result::ProjectedRow;
pub use sorter::ResultSorter;
pub use store::{pointer, MemoryStore, Row};

//! Batch processing
//!
//! Table parsing with row-level error isolation, and the runner that
//! applies the engine row by row in input order.

pub mod runner;
pub mod source;

pub use runner::{run_batch, run_batch_with_history, InterpretedRow, RowOutcome};
pub use source::{parse_file, parse_table, ParsedRow};

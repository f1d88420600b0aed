//! History persistence
//!
//! Append-only verdict storage keyed by sample id, the collaborator behind
//! delta-checks, the history viewer, and summary reports.

pub mod jsonl;
pub mod store;

pub use jsonl::JsonlHistory;
pub use store::{HistoryStore, MemoryHistory, StoredVerdict};

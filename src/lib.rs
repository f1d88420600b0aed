//! qftlab: interpretation core for the QuantiFERON-TB Gold Plus assay
//!
//! Classifies four-channel assay readings (Nil, TB1, TB2, Mitogen) into
//! POS/NEG/IND calls per the manufacturer's fixed algorithm, for single
//! samples and batches, with QA delta-checks, a regression self-test, and
//! audit persistence.
//!
//! # Architecture
//!
//! This crate is organized around a headless decision core and the
//! collaborators it reads from and writes to:
//!
//! ## Interpretation Core ([`engine`])
//! - [`engine::interpret`]: pure verdict derivation over immutable readings
//! - [`engine::delta`]: drift classification against a sample's prior result
//! - [`engine::selftest`]: regression verification against fixed vectors
//!
//! ## Configuration & Policy ([`config`])
//! - [`config::types`]: shared type definitions and closed enums
//! - [`config::policy`]: versioned threshold policy envelopes
//! - [`config::settings`]: settings loading and key filtering
//! - [`config::validator`]: startup validation matrix
//!
//! ## Batch Processing ([`batch`])
//! - [`batch::source`]: table parsing with row-level error isolation
//! - [`batch::runner`]: ordered row-by-row interpretation
//!
//! ## History ([`history`])
//! - [`history::store`]: append-only store contract and in-memory store
//! - [`history::jsonl`]: file-backed JSONL store with replay-on-open
//!
//! ## Observability ([`observability`])
//! - [`observability::audit`]: structured audit events
//! - [`observability::metrics`]: call-rate and QA counters
//!
//! ## Reporting ([`report`])
//! - [`report::text`]: lossless fixed-width rendering
//! - [`report::summary`]: date-range statistics
//!
//! # Design Principles
//!
//! 1. **Verdicts are pure functions** - `verdict = f(reading, policy)`,
//!    nothing ambient
//! 2. **Validation at construction** - a `Reading` that exists is a valid
//!    reading; later violations are fatal, never coerced into IND
//! 3. **Policies are versioned** - revised cutoffs get a new policy id so
//!    historical verdicts stay reproducible
//! 4. **Failures are data** - row errors and self-test mismatches travel
//!    alongside successes, never thrown across a batch or harness boundary
//! 5. **History is a capability** - the core queries "most recent verdict",
//!    it never owns storage

// Interpretation Core
pub mod engine;

// Configuration & Policy
pub mod config;

// Batch Processing
pub mod batch;

// History
pub mod history;

// Observability
pub mod observability;

// Reporting
pub mod report;

// Session worklist
pub mod worklist;

// CLI entrypoint wiring for the qft binary.
pub mod cli;

// Re-export commonly used types for convenience
pub use config::policy::{PolicyTable, ThresholdPolicy, DEFAULT_POLICY_ID};
pub use config::types::{Call, QftError, Reading, ReasonCode, Result, Verdict, WarningCode};
pub use engine::{compute_delta, interpret, run_self_test, DeltaClass, DeltaResult};
pub use history::{HistoryStore, JsonlHistory, MemoryHistory, StoredVerdict};

//! Interpretation core
//!
//! Derives verdicts as pure functions over immutable readings, checks drift
//! against prior results, and regression-verifies itself against fixed
//! vectors. Nothing in here performs I/O or holds state.

pub mod delta;
pub mod interpret;
pub mod selftest;

pub use delta::{compute_delta, DeltaClass, DeltaResult};
pub use interpret::interpret;
pub use selftest::{default_vectors, run_self_test, SelfTestReport, SelfTestVector};

// Interpretation metrics
//
// Purpose: ongoing visibility into call rates and QA flags.
// Counters only; rates are derived at snapshot time.

use crate::config::types::{Call, ReasonCode, Verdict};
use crate::engine::delta::DeltaClass;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter metric (monotonically increasing)
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.value.store(0, Ordering::Relaxed);
    }
}

/// Counters for interpretation activity. Safe to share across threads.
#[derive(Debug, Default)]
pub struct InterpretationMetrics {
    pub pos: Counter,
    pub neg: Counter,
    pub ind: Counter,
    pub ind_high_nil: Counter,
    pub ind_low_mitogen: Counter,
    pub warnings: Counter,
    pub row_errors: Counter,
    pub delta_minor: Counter,
    pub delta_significant: Counter,
}

impl InterpretationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one verdict
    pub fn record_verdict(&self, verdict: &Verdict) {
        match verdict.call {
            Call::Pos => self.pos.inc(),
            Call::Neg => self.neg.inc(),
            Call::Ind => {
                self.ind.inc();
                match verdict.reason_code {
                    ReasonCode::NilTooHigh => self.ind_high_nil.inc(),
                    ReasonCode::LowMitogenResponse => self.ind_low_mitogen.inc(),
                    _ => {}
                }
            }
        }
        if !verdict.warnings.is_empty() {
            self.warnings.inc();
        }
    }

    /// Record one delta-check outcome
    pub fn record_delta(&self, classification: DeltaClass) {
        match classification {
            DeltaClass::Minor => self.delta_minor.inc(),
            DeltaClass::Significant => self.delta_significant.inc(),
            DeltaClass::None => {}
        }
    }

    /// Record one rejected batch row
    pub fn record_row_error(&self) {
        self.row_errors.inc();
    }

    /// Point-in-time copy with derived rates
    pub fn snapshot(&self) -> MetricsSnapshot {
        let pos = self.pos.get();
        let neg = self.neg.get();
        let ind = self.ind.get();
        let total = pos + neg + ind;
        let rate = |count: u64| {
            if total > 0 {
                count as f64 / total as f64 * 100.0
            } else {
                0.0
            }
        };
        MetricsSnapshot {
            total,
            pos,
            neg,
            ind,
            ind_high_nil: self.ind_high_nil.get(),
            ind_low_mitogen: self.ind_low_mitogen.get(),
            warnings: self.warnings.get(),
            row_errors: self.row_errors.get(),
            delta_minor: self.delta_minor.get(),
            delta_significant: self.delta_significant.get(),
            pos_rate: rate(pos),
            ind_rate: rate(ind),
        }
    }
}

/// Snapshot of interpretation counters with derived percentages
#[derive(Clone, Debug, PartialEq)]
pub struct MetricsSnapshot {
    pub total: u64,
    pub pos: u64,
    pub neg: u64,
    pub ind: u64,
    pub ind_high_nil: u64,
    pub ind_low_mitogen: u64,
    pub warnings: u64,
    pub row_errors: u64,
    pub delta_minor: u64,
    pub delta_significant: u64,
    pub pos_rate: f64,
    pub ind_rate: f64,
}

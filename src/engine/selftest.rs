/// Self-test harness: regression-verifies the engine against fixed vectors.
///
/// The engine's output is safety-relevant, so its branch coverage is checked
/// against a built-in input/expected-output table. The harness itself never
/// fails; it classifies the engine's output and reports every mismatch.
use crate::config::policy::ThresholdPolicy;
use crate::config::types::{Call, Reading, ReasonCode, Verdict};
use crate::engine::interpret::interpret;

/// One fixed input/expected-output pair
#[derive(Clone, Debug, PartialEq)]
pub struct SelfTestVector {
    pub label: &'static str,
    pub nil: f64,
    pub tb1: f64,
    pub tb2: f64,
    pub mitogen: f64,
    pub expected_call: Call,
    pub expected_reason: ReasonCode,
}

/// A vector the engine disagreed with
#[derive(Clone, Debug, PartialEq)]
pub struct SelfTestFailure {
    pub vector: SelfTestVector,
    /// Engine output, or None when the vector's reading failed construction
    pub actual: Option<Verdict>,
}

/// Harness output: pass count plus every mismatch, in vector order
#[derive(Clone, Debug, Default)]
pub struct SelfTestReport {
    pub passed: usize,
    pub failures: Vec<SelfTestFailure>,
}

impl SelfTestReport {
    pub fn total(&self) -> usize {
        self.passed + self.failures.len()
    }

    pub fn all_passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// The built-in vector table. Covers every decision-tree branch: all three
/// POS sub-codes, the high-nil and low-mitogen indeterminates, a clean
/// negative, the zero-nil edge, the borderline absolute-cutoff and
/// 25%-rule cases, and readings that draw each plausibility warning.
pub fn default_vectors() -> Vec<SelfTestVector> {
    use Call::*;
    use ReasonCode::*;
    vec![
        vector("Clear Positive (TB1)", 0.10, 1.50, 0.20, 5.0, Pos, Tb1Positive),
        vector("Clear Positive (TB2)", 0.20, 0.40, 2.00, 6.0, Pos, Tb2Positive),
        vector("Dual Positive (TB1+TB2)", 0.10, 1.20, 1.40, 6.0, Pos, BothPositive),
        vector("Clear Negative", 0.10, 0.20, 0.30, 2.0, Neg, Negative),
        vector("Indeterminate (High Nil)", 9.50, 10.0, 11.0, 15.0, Ind, NilTooHigh),
        vector("Indeterminate (Low Mitogen)", 0.20, 0.30, 0.40, 0.60, Ind, LowMitogenResponse),
        vector("Zero Nil (absolute cutoff only)", 0.0, 1.0, 0.0, 1.0, Pos, Tb1Positive),
        vector("Borderline Positive (TB1 at 0.35)", 0.10, 0.45, 0.20, 3.0, Pos, Tb1Positive),
        vector("Borderline Negative (TB1 below 0.35)", 0.10, 0.40, 0.20, 3.0, Neg, Negative),
        vector("Borderline Positive (TB1 meets 25% rule)", 1.00, 1.35, 0.50, 4.0, Pos, Tb1Positive),
        vector("Borderline Negative (TB1 fails 25% rule)", 1.60, 1.95, 0.50, 4.0, Neg, Negative),
        vector("Negative with High-Nil Warning", 2.50, 2.60, 2.55, 8.0, Neg, Negative),
        vector("Negative with Very-High-Mitogen Warning", 0.10, 0.20, 0.15, 16.0, Neg, Negative),
    ]
}

fn vector(
    label: &'static str,
    nil: f64,
    tb1: f64,
    tb2: f64,
    mitogen: f64,
    expected_call: Call,
    expected_reason: ReasonCode,
) -> SelfTestVector {
    SelfTestVector {
        label,
        nil,
        tb1,
        tb2,
        mitogen,
        expected_call,
        expected_reason,
    }
}

/// Run every vector against the engine under the given policy.
///
/// Pure and side-effect-free beyond the returned report. A vector fails when
/// the call or the reason code differs from expectation; the mismatching
/// verdict is carried in the report, never swallowed.
pub fn run_self_test(vectors: &[SelfTestVector], policy: &ThresholdPolicy) -> SelfTestReport {
    let mut report = SelfTestReport::default();
    for v in vectors {
        let reading = match Reading::new("SELF-TEST", v.nil, v.tb1, v.tb2, v.mitogen) {
            Ok(reading) => reading,
            Err(_) => {
                report.failures.push(SelfTestFailure {
                    vector: v.clone(),
                    actual: None,
                });
                continue;
            }
        };
        let verdict = interpret(&reading, policy);
        if verdict.call == v.expected_call && verdict.reason_code == v.expected_reason {
            report.passed += 1;
        } else {
            report.failures.push(SelfTestFailure {
                vector: v.clone(),
                actual: Some(verdict),
            });
        }
    }
    report
}

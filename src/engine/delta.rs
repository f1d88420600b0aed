/// Delta-check: drift classification against a sample's prior verdict.
///
/// Advisory QA. The classification depends only on the two verdicts' calls
/// and the magnitude of numeric drift, never on when the comparison runs.
/// The result is transient; callers persist the current verdict, not this.
use crate::config::policy::ThresholdPolicy;
use crate::config::types::Verdict;
use serde::{Deserialize, Serialize};

/// A drift *ratio* against a prior antigen delta smaller than this is
/// meaningless (noise would read as 100x drift); below it the check falls
/// back to absolute change.
const PRIOR_DELTA_FLOOR: f64 = 0.01;

/// Drift classification for a repeat sample
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum DeltaClass {
    /// No prior verdict, or numerics identical
    None,
    /// Sub-threshold numeric drift with an unchanged call
    Minor,
    /// Call flip, or antigen drift beyond the policy ratio bounds
    Significant,
}

/// Outcome of a delta-check
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DeltaResult {
    /// Prior verdict the comparison ran against, if any
    pub prior: Option<Verdict>,
    /// Verdict being checked
    pub current: Verdict,
    pub classification: DeltaClass,
    /// One line per contributing observation, empty when nothing drifted
    pub details: Vec<String>,
}

/// Compare the current verdict with the most recent prior verdict for the
/// same sample. An absent prior is a normal state, not an error.
pub fn compute_delta(
    current: &Verdict,
    prior: Option<&Verdict>,
    policy: &ThresholdPolicy,
) -> DeltaResult {
    let prior = match prior {
        Some(p) => p,
        None => {
            return DeltaResult {
                prior: None,
                current: current.clone(),
                classification: DeltaClass::None,
                details: Vec::new(),
            }
        }
    };

    let mut details = Vec::new();

    // A category flip is always clinically meaningful, whatever the numbers.
    if prior.call != current.call {
        details.push(format!(
            "result changed from {} to {}",
            prior.call, current.call
        ));
        return DeltaResult {
            prior: Some(prior.clone()),
            current: current.clone(),
            classification: DeltaClass::Significant,
            details,
        };
    }

    let mut significant = false;
    for (label, prior_delta, current_delta) in [
        ("TB1-Nil", prior.tb1_minus_nil, current.tb1_minus_nil),
        ("TB2-Nil", prior.tb2_minus_nil, current.tb2_minus_nil),
    ] {
        if antigen_drift_significant(prior_delta, current_delta, policy) {
            significant = true;
            details.push(format!(
                "{} drifted from {:.3} to {:.3} IU/mL with unchanged result",
                label, prior_delta, current_delta
            ));
        }
    }
    if significant {
        return DeltaResult {
            prior: Some(prior.clone()),
            current: current.clone(),
            classification: DeltaClass::Significant,
            details,
        };
    }

    let drifted = prior.tb1_minus_nil != current.tb1_minus_nil
        || prior.tb2_minus_nil != current.tb2_minus_nil;
    DeltaResult {
        prior: Some(prior.clone()),
        current: current.clone(),
        classification: if drifted {
            DeltaClass::Minor
        } else {
            DeltaClass::None
        },
        details,
    }
}

/// Ratio rule when the prior delta is large enough to ratio against;
/// absolute-change fallback otherwise.
fn antigen_drift_significant(prior: f64, current: f64, policy: &ThresholdPolicy) -> bool {
    if prior.abs() >= PRIOR_DELTA_FLOOR {
        let ratio = current / prior;
        ratio > policy.drift_ratio_upper || ratio < policy.drift_ratio_lower
    } else {
        (current - prior).abs() >= policy.absolute_antigen_cutoff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{Call, ReasonCode};

    fn verdict(call: Call, tb1: f64, tb2: f64) -> Verdict {
        Verdict {
            call,
            reason_code: match call {
                Call::Pos => ReasonCode::Tb1Positive,
                Call::Neg => ReasonCode::Negative,
                Call::Ind => ReasonCode::LowMitogenResponse,
            },
            human_reason: String::new(),
            tb1_minus_nil: tb1,
            tb2_minus_nil: tb2,
            mitogen_minus_nil: 2.0,
            warnings: Vec::new(),
            policy_id: "qft-plus-v1".to_string(),
        }
    }

    fn policy() -> ThresholdPolicy {
        ThresholdPolicy::default_v1()
    }

    #[test]
    fn test_no_prior_is_none_with_no_details() {
        let result = compute_delta(&verdict(Call::Neg, 0.1, 0.1), None, &policy());
        assert_eq!(result.classification, DeltaClass::None);
        assert!(result.details.is_empty());
        assert!(result.prior.is_none());
    }

    #[test]
    fn test_call_flip_is_significant_regardless_of_magnitude() {
        let prior = verdict(Call::Neg, 0.34, 0.1);
        let current = verdict(Call::Pos, 0.36, 0.1);
        let result = compute_delta(&current, Some(&prior), &policy());
        assert_eq!(result.classification, DeltaClass::Significant);
        assert_eq!(result.details, vec!["result changed from NEG to POS"]);
    }

    #[test]
    fn test_identical_numerics_are_none() {
        let prior = verdict(Call::Pos, 1.2, 0.4);
        let result = compute_delta(&prior.clone(), Some(&prior), &policy());
        assert_eq!(result.classification, DeltaClass::None);
    }

    #[test]
    fn test_sub_threshold_drift_is_minor() {
        let prior = verdict(Call::Pos, 1.00, 0.40);
        let current = verdict(Call::Pos, 1.30, 0.40);
        let result = compute_delta(&current, Some(&prior), &policy());
        assert_eq!(result.classification, DeltaClass::Minor);
        assert!(result.details.is_empty());
    }

    #[test]
    fn test_drift_beyond_upper_ratio_is_significant() {
        let prior = verdict(Call::Pos, 0.50, 0.10);
        let current = verdict(Call::Pos, 1.50, 0.10);
        let result = compute_delta(&current, Some(&prior), &policy());
        assert_eq!(result.classification, DeltaClass::Significant);
        assert!(result.details[0].contains("TB1-Nil"));
    }

    #[test]
    fn test_drift_below_lower_ratio_is_significant() {
        let prior = verdict(Call::Pos, 1.00, 1.20);
        let current = verdict(Call::Pos, 1.00, 0.40);
        let result = compute_delta(&current, Some(&prior), &policy());
        assert_eq!(result.classification, DeltaClass::Significant);
        assert!(result.details[0].contains("TB2-Nil"));
    }

    #[test]
    fn test_near_zero_prior_uses_absolute_fallback() {
        // Prior delta 0.005 is below the ratio floor. A move to 0.02 is
        // noise (Minor); a move to 0.40 crosses the antigen cutoff.
        let prior = verdict(Call::Neg, 0.005, 0.0);
        let small = verdict(Call::Neg, 0.02, 0.0);
        let result = compute_delta(&small, Some(&prior), &policy());
        assert_eq!(result.classification, DeltaClass::Minor);

        let large = verdict(Call::Neg, 0.40, 0.0);
        // Same call (the relative rule can hold a high-nil sample negative).
        let result = compute_delta(&large, Some(&prior), &policy());
        assert_eq!(result.classification, DeltaClass::Significant);
    }

    #[test]
    fn test_classification_ignores_wall_clock() {
        let prior = verdict(Call::Pos, 1.00, 0.40);
        let current = verdict(Call::Pos, 1.30, 0.40);
        let first = compute_delta(&current, Some(&prior), &policy());
        let second = compute_delta(&current, Some(&prior), &policy());
        assert_eq!(first, second);
    }
}

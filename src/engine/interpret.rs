/// Interpretation engine: verdict = f(reading, policy).
///
/// A pure, deterministic function over an immutable reading and a versioned
/// threshold policy. No I/O, no ambient state; repeated calls with the same
/// inputs produce identical verdicts.
use crate::config::policy::ThresholdPolicy;
use crate::config::types::{Call, Reading, ReasonCode, Verdict, WarningCode};

/// Classify one reading under the given policy.
///
/// The decision tree is evaluated in fixed order and the first match wins;
/// that ordering is a contract, because the branches are not mutually
/// exclusive on the raw numbers. Readings are validated at construction, so
/// a reading that fails its own invariants here is a programming-contract
/// breach and panics rather than being coerced into IND.
pub fn interpret(reading: &Reading, policy: &ThresholdPolicy) -> Verdict {
    assert!(
        reading.is_valid(),
        "interpret() requires a constructor-validated Reading (sample '{}')",
        reading.sample_id
    );

    let tb1_minus_nil = reading.tb1 - reading.nil;
    let tb2_minus_nil = reading.tb2 - reading.nil;
    let mitogen_minus_nil = reading.mitogen - reading.nil;
    let warnings = plausibility_warnings(reading, policy);

    // Branch 1: uninterpretable background.
    if reading.nil > policy.nil_upper_bound {
        return Verdict {
            call: Call::Ind,
            reason_code: ReasonCode::NilTooHigh,
            human_reason: format!(
                "High Nil Control ({:.3} > {:.1} IU/mL)",
                reading.nil, policy.nil_upper_bound
            ),
            tb1_minus_nil,
            tb2_minus_nil,
            mitogen_minus_nil,
            warnings,
            policy_id: policy.id.clone(),
        };
    }

    // Branches 2-3: antigen responses.
    let tb1_positive = antigen_positive(tb1_minus_nil, reading.nil, policy);
    let tb2_positive = antigen_positive(tb2_minus_nil, reading.nil, policy);

    if tb1_positive || tb2_positive {
        let (reason_code, human_reason) = match (tb1_positive, tb2_positive) {
            (true, true) => (
                ReasonCode::BothPositive,
                format!(
                    "TB1 and TB2 Antigens positive (TB1-Nil={:.3}, TB2-Nil={:.3} IU/mL)",
                    tb1_minus_nil, tb2_minus_nil
                ),
            ),
            (true, false) => (
                ReasonCode::Tb1Positive,
                format!("TB1 Antigen positive (TB1-Nil={:.3} IU/mL)", tb1_minus_nil),
            ),
            (false, true) => (
                ReasonCode::Tb2Positive,
                format!("TB2 Antigen positive (TB2-Nil={:.3} IU/mL)", tb2_minus_nil),
            ),
            (false, false) => unreachable!(),
        };
        return Verdict {
            call: Call::Pos,
            reason_code,
            human_reason,
            tb1_minus_nil,
            tb2_minus_nil,
            mitogen_minus_nil,
            warnings,
            policy_id: policy.id.clone(),
        };
    }

    // Branch 4: mitogen control must prove the immune system responded.
    if mitogen_minus_nil < policy.absolute_mitogen_cutoff {
        return Verdict {
            call: Call::Ind,
            reason_code: ReasonCode::LowMitogenResponse,
            human_reason: format!(
                "Low Mitogen Control (Mit-Nil={:.3} < {:.1} IU/mL difference)",
                mitogen_minus_nil, policy.absolute_mitogen_cutoff
            ),
            tb1_minus_nil,
            tb2_minus_nil,
            mitogen_minus_nil,
            warnings,
            policy_id: policy.id.clone(),
        };
    }

    // Branch 5: valid negative.
    Verdict {
        call: Call::Neg,
        reason_code: ReasonCode::Negative,
        human_reason: "TB Antigens negative, Mitogen control valid".to_string(),
        tb1_minus_nil,
        tb2_minus_nil,
        mitogen_minus_nil,
        warnings,
        policy_id: policy.id.clone(),
    }
}

/// An antigen response counts as positive when it clears the absolute
/// cutoff and the relative (fraction-of-nil) rule. With nil at zero the
/// relative rule is trivially satisfied, so only the absolute cutoff gates
/// positivity; spelled out here rather than relying on `0.25 * 0.0 == 0.0`.
fn antigen_positive(delta: f64, nil: f64, policy: &ThresholdPolicy) -> bool {
    if delta < policy.absolute_antigen_cutoff {
        return false;
    }
    if nil == 0.0 {
        return true;
    }
    delta >= policy.relative_antigen_fraction * nil
}

/// Advisory checks, appended on every branch in definition order.
fn plausibility_warnings(reading: &Reading, policy: &ThresholdPolicy) -> Vec<WarningCode> {
    let mut warnings = Vec::new();
    if reading.nil > policy.nil_warn_threshold && reading.nil <= policy.nil_upper_bound {
        warnings.push(WarningCode::HighNilWithinRange);
    }
    if reading.mitogen > policy.mitogen_warn_threshold {
        warnings.push(WarningCode::VeryHighMitogen);
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(nil: f64, tb1: f64, tb2: f64, mitogen: f64) -> Reading {
        Reading::new("S-TEST", nil, tb1, tb2, mitogen).unwrap()
    }

    fn policy() -> ThresholdPolicy {
        ThresholdPolicy::default_v1()
    }

    #[test]
    fn test_high_nil_short_circuits_antigen_evaluation() {
        // Antigens and mitogen would all pass, but branch 1 decides first.
        let verdict = interpret(&reading(9.0, 10.0, 10.0, 10.0), &policy());
        assert_eq!(verdict.call, Call::Ind);
        assert_eq!(verdict.reason_code, ReasonCode::NilTooHigh);
        assert!(verdict.human_reason.contains("High Nil Control"));
    }

    #[test]
    fn test_tb1_positive() {
        let verdict = interpret(&reading(0.10, 1.50, 0.20, 5.0), &policy());
        assert_eq!(verdict.call, Call::Pos);
        assert_eq!(verdict.reason_code, ReasonCode::Tb1Positive);
        assert!((verdict.tb1_minus_nil - 1.40).abs() < 1e-12);
    }

    #[test]
    fn test_tb2_positive() {
        let verdict = interpret(&reading(0.20, 0.40, 2.00, 6.0), &policy());
        assert_eq!(verdict.call, Call::Pos);
        assert_eq!(verdict.reason_code, ReasonCode::Tb2Positive);
    }

    #[test]
    fn test_both_antigens_positive_records_dedicated_code() {
        let verdict = interpret(&reading(0.10, 1.20, 1.40, 6.0), &policy());
        assert_eq!(verdict.call, Call::Pos);
        assert_eq!(verdict.reason_code, ReasonCode::BothPositive);
        assert!(verdict.human_reason.contains("TB1"));
        assert!(verdict.human_reason.contains("TB2"));
    }

    #[test]
    fn test_zero_nil_gates_on_absolute_cutoff_only() {
        let verdict = interpret(&reading(0.0, 1.0, 0.0, 1.0), &policy());
        assert_eq!(verdict.call, Call::Pos);
        assert_eq!(verdict.reason_code, ReasonCode::Tb1Positive);
    }

    #[test]
    fn test_low_mitogen_yields_indeterminate() {
        let verdict = interpret(&reading(0.2, 0.3, 0.25, 0.3), &policy());
        assert_eq!(verdict.call, Call::Ind);
        assert_eq!(verdict.reason_code, ReasonCode::LowMitogenResponse);
        assert!((verdict.mitogen_minus_nil - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_valid_negative() {
        let verdict = interpret(&reading(0.2, 0.3, 0.25, 0.9), &policy());
        assert_eq!(verdict.call, Call::Neg);
        assert_eq!(verdict.reason_code, ReasonCode::Negative);
    }

    #[test]
    fn test_relative_rule_blocks_positivity_at_high_nil() {
        // Delta 0.35 clears the absolute cutoff but 25% of nil is 0.40.
        let verdict = interpret(&reading(1.60, 1.95, 0.50, 4.0), &policy());
        assert_eq!(verdict.call, Call::Neg);
    }

    #[test]
    fn test_relative_rule_met_exactly() {
        // Delta 0.35 sits exactly on the absolute cutoff and clears 25% of nil (0.25).
        let verdict = interpret(&reading(1.00, 1.35, 0.50, 4.0), &policy());
        assert_eq!(verdict.call, Call::Pos);
        assert_eq!(verdict.reason_code, ReasonCode::Tb1Positive);
    }

    #[test]
    fn test_high_nil_within_range_warning_does_not_change_call() {
        let verdict = interpret(&reading(2.50, 2.60, 2.55, 8.0), &policy());
        assert_eq!(verdict.call, Call::Neg);
        assert_eq!(verdict.warnings, vec![WarningCode::HighNilWithinRange]);
    }

    #[test]
    fn test_very_high_mitogen_warning() {
        let verdict = interpret(&reading(0.10, 0.20, 0.15, 16.0), &policy());
        assert_eq!(verdict.call, Call::Neg);
        assert_eq!(verdict.warnings, vec![WarningCode::VeryHighMitogen]);
    }

    #[test]
    fn test_warnings_cooccur_in_definition_order() {
        let verdict = interpret(&reading(2.50, 2.60, 2.55, 16.0), &policy());
        assert_eq!(
            verdict.warnings,
            vec![WarningCode::HighNilWithinRange, WarningCode::VeryHighMitogen]
        );
    }

    #[test]
    fn test_warnings_attach_even_on_indeterminate_branch() {
        let verdict = interpret(&reading(2.0, 2.1, 2.05, 2.2), &policy());
        assert_eq!(verdict.reason_code, ReasonCode::LowMitogenResponse);
        assert_eq!(verdict.warnings, vec![WarningCode::HighNilWithinRange]);
    }

    #[test]
    fn test_interpret_is_deterministic() {
        let r = reading(0.13, 0.47, 0.29, 3.7);
        let p = policy();
        let first = interpret(&r, &p);
        let second = interpret(&r, &p);
        assert_eq!(first, second);
    }

    #[test]
    fn test_verdict_records_policy_id() {
        let verdict = interpret(&reading(0.1, 0.2, 0.3, 2.0), &policy());
        assert_eq!(verdict.policy_id, policy().id);
    }

    #[test]
    #[should_panic(expected = "constructor-validated")]
    fn test_invariant_breach_is_fatal_not_indeterminate() {
        let mut r = reading(0.1, 0.2, 0.3, 2.0);
        r.nil = -1.0;
        interpret(&r, &policy());
    }
}

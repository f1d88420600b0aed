/// Fixed-width text rendering of verdicts, batch outcomes, and self-test
/// reports. Every verdict and delta field is representable here without
/// loss; richer renderers (PDF, spreadsheets) sit outside the core and
/// consume the same data.
use crate::batch::runner::RowOutcome;
use crate::config::policy::ThresholdPolicy;
use crate::config::types::{Reading, Verdict, WarningCode};
use crate::engine::delta::{DeltaClass, DeltaResult};
use crate::engine::selftest::SelfTestReport;

const RULE: &str = "======================================================================";
const THIN_RULE: &str = "----------------------------------------------------------------------";

/// Render one interpreted sample as the detail block shown to operators.
pub fn render_single(
    reading: &Reading,
    verdict: &Verdict,
    delta: Option<&DeltaResult>,
    policy: &ThresholdPolicy,
) -> String {
    let mut out = String::new();
    out.push_str(RULE);
    out.push('\n');
    out.push_str(&format!(
        " Sample ID: {} | Run ID: {} | Operator ID: {}\n",
        reading.sample_id,
        reading.run_id.as_deref().unwrap_or("N/A"),
        reading.operator_id.as_deref().unwrap_or("N/A"),
    ));
    out.push_str(THIN_RULE);
    out.push_str("\n\n");

    let nil_fraction = policy.relative_antigen_fraction * reading.nil;
    out.push_str(&format!(
        "{:<15} | {:<15} | {:<30}\n",
        "Parameter", "Input (IU/mL)", "Calculated Value"
    ));
    out.push_str(THIN_RULE);
    out.push('\n');
    out.push_str(&format!(
        "{:<15} | {:<15.3} | {:<14} {:<15.4}\n",
        "Nil", reading.nil, "25% of Nil:", nil_fraction
    ));
    out.push_str(&format!(
        "{:<15} | {:<15.3} | {:<14} {:<15.4}\n",
        "TB1", reading.tb1, "TB1 - Nil:", verdict.tb1_minus_nil
    ));
    out.push_str(&format!(
        "{:<15} | {:<15.3} | {:<14} {:<15.4}\n",
        "TB2", reading.tb2, "TB2 - Nil:", verdict.tb2_minus_nil
    ));
    out.push_str(&format!(
        "{:<15} | {:<15.3} | {:<14} {:<15.4}\n",
        "Mitogen", reading.mitogen, "Mit - Nil:", verdict.mitogen_minus_nil
    ));
    out.push_str(THIN_RULE);
    out.push('\n');
    out.push_str(&format!("{:<15} | {}\n", "QFT RESULT", verdict.call));
    out.push_str(&format!("{:<15} | {}\n", "Reason", verdict.human_reason));
    for warning in &verdict.warnings {
        out.push_str(&format!(
            "{:<15} | {}\n",
            "Warning",
            warning_text(*warning, reading)
        ));
    }
    if let Some(delta) = delta {
        out.push_str(&format!("{:<15} | {}\n", "Delta Check", delta_text(delta)));
    }
    out.push_str(RULE);
    out.push('\n');
    out.push_str(&format!("Policy: {}\n", verdict.policy_id));
    out.push_str("Note: Clinical correlation required.\n");
    out
}

/// One-line rendering of a plausibility warning with its numerics.
pub fn warning_text(code: WarningCode, reading: &Reading) -> String {
    match code {
        WarningCode::HighNilWithinRange => {
            format!("Nil ({:.3}) high but acceptable.", reading.nil)
        }
        WarningCode::VeryHighMitogen => {
            format!("Mitogen ({:.3}) very high.", reading.mitogen)
        }
    }
}

/// One-line rendering of a delta-check outcome.
pub fn delta_text(delta: &DeltaResult) -> String {
    match delta.classification {
        DeltaClass::None => "no prior result or no change".to_string(),
        DeltaClass::Minor => "minor numeric drift from prior result".to_string(),
        DeltaClass::Significant => {
            format!("SIGNIFICANT CHANGE: {}", delta.details.join("; "))
        }
    }
}

/// Render batch outcomes as an aligned table, one row per input row, in
/// input order. Errors occupy their row with the failure text.
pub fn render_batch(outcomes: &[RowOutcome]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<6} {:<16} {:>8} {:>8} {:>8} {:>8}  {:<7} {}\n",
        "Line", "Sample ID", "Nil", "TB1", "TB2", "Mit", "Result", "Reason"
    ));
    out.push_str(THIN_RULE);
    out.push('\n');
    for row in outcomes {
        match &row.outcome {
            Ok(interpreted) => {
                let r = &interpreted.reading;
                let v = &interpreted.verdict;
                let mut reason = v.human_reason.clone();
                if let Some(delta) = &interpreted.delta {
                    if delta.classification == DeltaClass::Significant {
                        reason.push_str(" [DELTA]");
                    }
                }
                out.push_str(&format!(
                    "{:<6} {:<16} {:>8.3} {:>8.3} {:>8.3} {:>8.3}  {:<7} {}\n",
                    row.line, r.sample_id, r.nil, r.tb1, r.tb2, r.mitogen, v.call, reason
                ));
            }
            Err(e) => {
                out.push_str(&format!(
                    "{:<6} {:<16} {:>8} {:>8} {:>8} {:>8}  {:<7} {}\n",
                    row.line,
                    row.sample_id.as_deref().unwrap_or("-"),
                    "-",
                    "-",
                    "-",
                    "-",
                    "ERROR",
                    e
                ));
            }
        }
    }
    let succeeded = outcomes.iter().filter(|o| o.outcome.is_ok()).count();
    out.push_str(THIN_RULE);
    out.push('\n');
    out.push_str(&format!(
        "Processed: {} / {} rows. Skipped: {} rows.\n",
        succeeded,
        outcomes.len(),
        outcomes.len() - succeeded
    ));
    out
}

/// Render a self-test report in the operator-facing layout.
pub fn render_self_test(report: &SelfTestReport) -> String {
    let mut out = String::from("--- QFT Interpreter Self-Test Results ---\n\n");
    for failure in &report.failures {
        let actual = match &failure.actual {
            Some(verdict) => format!("{} ({:?})", verdict.call, verdict.reason_code),
            None => "unconstructible reading".to_string(),
        };
        out.push_str(&format!(
            "FAILED: {:<42} expected {} ({:?}), got {}\n",
            failure.vector.label, failure.vector.expected_call, failure.vector.expected_reason, actual
        ));
    }
    out.push_str(&format!(
        "\n--- Summary ---\nPassed: {}\nFailed: {}\nTotal: {}\n",
        report.passed,
        report.failures.len(),
        report.total()
    ));
    out
}

// Startup validation for threshold policies and settings.
// Strict mode must validate at startup and fail fast with actionable errors.

use crate::config::policy::{PolicyTable, ThresholdPolicy};
use crate::config::settings::Settings;
use crate::config::types::{QftError, Result};

/// Validation result with detailed errors
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

/// Validate a threshold policy's internal consistency.
pub fn validate_policy(policy: &ThresholdPolicy) -> ValidationResult {
    let mut result = ValidationResult::new();

    if policy.id.trim().is_empty() {
        result.add_error("policy id must be non-empty".to_string());
    }

    for (name, value) in [
        ("absolute_antigen_cutoff", policy.absolute_antigen_cutoff),
        ("relative_antigen_fraction", policy.relative_antigen_fraction),
        ("absolute_mitogen_cutoff", policy.absolute_mitogen_cutoff),
        ("nil_upper_bound", policy.nil_upper_bound),
        ("nil_warn_threshold", policy.nil_warn_threshold),
        ("mitogen_warn_threshold", policy.mitogen_warn_threshold),
        ("drift_ratio_upper", policy.drift_ratio_upper),
        ("drift_ratio_lower", policy.drift_ratio_lower),
    ] {
        if !value.is_finite() {
            result.add_error(format!("{} must be finite, got {}", name, value));
        }
    }

    if policy.absolute_antigen_cutoff <= 0.0 {
        result.add_error(format!(
            "absolute_antigen_cutoff must be positive, got {}",
            policy.absolute_antigen_cutoff
        ));
    }
    if !(0.0..1.0).contains(&policy.relative_antigen_fraction) {
        result.add_error(format!(
            "relative_antigen_fraction must be in [0, 1), got {}",
            policy.relative_antigen_fraction
        ));
    }
    if policy.absolute_mitogen_cutoff <= 0.0 {
        result.add_error(format!(
            "absolute_mitogen_cutoff must be positive, got {}",
            policy.absolute_mitogen_cutoff
        ));
    }
    if policy.nil_upper_bound <= 0.0 {
        result.add_error(format!(
            "nil_upper_bound must be positive, got {}",
            policy.nil_upper_bound
        ));
    }

    // Soft bounds must sit inside the hard bounds they warn ahead of.
    if policy.nil_warn_threshold >= policy.nil_upper_bound {
        result.add_error(format!(
            "nil_warn_threshold ({}) must be below nil_upper_bound ({})",
            policy.nil_warn_threshold, policy.nil_upper_bound
        ));
    }
    if policy.mitogen_warn_threshold <= policy.absolute_mitogen_cutoff {
        result.add_warning(format!(
            "mitogen_warn_threshold ({}) at or below absolute_mitogen_cutoff ({}), every valid negative will warn",
            policy.mitogen_warn_threshold, policy.absolute_mitogen_cutoff
        ));
    }

    if policy.drift_ratio_upper <= 1.0 {
        result.add_error(format!(
            "drift_ratio_upper must exceed 1.0, got {}",
            policy.drift_ratio_upper
        ));
    }
    if !(policy.drift_ratio_lower > 0.0 && policy.drift_ratio_lower < 1.0) {
        result.add_error(format!(
            "drift_ratio_lower must be in (0, 1), got {}",
            policy.drift_ratio_lower
        ));
    }

    result
}

/// Validate settings against the policy table they will run with.
pub fn validate_settings(settings: &Settings, table: &PolicyTable) -> ValidationResult {
    let mut result = ValidationResult::new();

    if !table.contains(&settings.policy_id) {
        result.add_error(format!(
            "configured policy_id '{}' is not registered (known: {})",
            settings.policy_id,
            table.ids().join(", ")
        ));
    }

    if settings.summary_days == 0 {
        result.add_error("summary_days cannot be zero".to_string());
    }
    if settings.summary_days > 366 {
        result.add_warning(format!(
            "summary_days {} spans more than a year, summaries may be slow",
            settings.summary_days
        ));
    }

    if settings.history_path == settings.audit_path {
        result.add_error(format!(
            "history_path and audit_path must differ, both are {}",
            settings.history_path.display()
        ));
    }

    result
}

/// Validate everything at startup.
///
/// In strict mode any error is fatal; otherwise errors are returned for the
/// caller to report and run degraded.
pub fn validate_startup(settings: &Settings, table: &PolicyTable) -> Result<ValidationResult> {
    let mut result = ValidationResult::new();
    for id in table.ids() {
        // Registered ids always resolve; resolve() only fails for unknown ids.
        if let Ok(policy) = table.resolve(id) {
            result.merge(validate_policy(policy));
        }
    }
    result.merge(validate_settings(settings, table));

    if settings.strict && !result.is_valid() {
        return Err(QftError::Config(format!(
            "validation failed in strict mode:\n{}",
            result.errors.join("\n")
        )));
    }

    Ok(result)
}

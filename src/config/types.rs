/// Core types and structures for the qftlab system
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One sample's four channel readings plus identity, in IU/mL.
///
/// Constructed only through [`Reading::new`], which rejects negative or
/// non-finite concentrations and an empty sample id. Treated as immutable
/// after construction; the engine assumes every `Reading` it sees passed
/// that gate.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Reading {
    /// Sample identifier (non-empty)
    pub sample_id: String,
    /// Operator identifier, if recorded
    pub operator_id: Option<String>,
    /// Instrument run identifier, if recorded
    pub run_id: Option<String>,
    /// Nil (background) control
    pub nil: f64,
    /// TB Antigen tube 1
    pub tb1: f64,
    /// TB Antigen tube 2
    pub tb2: f64,
    /// Mitogen (positive) control
    pub mitogen: f64,
    /// When the reading was taken or entered
    pub timestamp: DateTime<Utc>,
}

impl Reading {
    /// Validate and construct a reading.
    ///
    /// All four concentrations must be finite and non-negative; the sample
    /// id must be non-empty after trimming.
    pub fn new(
        sample_id: impl Into<String>,
        nil: f64,
        tb1: f64,
        tb2: f64,
        mitogen: f64,
    ) -> Result<Self> {
        let sample_id = sample_id.into();
        if sample_id.trim().is_empty() {
            return Err(QftError::InvalidReading(
                "sample id must be non-empty".to_string(),
            ));
        }
        for (channel, value) in [("nil", nil), ("tb1", tb1), ("tb2", tb2), ("mitogen", mitogen)] {
            if !value.is_finite() {
                return Err(QftError::InvalidReading(format!(
                    "{channel} must be a finite number, got {value}"
                )));
            }
            if value < 0.0 {
                return Err(QftError::InvalidReading(format!(
                    "{channel} must be non-negative, got {value}"
                )));
            }
        }
        Ok(Self {
            sample_id,
            operator_id: None,
            run_id: None,
            nil,
            tb1,
            tb2,
            mitogen,
            timestamp: Utc::now(),
        })
    }

    /// Attach an operator id
    pub fn with_operator(mut self, operator_id: impl Into<String>) -> Self {
        self.operator_id = Some(operator_id.into());
        self
    }

    /// Attach a run id
    pub fn with_run(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    /// Override the entry timestamp
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// True when every constructor invariant still holds.
    pub fn is_valid(&self) -> bool {
        !self.sample_id.trim().is_empty()
            && [self.nil, self.tb1, self.tb2, self.mitogen]
                .iter()
                .all(|v| v.is_finite() && *v >= 0.0)
    }
}

/// Clinical call for one sample
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Call {
    /// TB antigen response detected
    Pos,
    /// No antigen response, mitogen control valid
    Neg,
    /// Result cannot be interpreted (control failure)
    Ind,
}

impl Call {
    /// Display form used in logs, reports and history listings
    pub fn as_str(&self) -> &'static str {
        match self {
            Call::Pos => "POS",
            Call::Neg => "NEG",
            Call::Ind => "IND",
        }
    }
}

impl std::fmt::Display for Call {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed enumeration of decision-tree branches.
///
/// Exactly one code is recorded per verdict and uniquely identifies the
/// branch that produced the call.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ReasonCode {
    /// Nil control above the policy upper bound
    NilTooHigh,
    /// TB1 antigen response positive (TB2 not)
    Tb1Positive,
    /// TB2 antigen response positive (TB1 not)
    Tb2Positive,
    /// Both antigen responses positive
    BothPositive,
    /// Mitogen response too low to confirm a true negative
    LowMitogenResponse,
    /// Antigens negative with a valid mitogen control
    Negative,
}

/// Advisory plausibility flags. Never change the call.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum WarningCode {
    /// Nil above the soft threshold but still within interpretable range
    HighNilWithinRange,
    /// Mitogen above the soft plausibility bound
    VeryHighMitogen,
}

/// Output of the interpretation engine. A pure value object: two verdicts
/// are equal iff every field matches, and nothing time- or host-dependent
/// is recorded here.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Verdict {
    /// Clinical call
    pub call: Call,
    /// Decision-tree branch that produced the call
    pub reason_code: ReasonCode,
    /// Deterministic text rendering of the reason code plus numerics
    pub human_reason: String,
    /// TB1 - Nil
    pub tb1_minus_nil: f64,
    /// TB2 - Nil
    pub tb2_minus_nil: f64,
    /// Mitogen - Nil
    pub mitogen_minus_nil: f64,
    /// Plausibility warnings in check-definition order
    pub warnings: Vec<WarningCode>,
    /// Identifier of the threshold policy the verdict was derived under
    pub policy_id: String,
}

/// Custom error types for qftlab
#[derive(Error, Debug)]
pub enum QftError {
    #[error("invalid reading: {0}")]
    InvalidReading(String),

    #[error("unknown threshold policy '{0}'")]
    PolicyMismatch(String),

    #[error("batch format error: {0}")]
    BatchFormat(String),

    #[error("history store error: {0}")]
    Store(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for qftlab operations
pub type Result<T> = std::result::Result<T, QftError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_accepts_valid_values() {
        let reading = Reading::new("S-001", 0.1, 0.5, 0.3, 4.0).unwrap();
        assert_eq!(reading.sample_id, "S-001");
        assert!(reading.is_valid());
        assert!(reading.operator_id.is_none());
    }

    #[test]
    fn test_reading_rejects_empty_sample_id() {
        let err = Reading::new("   ", 0.1, 0.5, 0.3, 4.0).unwrap_err();
        assert!(matches!(err, QftError::InvalidReading(_)));
    }

    #[test]
    fn test_reading_rejects_negative_concentration() {
        let err = Reading::new("S-001", 0.1, -0.5, 0.3, 4.0).unwrap_err();
        assert!(matches!(err, QftError::InvalidReading(_)));
        assert!(err.to_string().contains("tb1"));
    }

    #[test]
    fn test_reading_rejects_non_finite() {
        assert!(Reading::new("S-001", f64::NAN, 0.5, 0.3, 4.0).is_err());
        assert!(Reading::new("S-001", 0.1, 0.5, f64::INFINITY, 4.0).is_err());
    }

    #[test]
    fn test_reading_builder_attaches_identity() {
        let reading = Reading::new("S-001", 0.1, 0.5, 0.3, 4.0)
            .unwrap()
            .with_operator("OP7")
            .with_run("RUN-42");
        assert_eq!(reading.operator_id.as_deref(), Some("OP7"));
        assert_eq!(reading.run_id.as_deref(), Some("RUN-42"));
    }

    #[test]
    fn test_call_display_matches_report_labels() {
        assert_eq!(Call::Pos.to_string(), "POS");
        assert_eq!(Call::Neg.to_string(), "NEG");
        assert_eq!(Call::Ind.to_string(), "IND");
    }
}

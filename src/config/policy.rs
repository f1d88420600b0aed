/// Threshold Policy Envelopes
///
/// The manufacturer's cutoff constants are explicit, immutable, versioned
/// presets. A verdict records the id of the policy it was derived under, so
/// historical results stay reproducible when cutoffs are revised: a revision
/// is a new policy id, never an edit to an existing one.
use crate::config::types::{QftError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default policy shipped with the crate.
///
/// The numeric values mirror the published interpretation algorithm but are
/// placeholders until confirmed against the current package insert for any
/// real diagnostic use.
pub const DEFAULT_POLICY_ID: &str = "qft-plus-v1";

/// Versioned threshold constants consumed by the interpretation engine.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ThresholdPolicy {
    /// Policy id (e.g. "qft-plus-v1")
    pub id: String,
    /// Minimum antigen-minus-nil response counted as positive (IU/mL)
    pub absolute_antigen_cutoff: f64,
    /// Antigen response must also reach this fraction of nil
    pub relative_antigen_fraction: f64,
    /// Minimum mitogen-minus-nil response for a valid negative (IU/mL)
    pub absolute_mitogen_cutoff: f64,
    /// Nil above this is uninterpretable (IU/mL)
    pub nil_upper_bound: f64,
    /// Soft bound: nil above this (but within range) draws a warning
    pub nil_warn_threshold: f64,
    /// Soft bound: mitogen above this draws a warning
    pub mitogen_warn_threshold: f64,
    /// Delta-check: antigen drift beyond this multiple of the prior delta
    /// is significant
    pub drift_ratio_upper: f64,
    /// Delta-check: antigen drift below this multiple of the prior delta
    /// is significant
    pub drift_ratio_lower: f64,
}

impl ThresholdPolicy {
    /// The built-in default policy.
    pub fn default_v1() -> Self {
        Self {
            id: DEFAULT_POLICY_ID.to_string(),
            absolute_antigen_cutoff: 0.35,
            relative_antigen_fraction: 0.25,
            absolute_mitogen_cutoff: 0.5,
            nil_upper_bound: 8.0,
            nil_warn_threshold: 1.0,
            mitogen_warn_threshold: 15.0,
            drift_ratio_upper: 2.0,
            drift_ratio_lower: 0.5,
        }
    }
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self::default_v1()
    }
}

/// Registry of known policies keyed by id.
///
/// Resolving a persisted verdict's policy id through the table is how stale
/// history is caught: an id the running table does not know is surfaced as
/// [`QftError::PolicyMismatch`], never silently reinterpreted under a
/// different policy.
#[derive(Clone, Debug, Default)]
pub struct PolicyTable {
    policies: HashMap<String, ThresholdPolicy>,
}

impl PolicyTable {
    /// Create a table pre-loaded with the built-in default policy.
    pub fn with_defaults() -> Self {
        let mut table = Self {
            policies: HashMap::new(),
        };
        table.register(ThresholdPolicy::default_v1());
        table
    }

    /// Register a policy. Replaces any existing policy with the same id.
    pub fn register(&mut self, policy: ThresholdPolicy) {
        self.policies.insert(policy.id.clone(), policy);
    }

    /// Resolve a policy by id.
    pub fn resolve(&self, id: &str) -> Result<&ThresholdPolicy> {
        self.policies
            .get(id)
            .ok_or_else(|| QftError::PolicyMismatch(id.to_string()))
    }

    /// True when the table knows the given id.
    pub fn contains(&self, id: &str) -> bool {
        self.policies.contains_key(id)
    }

    /// Ids of every registered policy, sorted for stable output.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.policies.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

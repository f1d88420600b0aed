use crate::config::policy::DEFAULT_POLICY_ID;
/// Application settings loading from qft_config.json
use crate::config::types::{QftError, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Settings file shape. Every field has a default so a missing or partial
/// file never blocks startup; unknown keys are ignored with a warning.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// JSONL history store path
    pub history_path: PathBuf,
    /// JSONL audit trail path
    pub audit_path: PathBuf,
    /// Threshold policy id used for new interpretations
    pub policy_id: String,
    /// Date window (days) for the summary command
    pub summary_days: u32,
    /// Strict mode: settings/policy validation errors are fatal at startup
    pub strict: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            history_path: PathBuf::from("qft_history.jsonl"),
            audit_path: PathBuf::from("qft_audit.jsonl"),
            policy_id: DEFAULT_POLICY_ID.to_string(),
            summary_days: 7,
            strict: false,
        }
    }
}

impl Settings {
    const KNOWN_KEYS: [&'static str; 5] = [
        "history_path",
        "audit_path",
        "policy_id",
        "summary_days",
        "strict",
    ];

    /// Load settings from a JSON file.
    ///
    /// A missing file yields defaults. A present file is filtered to the
    /// known keys; anything else is reported and dropped so a config written
    /// by a newer release still loads.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!(
                "settings file {} not found, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| QftError::Config(format!("failed to read settings file: {}", e)))?;
        let raw: Value = serde_json::from_str(&content)
            .map_err(|e| QftError::Config(format!("failed to parse settings JSON: {}", e)))?;
        let map = raw
            .as_object()
            .ok_or_else(|| QftError::Config("settings file must be a JSON object".to_string()))?;

        for key in map.keys() {
            if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                warn!("ignoring unknown settings key '{}'", key);
            }
        }

        let filtered: serde_json::Map<String, Value> = map
            .iter()
            .filter(|(k, _)| Self::KNOWN_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        // Overlay the filtered keys onto defaults so partial files work.
        let mut merged = serde_json::to_value(Self::default())
            .map_err(|e| QftError::Config(format!("failed to encode default settings: {}", e)))?;
        if let Value::Object(ref mut base) = merged {
            for (k, v) in filtered {
                base.insert(k, v);
            }
        }

        let settings: Settings = serde_json::from_value(merged)
            .map_err(|e| QftError::Config(format!("invalid settings value: {}", e)))?;
        info!("settings loaded from {}", path.display());
        Ok(settings)
    }

    /// Persist settings to a JSON file (pretty-printed, stable key order
    /// via serde field order).
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| QftError::Config(format!("failed to encode settings: {}", e)))?;
        std::fs::write(path.as_ref(), content)
            .map_err(|e| QftError::Config(format!("failed to write settings file: {}", e)))?;
        Ok(())
    }
}

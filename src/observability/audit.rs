/// Structured audit trail for interpretation activity.
///
/// Every clinically relevant action (interpretation, batch import,
/// self-test, significant delta flag) is recorded as one JSON object per
/// line in an append-only audit file and echoed through the `log` facade.
/// The audit trail is what makes a verdict reconstructible after the fact:
/// it carries the inputs, the call, the reason, and the policy id.
use crate::config::types::{Reading, Verdict};
use crate::engine::delta::DeltaClass;
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use uuid::Uuid;

/// Audit event severity levels
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AuditSeverity {
    High,
    Medium,
    Low,
}

/// Types of events the trail tracks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AuditEventType {
    /// One sample interpreted
    Interpretation,
    /// Batch import started or finished
    BatchImport,
    /// Self-test harness executed
    SelfTest,
    /// Delta-check flagged a significant change
    DeltaFlag,
    /// A reading was rejected at validation
    ReadingRejected,
    /// History store operation failed
    StoreError,
    /// Configuration problem detected at startup
    ConfigProblem,
}

impl AuditEventType {
    /// Default severity for this event type
    pub fn default_severity(&self) -> AuditSeverity {
        match self {
            AuditEventType::Interpretation => AuditSeverity::Low,
            AuditEventType::BatchImport => AuditSeverity::Low,
            AuditEventType::SelfTest => AuditSeverity::Medium,
            AuditEventType::DeltaFlag => AuditSeverity::High,
            AuditEventType::ReadingRejected => AuditSeverity::Medium,
            AuditEventType::StoreError => AuditSeverity::High,
            AuditEventType::ConfigProblem => AuditSeverity::Medium,
        }
    }
}

/// Correlation identifiers for event tracking
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorrelationIds {
    /// Groups every row of one batch import (uuid)
    pub batch_id: Option<String>,
    pub operator_id: Option<String>,
    pub run_id: Option<String>,
    pub sample_id: Option<String>,
}

impl CorrelationIds {
    /// Fresh correlation set for a batch import
    pub fn for_batch() -> Self {
        Self {
            batch_id: Some(Uuid::new_v4().to_string()),
            ..Self::default()
        }
    }

    /// Correlation set for a single reading
    pub fn for_reading(reading: &Reading) -> Self {
        Self {
            batch_id: None,
            operator_id: reading.operator_id.clone(),
            run_id: reading.run_id.clone(),
            sample_id: Some(reading.sample_id.clone()),
        }
    }
}

/// Individual audit event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_type: AuditEventType,
    pub severity: AuditSeverity,
    pub timestamp: DateTime<Utc>,
    pub details: String,
    pub correlation: CorrelationIds,
    /// Present on interpretation events
    pub verdict: Option<Verdict>,
    /// Present on delta flags
    pub delta_classification: Option<DeltaClass>,
}

impl AuditEvent {
    /// Create a new event with the type's default severity
    pub fn new(event_type: AuditEventType, details: String) -> Self {
        Self {
            event_type,
            severity: event_type.default_severity(),
            timestamp: Utc::now(),
            details,
            correlation: CorrelationIds::default(),
            verdict: None,
            delta_classification: None,
        }
    }

    pub fn with_correlation(mut self, correlation: CorrelationIds) -> Self {
        self.correlation = correlation;
        self
    }

    pub fn with_verdict(mut self, verdict: Verdict) -> Self {
        self.verdict = Some(verdict);
        self
    }

    pub fn with_delta(mut self, classification: DeltaClass) -> Self {
        self.delta_classification = Some(classification);
        self
    }

    pub fn with_severity(mut self, severity: AuditSeverity) -> Self {
        self.severity = severity;
        self
    }
}

/// Audit logger writing one JSON object per line
pub struct AuditLogger {
    audit_file: Mutex<File>,
    audit_path: PathBuf,
}

impl AuditLogger {
    /// Create a new audit logger appending to the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let audit_path = path.as_ref().to_path_buf();
        if let Some(parent) = audit_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let audit_file = OpenOptions::new().create(true).append(true).open(&audit_path)?;
        Ok(Self {
            audit_file: Mutex::new(audit_file),
            audit_path,
        })
    }

    /// Record an event: JSONL line plus a `log` echo scaled by severity.
    pub fn log_event(&self, event: &AuditEvent) {
        match event.severity {
            AuditSeverity::High => error!("AUDIT: {:?} - {}", event.event_type, event.details),
            AuditSeverity::Medium => warn!("AUDIT: {:?} - {}", event.event_type, event.details),
            AuditSeverity::Low => info!("AUDIT: {:?} - {}", event.event_type, event.details),
        }

        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                error!("failed to encode audit event: {}", e);
                return;
            }
        };
        if let Ok(mut file) = self.audit_file.lock() {
            if let Err(e) = writeln!(file, "{}", line) {
                error!("failed to write audit trail: {}", e);
            }
            if let Err(e) = file.flush() {
                error!("failed to flush audit trail: {}", e);
            }
        } else {
            error!("failed to acquire audit trail lock");
        }
    }

    /// Path of the audit file
    pub fn audit_path(&self) -> &Path {
        &self.audit_path
    }
}

/// Global audit logger instance
static AUDIT_LOGGER: OnceLock<AuditLogger> = OnceLock::new();

/// Initialize the global audit logger.
///
/// Degrades gracefully: if the file cannot be opened, events still reach
/// the `log` facade and the process keeps running.
pub fn init_audit_logger<P: AsRef<Path>>(path: P) {
    match AuditLogger::new(path.as_ref()) {
        Ok(logger) => {
            if AUDIT_LOGGER.set(logger).is_err() {
                warn!("audit logger already initialized");
            } else {
                info!("audit trail at {}", path.as_ref().display());
            }
        }
        Err(e) => {
            warn!(
                "audit file {} unavailable ({}); continuing with log-only audit events",
                path.as_ref().display(),
                e
            );
        }
    }
}

/// Record an event through the global logger, or the `log` facade when no
/// file-backed logger is initialized.
pub fn log_audit_event(event: AuditEvent) {
    if let Some(logger) = AUDIT_LOGGER.get() {
        logger.log_event(&event);
    } else {
        match event.severity {
            AuditSeverity::High => error!("AUDIT: {:?} - {}", event.event_type, event.details),
            AuditSeverity::Medium => warn!("AUDIT: {:?} - {}", event.event_type, event.details),
            AuditSeverity::Low => info!("AUDIT: {:?} - {}", event.event_type, event.details),
        }
    }
}

/// Convenience constructors for common events
pub mod events {
    use super::*;

    /// One sample interpreted
    pub fn interpretation(reading: &Reading, verdict: &Verdict) -> AuditEvent {
        AuditEvent::new(
            AuditEventType::Interpretation,
            format!(
                "sample {} => {} ({})",
                reading.sample_id, verdict.call, verdict.human_reason
            ),
        )
        .with_correlation(CorrelationIds::for_reading(reading))
        .with_verdict(verdict.clone())
    }

    /// Delta-check flagged a significant change
    pub fn delta_flag(reading: &Reading, classification: DeltaClass, details: &[String]) -> AuditEvent {
        AuditEvent::new(
            AuditEventType::DeltaFlag,
            format!("sample {}: {}", reading.sample_id, details.join("; ")),
        )
        .with_correlation(CorrelationIds::for_reading(reading))
        .with_delta(classification)
    }

    /// Batch import finished
    pub fn batch_finished(
        correlation: CorrelationIds,
        total: usize,
        succeeded: usize,
        failed: usize,
    ) -> AuditEvent {
        AuditEvent::new(
            AuditEventType::BatchImport,
            format!(
                "batch complete: {} rows, {} interpreted, {} rejected",
                total, succeeded, failed
            ),
        )
        .with_correlation(correlation)
    }

    /// Self-test harness executed
    pub fn self_test(passed: usize, failed: usize) -> AuditEvent {
        let event = AuditEvent::new(
            AuditEventType::SelfTest,
            format!("self-test: {} passed, {} failed", passed, failed),
        );
        if failed > 0 {
            event.with_severity(AuditSeverity::High)
        } else {
            event
        }
    }
}

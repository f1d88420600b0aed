/// History collaborator contract and the in-memory reference store.
///
/// Append-only, keyed by sample id, ordered by (timestamp, sequence). The
/// store linearizes concurrent appends so "most recent prior verdict" is
/// well-defined; the interpretation core never owns history data itself.
use crate::config::types::{QftError, Reading, Result, Verdict};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// One persisted interpretation: the full verdict plus the identity and
/// input fields needed for delta-checks and audit replay.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StoredVerdict {
    /// Store-assigned, strictly increasing
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub sample_id: String,
    pub operator_id: Option<String>,
    pub run_id: Option<String>,
    pub nil: f64,
    pub tb1: f64,
    pub tb2: f64,
    pub mitogen: f64,
    pub verdict: Verdict,
}

impl StoredVerdict {
    /// Build a record from a reading and its verdict. The sequence is
    /// assigned by the store on append.
    pub fn from_interpretation(reading: &Reading, verdict: &Verdict) -> Self {
        Self {
            sequence: 0,
            timestamp: reading.timestamp,
            sample_id: reading.sample_id.clone(),
            operator_id: reading.operator_id.clone(),
            run_id: reading.run_id.clone(),
            nil: reading.nil,
            tb1: reading.tb1,
            tb2: reading.tb2,
            mitogen: reading.mitogen,
            verdict: verdict.clone(),
        }
    }

    /// Ordering key: ties on timestamp resolve to the larger sequence.
    fn recency_key(&self) -> (DateTime<Utc>, u64) {
        (self.timestamp, self.sequence)
    }
}

/// Capability the interpretation core requires of its history collaborator.
pub trait HistoryStore {
    /// Persist one interpretation; returns the assigned sequence number.
    fn append(&self, reading: &Reading, verdict: &Verdict) -> Result<u64>;

    /// Most recent record for a sample by (timestamp, sequence), if any.
    fn most_recent(&self, sample_id: &str) -> Result<Option<StoredVerdict>>;

    /// Every record for a sample, oldest first.
    fn for_sample(&self, sample_id: &str) -> Result<Vec<StoredVerdict>>;

    /// Records whose timestamp falls in [from, to], oldest first.
    fn in_range(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<StoredVerdict>>;

    /// The most recent `limit` records, newest first.
    fn recent(&self, limit: usize) -> Result<Vec<StoredVerdict>>;
}

/// Mutex-linearized in-memory store. The reference implementation for tests
/// and for hosts that manage persistence themselves.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    records: Mutex<Vec<StoredVerdict>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemoryHistory {
    fn append(&self, reading: &Reading, verdict: &Verdict) -> Result<u64> {
        let mut records = self.records
            .lock()
            .map_err(|_| QftError::Store("history lock poisoned".to_string()))?;
        let sequence = records.last().map(|r| r.sequence).unwrap_or(0) + 1;
        let mut record = StoredVerdict::from_interpretation(reading, verdict);
        record.sequence = sequence;
        records.push(record);
        Ok(sequence)
    }

    fn most_recent(&self, sample_id: &str) -> Result<Option<StoredVerdict>> {
        let records = self.records
            .lock()
            .map_err(|_| QftError::Store("history lock poisoned".to_string()))?;
        Ok(records
            .iter()
            .filter(|r| r.sample_id == sample_id)
            .max_by_key(|r| r.recency_key())
            .cloned())
    }

    fn for_sample(&self, sample_id: &str) -> Result<Vec<StoredVerdict>> {
        let records = self.records
            .lock()
            .map_err(|_| QftError::Store("history lock poisoned".to_string()))?;
        let mut matching: Vec<StoredVerdict> = records
            .iter()
            .filter(|r| r.sample_id == sample_id)
            .cloned()
            .collect();
        matching.sort_by_key(|r| r.recency_key());
        Ok(matching)
    }

    fn in_range(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<StoredVerdict>> {
        let records = self.records
            .lock()
            .map_err(|_| QftError::Store("history lock poisoned".to_string()))?;
        let mut matching: Vec<StoredVerdict> = records
            .iter()
            .filter(|r| r.timestamp >= from && r.timestamp <= to)
            .cloned()
            .collect();
        matching.sort_by_key(|r| r.recency_key());
        Ok(matching)
    }

    fn recent(&self, limit: usize) -> Result<Vec<StoredVerdict>> {
        let records = self.records
            .lock()
            .map_err(|_| QftError::Store("history lock poisoned".to_string()))?;
        let mut all: Vec<StoredVerdict> = records.clone();
        all.sort_by_key(|r| r.recency_key());
        all.reverse();
        all.truncate(limit);
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::policy::ThresholdPolicy;
    use crate::engine::interpret;
    use chrono::TimeZone;

    fn interpreted(sample_id: &str, ts: DateTime<Utc>) -> (Reading, Verdict) {
        let reading = Reading::new(sample_id, 0.1, 0.2, 0.3, 2.0)
            .unwrap()
            .with_timestamp(ts);
        let verdict = interpret(&reading, &ThresholdPolicy::default_v1());
        (reading, verdict)
    }

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_append_assigns_increasing_sequences() {
        let store = MemoryHistory::new();
        let (reading, verdict) = interpreted("S-1", ts(0));
        assert_eq!(store.append(&reading, &verdict).unwrap(), 1);
        assert_eq!(store.append(&reading, &verdict).unwrap(), 2);
    }

    #[test]
    fn test_most_recent_prefers_later_timestamp() {
        let store = MemoryHistory::new();
        let (old_reading, old_verdict) = interpreted("S-1", ts(0));
        let (new_reading, new_verdict) = interpreted("S-1", ts(60));
        store.append(&new_reading, &new_verdict).unwrap();
        store.append(&old_reading, &old_verdict).unwrap();

        let recent = store.most_recent("S-1").unwrap().unwrap();
        assert_eq!(recent.timestamp, ts(60));
    }

    #[test]
    fn test_timestamp_tie_resolves_to_larger_sequence() {
        let store = MemoryHistory::new();
        let (reading, verdict) = interpreted("S-1", ts(0));
        store.append(&reading, &verdict).unwrap();
        let second = store.append(&reading, &verdict).unwrap();

        let recent = store.most_recent("S-1").unwrap().unwrap();
        assert_eq!(recent.sequence, second);
    }

    #[test]
    fn test_most_recent_is_per_sample() {
        let store = MemoryHistory::new();
        let (a, va) = interpreted("S-A", ts(0));
        let (b, vb) = interpreted("S-B", ts(60));
        store.append(&a, &va).unwrap();
        store.append(&b, &vb).unwrap();

        assert_eq!(store.most_recent("S-A").unwrap().unwrap().sample_id, "S-A");
        assert!(store.most_recent("S-C").unwrap().is_none());
    }

    #[test]
    fn test_in_range_bounds_are_inclusive() {
        let store = MemoryHistory::new();
        for secs in [0, 60, 120] {
            let (reading, verdict) = interpreted("S-1", ts(secs));
            store.append(&reading, &verdict).unwrap();
        }
        let hits = store.in_range(ts(0), ts(60)).unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_recent_returns_newest_first() {
        let store = MemoryHistory::new();
        for secs in [0, 60, 120] {
            let (reading, verdict) = interpreted("S-1", ts(secs));
            store.append(&reading, &verdict).unwrap();
        }
        let recent = store.recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].timestamp, ts(120));
        assert_eq!(recent[1].timestamp, ts(60));
    }

    #[test]
    fn test_record_preserves_every_verdict_field() {
        let store = MemoryHistory::new();
        let (reading, verdict) = interpreted("S-1", ts(0));
        store.append(&reading, &verdict).unwrap();
        let record = store.most_recent("S-1").unwrap().unwrap();
        assert_eq!(record.verdict, verdict);
        assert_eq!(record.nil, reading.nil);
        assert_eq!(record.operator_id, reading.operator_id);
    }
}

/// Append-only JSONL history store.
///
/// One JSON record per line, opened in append mode and replayed on open so
/// sequence numbers survive restarts. A corrupt line is reported and
/// skipped rather than poisoning the rest of the file. Writes happen under
/// one lock, which is what linearizes concurrent appends for a sample.
use crate::config::types::{QftError, Reading, Result, Verdict};
use crate::history::store::{HistoryStore, StoredVerdict};
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

struct Inner {
    file: File,
    records: Vec<StoredVerdict>,
    next_sequence: u64,
}

/// File-backed history store
pub struct JsonlHistory {
    inner: Mutex<Inner>,
    path: PathBuf,
}

impl JsonlHistory {
    /// Open (or create) a JSONL history file and replay its records.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    QftError::Store(format!("failed to create history directory: {}", e))
                })?;
            }
        }

        let mut records = Vec::new();
        if path.exists() {
            let reader = BufReader::new(File::open(&path).map_err(|e| {
                QftError::Store(format!("failed to read history file: {}", e))
            })?);
            for (line_no, line) in reader.lines().enumerate() {
                let line =
                    line.map_err(|e| QftError::Store(format!("failed to read history: {}", e)))?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<StoredVerdict>(&line) {
                    Ok(record) => records.push(record),
                    Err(e) => warn!(
                        "skipping corrupt history record at {}:{}: {}",
                        path.display(),
                        line_no + 1,
                        e
                    ),
                }
            }
        }
        let next_sequence = records.iter().map(|r| r.sequence).max().unwrap_or(0) + 1;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| QftError::Store(format!("failed to open history file: {}", e)))?;

        info!(
            "history store {} opened with {} records",
            path.display(),
            records.len()
        );
        Ok(Self {
            inner: Mutex::new(Inner {
                file,
                records,
                next_sequence,
            }),
            path,
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| QftError::Store("history lock poisoned".to_string()))
    }
}

impl HistoryStore for JsonlHistory {
    fn append(&self, reading: &Reading, verdict: &Verdict) -> Result<u64> {
        let mut inner = self.lock()?;
        let sequence = inner.next_sequence;
        let mut record = StoredVerdict::from_interpretation(reading, verdict);
        record.sequence = sequence;

        let line = serde_json::to_string(&record)
            .map_err(|e| QftError::Store(format!("failed to encode history record: {}", e)))?;
        writeln!(inner.file, "{}", line)
            .map_err(|e| QftError::Store(format!("failed to append history record: {}", e)))?;
        inner
            .file
            .flush()
            .map_err(|e| QftError::Store(format!("failed to flush history file: {}", e)))?;

        inner.records.push(record);
        inner.next_sequence = sequence + 1;
        Ok(sequence)
    }

    fn most_recent(&self, sample_id: &str) -> Result<Option<StoredVerdict>> {
        let inner = self.lock()?;
        Ok(inner
            .records
            .iter()
            .filter(|r| r.sample_id == sample_id)
            .max_by_key(|r| (r.timestamp, r.sequence))
            .cloned())
    }

    fn for_sample(&self, sample_id: &str) -> Result<Vec<StoredVerdict>> {
        let inner = self.lock()?;
        let mut matching: Vec<StoredVerdict> = inner
            .records
            .iter()
            .filter(|r| r.sample_id == sample_id)
            .cloned()
            .collect();
        matching.sort_by_key(|r| (r.timestamp, r.sequence));
        Ok(matching)
    }

    fn in_range(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<StoredVerdict>> {
        let inner = self.lock()?;
        let mut matching: Vec<StoredVerdict> = inner
            .records
            .iter()
            .filter(|r| r.timestamp >= from && r.timestamp <= to)
            .cloned()
            .collect();
        matching.sort_by_key(|r| (r.timestamp, r.sequence));
        Ok(matching)
    }

    fn recent(&self, limit: usize) -> Result<Vec<StoredVerdict>> {
        let inner = self.lock()?;
        let mut all = inner.records.clone();
        all.sort_by_key(|r| (r.timestamp, r.sequence));
        all.reverse();
        all.truncate(limit);
        Ok(all)
    }
}

/// Batch runner: row-by-row interpretation with per-row failure isolation.
///
/// Each row is interpreted independently with no shared engine state; a
/// malformed row yields a row-level error entry and the rest of the batch
/// proceeds. Output order exactly mirrors input order, with no regrouping
/// of successes and failures.
use crate::batch::source::ParsedRow;
use crate::config::policy::ThresholdPolicy;
use crate::config::types::{Reading, Result, Verdict};
use crate::engine::delta::{compute_delta, DeltaResult};
use crate::engine::interpret::interpret;
use crate::history::store::HistoryStore;
use log::debug;

/// A successfully interpreted row
#[derive(Clone, Debug)]
pub struct InterpretedRow {
    pub reading: Reading,
    pub verdict: Verdict,
    /// Present when the batch ran against a history store
    pub delta: Option<DeltaResult>,
}

/// Outcome for one input row, success or error, in input position
#[derive(Debug)]
pub struct RowOutcome {
    /// 1-based line number in the batch source
    pub line: usize,
    /// Sample id when the row carried one
    pub sample_id: Option<String>,
    pub outcome: Result<InterpretedRow>,
}

/// Interpret every row under the given policy. Pure except for the
/// per-row engine calls; nothing is persisted.
pub fn run_batch(rows: Vec<ParsedRow>, policy: &ThresholdPolicy) -> Vec<RowOutcome> {
    rows.into_iter()
        .map(|row| RowOutcome {
            line: row.line,
            sample_id: row.sample_id,
            outcome: row.reading.map(|reading| {
                let verdict = interpret(&reading, policy);
                InterpretedRow {
                    reading,
                    verdict,
                    delta: None,
                }
            }),
        })
        .collect()
}

/// Interpret every row, delta-check each against the sample's most recent
/// stored verdict, and persist successes in row order. Store failures are
/// row-level errors like any other; they never abort the batch.
pub fn run_batch_with_history(
    rows: Vec<ParsedRow>,
    policy: &ThresholdPolicy,
    history: &dyn HistoryStore,
) -> Vec<RowOutcome> {
    rows.into_iter()
        .map(|row| {
            let ParsedRow {
                line,
                sample_id,
                reading,
            } = row;
            let outcome = reading.and_then(|reading| {
                let verdict = interpret(&reading, policy);
                let prior = history.most_recent(&reading.sample_id)?;
                let delta = compute_delta(&verdict, prior.as_ref().map(|p| &p.verdict), policy);
                let sequence = history.append(&reading, &verdict)?;
                debug!(
                    "batch row {} persisted as sequence {} ({})",
                    line, sequence, verdict.call
                );
                Ok(InterpretedRow {
                    reading,
                    verdict,
                    delta: Some(delta),
                })
            });
            RowOutcome {
                line,
                sample_id,
                outcome,
            }
        })
        .collect()
}

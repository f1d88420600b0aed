/// Date-range summary statistics over history records.
///
/// The data behind the dashboard and the periodic summary report: call
/// counts, indeterminate reason breakdown, rates, and the spread of runs
/// and operators in the window.
use crate::config::types::{Call, ReasonCode};
use crate::history::store::StoredVerdict;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Aggregated interpretation statistics for a date range
#[derive(Clone, Debug, PartialEq)]
pub struct SummaryStats {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub total: usize,
    pub pos: usize,
    pub neg: usize,
    pub ind: usize,
    pub ind_high_nil: usize,
    pub ind_low_mitogen: usize,
    pub pos_rate: f64,
    pub neg_rate: f64,
    pub ind_rate: f64,
    pub unique_operators: usize,
    pub unique_runs: usize,
}

impl SummaryStats {
    /// Aggregate records already filtered to [from, to] by the store.
    pub fn from_records(records: &[StoredVerdict], from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        let mut pos = 0;
        let mut neg = 0;
        let mut ind = 0;
        let mut ind_high_nil = 0;
        let mut ind_low_mitogen = 0;
        let mut operators = HashSet::new();
        let mut runs = HashSet::new();

        for record in records {
            match record.verdict.call {
                Call::Pos => pos += 1,
                Call::Neg => neg += 1,
                Call::Ind => {
                    ind += 1;
                    match record.verdict.reason_code {
                        ReasonCode::NilTooHigh => ind_high_nil += 1,
                        ReasonCode::LowMitogenResponse => ind_low_mitogen += 1,
                        _ => {}
                    }
                }
            }
            if let Some(op) = &record.operator_id {
                operators.insert(op.clone());
            }
            if let Some(run) = &record.run_id {
                runs.insert(run.clone());
            }
        }

        let total = records.len();
        let rate = |count: usize| {
            if total > 0 {
                count as f64 / total as f64 * 100.0
            } else {
                0.0
            }
        };
        Self {
            from,
            to,
            total,
            pos,
            neg,
            ind,
            ind_high_nil,
            ind_low_mitogen,
            pos_rate: rate(pos),
            neg_rate: rate(neg),
            ind_rate: rate(ind),
            unique_operators: operators.len(),
            unique_runs: runs.len(),
        }
    }

    /// Render the summary as the report's metric table.
    pub fn render(&self) -> String {
        let mut out = String::from("QFT Interpretation Summary Report\n");
        out.push_str(&format!(
            "Date Range: {} to {}\n\n",
            self.from.format("%Y-%m-%d"),
            self.to.format("%Y-%m-%d")
        ));
        out.push_str(&format!("{:<32} {:>8}\n", "Total Interpretations:", self.total));
        out.push_str(&format!("{:<32} {:>8}\n", "Positive Results (POS):", self.pos));
        out.push_str(&format!("{:<32} {:>8}\n", "Negative Results (NEG):", self.neg));
        out.push_str(&format!(
            "{:<32} {:>8}\n",
            "Indeterminate Results (IND):", self.ind
        ));
        out.push_str(&format!(
            "{:<32} {:>8}\n",
            "    - IND (High Nil):", self.ind_high_nil
        ));
        out.push_str(&format!(
            "{:<32} {:>8}\n",
            "    - IND (Low Mitogen):", self.ind_low_mitogen
        ));
        out.push_str(&format!(
            "{:<32} {:>7.1}%\n",
            "Positivity Rate:", self.pos_rate
        ));
        out.push_str(&format!(
            "{:<32} {:>7.1}%\n",
            "Negativity Rate:", self.neg_rate
        ));
        out.push_str(&format!(
            "{:<32} {:>7.1}%\n",
            "Indeterminate Rate:", self.ind_rate
        ));
        out.push_str(&format!(
            "{:<32} {:>8}\n",
            "Unique Run IDs:", self.unique_runs
        ));
        out.push_str(&format!(
            "{:<32} {:>8}\n",
            "Unique Operators:", self.unique_operators
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::policy::ThresholdPolicy;
    use crate::config::types::Reading;
    use crate::engine::interpret::interpret;
    use crate::history::store::{HistoryStore, MemoryHistory};
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn seeded_history() -> MemoryHistory {
        let policy = ThresholdPolicy::default_v1();
        let history = MemoryHistory::new();
        let samples = [
            ("S-1", 0.1, 1.5, 0.2, 5.0, Some("OP1"), Some("RUN-1")), // POS
            ("S-2", 0.1, 0.2, 0.3, 2.0, Some("OP1"), Some("RUN-1")), // NEG
            ("S-3", 9.0, 10.0, 10.0, 10.0, Some("OP2"), Some("RUN-2")), // IND high nil
            ("S-4", 0.2, 0.3, 0.25, 0.3, Some("OP2"), Some("RUN-2")), // IND low mitogen
        ];
        for (i, (id, nil, tb1, tb2, mit, op, run)) in samples.into_iter().enumerate() {
            let mut reading = Reading::new(id, nil, tb1, tb2, mit)
                .unwrap()
                .with_timestamp(ts(i as i64 * 60));
            if let Some(op) = op {
                reading = reading.with_operator(op);
            }
            if let Some(run) = run {
                reading = reading.with_run(run);
            }
            let verdict = interpret(&reading, &policy);
            history.append(&reading, &verdict).unwrap();
        }
        history
    }

    #[test]
    fn test_summary_counts_and_rates() {
        let history = seeded_history();
        let records = history.in_range(ts(0), ts(3600)).unwrap();
        let stats = SummaryStats::from_records(&records, ts(0), ts(3600));

        assert_eq!(stats.total, 4);
        assert_eq!(stats.pos, 1);
        assert_eq!(stats.neg, 1);
        assert_eq!(stats.ind, 2);
        assert_eq!(stats.ind_high_nil, 1);
        assert_eq!(stats.ind_low_mitogen, 1);
        assert_eq!(stats.pos_rate, 25.0);
        assert_eq!(stats.ind_rate, 50.0);
        assert_eq!(stats.unique_operators, 2);
        assert_eq!(stats.unique_runs, 2);
    }

    #[test]
    fn test_window_excludes_out_of_range_records() {
        let history = seeded_history();
        let records = history.in_range(ts(0), ts(90)).unwrap();
        let stats = SummaryStats::from_records(&records, ts(0), ts(90));
        assert_eq!(stats.total, 2);
    }

    #[test]
    fn test_empty_range_has_zero_rates() {
        let stats = SummaryStats::from_records(&[], ts(0), ts(60));
        assert_eq!(stats.total, 0);
        assert_eq!(stats.pos_rate, 0.0);
    }

    #[test]
    fn test_render_lists_every_metric() {
        let history = seeded_history();
        let records = history.in_range(ts(0), ts(3600)).unwrap();
        let text = SummaryStats::from_records(&records, ts(0), ts(3600)).render();
        assert!(text.contains("Total Interpretations:"));
        assert!(text.contains("IND (High Nil):"));
        assert!(text.contains("25.0%"));
        assert!(text.contains("Unique Operators:"));
    }
}

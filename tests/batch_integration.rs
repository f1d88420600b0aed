//! Integration tests for batch import
//!
//! Exercise the full path: file on disk -> source parsing -> batch runner
//! -> history persistence -> rendering, with partial-failure semantics.

use qftlab::batch::{parse_file, parse_table, run_batch, run_batch_with_history};
use qftlab::report::text::render_batch;
use qftlab::{Call, DeltaClass, HistoryStore, JsonlHistory, QftError, ThresholdPolicy};
use std::io::Write;

fn write_batch_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

const MIXED_BATCH: &str = "\
Sample ID,Nil,TB1,TB2,Mitogen
Sample-001,0.120,5.600,4.800,8.900
Sample-002,0.080,0.150,0.200,6.500
Sample-003,0.210,0.450,0.330,7.100
Control-A,9.200,10.00,11.00,15.00
Sample-004,not-a-number,0.150,0.200,6.500
Sample-005,0.080,0.150,0.200,0.300
";

#[test]
fn test_file_to_outcomes_preserves_order_and_isolates_failures() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_batch_file(&dir, "worklist.csv", MIXED_BATCH);

    let rows = parse_file(&path, Some("OP1"), Some("RUN-1")).unwrap();
    let outcomes = run_batch(rows, &ThresholdPolicy::default_v1());

    assert_eq!(outcomes.len(), 6);
    let calls: Vec<Option<Call>> = outcomes
        .iter()
        .map(|o| o.outcome.as_ref().ok().map(|i| i.verdict.call))
        .collect();
    assert_eq!(
        calls,
        vec![
            Some(Call::Pos),
            Some(Call::Neg),
            Some(Call::Neg),
            Some(Call::Ind),
            None,
            Some(Call::Ind),
        ]
    );
    assert!(matches!(
        outcomes[4].outcome.as_ref().unwrap_err(),
        QftError::InvalidReading(_)
    ));
    // Operator and run ids applied batch-wide.
    let first = outcomes[0].outcome.as_ref().unwrap();
    assert_eq!(first.reading.operator_id.as_deref(), Some("OP1"));
    assert_eq!(first.reading.run_id.as_deref(), Some("RUN-1"));
}

#[test]
fn test_batch_persists_through_jsonl_store_and_flags_reruns() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("history.jsonl");
    let policy = ThresholdPolicy::default_v1();

    {
        let history = JsonlHistory::open(&store_path).unwrap();
        let rows = parse_table(
            "Sample ID,Nil,TB1,TB2,Mitogen\nPT-9,0.1,0.2,0.25,2.0\n",
            None,
            None,
        )
        .unwrap();
        let outcomes = run_batch_with_history(rows, &policy, &history);
        assert_eq!(
            outcomes[0]
                .outcome
                .as_ref()
                .unwrap()
                .delta
                .as_ref()
                .unwrap()
                .classification,
            DeltaClass::None
        );
    }

    // New process, same store: the rerun sees the persisted prior.
    let history = JsonlHistory::open(&store_path).unwrap();
    let rows = parse_table(
        "Sample ID,Nil,TB1,TB2,Mitogen\nPT-9,0.1,1.5,0.25,5.0\n",
        None,
        None,
    )
    .unwrap();
    let outcomes = run_batch_with_history(rows, &policy, &history);
    let delta = outcomes[0]
        .outcome
        .as_ref()
        .unwrap()
        .delta
        .as_ref()
        .unwrap();
    assert_eq!(delta.classification, DeltaClass::Significant);
    assert_eq!(history.for_sample("PT-9").unwrap().len(), 2);
}

#[test]
fn test_missing_header_fails_before_any_row_runs() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_batch_file(&dir, "bad.csv", "Sample ID,Nil,TB1,TB2\nS-1,0.1,0.2,0.3\n");
    let err = parse_file(&path, None, None).unwrap_err();
    assert!(matches!(err, QftError::BatchFormat(_)));
}

#[test]
fn test_rendered_batch_report_enumerates_every_row() {
    let rows = parse_table(MIXED_BATCH, None, None).unwrap();
    let outcomes = run_batch(rows, &ThresholdPolicy::default_v1());
    let text = render_batch(&outcomes);

    for sample in ["Sample-001", "Sample-002", "Sample-003", "Control-A", "Sample-004", "Sample-005"] {
        assert!(text.contains(sample), "missing row for {}", sample);
    }
    assert!(text.contains("Processed: 5 / 6 rows. Skipped: 1 rows."));
}

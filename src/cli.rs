use crate::batch;
use crate::config::policy::PolicyTable;
use crate::config::settings::Settings;
use crate::config::types::Reading;
use crate::config::validator;
use crate::engine::delta::{compute_delta, DeltaClass};
use crate::engine::selftest::{default_vectors, run_self_test};
use crate::history::jsonl::JsonlHistory;
use crate::history::store::HistoryStore;
use crate::observability::audit::{self, events, CorrelationIds};
use crate::observability::metrics::InterpretationMetrics;
use crate::report::summary::SummaryStats;
use crate::report::text;
use anyhow::{bail, Context, Result};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (JSON)
    #[arg(long, default_value = "qft_config.json")]
    config: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interpret a single sample
    Interpret {
        /// Sample identifier
        #[arg(long)]
        sample_id: String,
        /// Nil control (IU/mL)
        #[arg(long)]
        nil: f64,
        /// TB Antigen 1 (IU/mL)
        #[arg(long)]
        tb1: f64,
        /// TB Antigen 2 (IU/mL)
        #[arg(long)]
        tb2: f64,
        /// Mitogen control (IU/mL)
        #[arg(long)]
        mitogen: f64,
        /// Operator identifier
        #[arg(long)]
        operator: Option<String>,
        /// Instrument run identifier
        #[arg(long)]
        run: Option<String>,
        /// Interpret only; skip history persistence and the delta-check
        #[arg(long)]
        no_persist: bool,
    },
    /// Import and interpret a batch file (CSV with header row)
    Batch {
        /// Batch file path
        file: PathBuf,
        /// Operator identifier applied to every row
        #[arg(long)]
        operator: Option<String>,
        /// Run identifier applied to every row
        #[arg(long)]
        run: Option<String>,
        /// Interpret only; skip history persistence and delta-checks
        #[arg(long)]
        no_persist: bool,
    },
    /// Run the engine's regression self-test vectors
    SelfTest,
    /// List interpretation history
    History {
        /// Only records for this sample id
        #[arg(long)]
        sample_id: Option<String>,
        /// Maximum records to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Summary statistics over a recent date window
    Summary {
        /// Window length in days (default from settings)
        #[arg(long)]
        days: Option<u32>,
    },
}

/// CLI entrypoint shared by the `qft` binary.
pub fn run() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let settings = Settings::load_from_file(&cli.config)
        .with_context(|| format!("loading settings from {}", cli.config.display()))?;
    let table = PolicyTable::with_defaults();
    let validation = validator::validate_startup(&settings, &table)?;
    for warning in &validation.warnings {
        warn!("config: {}", warning);
    }
    // Strict mode already failed fast inside validate_startup; in permissive
    // mode problems are reported and the run continues degraded.
    for error in &validation.errors {
        warn!("config error: {}", error);
    }
    audit::init_audit_logger(&settings.audit_path);
    let policy = table.resolve(&settings.policy_id)?.clone();

    match cli.command {
        Commands::Interpret {
            sample_id,
            nil,
            tb1,
            tb2,
            mitogen,
            operator,
            run,
            no_persist,
        } => {
            let mut reading = Reading::new(sample_id, nil, tb1, tb2, mitogen)?;
            if let Some(op) = operator {
                reading = reading.with_operator(op);
            }
            if let Some(run) = run {
                reading = reading.with_run(run);
            }
            let verdict = crate::engine::interpret(&reading, &policy);

            let delta = if no_persist {
                None
            } else {
                let history = JsonlHistory::open(&settings.history_path)?;
                let prior = history.most_recent(&reading.sample_id)?;
                if let Some(prior) = &prior {
                    if !table.contains(&prior.verdict.policy_id) {
                        warn!(
                            "prior verdict for {} references unknown policy '{}'",
                            prior.sample_id, prior.verdict.policy_id
                        );
                    }
                }
                let delta =
                    compute_delta(&verdict, prior.as_ref().map(|p| &p.verdict), &policy);
                history.append(&reading, &verdict)?;
                Some(delta)
            };

            audit::log_audit_event(events::interpretation(&reading, &verdict));
            if let Some(delta) = &delta {
                if delta.classification == DeltaClass::Significant {
                    audit::log_audit_event(events::delta_flag(
                        &reading,
                        delta.classification,
                        &delta.details,
                    ));
                }
            }
            print!(
                "{}",
                text::render_single(&reading, &verdict, delta.as_ref(), &policy)
            );
        }

        Commands::Batch {
            file,
            operator,
            run,
            no_persist,
        } => {
            let rows =
                batch::parse_file(&file, operator.as_deref(), run.as_deref()).with_context(
                    || format!("parsing batch file {}", file.display()),
                )?;
            let total = rows.len();
            let outcomes = if no_persist {
                batch::run_batch(rows, &policy)
            } else {
                let history = JsonlHistory::open(&settings.history_path)?;
                batch::run_batch_with_history(rows, &policy, &history)
            };
            let metrics = InterpretationMetrics::new();
            for row in &outcomes {
                match &row.outcome {
                    Ok(interpreted) => {
                        metrics.record_verdict(&interpreted.verdict);
                        if let Some(delta) = &interpreted.delta {
                            metrics.record_delta(delta.classification);
                        }
                    }
                    Err(_) => metrics.record_row_error(),
                }
            }
            let snapshot = metrics.snapshot();
            info!(
                "batch metrics: {} interpreted, POS {:.1}%, IND {:.1}%, {} significant deltas, {} row errors",
                snapshot.total,
                snapshot.pos_rate,
                snapshot.ind_rate,
                snapshot.delta_significant,
                snapshot.row_errors
            );

            let succeeded = outcomes.iter().filter(|o| o.outcome.is_ok()).count();
            audit::log_audit_event(events::batch_finished(
                CorrelationIds::for_batch(),
                total,
                succeeded,
                total - succeeded,
            ));
            print!("{}", text::render_batch(&outcomes));
        }

        Commands::SelfTest => {
            let report = run_self_test(&default_vectors(), &policy);
            audit::log_audit_event(events::self_test(report.passed, report.failures.len()));
            print!("{}", text::render_self_test(&report));
            if !report.all_passed() {
                bail!("self-test failed: {} vector(s) mismatched", report.failures.len());
            }
        }

        Commands::History { sample_id, limit } => {
            let history = JsonlHistory::open(&settings.history_path)?;
            let records = match sample_id {
                Some(id) => history.for_sample(&id)?,
                None => history.recent(limit)?,
            };
            if records.is_empty() {
                println!("No history records found.");
            }
            for record in records.iter().take(limit) {
                if !table.contains(&record.verdict.policy_id) {
                    warn!(
                        "record {} for sample {} references unknown policy '{}'",
                        record.sequence, record.sample_id, record.verdict.policy_id
                    );
                }
                println!(
                    "{}  {:<10} {:<10} {:<16} {:>7.3} {:>7.3} {:>7.3} {:>7.3}  {:<4} {}",
                    record.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    record.operator_id.as_deref().unwrap_or("-"),
                    record.run_id.as_deref().unwrap_or("-"),
                    record.sample_id,
                    record.nil,
                    record.tb1,
                    record.tb2,
                    record.mitogen,
                    record.verdict.call,
                    record.verdict.human_reason,
                );
            }
        }

        Commands::Summary { days } => {
            let days = days.unwrap_or(settings.summary_days).max(1);
            let to = Utc::now();
            let from = to - Duration::days(i64::from(days) - 1);
            let history = JsonlHistory::open(&settings.history_path)?;
            let records = history.in_range(from, to)?;
            let stats = SummaryStats::from_records(&records, from, to);
            print!("{}", stats.render());
        }
    }
    Ok(())
}

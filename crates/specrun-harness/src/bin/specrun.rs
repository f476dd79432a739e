//! CLI entrypoint for the specrun conformance harness.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::json;
use specrun_core::{ExclusionFilter, SpecRegistry, SpecSet, Subject};
use specrun_harness::structured_log::{ArtifactIndex, LogEmitter, LogEntry, LogLevel};
use specrun_harness::{ConformanceReport, ReferenceSubject, TestRunner};

/// Conformance suite runner.
#[derive(Debug, Parser)]
#[command(name = "specrun")]
#[command(about = "Declarative conformance suite runner")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load spec sources, apply exclusions, execute, and report.
    Run {
        /// Spec source: a JSON file or a directory of JSON files.
        #[arg(long)]
        spec: PathBuf,
        /// Exclusion list (one `identifier reason` per line).
        #[arg(long)]
        excludes: Option<PathBuf>,
        /// Output report path (markdown; a JSON sibling is written too).
        #[arg(long)]
        report: Option<PathBuf>,
        /// Structured JSONL log path.
        #[arg(long)]
        log: Option<PathBuf>,
        /// Parallel workers.
        #[arg(long, default_value_t = 1)]
        jobs: usize,
        /// Per-case deadline in milliseconds; breaches become errors.
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Campaign label for reports and logs.
        #[arg(long, default_value = "conformance")]
        campaign: String,
    },
    /// Parse spec and exclusion sources without executing anything.
    Validate {
        /// Spec source: a JSON file or a directory of JSON files.
        #[arg(long)]
        spec: PathBuf,
        /// Exclusion list to cross-check.
        #[arg(long)]
        excludes: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            spec,
            excludes,
            report,
            log,
            jobs,
            timeout_ms,
            campaign,
        } => run(
            &spec,
            excludes.as_deref(),
            report.as_deref(),
            log.as_deref(),
            jobs,
            timeout_ms,
            &campaign,
        ),
        Command::Validate { spec, excludes } => validate(&spec, excludes.as_deref()),
    }
}

#[allow(clippy::too_many_arguments)]
fn run(
    spec: &Path,
    excludes: Option<&Path>,
    report_path: Option<&Path>,
    log_path: Option<&Path>,
    jobs: usize,
    timeout_ms: Option<u64>,
    campaign: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let (registry, filter) = load_sources(spec, excludes)?;

    let warnings: Vec<String> = filter
        .unmatched(&registry)
        .into_iter()
        .map(|entry| {
            format!(
                "exclusion `{}` matches no registered case ({})",
                entry.id, entry.reason
            )
        })
        .collect();
    for warning in &warnings {
        eprintln!("warning: {warning}");
    }

    let partition = filter.partition(registry.cases().cloned());
    eprintln!(
        "Running {} cases ({} skipped) from {}",
        partition.to_run.len(),
        partition.to_skip.len(),
        spec.display()
    );

    let mut runner = TestRunner::new(campaign).with_workers(jobs);
    if let Some(ms) = timeout_ms {
        runner = runner.with_deadline(Duration::from_millis(ms));
    }

    let mut results = runner.run(&partition.to_run);
    results.extend(TestRunner::skipped_results(&partition.to_skip));
    let summary = specrun_core::RunSummary::from_results(results);
    let report_doc = ConformanceReport::new("specrun Conformance Report", campaign, summary, warnings);

    eprintln!(
        "Run complete: total={}, passed={}, failed={}, errors={}, skipped={}",
        report_doc.summary.total,
        report_doc.summary.passed,
        report_doc.summary.failed,
        report_doc.summary.errors,
        report_doc.summary.skipped
    );

    let mut written: Vec<(PathBuf, &'static str, Vec<u8>)> = Vec::new();
    if let Some(path) = report_path {
        let markdown = report_doc.to_markdown();
        std::fs::write(path, &markdown)?;
        written.push((path.to_path_buf(), "report_markdown", markdown.into_bytes()));

        let json_path = path.with_extension("json");
        let body = report_doc.to_json();
        std::fs::write(&json_path, &body)?;
        written.push((json_path, "report_json", body.into_bytes()));
        eprintln!("Wrote report to {}", path.display());
    }

    if let Some(path) = log_path {
        write_log(path, campaign, &report_doc, &written)?;
        eprintln!("Wrote log to {}", path.display());
    }

    if report_doc.exit_code() != 0 {
        return Err("conformance run failed".into());
    }
    Ok(())
}

fn validate(spec: &Path, excludes: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let (registry, filter) = load_sources(spec, excludes)?;

    println!("{} cases registered, {} exclusions", registry.len(), filter.len());
    for entry in filter.unmatched(&registry) {
        println!(
            "warning: exclusion `{}` matches no registered case ({})",
            entry.id, entry.reason
        );
    }
    Ok(())
}

fn load_sources(
    spec: &Path,
    excludes: Option<&Path>,
) -> Result<(SpecRegistry, ExclusionFilter), Box<dyn std::error::Error>> {
    let sets = load_spec_sets(spec)?;
    let subject: Arc<dyn Subject> = Arc::new(ReferenceSubject::new());
    let registry = SpecRegistry::from_sets(&sets, &subject)?;

    let filter = match excludes {
        Some(path) => ExclusionFilter::from_file(path)?,
        None => ExclusionFilter::new(),
    };
    Ok((registry, filter))
}

fn load_spec_sets(spec: &Path) -> Result<Vec<SpecSet>, Box<dyn std::error::Error>> {
    let mut paths = Vec::new();
    if spec.is_dir() {
        for entry in std::fs::read_dir(spec)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                paths.push(path);
            }
        }
        paths.sort();
    } else {
        paths.push(spec.to_path_buf());
    }

    let mut sets = Vec::new();
    for path in &paths {
        sets.push(SpecSet::from_file(path)?);
    }
    if sets.is_empty() {
        return Err(format!("no spec JSON files found in {}", spec.display()).into());
    }
    Ok(sets)
}

fn write_log(
    path: &Path,
    campaign: &str,
    report: &ConformanceReport,
    artifacts: &[(PathBuf, &'static str, Vec<u8>)],
) -> Result<(), Box<dyn std::error::Error>> {
    let run_id = format!("{campaign}-{}", std::process::id());
    let mut emitter = LogEmitter::to_file(path, &run_id)?;

    emitter.emit_entry(
        LogEntry::new("", LogLevel::Info, "run_start")
            .with_campaign(campaign)
            .with_details(json!({"total": report.summary.total})),
    )?;

    for result in &report.summary.results {
        let mut entry = LogEntry::new("", LogLevel::Info, "case_result")
            .with_campaign(campaign)
            .with_case(&result.case_id)
            .with_outcome(result.outcome)
            .with_duration_ms(result.duration_ms);
        if let Some(reason) = &result.skip_reason {
            entry = entry.with_skip_reason(reason);
        }
        if let Some(diagnostic) = &result.diagnostic {
            entry = entry.with_details(serde_json::to_value(diagnostic)?);
        }
        emitter.emit_entry(entry)?;
    }

    emitter.emit_entry(
        LogEntry::new("", LogLevel::Info, "run_end")
            .with_campaign(campaign)
            .with_details(json!({
                "passed": report.summary.passed,
                "failed": report.summary.failed,
                "errors": report.summary.errors,
                "skipped": report.summary.skipped,
            })),
    )?;
    emitter.flush()?;

    if !artifacts.is_empty() {
        let mut index = ArtifactIndex::new(&run_id);
        for (artifact_path, kind, contents) in artifacts {
            index.add(artifact_path.display().to_string(), *kind, contents);
        }
        let index_path = path.with_extension("artifacts.json");
        std::fs::write(&index_path, index.to_json()?)?;
    }
    Ok(())
}

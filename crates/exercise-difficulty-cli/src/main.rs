use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use exercise_difficulty_core::{
    apply_corrections, load, render_summary, save, write_changelog, CorrectionReport,
    CorrectionTable, Dataset,
};
use serde_json::Value;
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

const CLI_CONTRACT_VERSION: &str = "fix-difficulties.v1";
const DEFAULT_DATASET_PATH: &str = "./apps/web/src/data/exercises.json";
const DEFAULT_CHANGELOG_PATH: &str = "./EXERCISE_DIFFICULTY_CHANGELOG.md";
const LOG_ENV: &str = "FIX_DIFFICULTIES_LOG";

#[derive(Debug, Parser)]
#[command(name = "fix-difficulties")]
#[command(about = "Apply curated difficulty corrections to the exercise dataset")]
struct Cli {
    /// Exercise dataset, rewritten in place.
    #[arg(long, default_value = DEFAULT_DATASET_PATH)]
    dataset: PathBuf,

    /// Markdown changelog, overwritten on every run.
    #[arg(long, default_value = DEFAULT_CHANGELOG_PATH)]
    changelog: PathBuf,

    /// YAML or JSON correction table to use instead of the built-in one.
    #[arg(long)]
    table: Option<PathBuf>,

    /// Report what would change without writing any file.
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    run(&cli)
}

fn run(cli: &Cli) -> Result<()> {
    let table = load_table(cli.table.as_deref())?;
    for id in table.duplicate_ids() {
        tracing::warn!(id, "correction table lists this id more than once; the last entry wins");
    }

    tracing::info!(path = %cli.dataset.display(), "loading exercises");
    let mut dataset = load(&cli.dataset)
        .with_context(|| format!("failed to load dataset {}", cli.dataset.display()))?;
    tracing::info!(records = dataset.len(), "exercises loaded");
    warn_duplicate_records(&dataset, &table);

    tracing::info!(entries = table.len(), "applying corrections");
    let report = apply_corrections(&mut dataset, &table);

    if cli.format == OutputFormat::Text {
        print!("{}", render_summary(&report));
    }

    if cli.dry_run {
        tracing::info!("dry run; dataset and changelog left untouched");
    } else {
        save(&cli.dataset, &dataset)
            .with_context(|| format!("failed to save dataset {}", cli.dataset.display()))?;
        tracing::info!(path = %cli.dataset.display(), "dataset updated");

        let today = OffsetDateTime::now_utc().date();
        write_changelog(&cli.changelog, &report, table.based_on.as_deref(), today)
            .with_context(|| format!("failed to write changelog {}", cli.changelog.display()))?;
        tracing::info!(path = %cli.changelog.display(), "changelog written");
    }

    if cli.format == OutputFormat::Json {
        emit_json(report_json(cli, &dataset, &report)?)?;
    }

    Ok(())
}

fn load_table(path: Option<&Path>) -> Result<CorrectionTable> {
    match path {
        Some(path) => CorrectionTable::load(path)
            .with_context(|| format!("failed to load correction table {}", path.display())),
        None => CorrectionTable::builtin().context("built-in correction table is invalid"),
    }
}

fn warn_duplicate_records(dataset: &Dataset, table: &CorrectionTable) {
    for id in dataset.duplicate_ids() {
        if table.iter().any(|entry| entry.id == id) {
            tracing::warn!(id, "dataset holds this id more than once; only the first is corrected");
        }
    }
}

fn report_json(cli: &Cli, dataset: &Dataset, report: &CorrectionReport) -> Result<Value> {
    let mut value = serde_json::to_value(report).context("failed to serialize correction report")?;
    if let Value::Object(object) = &mut value {
        object.insert("dataset".to_string(), path_value(&cli.dataset));
        object.insert(
            "changelog".to_string(),
            if cli.dry_run { Value::Null } else { path_value(&cli.changelog) },
        );
        object.insert("dry_run".to_string(), Value::Bool(cli.dry_run));
        object.insert("records".to_string(), serde_json::json!(dataset.len()));
    }
    Ok(value)
}

/// Paths are reported lossily so non-UTF-8 names still produce output.
fn path_value(path: &Path) -> Value {
    Value::String(path.display().to_string())
}

fn with_contract_version(value: Value) -> Value {
    match value {
        Value::Object(mut object) => {
            object.insert(
                "contract_version".to_string(),
                Value::String(CLI_CONTRACT_VERSION.to_string()),
            );
            Value::Object(object)
        }
        other => serde_json::json!({
            "contract_version": CLI_CONTRACT_VERSION,
            "payload": other
        }),
    }
}

fn emit_json(value: Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&with_contract_version(value))?);
    Ok(())
}

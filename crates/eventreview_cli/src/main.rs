//! `eventreview`: batch front-end for the event review report.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use eventreview_pipeline::{
    EnumReportFormat, ManagerDirectory, RecordTable, SpecReportOptions, SpecRunParams,
    run_event_report,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Build one event review workbook from an Arrow IPC export.
#[derive(Debug, Parser)]
#[command(name = "eventreview", version, about)]
struct Args {
    /// Constituent export as an Arrow IPC file.
    #[arg(long)]
    input: PathBuf,

    /// Manager directory as a JSON object keyed by manager name.
    #[arg(long)]
    managers: PathBuf,

    /// Report format: broad (uif), full (eng) or flagged (event flag).
    #[arg(long, env = "EVENTREVIEW_FORMAT", value_parser = parse_format)]
    format: EnumReportFormat,

    /// Destination path; its stem is `<event>_<date>`.
    #[arg(long)]
    dest: PathBuf,

    /// Event identifier shown in the summary title.
    #[arg(long)]
    event_id: String,

    /// Optional JSON overrides for column names, ranges and labels.
    #[arg(long, env = "EVENTREVIEW_OPTIONS")]
    options: Option<PathBuf>,
}

fn parse_format(txt: &str) -> Result<EnumReportFormat, String> {
    txt.parse().map_err(|err: eventreview_pipeline::ReportError| err.to_string())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let v_ipc = fs::read(&args.input)
        .with_context(|| format!("failed to read input {}", args.input.display()))?;
    let table = RecordTable::from_ipc_bytes(&v_ipc)
        .with_context(|| format!("failed to decode input {}", args.input.display()))?;

    let txt_managers = fs::read_to_string(&args.managers)
        .with_context(|| format!("failed to read managers {}", args.managers.display()))?;
    let directory = ManagerDirectory::from_json_str(&txt_managers)
        .with_context(|| format!("failed to parse managers {}", args.managers.display()))?;

    let options = match &args.options {
        Some(path) => {
            let txt = fs::read_to_string(path)
                .with_context(|| format!("failed to read options {}", path.display()))?;
            SpecReportOptions::from_json_str(&txt)
                .with_context(|| format!("failed to parse options {}", path.display()))?
        }
        None => SpecReportOptions::default(),
    };

    let params = SpecRunParams::new(args.format, &args.dest, &args.event_id);
    let report = run_event_report(&table, &directory, &params, &options)
        .with_context(|| format!("{} report failed", args.format))?;

    info!(sheets = ?report.sheets, "done");
    println!("{report}");
    Ok(())
}

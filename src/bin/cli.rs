//! `air-sample`: batch-ingest measurement files into a CSV record table and print statistics.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use air_sample_ingest::ingestion::{
    ingest_paths, ExcelSheetSelection, FileOutcome, IngestionFormat, IngestionOptions, TracingObserver,
};
use air_sample_ingest::processing::{overview, summarize, TableOverview, TableSummary};
use air_sample_ingest::table::RecordTable;
use air_sample_ingest::types::{CollectionMetadata, Period, Variable};
use air_sample_ingest::{IngestionError, IngestionResult};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;

#[derive(Debug, Parser)]
#[command(
    name = "air-sample",
    version,
    about = "Average temperature/humidity/CO2 uploads into a per-site record table"
)]
struct Args {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Ingest files (one record per file) and append them to a record table
    Ingest(IngestArgs),
    /// Print counts and summary statistics of a record table
    Stats(StatsArgs),
}

#[derive(Debug, Parser)]
struct IngestArgs {
    /// Collection site shared by every file
    #[arg(long)]
    site: String,

    /// Collection date (YYYY-MM-DD)
    #[arg(long)]
    date: NaiveDate,

    /// Collection period (manha/Manhã or tarde/Tarde)
    #[arg(long, value_parser = parse_period)]
    period: Period,

    /// Existing record table to append to (created if missing)
    #[arg(long, value_name = "CSV")]
    table: Option<PathBuf>,

    /// Where to write the resulting table; defaults to --table, else stdout
    #[arg(short, long, value_name = "CSV")]
    output: Option<PathBuf>,

    /// Worksheet to read from spreadsheets (default: first sheet)
    #[arg(long)]
    sheet: Option<String>,

    /// Only accept .csv uploads
    #[arg(long)]
    csv_only: bool,

    /// Print the batch report as JSON (stdout when the table goes to a file, else stderr)
    #[arg(long)]
    json: bool,

    /// Files or glob patterns
    #[arg(required = true)]
    files: Vec<String>,
}

#[derive(Debug, Parser)]
struct StatsArgs {
    /// Record table written by `ingest`
    table: PathBuf,

    /// Restrict statistics to one site
    #[arg(long)]
    site: Option<String>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct BatchJson {
    succeeded: usize,
    failed: usize,
    errors: Vec<String>,
    records: usize,
}

#[derive(Debug, Serialize)]
struct StatsJson<'a> {
    site: Option<&'a str>,
    overview: TableOverview,
    summary: Option<TableSummary>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    setup_logging(args.verbose);

    let result = match args.command {
        Command::Ingest(a) => run_ingest(a),
        Command::Stats(a) => run_stats(a),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(verbose: u8) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("air_sample_ingest={level},air_sample={level}")));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

fn run_ingest(args: IngestArgs) -> IngestionResult<ExitCode> {
    let mut table = match &args.table {
        Some(path) if path.exists() => RecordTable::read_csv(File::open(path)?)?,
        _ => RecordTable::new(),
    };

    let mut options = IngestionOptions {
        observer: Some(Arc::new(TracingObserver)),
        ..Default::default()
    };
    if let Some(sheet) = args.sheet.clone() {
        options.excel_sheet_selection = ExcelSheetSelection::Sheet(sheet);
    }
    if args.csv_only {
        options.accepted_formats = vec![IngestionFormat::Delimited];
    }

    let metadata = CollectionMetadata::new(args.date, args.site.clone(), args.period);
    let report = ingest_paths(expand_inputs(&args.files), &metadata, &options);
    let appended = report.append_to(&mut table);
    let destination = args.output.as_ref().or(args.table.as_ref());

    if args.json {
        let out = BatchJson {
            succeeded: report.success_count(),
            failed: report.failure_count(),
            errors: report.error_messages(),
            records: table.len(),
        };
        let json = to_json(&out)?;
        // Stdout carries the table itself when no destination file is given.
        if destination.is_some() {
            println!("{json}");
        } else {
            eprintln!("{json}");
        }
    } else {
        for outcome in &report.outcomes {
            match outcome {
                FileOutcome::Ingested { filename, record } => eprintln!(
                    "ok    {filename}: T={:.2} UR={:.2} CO2={:.2}",
                    record.temperature(),
                    record.humidity(),
                    record.co2()
                ),
                FileOutcome::Failed(failure) => eprintln!("fail  {failure}"),
            }
        }
        eprintln!("{}", report.summary());
        eprintln!("{appended} record(s) appended, table now has {}", table.len());
    }

    match destination {
        Some(path) => table.write_csv(File::create(path)?)?,
        None => table.write_csv(std::io::stdout().lock())?,
    }

    Ok(if report.failure_count() == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run_stats(args: StatsArgs) -> IngestionResult<ExitCode> {
    let table = RecordTable::read_csv(File::open(&args.table)?)?;
    let records: Vec<_> = match &args.site {
        Some(site) => table.for_site(site),
        None => table.records().iter().collect(),
    };

    let ov = overview(records.iter().copied());
    let summary = summarize(records.iter().copied());

    if args.json {
        let out = StatsJson {
            site: args.site.as_deref(),
            overview: ov,
            summary,
        };
        println!("{}", to_json(&out)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("records: {}", ov.total);
    println!("sites:   {}", ov.distinct_sites);
    println!("dates:   {}", ov.distinct_dates);
    for (period, n) in &ov.per_period {
        println!("  {period}: {n}");
    }
    for (site, n) in &ov.per_site {
        println!("  {site}: {n}");
    }

    match summary {
        Some(s) => {
            println!();
            println!("{:<18} {:>10} {:>10} {:>10} {:>10}", "variable", "mean", "min", "max", "std");
            for v in Variable::ALL {
                let vs = s.get(v);
                let std = vs.std_dev.map(|d| format!("{d:.2}")).unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<18} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                    v.display_name(),
                    vs.mean,
                    vs.min,
                    vs.max,
                    std
                );
            }
        }
        None => println!("no records"),
    }
    Ok(ExitCode::SUCCESS)
}

fn parse_period(raw: &str) -> Result<Period, String> {
    raw.parse().map_err(|e: IngestionError| e.to_string())
}

/// Expand glob patterns; a pattern with no matches is kept as a literal path so the batch
/// reports it with its read error.
fn expand_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for pattern in patterns {
        let matches: Vec<PathBuf> = match glob::glob(pattern) {
            Ok(paths) => paths.filter_map(Result::ok).collect(),
            Err(e) => {
                tracing::warn!(pattern = %pattern, error = %e, "invalid glob pattern");
                Vec::new()
            }
        };
        if matches.is_empty() {
            out.push(Path::new(pattern).to_path_buf());
        } else {
            out.extend(matches);
        }
    }
    out
}

fn to_json<T: Serialize>(value: &T) -> IngestionResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| IngestionError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

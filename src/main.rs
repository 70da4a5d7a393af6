//! Tallysheet - evaluate spreadsheet cells from the command line.
//!
//! Each positional argument assigns raw text to a cell (`A1=5`, `B1==A1*2`).
//! Assignments are committed in order through the same edit protocol an
//! interactive front end would use, then the sheet is printed.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use tallysheet_core::{
    CellId, CellRecord, Config, Document, RecomputeStats, TokenizePolicy, parse_assignment,
    parse_column,
};

const LOG_ENV: &str = "TALLYSHEET_LOG";

#[derive(Parser, Debug)]
#[command(version, about = "Evaluate spreadsheet cells and print their values.")]
struct Args {
    /// Cell assignments, e.g. `A1=5` or `B1==A1*2`.
    #[arg(value_name = "ID=VALUE")]
    assignments: Vec<String>,

    /// Config file. Defaults to config.toml in the platform config directory.
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Pass cap for recomputation. Overrides the config file.
    #[arg(long, value_name = "N")]
    max_iterations: Option<usize>,

    /// Ignore characters the tokenizer does not recognize.
    #[arg(long)]
    lenient: bool,

    /// Load every assignment first and evaluate once, instead of committing
    /// them one at a time.
    #[arg(long)]
    bulk: bool,

    /// Delete a row after the assignments (repeatable).
    #[arg(long = "delete-row", value_name = "ROW", value_parser = clap::value_parser!(u32).range(1..))]
    delete_rows: Vec<u32>,

    /// Delete a column, given as letters, after the assignments (repeatable).
    #[arg(long = "delete-column", value_name = "COL")]
    delete_columns: Vec<String>,

    /// Recompute the whole sheet before printing and report the result.
    #[arg(long)]
    recompute: bool,

    /// Print JSON instead of tab-separated lines.
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct CellOutput<'a> {
    id: CellId,
    #[serde(flatten)]
    record: &'a CellRecord,
}

#[derive(Serialize)]
struct Output<'a> {
    cells: Vec<CellOutput<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<RecomputeStats>,
}

fn default_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "tallysheet")?;
    Some(proj.config_dir().join("config.toml"))
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => match default_config_path() {
            Some(path) => Config::load_or_default(&path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => Config::default(),
        },
    };
    if let Some(max) = args.max_iterations {
        config.max_iterations = max;
    }
    if args.lenient {
        config.tokenizer = TokenizePolicy::Lenient;
    }
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    tracing::debug!(?config, "starting");

    let assignments = args
        .assignments
        .iter()
        .map(|text| parse_assignment(text))
        .collect::<tallysheet_core::Result<Vec<_>>>()?;
    let columns = args
        .delete_columns
        .iter()
        .map(|text| parse_column(text))
        .collect::<tallysheet_core::Result<Vec<_>>>()?;

    let mut doc = Document::with_config(config);
    let mut stats = None;
    if args.bulk {
        stats = Some(doc.load_cells(assignments));
    } else {
        for (id, raw) in assignments {
            doc.set_cell_from_input(id, &raw);
        }
    }
    for row in &args.delete_rows {
        doc.delete_row(*row);
    }
    for col in columns {
        doc.delete_column(col);
    }
    if args.recompute {
        stats = Some(doc.recalculate());
    }

    if args.json {
        let output = Output {
            cells: doc
                .sheet
                .iter()
                .map(|(id, record)| CellOutput { id: *id, record })
                .collect(),
            stats,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for (id, record) in doc.sheet.iter() {
            println!("{}\t{}\t{}", id, record.raw, record.value);
        }
        if let Some(stats) = stats {
            eprintln!(
                "iterations: {}, stable: {}, valid: {}, errors: {}",
                stats.iterations, stats.stable, stats.valid_count, stats.error_count
            );
        }
    }
    Ok(())
}

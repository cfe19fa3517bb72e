//! Unthrow CLI - redundant-throws analyzer for program snapshots.

mod config;
mod formatters;

use anyhow::{Context, Result};
use clap::Parser;
use config::CliConfig;
use formatters::{Formatter, HumanFormatter, JsonFormatter};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use unthrow_core::{MemoryHost, Program};
use unthrow_engine::{Analysis, Analyzer, AnalyzerOptions};

#[derive(Parser, Debug)]
#[command(name = "unthrow")]
#[command(about = "Finds throws declarations for checked exceptions that can never be thrown", long_about = None)]
struct Cli {
    /// Program snapshot to analyze (JSON)
    #[arg(value_name = "SNAPSHOT")]
    snapshot: PathBuf,

    /// Output format
    #[arg(short, long = "output", value_enum, default_value = "human")]
    format: OutputFormat,

    /// Output JSON format (alias for --output json)
    #[arg(long)]
    json: bool,

    /// Apply every confirmed fix and write the fixed snapshot to --out
    #[arg(long, requires = "out")]
    fix: bool,

    /// Where to write the fixed snapshot
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,

    /// Skip methods the snapshot marks as entry points
    #[arg(long)]
    ignore_entry_points: bool,

    /// Maximum override count enumerated per method
    #[arg(long, value_name = "N")]
    budget: Option<usize>,

    /// Configuration file path (defaults to .unthrow.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let options = resolve_options(&cli)?;

    let json = std::fs::read_to_string(&cli.snapshot)
        .with_context(|| format!("Failed to read snapshot: {}", cli.snapshot.display()))?;
    let program = Program::from_json(&json)
        .with_context(|| format!("Failed to parse snapshot: {}", cli.snapshot.display()))?;

    let host = MemoryHost::new(program);
    let analyzer = Analyzer::new(&host, options);

    let analysis = if cli.fix {
        run_fixes(&analyzer, &host)?
    } else {
        analyzer.analyze(&host.snapshot())?
    };

    let formatter: Box<dyn Formatter> = match (cli.json, cli.format) {
        (true, _) | (_, OutputFormat::Json) => Box::new(JsonFormatter),
        (_, OutputFormat::Human) => Box::new(HumanFormatter),
    };
    formatter.format(&analysis);

    if cli.fix {
        // clap guarantees --out is present alongside --fix.
        let out = cli.out.as_deref().context("--fix requires --out")?;
        let fixed = host.snapshot().to_json()?;
        std::fs::write(out, fixed)
            .with_context(|| format!("Failed to write fixed snapshot: {}", out.display()))?;
        println!("Wrote fixed snapshot to {}", out.display());
    }
    Ok(())
}

/// Applies confirmed fixes one at a time, re-analyzing between fixes so
/// every plan is made against the current snapshot. Terminates because
/// each fix removes at least one throws-list entry.
fn run_fixes(analyzer: &Analyzer, host: &MemoryHost) -> Result<Analysis> {
    let mut fixed = 0usize;
    loop {
        let program = host.snapshot();
        let analysis = analyzer.analyze(&program)?;
        let Some(problem) = analysis.problems.first() else {
            if fixed > 0 {
                println!("Applied {} fix(es).", fixed);
            }
            return Ok(analysis);
        };
        analyzer.apply_fix(&program, problem)?;
        fixed += 1;
    }
}

fn resolve_options(cli: &Cli) -> Result<AnalyzerOptions> {
    let config = match &cli.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::load_default()?,
    };
    let mut options = config.to_options();
    // Command-line flags win over the config file.
    if cli.ignore_entry_points {
        options.ignore_entry_points = true;
    }
    if let Some(budget) = cli.budget {
        options.override_search_budget = budget;
    }
    Ok(options)
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

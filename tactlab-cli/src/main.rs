//! TactLab CLI: replay the allocation strategies over local files.
//!
//! Commands:
//! - `cape`: replay the CAPE allocation over a CAPE data file
//! - `dual-momentum`: replay the dual momentum rotation over a price directory
//! - `inspect-cape`: summarize a CAPE data file

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tactlab_core::cape::WeightBounds;
use tactlab_runner::{
    load_cape_file, run_cape_replay, run_dual_momentum_replay, save_report, PriceLoadOptions,
    ReplayConfig, ReplayReport,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "tactlab",
    about = "TactLab CLI: tactical allocation strategy replays"
)]
struct Cli {
    /// Log at debug level (overrides RUST_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay the CAPE allocation over a CAPE data file.
    Cape {
        /// CAPE data file (field 0 = date, field 16 = CAPE). Overrides `cape.cape_file`.
        #[arg(long)]
        cape_file: Option<PathBuf>,

        /// Path to a TOML replay config.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory for the report bundle.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Replay the dual momentum rotation over per-symbol close files.
    DualMomentum {
        /// Directory holding <SYMBOL>.csv files. Overrides `dual_momentum.prices_dir`.
        #[arg(long)]
        prices: Option<PathBuf>,

        /// Path to a TOML replay config.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Use synthetic data for symbols without a file.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// First replay date (YYYY-MM-DD).
        #[arg(long)]
        start: Option<String>,

        /// Last replay date (YYYY-MM-DD).
        #[arg(long)]
        end: Option<String>,

        /// Output directory for the report bundle.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print record count, skipped rows, date range and CAPE extremes.
    InspectCape {
        #[arg(long)]
        cape_file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Cape {
            cape_file,
            config,
            output,
        } => run_cape_cmd(cape_file, config, output),
        Commands::DualMomentum {
            prices,
            config,
            synthetic,
            start,
            end,
            output,
        } => run_dual_momentum_cmd(prices, config, synthetic, start, end, output),
        Commands::InspectCape { cape_file } => run_inspect_cape(&cape_file),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ReplayConfig> {
    match path {
        Some(path) => ReplayConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(ReplayConfig::default()),
    }
}

fn parse_date(raw: Option<&str>) -> Result<Option<NaiveDate>> {
    raw.map(|s| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD"))
    })
    .transpose()
}

fn run_cape_cmd(
    cape_file: Option<PathBuf>,
    config_path: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config_path.as_deref())?;
    let Some(cape_file) = cape_file.or(config.cape.cape_file.clone()) else {
        bail!("a CAPE file is required: pass --cape-file or set cape.cape_file");
    };

    let series = load_cape_file(&cape_file)?;
    let report = run_cape_replay(&config.cape.strategy, &series)?;
    finish(&report, output.as_deref())
}

fn run_dual_momentum_cmd(
    prices: Option<PathBuf>,
    config_path: Option<PathBuf>,
    synthetic: bool,
    start: Option<String>,
    end: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config_path.as_deref())?;
    let settings = config.dual_momentum;

    let start = parse_date(start.as_deref())?.or(settings.start);
    let end = parse_date(end.as_deref())?.or(settings.end);
    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            bail!("--start ({s}) is after --end ({e})");
        }
    }

    let opts = PriceLoadOptions {
        dir: prices.or(settings.prices_dir),
        start,
        end,
        synthetic: synthetic || settings.synthetic,
    };
    if opts.dir.is_none() && !opts.synthetic {
        bail!("pass --prices, set dual_momentum.prices_dir, or use --synthetic");
    }

    let report = run_dual_momentum_replay(&settings.strategy, &opts)?;
    finish(&report, output.as_deref())
}

fn run_inspect_cape(cape_file: &Path) -> Result<()> {
    let series = load_cape_file(cape_file)?;

    println!("File:     {}", cape_file.display());
    println!("Records:  {}", series.len());
    println!("Skipped:  {}", series.skipped);
    if let (Some(first), Some(last)) = (series.first(), series.last()) {
        println!("Range:    {} to {}", first.date, last.date);
        if let Some((lo, hi)) = series.value_range() {
            println!("CAPE:     min {lo:.4}, max {hi:.4}");
        }
        let bounds = WeightBounds::default();
        println!(
            "Latest:   {:.4} on {} -> weight {:.4} (bounds {}..{})",
            last.value,
            last.date,
            bounds.weight_for(last.value),
            bounds.lower,
            bounds.upper
        );
    }
    println!("Hash:     {}", series.dataset_hash());
    Ok(())
}

fn finish(report: &ReplayReport, output: Option<&Path>) -> Result<()> {
    print_summary(report);
    if let Some(dir) = output {
        let run_dir = save_report(report, dir)?;
        println!("Report saved to: {}", run_dir.display());
    }
    Ok(())
}

fn print_summary(report: &ReplayReport) {
    println!("\n=== Replay: {} ===", report.strategy);
    println!("Period:       {} to {}", report.start, report.end);
    println!("Data events:  {}", report.data_events);
    println!("Triggers:     {}", report.triggers);
    println!("Rebalances:   {}", report.rebalances.len());
    println!("Errors:       {}", report.errors.len());
    println!("Dataset hash: {}", report.dataset_hash);
    if report.synthetic {
        println!("WARNING: replay used SYNTHETIC data");
    }

    if let Some(last) = report.rebalances.last() {
        println!("\nLatest rebalance ({}):", last.date);
        for target in &last.targets {
            println!("  {:<8} {:>8.4}", target.symbol, target.weight);
        }
    }
    for error in &report.errors {
        println!("  error on {}: {}", error.date, error.message);
    }
}

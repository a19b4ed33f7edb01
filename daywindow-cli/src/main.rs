//! daywindow CLI: inspect series matrices and preview training batches.
//!
//! Commands:
//! - `inspect`: shape, columns, date span and dataset hash of a matrix
//! - `sample`: draw a few random batches (regression or direction) and summarize them
//! - `iterate`: run one deterministic pass and optionally export it as CSV

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use daywindow_core::{load_csv, Batch, GeneratorConfig, SeriesMatrix, WindowIterator};

#[derive(Parser)]
#[command(
    name = "daywindow",
    about = "daywindow CLI: windowed training batches over daily series"
)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where the series matrix comes from.
#[derive(Args, Debug)]
struct Source {
    /// Dense matrix CSV (optional leading `date` column).
    #[arg(long, required_unless_present = "synthetic", conflicts_with = "synthetic")]
    data: Option<PathBuf>,

    /// Use a synthetic ramp matrix with this many rows instead of --data.
    #[arg(long)]
    synthetic: Option<usize>,

    /// Column count of the synthetic matrix.
    #[arg(long, default_value_t = 1)]
    columns: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Report matrix shape, columns, date span and dataset hash.
    Inspect {
        #[command(flatten)]
        source: Source,
    },
    /// Draw random batches and print a summary of each.
    Sample {
        #[command(flatten)]
        source: Source,

        /// Generator config (TOML).
        #[arg(long)]
        config: PathBuf,

        /// Number of batches to draw.
        #[arg(long, default_value_t = 3)]
        batches: usize,

        /// Draw up/down direction labels instead of regression targets.
        #[arg(long, default_value_t = false)]
        direction: bool,
    },
    /// Run one deterministic pass over every start day.
    Iterate {
        #[command(flatten)]
        source: Source,

        /// Generator config (TOML).
        #[arg(long)]
        config: PathBuf,

        /// Write every example of the pass to this CSV file.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Inspect { source } => run_inspect(&source),
        Commands::Sample {
            source,
            config,
            batches,
            direction,
        } => run_sample(&source, &config, batches, direction),
        Commands::Iterate {
            source,
            config,
            output,
        } => run_iterate(&source, &config, output.as_deref()),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_source(source: &Source) -> Result<SeriesMatrix> {
    match (&source.data, source.synthetic) {
        (Some(path), _) => {
            load_csv(path).with_context(|| format!("loading matrix from {}", path.display()))
        }
        (None, Some(rows)) => {
            info!(rows, columns = source.columns, "using synthetic ramp matrix");
            SeriesMatrix::ramp(rows, source.columns).context("building synthetic matrix")
        }
        (None, None) => anyhow::bail!("one of --data or --synthetic is required"),
    }
}

fn load_config(path: &Path) -> Result<GeneratorConfig> {
    GeneratorConfig::from_file(path)
        .with_context(|| format!("loading generator config from {}", path.display()))
}

fn run_inspect(source: &Source) -> Result<()> {
    let matrix = load_source(source)?;

    println!();
    println!("=== Series Matrix ===");
    println!("Rows:           {}", matrix.n_rows());
    println!("Columns:        {}", matrix.n_cols());
    match (matrix.start_date(), matrix.end_date()) {
        (Some(start), Some(end)) => println!("Period:         {start} to {end}"),
        _ => println!("Period:         (no calendar)"),
    }
    println!("Dataset hash:   {}", matrix.dataset_hash());
    println!();
    println!("{:<5} {:<24}", "Index", "Column");
    println!("{}", "-".repeat(30));
    for (i, name) in matrix.columns().iter().enumerate() {
        println!("{i:<5} {name:<24}");
    }
    println!();
    Ok(())
}

fn run_sample(source: &Source, config_path: &Path, batches: usize, direction: bool) -> Result<()> {
    let matrix = load_source(source)?;
    let config = load_config(config_path)?;
    let fingerprint = config.fingerprint(&matrix)?;
    debug!(id = %fingerprint.id(), "stream fingerprint");

    let drawn: Vec<Batch> = if direction {
        let sampler = config.direction_sampler(&matrix)?;
        print_header("Direction Sampler", sampler.pool().len(), &fingerprint.id());
        sampler.take(batches).collect()
    } else {
        let sampler = config.window_sampler(&matrix)?;
        print_header("Window Sampler", sampler.pool().len(), &fingerprint.id());
        sampler.take(batches).collect()
    };

    for (i, batch) in drawn.iter().enumerate() {
        print_batch(i, batch, config.reference_column, direction);
    }
    println!();
    Ok(())
}

fn run_iterate(source: &Source, config_path: &Path, output: Option<&Path>) -> Result<()> {
    let matrix = load_source(source)?;
    let config = load_config(config_path)?;
    let iterator = config.window_iterator(&matrix)?;
    let fingerprint = config.fingerprint(&matrix)?;

    println!();
    println!("=== Window Iterator ===");
    println!("Start-day limit:{}", iterator.bounds().limit());
    println!("Batches:        {}", iterator.num_batches());
    println!("Covered days:   {}", iterator.covered_days().len());
    println!("Fingerprint:    {}", fingerprint.id());

    if let Some(path) = output {
        let file = File::create(path)
            .with_context(|| format!("creating export file {}", path.display()))?;
        let rows = write_pass(file, &matrix, iterator)?;
        println!("Exported:       {rows} example(s) to {}", path.display());
    }
    println!();
    Ok(())
}

fn print_header(kind: &str, pool: usize, id: &str) {
    println!();
    println!("=== {kind} ===");
    println!("Start days:     {pool}");
    println!("Fingerprint:    {id}");
}

/// Summarize a batch by the first learn value of the reference column and
/// the targets of up to four examples.
fn print_batch(index: usize, batch: &Batch, reference_column: usize, direction: bool) {
    println!();
    println!("--- Batch {index} ({} examples) ---", batch.len());
    if direction {
        let ups = batch.targets.iter().filter(|&&y| y > 0.5).count();
        println!("Up labels:      {ups}/{}", batch.len());
    }
    for slot in 0..batch.len().min(4) {
        let first = batch.inputs[[slot, 0, reference_column]];
        let targets: Vec<String> = batch
            .targets
            .row(slot)
            .iter()
            .map(|v| format!("{v:.4}"))
            .collect();
        println!("  [{slot}] x0={first:<12.4} y=[{}]", targets.join(", "));
    }
}

/// Write one row per example: batch, slot, start day, optional date, then
/// every input value (`x{j}_{column}`) and every target (`y{k}`).
fn write_pass<W: Write>(
    writer: W,
    matrix: &SeriesMatrix,
    iterator: WindowIterator<'_>,
) -> Result<usize> {
    let mut out = csv::Writer::from_writer(writer);
    let days = iterator.covered_days().to_vec();
    let mut rows = 0usize;

    for (b, batch) in iterator.enumerate() {
        if b == 0 {
            out.write_record(header(matrix, &batch))?;
        }
        let (size, learn_len, cols) = batch.inputs.dim();
        for slot in 0..size {
            let start = days[b * size + slot];
            let mut record = vec![b.to_string(), slot.to_string(), start.to_string()];
            if matrix.start_date().is_some() {
                record.push(
                    matrix
                        .date_of(start)
                        .map(|d| d.to_string())
                        .unwrap_or_default(),
                );
            }
            for j in 0..learn_len {
                for c in 0..cols {
                    record.push(batch.inputs[[slot, j, c]].to_string());
                }
            }
            record.extend(batch.targets.row(slot).iter().map(|v| v.to_string()));
            out.write_record(&record)?;
            rows += 1;
        }
    }
    out.flush()?;
    Ok(rows)
}

fn header(matrix: &SeriesMatrix, batch: &Batch) -> Vec<String> {
    let (_, learn_len, _) = batch.inputs.dim();
    let mut names = vec!["batch".to_string(), "slot".into(), "start_day".into()];
    if matrix.start_date().is_some() {
        names.push("date".into());
    }
    for j in 0..learn_len {
        for column in matrix.columns() {
            names.push(format!("x{j}_{column}"));
        }
    }
    names.extend((0..batch.targets.ncols()).map(|k| format!("y{k}")));
    names
}

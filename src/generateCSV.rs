use std::fs::{create_dir_all, File};
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use metro_dash::logger::init_logger;
use metro_dash::records::load_hourly;
use metro_dash::DashboardConfig;

/// Writes `Hour,Weekday,Weekend`: ridership per hour averaged over all stations.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value = ".")]
    base_dir: PathBuf,
    /// Defaults to `<output_dir>/hourly_patterns.csv`.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_logger();
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => DashboardConfig::load(path)?,
        None => DashboardConfig::with_base_dir(&args.base_dir),
    };
    let output_file_path = args
        .output
        .clone()
        .unwrap_or_else(|| config.output_dir.join("hourly_patterns.csv"));
    if let Some(parent) = output_file_path.parent() {
        create_dir_all(parent)?;
    }

    let hourly = load_hourly(config.hourly_path()).context("loading hourly ridership")?;
    if hourly.is_empty() {
        anyhow::bail!("'{}' has no stations", config.hourly_path().display());
    }

    let mut file = File::create(&output_file_path)
        .with_context(|| format!("creating {}", output_file_path.display()))?;
    writeln!(file, "Hour,Weekday,Weekend")?; // Writing the header
    for (hour, weekday, weekend) in hourly.network_average() {
        writeln!(file, "{},{:.2},{:.2}", hour, weekday, weekend)?;
    }

    println!(
        "Hourly patterns for {} stations saved in '{}'.",
        hourly.rows().len(),
        output_file_path.display()
    );
    Ok(())
}

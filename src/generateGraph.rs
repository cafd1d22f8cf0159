use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use metro_dash::charts::{self, Series, WEEKDAY_COLOUR};
use metro_dash::logger::init_logger;
use metro_dash::records::{load_hourly, load_stations, StationRecord};
use metro_dash::stats::histogram;
use metro_dash::DashboardConfig;
use plotters::style::RGBColor;

const HISTOGRAM_BINS: usize = 30;

/// Renders the static data-analysis charts shown on the insights view.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value = ".")]
    base_dir: PathBuf,
}

type Job<'a> = (&'static str, Box<dyn Fn(&PathBuf) -> metro_dash::Result<()> + 'a>);

fn job<'a>(file: &'static str, draw: impl Fn(&PathBuf) -> metro_dash::Result<()> + 'a) -> Job<'a> {
    (file, Box::new(draw))
}

fn main() -> Result<()> {
    init_logger();
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => DashboardConfig::load(path)?,
        None => DashboardConfig::with_base_dir(&args.base_dir),
    };
    let output_dir = config.data_analysis_graphs_dir();

    let stations = load_stations(config.stations_path()).context("loading station dataset")?;
    // The hourly chart is optional; the other charts only need stations.
    let hourly = match load_hourly(config.hourly_path()) {
        Ok(table) => Some(table),
        Err(err) => {
            eprintln!("Skipping hourly pattern chart: {}", err);
            None
        }
    };

    let mut jobs: Vec<Job> = vec![
        job(
            "01_daily_ridership_distribution.png",
            |path: &PathBuf| {
                let ridership: Vec<f64> = stations.iter().map(|s| s.daily_ridership as f64).collect();
                charts::histogram_chart(
                    path,
                    "Daily Ridership Distribution",
                    "Daily Ridership",
                    &histogram(&ridership, HISTOGRAM_BINS),
                )
            },
        ),
        job(
            "02_ridership_by_distance.png",
            |path: &PathBuf| {
                charts::scatter_chart(
                    path,
                    "Ridership by Distance from First Station",
                    ("Distance from First Station (km)", "Daily Ridership"),
                    &group_by_line(&stations, |s| Some(s.distance_from_first_km)),
                )
            },
        ),
        job(
            "03_ridership_by_line.png",
            |path: &PathBuf| {
                charts::bar_chart(
                    path,
                    "Total Daily Ridership by Line",
                    "Daily Ridership",
                    &total_by_line(&stations),
                    RGBColor(0, 31, 63),
                )
            },
        ),
    ];
    if stations.iter().any(|s| s.station_age.is_some()) {
        jobs.push(job(
            "04_ridership_by_station_age.png",
            |path: &PathBuf| {
                charts::scatter_chart(
                    path,
                    "Ridership by Station Age",
                    ("Station Age (years)", "Daily Ridership"),
                    &group_by_line(&stations, |s| s.station_age),
                )
            },
        ));
    }
    if let Some(hourly) = &hourly {
        jobs.push(job(
            "05_average_hourly_patterns.png",
            move |path: &PathBuf| {
                let average = hourly.network_average();
                let series = [
                    Series {
                        label: "Weekday".into(),
                        colour: WEEKDAY_COLOUR,
                        points: average.iter().map(|(h, wd, _)| (*h as i32, *wd)).collect(),
                    },
                    Series {
                        label: "Weekend".into(),
                        colour: RGBColor(255, 165, 0),
                        points: average.iter().map(|(h, _, we)| (*h as i32, *we)).collect(),
                    },
                ];
                charts::hourly_chart(path, "Average Hourly Ridership Patterns", "Average Ridership", &series)
            },
        ));
    }

    let pb = ProgressBar::new(jobs.len() as u64);
    pb.set_message("Rendering charts...");
    pb.set_style(ProgressStyle::default_bar()
        .template("{msg} {wide_bar} {pos}/{len} ({eta})")
        .progress_chars("█▒░"));
    pb.enable_steady_tick(100);

    for (file, draw) in &jobs {
        let path = output_dir.join(file);
        draw(&path).with_context(|| format!("rendering {}", path.display()))?;
        pb.inc(1);
    }
    pb.finish_with_message("Charts generated successfully.");

    println!("Analysis graphs saved in '{}'.", output_dir.display());
    Ok(())
}

/// Scatter points `(x, daily ridership)` grouped by metro line, sorted by line.
fn group_by_line(
    stations: &[StationRecord],
    x: impl Fn(&StationRecord) -> Option<f64>,
) -> Vec<(String, Vec<(f64, f64)>)> {
    let mut groups: BTreeMap<String, Vec<(f64, f64)>> = BTreeMap::new();
    for station in stations {
        if let Some(value) = x(station) {
            groups
                .entry(station.metro_line.clone())
                .or_default()
                .push((value, station.daily_ridership as f64));
        }
    }
    groups.into_iter().collect()
}

fn total_by_line(stations: &[StationRecord]) -> Vec<(String, f64)> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for station in stations {
        *totals.entry(station.metro_line.clone()).or_insert(0.0) += station.daily_ridership as f64;
    }
    totals.into_iter().collect()
}

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use metro_dash::logger::init_logger;
use metro_dash::realtime::SystemClock;
use metro_dash::scenario::{
    CONNECTIVITY_RANGE, DEFAULT_LATITUDE, DEFAULT_LONGITUDE, DISTANCE_RANGE, STATION_AGE_RANGE,
    STATION_DENSITY_RANGE,
};
use metro_dash::views::{Dashboard, ViewRequest};
use metro_dash::{DashboardConfig, MetroLine, ScenarioInput};

#[derive(Parser, Debug)]
#[command(name = "metroDash", version, about = "Delhi Metro ridership dashboard")]
struct Cli {
    /// TOML configuration; paths inside it are relative to the file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Root for data/, models/, assets/ and output/ when no config is given.
    #[arg(long, global = true, default_value = ".")]
    base_dir: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Key network metrics.
    Home,
    /// Serves the interactive station map.
    Map {
        /// Rebuild the map document from the station dataset.
        #[arg(long)]
        regenerate: bool,
        /// Write the document here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Dataset overview, summary statistics and analysis graphs.
    Insights,
    /// Model performance metrics and comparison charts.
    Models,
    /// Ridership at a station for the current hour.
    Realtime {
        /// Station name; defaults to the first station alphabetically.
        #[arg(long)]
        station: Option<String>,
    },
    /// Predicts daily ridership for a what-if station.
    Simulate(ScenarioArgs),
    /// Renders every view in menu order.
    All,
}

#[derive(Args, Debug)]
struct ScenarioArgs {
    /// Station age in years.
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(i64).range(STATION_AGE_RANGE.0..=STATION_AGE_RANGE.1))]
    station_age: i64,
    /// Metro line label, e.g. "Blue Line" or "magenta".
    #[arg(long, default_value = "Red Line")]
    line: MetroLine,
    /// Distance from the line's first station in km.
    #[arg(long, default_value_t = 5.0, value_parser = parse_distance)]
    distance: f64,
    #[arg(long, default_value_t = DEFAULT_LATITUDE, allow_negative_numbers = true)]
    latitude: f64,
    #[arg(long, default_value_t = DEFAULT_LONGITUDE, allow_negative_numbers = true)]
    longitude: f64,
    /// Number of lines meeting at the station.
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(i64).range(CONNECTIVITY_RANGE.0..=CONNECTIVITY_RANGE.1))]
    connectivity: i64,
    /// Number of metro stations within a 2 km radius.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(i64).range(STATION_DENSITY_RANGE.0..=STATION_DENSITY_RANGE.1))]
    station_density: i64,
}

fn parse_distance(raw: &str) -> std::result::Result<f64, String> {
    let value: f64 = raw.parse().map_err(|_| format!("'{}' is not a number", raw))?;
    let (min, max) = DISTANCE_RANGE;
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{} is outside {}..={}", value, min, max))
    }
}

impl From<ScenarioArgs> for ScenarioInput {
    fn from(args: ScenarioArgs) -> Self {
        ScenarioInput {
            station_age: args.station_age,
            metro_line: args.line,
            distance_from_first_station: args.distance,
            latitude: args.latitude,
            longitude: args.longitude,
            connectivity: args.connectivity,
            station_density: args.station_density,
        }
    }
}

fn main() -> Result<()> {
    init_logger();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => DashboardConfig::load(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => DashboardConfig::with_base_dir(&cli.base_dir),
    };
    let dashboard = Dashboard::new(config, Box::new(SystemClock));

    let output = match cli.command {
        Commands::All => dashboard.render_all(),
        Commands::Home => dashboard.render(&ViewRequest::Home),
        Commands::Map { regenerate, output } => dashboard.render(&ViewRequest::Map { regenerate, output }),
        Commands::Insights => dashboard.render(&ViewRequest::DataInsights),
        Commands::Models => dashboard.render(&ViewRequest::ModelComparisons),
        Commands::Realtime { station } => dashboard.render(&ViewRequest::RealTime { station }),
        Commands::Simulate(args) => dashboard.render(&ViewRequest::Scenario(args.into())),
    };
    print!("{}", output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_bounds_are_inclusive() {
        assert_eq!(parse_distance("0"), Ok(0.0));
        assert_eq!(parse_distance("50"), Ok(50.0));
        assert!(parse_distance("50.1").is_err());
        assert!(parse_distance("far").is_err());
    }

    #[test]
    fn scenario_flags_are_range_checked() {
        let cli = Cli::try_parse_from(["metroDash", "simulate", "--line", "blue", "--connectivity", "10"]).unwrap();
        match cli.command {
            Commands::Simulate(args) => {
                let input = ScenarioInput::from(args);
                assert_eq!(input.metro_line, MetroLine::Blue);
                assert_eq!(input.connectivity, 10);
                assert_eq!(input.station_age, 10);
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(Cli::try_parse_from(["metroDash", "simulate", "--station-age", "101"]).is_err());
        assert!(Cli::try_parse_from(["metroDash", "simulate", "--connectivity", "0"]).is_err());
        assert!(Cli::try_parse_from(["metroDash", "simulate", "--station-density", "11"]).is_err());
    }
}

//! The six dashboard views, rendered as plain text plus PNG side files.
//!
//! A view that fails renders its error in place of its body; other views are
//! unaffected.

use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::charts::{self, Series, LIGHT_GREEN, SALMON, SKY_BLUE, WEEKDAY_COLOUR, WEEKEND_COLOUR};
use crate::config::DashboardConfig;
use crate::error::{DashboardError, Result};
use crate::map::{read_map_document, write_station_geojson};
use crate::realtime::{local_time, ridership_at, Clock, RidershipColumn};
use crate::records::{load_hourly, load_model_performance, load_stations, ModelPerformance};
use crate::scenario::{PredictionResult, RidershipCategory, ScenarioInput, ScenarioSimulator};
use crate::stats::{describe, KeyMetrics};

/// Graphs shown in their own model section rather than under cross-validation.
pub const MODEL_SECTION_GRAPHS: [&str; 6] = [
    "xgboost_feature_importance.png",
    "xgboost_actual_vs_predicted.png",
    "linear_regression_actual_vs_predicted.png",
    "linear_regression_coefficients.png",
    "ensemble_actual_vs_predicted.png",
    "model_comparison.png",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Home,
    Map,
    DataInsights,
    ModelComparisons,
    RealTimeAnalysis,
    ScenarioSimulations,
}

impl View {
    pub const ALL: [View; 6] = [
        View::Home,
        View::Map,
        View::DataInsights,
        View::ModelComparisons,
        View::RealTimeAnalysis,
        View::ScenarioSimulations,
    ];

    pub fn title(self) -> &'static str {
        match self {
            View::Home => "Home",
            View::Map => "Map Visualization",
            View::DataInsights => "Data Insights",
            View::ModelComparisons => "Model Comparisons",
            View::RealTimeAnalysis => "Real-Time Analysis",
            View::ScenarioSimulations => "Scenario Simulations",
        }
    }

    pub fn summary(self) -> &'static str {
        match self {
            View::Home => "Key network metrics.",
            View::Map => "Explore the interactive map of all metro stations.",
            View::DataInsights => "View trends and patterns in metro ridership data.",
            View::ModelComparisons => "Compare the regression models behind the predictions.",
            View::RealTimeAnalysis => "Ridership at a station for the current hour.",
            View::ScenarioSimulations => "Simulate and forecast ridership for any station.",
        }
    }
}

/// A view together with its inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewRequest {
    Home,
    Map { regenerate: bool, output: Option<PathBuf> },
    DataInsights,
    ModelComparisons,
    RealTime { station: Option<String> },
    Scenario(ScenarioInput),
}

impl ViewRequest {
    pub fn view(&self) -> View {
        match self {
            ViewRequest::Home => View::Home,
            ViewRequest::Map { .. } => View::Map,
            ViewRequest::DataInsights => View::DataInsights,
            ViewRequest::ModelComparisons => View::ModelComparisons,
            ViewRequest::RealTime { .. } => View::RealTimeAnalysis,
            ViewRequest::Scenario(_) => View::ScenarioSimulations,
        }
    }

    /// The request each view receives when nothing is specified.
    pub fn default_for(view: View) -> Self {
        match view {
            View::Home => ViewRequest::Home,
            View::Map => ViewRequest::Map {
                regenerate: false,
                output: None,
            },
            View::DataInsights => ViewRequest::DataInsights,
            View::ModelComparisons => ViewRequest::ModelComparisons,
            View::RealTimeAnalysis => ViewRequest::RealTime { station: None },
            View::ScenarioSimulations => ViewRequest::Scenario(ScenarioInput::default()),
        }
    }
}

/// Serves the views. The scenario simulator, with its artifacts and
/// thresholds, is built once here and reused by every scenario request.
pub struct Dashboard {
    config: DashboardConfig,
    clock: Box<dyn Clock>,
    simulator: Result<ScenarioSimulator>,
}

impl Dashboard {
    /// Loads the simulator from `config`. A load failure is kept and reported
    /// by the scenario view only.
    pub fn new(config: DashboardConfig, clock: Box<dyn Clock>) -> Self {
        let simulator = ScenarioSimulator::load(&config);
        if let Err(err) = &simulator {
            warn!(error = %err, "scenario simulator not loaded");
        }
        Dashboard {
            config,
            clock,
            simulator,
        }
    }

    pub fn with_simulator(mut self, simulator: ScenarioSimulator) -> Self {
        self.simulator = Ok(simulator);
        self
    }

    /// Renders a view. Errors become a message inside the output.
    pub fn render(&self, request: &ViewRequest) -> String {
        let view = request.view();
        let mut out = heading(view.title());
        match self.try_render(request) {
            Ok(body) => out.push_str(&body),
            Err(err) => {
                warn!(view = view.title(), error = %err, "view failed");
                out.push_str(&format!("error: {}\n", err));
            }
        }
        out
    }

    /// Renders every view with default inputs, in menu order.
    pub fn render_all(&self) -> String {
        View::ALL
            .iter()
            .map(|view| self.render(&ViewRequest::default_for(*view)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn try_render(&self, request: &ViewRequest) -> Result<String> {
        match request {
            ViewRequest::Home => self.home(),
            ViewRequest::Map { regenerate, output } => self.map(*regenerate, output.as_deref()),
            ViewRequest::DataInsights => self.data_insights(),
            ViewRequest::ModelComparisons => self.model_comparisons(),
            ViewRequest::RealTime { station } => self.real_time(station.as_deref()),
            ViewRequest::Scenario(input) => self.scenario(input),
        }
    }

    fn home(&self) -> Result<String> {
        let stations = load_stations(self.config.stations_path())?;
        let metrics = KeyMetrics::from_stations(&stations)?;
        let mut out = String::new();
        writeln!(out, "Delhi Metro Ridership Dashboard")?;
        writeln!(out, "Advanced Analytics & Predictive Insights for Urban Transit Planning\n")?;
        writeln!(out, "Key Metrics")?;
        writeln!(out, "  Total metro stations currently operational: {}", metrics.total_stations)?;
        writeln!(
            out,
            "  Avg. daily ridership across the network:    {}",
            metrics.average_daily_ridership
        )?;
        writeln!(out, "  Highest ridership station:                  {}\n", metrics.busiest_station)?;
        writeln!(out, "Explore the Dashboard")?;
        for view in View::ALL.iter().skip(1) {
            writeln!(out, "  {:<22} {}", view.title(), view.summary())?;
        }
        Ok(out)
    }

    fn map(&self, regenerate: bool, output: Option<&Path>) -> Result<String> {
        if regenerate {
            let stations = load_stations(self.config.stations_path())?;
            let target = output
                .map(Path::to_path_buf)
                .unwrap_or_else(|| self.config.output_dir.join("delhi_metro_map.geojson"));
            write_station_geojson(&target, &stations)?;
            return Ok(format!(
                "Map document with {} stations written to {}\n",
                stations.len(),
                target.display()
            ));
        }
        let document = read_map_document(self.config.map_path())?;
        match output {
            Some(target) => {
                fs::write(target, &document).map_err(|err| DashboardError::io(target, err))?;
                Ok(format!("Interactive map written to {}\n", target.display()))
            }
            None => Ok(document),
        }
    }

    fn data_insights(&self) -> Result<String> {
        let stations = load_stations(self.config.stations_path())?;
        let mut out = String::new();
        writeln!(out, "Data Overview\n")?;
        writeln!(out, "First 5 Rows")?;
        let head: Vec<Vec<String>> = stations
            .iter()
            .take(5)
            .map(|s| {
                let mut row = vec![
                    s.name.clone(),
                    s.daily_ridership.to_string(),
                    s.metro_line.clone(),
                    s.opening_year.to_string(),
                    format!("{:.4}", s.latitude),
                    format!("{:.4}", s.longitude),
                    format!("{:.1}", s.distance_from_first_km),
                ];
                if let Some(age) = s.station_age {
                    row.push(format!("{}", age));
                }
                row
            })
            .collect();
        let mut columns = vec![
            "Station Names",
            "Daily_Ridership",
            "Metro Line",
            "Opening_Year",
            "Latitude",
            "Longitude",
            "Dist. From First Station(km)",
        ];
        if stations.iter().take(5).any(|s| s.station_age.is_some()) {
            columns.push("Station_Age");
        }
        out.push_str(&render_table(&columns, &head)?);

        writeln!(out, "\nSummary Statistics")?;
        let summary: Vec<Vec<String>> = describe(&stations)
            .into_iter()
            .map(|c| {
                vec![
                    c.column,
                    c.count.to_string(),
                    format!("{:.2}", c.mean),
                    format!("{:.2}", c.std),
                    format!("{:.2}", c.min),
                    format!("{:.2}", c.p25),
                    format!("{:.2}", c.p50),
                    format!("{:.2}", c.p75),
                    format!("{:.2}", c.max),
                ]
            })
            .collect();
        out.push_str(&render_table(
            &["", "count", "mean", "std", "min", "25%", "50%", "75%", "max"],
            &summary,
        )?);

        writeln!(out, "\nAnalysis Graphs")?;
        let graphs_dir = self.config.data_analysis_graphs_dir();
        match list_pngs(&graphs_dir) {
            Ok(graphs) if !graphs.is_empty() => {
                for graph in graphs {
                    writeln!(out, "  {}", graph.display())?;
                }
            }
            _ => {
                writeln!(
                    out,
                    "  No analysis graphs in {}; run generateGraphs first.",
                    graphs_dir.display()
                )?;
            }
        }
        Ok(out)
    }

    fn model_comparisons(&self) -> Result<String> {
        let metrics = load_model_performance(self.config.model_metrics_path())?;
        let graphs_dir = self.config.model_analysis_graphs_dir();
        let mut out = String::new();

        let sections: [(&str, &str, &[&str]); 3] = [
            (
                "XGBoost Model",
                "xgboost",
                &["xgboost_actual_vs_predicted.png", "xgboost_feature_importance.png"],
            ),
            (
                "Linear Regression Model",
                "linear",
                &["linear_regression_actual_vs_predicted.png", "linear_regression_coefficients.png"],
            ),
            ("Ensemble Model", "ensemble", &["ensemble_actual_vs_predicted.png"]),
        ];
        for (title, needle, graphs) in sections {
            writeln!(out, "{}", title)?;
            let rows = metrics_rows(models_matching(&metrics, needle));
            if !rows.is_empty() {
                out.push_str(&render_table(&["Model", "RMSE", "MAE", "R2_Score"], &rows)?);
            }
            for graph in graphs.iter().map(|g| graphs_dir.join(g)).filter(|p| p.exists()) {
                writeln!(out, "  {}", graph.display())?;
            }
            out.push('\n');
        }

        writeln!(out, "Performance Metric Comparison")?;
        out.push_str(&render_table(&["Model", "RMSE", "MAE", "R2_Score"], &metrics_rows(metrics.iter()))?);

        writeln!(out, "\nModel Performance Comparison (Bar Charts)")?;
        let summary_image = graphs_dir.join("model_comparison.png");
        if summary_image.exists() {
            writeln!(out, "  {}", summary_image.display())?;
        }
        let charts: [(&str, &str, fn(&ModelPerformance) -> f64, _); 3] = [
            ("model_rmse.png", "Root Mean Squared Error (RMSE) Comparison", |m| m.rmse, SKY_BLUE),
            ("model_mae.png", "Mean Absolute Error (MAE) Comparison", |m| m.mae, LIGHT_GREEN),
            ("model_r2.png", "R² Score Comparison", |m| m.r2_score, SALMON),
        ];
        for (file, caption, metric, colour) in charts {
            let data: Vec<(String, f64)> = metrics.iter().map(|m| (m.model.clone(), metric(m))).collect();
            let path = self.config.output_dir.join(file);
            let y_desc = caption.split(" Comparison").next().unwrap_or(caption);
            match charts::bar_chart(&path, caption, y_desc, &data, colour) {
                Ok(()) => {
                    writeln!(out, "  {}", path.display())?;
                }
                Err(err) => {
                    writeln!(out, "  chart unavailable: {}", err)?;
                }
            }
        }

        writeln!(out, "\nCross Validation Graphs")?;
        match list_pngs(&graphs_dir) {
            Ok(graphs) => {
                let remaining: Vec<_> = graphs
                    .into_iter()
                    .filter(|g| {
                        g.file_name()
                            .and_then(|n| n.to_str())
                            .map_or(true, |n| !MODEL_SECTION_GRAPHS.contains(&n))
                    })
                    .collect();
                if remaining.is_empty() {
                    writeln!(out, "  No PNG files found in the directory.")?;
                }
                for graph in remaining {
                    writeln!(out, "  {}", graph.display())?;
                }
            }
            Err(err) => {
                writeln!(out, "  {}", err)?;
            }
        }
        Ok(out)
    }

    fn real_time(&self, station: Option<&str>) -> Result<String> {
        let hourly = load_hourly(self.config.hourly_path())?;
        let stations = hourly.station_names();
        let selected = match station {
            Some(name) => name.to_string(),
            None => stations
                .first()
                .map(|s| s.to_string())
                .ok_or_else(|| DashboardError::EmptyDataset("hourly ridership".into()))?,
        };

        let now = local_time(self.clock.as_ref(), self.config.timezone);
        let column = RidershipColumn::at(&now);
        let ridership = ridership_at(&selected, &hourly, column)?;
        info!(station = %selected, %column, ridership, "current ridership");

        let mut out = String::new();
        writeln!(out, "Stations: {}", stations.join(", "))?;
        writeln!(out, "Selected station: {}\n", selected)?;
        writeln!(out, "Current Ridership and Time:")?;
        writeln!(out, "  {} Passengers ({})", ridership, column)?;
        writeln!(out, "  Current Time: {}", now.format("%Y-%m-%d %H:%M:%S %Z"))?;

        // find() cannot miss here: ridership_at already resolved the station.
        if let Some(row) = hourly.find(&selected) {
            let to_points = |counts: &[u64; 24]| -> Vec<(i32, f64)> {
                counts.iter().enumerate().map(|(h, c)| (h as i32, *c as f64)).collect()
            };
            let series = [
                Series {
                    label: "Weekday".into(),
                    colour: WEEKDAY_COLOUR,
                    points: to_points(&row.weekday),
                },
                Series {
                    label: "Weekend".into(),
                    colour: WEEKEND_COLOUR,
                    points: to_points(&row.weekend),
                },
            ];
            let path = self.config.output_dir.join(format!("hourly_{}.png", slug(&selected)));
            let caption = format!("Hourly Ridership Trends for {}", selected);
            writeln!(out, "\nHourly Ridership Trends")?;
            match charts::hourly_chart(&path, &caption, "Ridership", &series) {
                Ok(()) => {
                    writeln!(out, "  {}", path.display())?;
                }
                Err(err) => {
                    writeln!(out, "  chart unavailable: {}", err)?;
                }
            }
        }
        Ok(out)
    }

    fn scenario(&self, input: &ScenarioInput) -> Result<String> {
        let simulator = self
            .simulator
            .as_ref()
            .map_err(|err| DashboardError::SimulatorUnavailable(err.to_string()))?;
        let result = simulator.simulate(input)?;
        render_prediction(input, &result)
    }
}

/// Results panel for a simulated scenario.
pub fn render_prediction(input: &ScenarioInput, result: &PredictionResult) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "Input Parameters")?;
    writeln!(out, "  Station Age (years):              {}", input.station_age)?;
    writeln!(out, "  Metro Line:                       {}", input.metro_line)?;
    writeln!(out, "  Distance from First Station (km): {}", input.distance_from_first_station)?;
    writeln!(out, "  Latitude:                         {}", input.latitude)?;
    writeln!(out, "  Longitude:                        {}", input.longitude)?;
    writeln!(out, "  Connectivity (number of lines):   {}", input.connectivity)?;
    writeln!(out, "  Station Density:                  {}\n", input.station_density)?;
    writeln!(out, "Predicted Ridership")?;
    writeln!(out, "  {} Passengers", format_thousands(result.prediction as i64))?;
    writeln!(
        out,
        "  Ridership Category: {} ({})\n",
        result.category,
        result.category.colour()
    )?;
    writeln!(out, "Ridership Categories:")?;
    for category in [RidershipCategory::Low, RidershipCategory::Medium, RidershipCategory::High] {
        writeln!(out, "  {}: {}", category, category.description())?;
    }
    for warning in &result.warnings {
        writeln!(out, "\nwarning: {}", warning)?;
    }
    Ok(out)
}

fn heading(title: &str) -> String {
    format!("{}\n{}\n", title, "=".repeat(title.chars().count()))
}

fn models_matching<'a>(
    metrics: &'a [ModelPerformance],
    needle: &'a str,
) -> impl Iterator<Item = &'a ModelPerformance> {
    metrics.iter().filter(move |m| m.model.to_lowercase().contains(needle))
}

fn metrics_rows<'a>(metrics: impl Iterator<Item = &'a ModelPerformance>) -> Vec<Vec<String>> {
    metrics
        .map(|m| {
            vec![
                m.model.clone(),
                format!("{:.4}", m.rmse),
                format!("{:.4}", m.mae),
                format!("{:.4}", m.r2_score),
            ]
        })
        .collect()
}

/// PNG files in `dir`, sorted by file name.
pub fn list_pngs(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|err| DashboardError::io(dir, err))?;
    let mut pngs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().map_or(false, |ext| ext == "png"))
        .collect();
    pngs.sort();
    Ok(pngs)
}

/// Left-aligned text table.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> Result<String> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }
    let format_row = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };
    let mut out = String::new();
    writeln!(out, "{}", format_row(headers.to_vec()))?;
    writeln!(
        out,
        "{}",
        widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("-+-")
    )?;
    for row in rows {
        writeln!(out, "{}", format_row(row.iter().map(String::as_str).collect()))?;
    }
    Ok(out)
}

/// `1234567` -> `1,234,567`
pub fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

fn slug(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

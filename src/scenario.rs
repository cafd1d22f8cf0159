//! What-if ridership simulation: feature vector, scaler, regressor and the
//! Low/Medium/High classifier.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, info, warn};

use crate::artifacts::{FeatureScaler, LabelEncoder, LineEncoder, Model, Regressor, Scaler};
use crate::config::{DashboardConfig, LineCodeStrategy};
use crate::error::{DashboardError, Result};
use crate::features::FeatureVector;
use crate::records::load_stations;
use crate::stats::{ObservedRanges, Range, RidershipThresholds};

pub const STATION_AGE_RANGE: (i64, i64) = (0, 100);
pub const DISTANCE_RANGE: (f64, f64) = (0.0, 50.0);
pub const CONNECTIVITY_RANGE: (i64, i64) = (1, 10);
pub const STATION_DENSITY_RANGE: (i64, i64) = (0, 10);
pub const DEFAULT_LATITUDE: f64 = 28.6139;
pub const DEFAULT_LONGITUDE: f64 = 77.2090;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetroLine {
    Red,
    Yellow,
    Blue,
    Green,
    Violet,
    AirportExpress,
    Magenta,
    Pink,
    Grey,
    RapidMetro,
    Orange,
}

impl MetroLine {
    /// In selector order, which is also static code order.
    pub const ALL: [MetroLine; 11] = [
        MetroLine::Red,
        MetroLine::Yellow,
        MetroLine::Blue,
        MetroLine::Green,
        MetroLine::Violet,
        MetroLine::AirportExpress,
        MetroLine::Magenta,
        MetroLine::Pink,
        MetroLine::Grey,
        MetroLine::RapidMetro,
        MetroLine::Orange,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MetroLine::Red => "Red Line",
            MetroLine::Yellow => "Yellow Line",
            MetroLine::Blue => "Blue Line",
            MetroLine::Green => "Green Line",
            MetroLine::Violet => "Violet Line",
            MetroLine::AirportExpress => "Airport Express",
            MetroLine::Magenta => "Magenta Line",
            MetroLine::Pink => "Pink Line",
            MetroLine::Grey => "Grey Line",
            MetroLine::RapidMetro => "Rapid Metro",
            MetroLine::Orange => "Orange Line",
        }
    }

    pub fn static_code(self) -> i64 {
        self as i64
    }
}

impl fmt::Display for MetroLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MetroLine {
    type Err = DashboardError;

    /// Accepts the display label in any case; `"red"` is short for `"Red Line"`.
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        MetroLine::ALL
            .into_iter()
            .find(|line| {
                let label = line.label().to_lowercase();
                label == wanted || label.trim_end_matches(" line") == wanted
            })
            .ok_or_else(|| DashboardError::UnknownLineLabel(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenarioInput {
    pub station_age: i64,
    pub metro_line: MetroLine,
    pub distance_from_first_station: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub connectivity: i64,
    pub station_density: i64,
}

impl Default for ScenarioInput {
    fn default() -> Self {
        ScenarioInput {
            station_age: 10,
            metro_line: MetroLine::Red,
            distance_from_first_station: 5.0,
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
            connectivity: 2,
            station_density: 1,
        }
    }
}

impl ScenarioInput {
    pub fn feature_vector(&self, metro_line_code: i64) -> FeatureVector {
        FeatureVector::build(
            self.station_age,
            metro_line_code,
            self.distance_from_first_station,
            self.latitude,
            self.longitude,
            self.connectivity,
            self.station_density,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RidershipCategory {
    Low,
    Medium,
    High,
}

impl RidershipCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            RidershipCategory::Low => "Low",
            RidershipCategory::Medium => "Medium",
            RidershipCategory::High => "High",
        }
    }

    pub fn colour(self) -> &'static str {
        match self {
            RidershipCategory::Low => "#FF6B6B",
            RidershipCategory::Medium => "#FFD93D",
            RidershipCategory::High => "#6BCB77",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            RidershipCategory::Low => "Below 33rd percentile of all stations",
            RidershipCategory::Medium => "Between 33rd and 67th percentile",
            RidershipCategory::High => "Above 67th percentile",
        }
    }
}

impl fmt::Display for RidershipCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Both bounds are inclusive from below: `p == low` is Low, `p == high` is Medium.
pub fn categorize(prediction: f64, thresholds: &RidershipThresholds) -> RidershipCategory {
    if prediction <= thresholds.low {
        RidershipCategory::Low
    } else if prediction <= thresholds.high {
        RidershipCategory::Medium
    } else {
        RidershipCategory::High
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PredictionWarning {
    NegativePrediction,
    OutsideObservedRange {
        feature: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl fmt::Display for PredictionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictionWarning::NegativePrediction => {
                write!(f, "Predicted ridership is negative. Please check your input parameters.")
            }
            PredictionWarning::OutsideObservedRange {
                feature,
                value,
                min,
                max,
            } => write!(
                f,
                "{} = {} lies outside the historical range [{}, {}]; treat the prediction as an extrapolation.",
                feature, value, min, max
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub prediction: f64,
    pub category: RidershipCategory,
    pub warnings: Vec<PredictionWarning>,
}

/// Scores scenarios against injected artifacts. Thresholds are fixed for the
/// lifetime of the simulator.
pub struct ScenarioSimulator {
    scaler: Box<dyn FeatureScaler>,
    model: Box<dyn Regressor>,
    encoder: Option<Box<dyn LineEncoder>>,
    strategy: LineCodeStrategy,
    thresholds: RidershipThresholds,
    observed: ObservedRanges,
}

impl ScenarioSimulator {
    pub fn new(
        scaler: Box<dyn FeatureScaler>,
        model: Box<dyn Regressor>,
        thresholds: RidershipThresholds,
    ) -> Self {
        ScenarioSimulator {
            scaler,
            model,
            encoder: None,
            strategy: LineCodeStrategy::Static,
            thresholds,
            observed: ObservedRanges::default(),
        }
    }

    pub fn with_encoder(mut self, encoder: Box<dyn LineEncoder>) -> Self {
        self.encoder = Some(encoder);
        self
    }

    pub fn with_strategy(mut self, strategy: LineCodeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_observed_ranges(mut self, observed: ObservedRanges) -> Self {
        self.observed = observed;
        self
    }

    /// Loads scaler, regressor, the station history for thresholds and, with
    /// the encoder strategy, the line encoder. Any failure aborts the load.
    pub fn load(config: &DashboardConfig) -> Result<Self> {
        let scaler = Scaler::load(config.scaler_path())?;
        let model = Model::load(config.model_path())?;
        let stations = load_stations(config.stations_path())?;
        let thresholds = RidershipThresholds::from_stations(&stations)?;
        info!(low = thresholds.low, high = thresholds.high, "ridership thresholds");

        let mut simulator = ScenarioSimulator::new(Box::new(scaler), Box::new(model), thresholds)
            .with_strategy(config.line_codes)
            .with_observed_ranges(ObservedRanges::from_stations(&stations));
        if config.line_codes == LineCodeStrategy::Encoder {
            let encoder = LabelEncoder::load(config.line_encoder_path())?;
            simulator = simulator.with_encoder(Box::new(encoder));
        }
        Ok(simulator)
    }

    pub fn thresholds(&self) -> RidershipThresholds {
        self.thresholds
    }

    pub fn line_code(&self, line: MetroLine) -> Result<i64> {
        match (self.strategy, &self.encoder) {
            (LineCodeStrategy::Static, _) => Ok(line.static_code()),
            (LineCodeStrategy::Encoder, Some(encoder)) => encoder.encode(line.label()),
            (LineCodeStrategy::Encoder, None) => Err(DashboardError::Config(
                "line_codes = \"encoder\" but no line encoder was loaded".into(),
            )),
        }
    }

    /// Raw model output for a scenario, before classification.
    pub fn predict(&self, input: &ScenarioInput) -> Result<f64> {
        let features = input.feature_vector(self.line_code(input.metro_line)?);
        let scaled = self.scaler.transform(&features);
        debug!(?features, ?scaled, "scoring scenario");
        Ok(self.model.predict(&scaled))
    }

    pub fn simulate(&self, input: &ScenarioInput) -> Result<PredictionResult> {
        let prediction = self.predict(input)?;
        let category = categorize(prediction, &self.thresholds);
        let warnings = self.warnings(input, prediction);
        if !warnings.is_empty() {
            warn!(prediction, count = warnings.len(), "prediction flagged");
        }
        Ok(PredictionResult {
            prediction,
            category,
            warnings,
        })
    }

    fn warnings(&self, input: &ScenarioInput, prediction: f64) -> Vec<PredictionWarning> {
        let mut warnings = Vec::new();
        if prediction < 0.0 {
            warnings.push(PredictionWarning::NegativePrediction);
        }
        let checks: [(&'static str, f64, Option<Range>); 4] = [
            ("Station age", input.station_age as f64, self.observed.station_age),
            (
                "Distance from first station",
                input.distance_from_first_station,
                self.observed.distance_from_first_km,
            ),
            ("Latitude", input.latitude, self.observed.latitude),
            ("Longitude", input.longitude, self.observed.longitude),
        ];
        for (feature, value, range) in checks {
            if let Some(range) = range {
                if !range.contains(value) {
                    warnings.push(PredictionWarning::OutsideObservedRange {
                        feature,
                        value,
                        min: range.min,
                        max: range.max,
                    });
                }
            }
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Identity;

    impl FeatureScaler for Identity {
        fn transform(&self, features: &FeatureVector) -> FeatureVector {
            *features
        }
    }

    struct Constant(f64);

    impl Regressor for Constant {
        fn predict(&self, _: &FeatureVector) -> f64 {
            self.0
        }
    }

    /// Echoes the metro line code back as the prediction.
    struct LineCodeEcho;

    impl Regressor for LineCodeEcho {
        fn predict(&self, features: &FeatureVector) -> f64 {
            features.values()[1]
        }
    }

    fn thresholds() -> RidershipThresholds {
        RidershipThresholds::new(5000.0, 15000.0)
    }

    #[test]
    fn categorize_boundaries() {
        let t = thresholds();
        assert_eq!(categorize(5000.0, &t), RidershipCategory::Low);
        assert_eq!(categorize(5000.0001, &t), RidershipCategory::Medium);
        assert_eq!(categorize(15000.0, &t), RidershipCategory::Medium);
        assert_eq!(categorize(15000.0001, &t), RidershipCategory::High);
        assert_eq!(categorize(-10.0, &t), RidershipCategory::Low);
    }

    #[test]
    fn categorize_matches_its_definition() {
        let t = thresholds();
        for p in (-2000..=20000).step_by(250).map(f64::from) {
            let expected = if p <= t.low {
                RidershipCategory::Low
            } else if p <= t.high {
                RidershipCategory::Medium
            } else {
                RidershipCategory::High
            };
            assert_eq!(categorize(p, &t), expected, "p = {}", p);
        }
    }

    #[test]
    fn constant_model_pipeline() {
        let simulator = ScenarioSimulator::new(Box::new(Identity), Box::new(Constant(8000.0)), thresholds());
        let result = simulator.simulate(&ScenarioInput::default()).unwrap();
        assert_eq!(result.prediction, 8000.0);
        assert_eq!(result.category, RidershipCategory::Medium);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn negative_prediction_is_flagged_not_rejected() {
        let simulator = ScenarioSimulator::new(Box::new(Identity), Box::new(Constant(-42.0)), thresholds());
        let result = simulator.simulate(&ScenarioInput::default()).unwrap();
        assert_eq!(result.prediction, -42.0);
        assert_eq!(result.category, RidershipCategory::Low);
        assert_eq!(result.warnings, vec![PredictionWarning::NegativePrediction]);
    }

    #[test]
    fn static_table_codes() {
        let simulator = ScenarioSimulator::new(Box::new(Identity), Box::new(LineCodeEcho), thresholds());
        let input = ScenarioInput {
            metro_line: MetroLine::Orange,
            ..ScenarioInput::default()
        };
        assert_eq!(simulator.predict(&input).unwrap(), 10.0);
        assert_eq!(MetroLine::Blue.static_code(), 2);
    }

    #[test]
    fn encoder_strategy_rederives_code_from_label() {
        // Alphabetical classes, as a fitted encoder would store them.
        let mut classes: Vec<String> = MetroLine::ALL.iter().map(|l| l.label().to_string()).collect();
        classes.sort();
        let simulator = ScenarioSimulator::new(Box::new(Identity), Box::new(LineCodeEcho), thresholds())
            .with_strategy(LineCodeStrategy::Encoder)
            .with_encoder(Box::new(LabelEncoder { classes }));
        let input = ScenarioInput {
            metro_line: MetroLine::AirportExpress,
            ..ScenarioInput::default()
        };
        assert_eq!(simulator.predict(&input).unwrap(), 0.0);
    }

    #[test]
    fn encoder_strategy_without_encoder_is_a_config_error() {
        let simulator = ScenarioSimulator::new(Box::new(Identity), Box::new(Constant(1.0)), thresholds())
            .with_strategy(LineCodeStrategy::Encoder);
        assert!(matches!(
            simulator.simulate(&ScenarioInput::default()),
            Err(DashboardError::Config(_))
        ));
    }

    #[test]
    fn inputs_outside_history_are_flagged() {
        let observed = ObservedRanges {
            station_age: None,
            distance_from_first_km: Some(Range { min: 0.0, max: 30.0 }),
            latitude: Some(Range { min: 28.4, max: 28.9 }),
            longitude: Some(Range { min: 76.9, max: 77.4 }),
        };
        let simulator = ScenarioSimulator::new(Box::new(Identity), Box::new(Constant(20000.0)), thresholds())
            .with_observed_ranges(observed);
        let input = ScenarioInput {
            distance_from_first_station: 45.0,
            ..ScenarioInput::default()
        };
        let result = simulator.simulate(&input).unwrap();
        assert_eq!(result.category, RidershipCategory::High);
        assert_eq!(result.warnings.len(), 1);
        assert!(matches!(
            result.warnings[0],
            PredictionWarning::OutsideObservedRange { feature: "Distance from first station", .. }
        ));
    }

    #[test]
    fn metro_line_parses_labels_and_short_names() {
        assert_eq!("Airport Express".parse::<MetroLine>().unwrap(), MetroLine::AirportExpress);
        assert_eq!("magenta".parse::<MetroLine>().unwrap(), MetroLine::Magenta);
        assert_eq!("rapid metro".parse::<MetroLine>().unwrap(), MetroLine::RapidMetro);
        assert!("Silver".parse::<MetroLine>().is_err());
    }
}

//! Delhi Metro ridership dashboard: station datasets, descriptive analytics
//! and a what-if ridership simulator backed by pre-fitted model artifacts.

pub mod artifacts;
pub mod charts;
pub mod config;
pub mod error;
pub mod features;
pub mod logger;
pub mod map;
pub mod realtime;
pub mod records;
pub mod scenario;
pub mod stats;
pub mod views;

pub use config::{DashboardConfig, LineCodeStrategy};
pub use error::{DashboardError, Result};
pub use scenario::{categorize, MetroLine, PredictionResult, RidershipCategory, ScenarioInput, ScenarioSimulator};
pub use stats::RidershipThresholds;

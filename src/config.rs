//! Dashboard configuration.
//!
//! Every path is relative: either to the directory holding the TOML file or,
//! without a file, to the base directory handed in by the caller.

use std::fs;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::Deserialize;

use crate::error::{DashboardError, Result};

pub const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";

/// How a metro line label becomes the integer fed to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LineCodeStrategy {
    /// Built-in label table, codes 0..=10.
    #[default]
    Static,
    /// Codes come from the fitted line encoder artifact.
    Encoder,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FileNames {
    pub stations: String,
    pub hourly: String,
    pub model_metrics: String,
    pub map: String,
    pub model: String,
    pub scaler: String,
    pub line_encoder: String,
}

impl Default for FileNames {
    fn default() -> Self {
        FileNames {
            stations: "delhi_metro_final.csv".into(),
            hourly: "hourly_ridership.csv".into(),
            model_metrics: "model_performance_metrics.csv".into(),
            map: "delhi_metro_map.html".into(),
            model: "xgb_model.json".into(),
            scaler: "scaler.json".into(),
            line_encoder: "line_encoder.json".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawConfig {
    data_dir: PathBuf,
    models_dir: PathBuf,
    assets_dir: PathBuf,
    output_dir: PathBuf,
    timezone: String,
    line_codes: LineCodeStrategy,
    files: FileNames,
}

impl Default for RawConfig {
    fn default() -> Self {
        RawConfig {
            data_dir: "data".into(),
            models_dir: "models".into(),
            assets_dir: "assets".into(),
            output_dir: "output".into(),
            timezone: DEFAULT_TIMEZONE.into(),
            line_codes: LineCodeStrategy::Static,
            files: FileNames::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub data_dir: PathBuf,
    pub models_dir: PathBuf,
    pub assets_dir: PathBuf,
    pub output_dir: PathBuf,
    pub timezone: Tz,
    pub line_codes: LineCodeStrategy,
    pub files: FileNames,
}

impl DashboardConfig {
    /// Defaults rooted at `base_dir`.
    pub fn with_base_dir(base_dir: impl AsRef<Path>) -> Self {
        Self::assemble(RawConfig::default(), base_dir.as_ref(), chrono_tz::Asia::Kolkata)
    }

    /// Loads a TOML file; relative paths resolve against its directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|err| DashboardError::io(path, err))?;
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::from_toml_str(&raw, &base_dir)
    }

    pub fn from_toml_str(raw: &str, base_dir: &Path) -> Result<Self> {
        let document: RawConfig =
            toml::from_str(raw).map_err(|err| DashboardError::Config(err.to_string()))?;
        Self::resolve(document, base_dir)
    }

    fn resolve(raw: RawConfig, base_dir: &Path) -> Result<Self> {
        let timezone: Tz = raw.timezone.parse().map_err(|_| {
            DashboardError::Config(format!("unknown timezone '{}'", raw.timezone))
        })?;
        Ok(Self::assemble(raw, base_dir, timezone))
    }

    fn assemble(raw: RawConfig, base_dir: &Path, timezone: Tz) -> Self {
        let rebase = |candidate: PathBuf| {
            if candidate.is_absolute() {
                candidate
            } else {
                base_dir.join(candidate)
            }
        };
        DashboardConfig {
            data_dir: rebase(raw.data_dir),
            models_dir: rebase(raw.models_dir),
            assets_dir: rebase(raw.assets_dir),
            output_dir: rebase(raw.output_dir),
            timezone,
            line_codes: raw.line_codes,
            files: raw.files,
        }
    }

    pub fn stations_path(&self) -> PathBuf {
        self.data_dir.join(&self.files.stations)
    }

    pub fn hourly_path(&self) -> PathBuf {
        self.data_dir.join(&self.files.hourly)
    }

    pub fn model_metrics_path(&self) -> PathBuf {
        self.data_dir.join(&self.files.model_metrics)
    }

    pub fn map_path(&self) -> PathBuf {
        self.data_dir.join(&self.files.map)
    }

    pub fn model_path(&self) -> PathBuf {
        self.models_dir.join(&self.files.model)
    }

    pub fn scaler_path(&self) -> PathBuf {
        self.models_dir.join(&self.files.scaler)
    }

    pub fn line_encoder_path(&self) -> PathBuf {
        self.models_dir.join(&self.files.line_encoder)
    }

    pub fn data_analysis_graphs_dir(&self) -> PathBuf {
        self.assets_dir.join("data_analysis_graphs")
    }

    pub fn model_analysis_graphs_dir(&self) -> PathBuf {
        self.assets_dir.join("model_analysis_graphs")
    }
}

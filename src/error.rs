use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading datasets, artifacts and serving views.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// A file could not be opened or read.
    #[error("could not read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A CSV file was malformed.
    #[error("invalid CSV in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    /// A required CSV column is absent.
    #[error("'{path}' has no column named '{column}'")]
    MissingColumn { path: PathBuf, column: String },
    /// A CSV cell could not be parsed.
    #[error("'{path}' row {row}: column '{column}' has unparseable value '{value}'")]
    InvalidValue {
        path: PathBuf,
        row: usize,
        column: String,
        value: String,
    },
    /// A dataset held no rows where at least one is needed.
    #[error("dataset '{0}' is empty")]
    EmptyDataset(String),
    /// A model artifact could not be decoded.
    #[error("invalid artifact '{path}': {reason}")]
    Artifact { path: PathBuf, reason: String },
    /// An artifact was fitted on a different number of features.
    #[error("artifact '{artifact}' expects {found} features, scoring uses {expected}")]
    FeatureCount {
        artifact: String,
        expected: usize,
        found: usize,
    },
    /// The hourly dataset has no row for this station.
    #[error("Station '{0}' not found in the data.")]
    StationNotFound(String),
    /// The line encoder does not know this label.
    #[error("metro line '{0}' is unknown to the line encoder")]
    UnknownLineLabel(String),
    /// Configuration could not be parsed or is inconsistent.
    #[error("configuration error: {0}")]
    Config(String),
    /// A chart could not be drawn.
    #[error("chart '{path}' could not be rendered: {reason}")]
    Chart { path: PathBuf, reason: String },
    /// The scenario simulator failed to load at startup.
    #[error("scenario simulator unavailable: {0}")]
    SimulatorUnavailable(String),
    /// Writing view output failed.
    #[error("could not format view output")]
    Format(#[from] std::fmt::Error),
}

impl DashboardError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DashboardError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        DashboardError::Csv {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn artifact(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        DashboardError::Artifact {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;

use std::path::PathBuf;

use thiserror::Error;

/// Failures while reading the well and production tables.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("input file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("{}: missing required column `{column}`", .path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("{}: bad row at line {line}: {message}", .path.display())]
    BadRow {
        path: PathBuf,
        line: u64,
        message: String,
    },

    #[error("{}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Structurally invalid production history for one well.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeriesError {
    #[error("well has no production records")]
    Empty,

    #[error("invalid oil volume {volume} at month index {index}")]
    InvalidVolume { index: i64, volume: f64 },

    #[error("no positive oil volume to locate a peak")]
    NoProduction,

    #[error("month index {index} cannot be rebased to the peak")]
    IndexOutOfRange { index: i64 },
}

/// Reasons a bounded decline fit cannot produce a usable model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("{points} points remain after shut-in removal, need at least {required}")]
    TooFewPoints { points: usize, required: usize },

    #[error("residual became non-finite")]
    NonFinite,

    #[error("no convergence after {0} iterations")]
    MaxIterations(usize),

    #[error("fit exceeded {0} ms")]
    Timeout(u64),

    #[error("reserve integral is not finite")]
    NonFiniteIntegral,
}

/// Failures while writing result tables or sample data.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum EstimateError {
    #[error("failed to start estimation workers: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

/// Configuration loading and validation failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config I/O error ({}): {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error ({}): {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

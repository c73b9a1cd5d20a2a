//! Estimator configuration.
//!
//! Every business assumption (production horizon, minimum history, parameter
//! bounds) and every solver constant lives here as a TOML value. Each section
//! implements `Default`, so an empty file or no file at all gives the standard
//! 200-month hyperbolic estimate.
//!
//! ## Loading order
//!
//! 1. An explicit path (the `--config` flag, or `DECLINE_EUR_CONFIG` through clap)
//! 2. `decline_eur.toml` in the current working directory
//! 3. Built-in defaults

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;

pub const CONFIG_ENV: &str = "DECLINE_EUR_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "decline_eur.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EstimatorConfig {
    #[serde(default)]
    pub reserve: ReserveConfig,

    #[serde(default)]
    pub bounds: BoundsConfig,

    #[serde(default)]
    pub solver: SolverConfig,

    #[serde(default)]
    pub quadrature: QuadratureConfig,

    #[serde(default)]
    pub runtime: RuntimeConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReserveConfig {
    /// Months of production assumed before the economic limit.
    pub horizon_months: f64,
    /// Post-peak points (counted before shut-in removal) required to attempt a fit.
    pub min_points: usize,
}

impl Default for ReserveConfig {
    fn default() -> Self {
        Self {
            horizon_months: 200.0,
            min_points: 6,
        }
    }
}

/// Upper bounds of the fit box; every lower bound is zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundsConfig {
    pub qi_max: f64,
    pub b_max: f64,
    pub di_max: f64,
}

impl Default for BoundsConfig {
    fn default() -> Self {
        Self {
            qi_max: 50_000.0,
            b_max: 2.0,
            di_max: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub max_iterations: usize,
    /// Relative step and cost tolerance for convergence.
    pub tolerance: f64,
    /// Wall-clock budget for one well's fit; 0 disables the limit.
    ///
    /// The budget is measured in real time, so a well whose fit runs close to
    /// it can come out fitted on one run and `fit_divergence` on a loaded
    /// machine. Set 0 when runs must be reproducible byte for byte.
    pub timeout_ms: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 500,
            tolerance: 1e-10,
            timeout_ms: 2_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadratureConfig {
    pub tolerance: f64,
    pub max_depth: u32,
}

impl Default for QuadratureConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-8,
            max_depth: 50,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Worker threads for per-well estimation; 0 uses every available core.
    pub concurrency: usize,
}

impl EstimatorConfig {
    /// Resolves configuration using the standard search order.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            let config = Self::load_from_file(path)?;
            info!(path = %path.display(), "Loaded estimator config");
            return Ok(config);
        }

        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        if local.exists() {
            let config = Self::load_from_file(&local)?;
            info!(path = %local.display(), "Loaded estimator config");
            return Ok(config);
        }

        Ok(Self::default())
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        Self::check_positive(self.reserve.horizon_months, "reserve.horizon_months", &mut errors);
        Self::check_positive(self.bounds.qi_max, "bounds.qi_max", &mut errors);
        Self::check_positive(self.bounds.b_max, "bounds.b_max", &mut errors);
        Self::check_positive(self.bounds.di_max, "bounds.di_max", &mut errors);
        Self::check_positive(self.solver.tolerance, "solver.tolerance", &mut errors);
        Self::check_positive(self.quadrature.tolerance, "quadrature.tolerance", &mut errors);

        if self.reserve.min_points == 0 {
            errors.push("reserve.min_points must be at least 1".to_string());
        }
        if self.solver.max_iterations == 0 {
            errors.push("solver.max_iterations must be at least 1".to_string());
        }
        if self.quadrature.max_depth == 0 {
            errors.push("quadrature.max_depth must be at least 1".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_positive(value: f64, name: &str, errors: &mut Vec<String>) {
        if !(value.is_finite() && value > 0.0) {
            errors.push(format!("{name} must be a positive number, got {value}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_toml_gives_defaults() {
        let config: EstimatorConfig = toml::from_str("").expect("empty TOML should parse");
        assert_eq!(config, EstimatorConfig::default());
        assert_eq!(config.reserve.horizon_months, 200.0);
        assert_eq!(config.reserve.min_points, 6);
        assert_eq!(config.bounds.qi_max, 50_000.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config: EstimatorConfig = toml::from_str(
            r#"
[reserve]
horizon_months = 360.0

[runtime]
concurrency = 2
"#,
        )
        .unwrap();
        assert_eq!(config.reserve.horizon_months, 360.0);
        assert_eq!(config.reserve.min_points, 6);
        assert_eq!(config.runtime.concurrency, 2);
        assert_eq!(config.solver, SolverConfig::default());
    }

    #[test]
    fn validation_collects_every_problem() {
        let mut config = EstimatorConfig::default();
        config.reserve.horizon_months = 0.0;
        config.bounds.b_max = -1.0;
        config.reserve.min_points = 0;

        match config.validate() {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 3),
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn load_from_file_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[solver]\nmax_iterations = 0").unwrap();
        let err = EstimatorConfig::load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn explicit_path_wins() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[reserve]\nmin_points = 8").unwrap();
        let config = EstimatorConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.reserve.min_points, 8);
    }
}

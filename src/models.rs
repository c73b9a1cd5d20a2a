use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::error::FitError;

/// One row of the well reference table.
#[derive(Debug, Clone, PartialEq)]
pub struct WellRecord {
    pub api: String,
    pub operator_name: String,
    pub well_name: String,
    pub cum_oil: f64,
    pub spud_date: Option<NaiveDate>,
}

/// One monthly row of the production table.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionRecord {
    pub api: String,
    /// Chronological month index as reported.
    pub index: i64,
    pub oil_bbls: f64,
    pub gas_mcf: f64,
    pub date: Option<NaiveDate>,
}

/// Post-peak production with shut-in months removed; `months` starts at 1.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanedSeries {
    pub months: Vec<i64>,
    pub oil: Vec<f64>,
    /// Points retained after the peak, counted before shut-in removal.
    pub retained_points: usize,
}

impl CleanedSeries {
    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }
}

/// Fitted Arps hyperbolic parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DeclineParams {
    pub qi: f64,
    pub b: f64,
    pub di: f64,
}

/// Why a well has no reserve estimate.
#[derive(Debug, Clone, PartialEq)]
pub enum UndeterminedReason {
    InsufficientData { points: usize },
    FitDivergence(FitError),
    MalformedInput(String),
}

impl UndeterminedReason {
    pub fn status(&self) -> &'static str {
        match self {
            UndeterminedReason::InsufficientData { .. } => "insufficient_data",
            UndeterminedReason::FitDivergence(_) => "fit_divergence",
            UndeterminedReason::MalformedInput(_) => "malformed_input",
        }
    }

    pub fn describe(&self) -> String {
        match self {
            UndeterminedReason::InsufficientData { points } => {
                format!("only {points} post-peak points")
            }
            UndeterminedReason::FitDivergence(err) => err.to_string(),
            UndeterminedReason::MalformedInput(message) => message.clone(),
        }
    }
}

/// Reserve estimate for a single well, in whole barrels.
#[derive(Debug, Clone, PartialEq)]
pub enum Eur {
    Fitted(u64),
    Undetermined(UndeterminedReason),
}

impl Eur {
    pub fn barrels(&self) -> Option<u64> {
        match self {
            Eur::Fitted(value) => Some(*value),
            Eur::Undetermined(_) => None,
        }
    }

    /// Contribution to operator sums; undetermined wells count as zero.
    pub fn summable(&self) -> u64 {
        self.barrels().unwrap_or(0)
    }

    pub fn status(&self) -> &'static str {
        match self {
            Eur::Fitted(_) => "fitted",
            Eur::Undetermined(reason) => reason.status(),
        }
    }

    pub fn is_fitted(&self) -> bool {
        matches!(self, Eur::Fitted(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EurRecord {
    pub api: String,
    pub eur: Eur,
    pub operator_name: Option<String>,
    pub well_name: Option<String>,
    pub params: Option<DeclineParams>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperatorProduction {
    pub operator_name: String,
    pub total_oil_production: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperatorReserve {
    pub operator_name: String,
    pub total_estimated_reserve: u64,
    pub wells_estimated: usize,
    pub wells_undetermined: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyProduction {
    pub date: NaiveDate,
    pub oil_bbls: f64,
    pub gas_mcf: f64,
    pub well_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub wells_in_table: usize,
    pub production_records: usize,
    pub wells_estimated: usize,
    pub wells_undetermined: usize,
    pub total_estimated_reserve: u64,
    pub horizon_months: f64,
}

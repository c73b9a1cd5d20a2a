//! Hyperbolic decline-curve reserve estimation.
//!
//! Production histories are grouped per well, cleaned, fitted with the Arps
//! hyperbolic decline under box constraints, and integrated over a fixed
//! horizon to give an EUR per well, then rolled up per operator.

pub mod aggregate;
pub mod clean;
pub mod config;
pub mod decline;
pub mod error;
pub mod estimate;
pub mod export;
pub mod group;
pub mod ingest;
pub mod integrate;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod seed;

pub use config::EstimatorConfig;
pub use models::{
    CleanedSeries, DeclineParams, Eur, EurRecord, OperatorProduction, OperatorReserve,
    ProductionRecord, UndeterminedReason, WellRecord,
};
pub use pipeline::{run, EstimateRun};

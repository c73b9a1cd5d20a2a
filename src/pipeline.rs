use tracing::info;
use uuid::Uuid;

use crate::aggregate::{operator_production, operator_reserves, production_by_date};
use crate::config::EstimatorConfig;
use crate::error::EstimateError;
use crate::estimate::Estimator;
use crate::models::{
    EurRecord, MonthlyProduction, OperatorProduction, OperatorReserve, ProductionRecord,
    RunSummary, WellRecord,
};

/// Everything one estimation run produces.
#[derive(Debug, Clone)]
pub struct EstimateRun {
    pub operator_production: Vec<OperatorProduction>,
    pub eur_records: Vec<EurRecord>,
    pub operator_reserves: Vec<OperatorReserve>,
    pub monthly_production: Vec<MonthlyProduction>,
    pub summary: RunSummary,
}

pub fn run(
    wells: &[WellRecord],
    production: Vec<ProductionRecord>,
    config: &EstimatorConfig,
) -> Result<EstimateRun, EstimateError> {
    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("estimate", %run_id);
    let _guard = span.enter();

    let production_records = production.len();
    let operator_production = operator_production(wells);
    let monthly_production = production_by_date(&production);

    let eur_records = Estimator::new(config).estimate_all(wells, production)?;
    let operator_reserves = operator_reserves(wells, &eur_records);

    let wells_estimated = eur_records.iter().filter(|r| r.eur.is_fitted()).count();
    let summary = RunSummary {
        run_id,
        wells_in_table: wells.len(),
        production_records,
        wells_estimated,
        wells_undetermined: eur_records.len() - wells_estimated,
        total_estimated_reserve: eur_records.iter().map(|r| r.eur.summable()).sum(),
        horizon_months: config.reserve.horizon_months,
    };

    info!(
        wells = eur_records.len(),
        estimated = summary.wells_estimated,
        undetermined = summary.wells_undetermined,
        total_reserve = summary.total_estimated_reserve,
        "Estimation complete"
    );

    Ok(EstimateRun {
        operator_production,
        eur_records,
        operator_reserves,
        monthly_production,
        summary,
    })
}

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::clean::clean_series;
use crate::config::EstimatorConfig;
use crate::decline::DeclineFitter;
use crate::error::EstimateError;
use crate::group::{group_by, Group};
use crate::integrate::estimate_eur;
use crate::models::{Eur, EurRecord, ProductionRecord, UndeterminedReason, WellRecord};

/// Runs clean → fit → integrate for every well.
#[derive(Debug, Clone)]
pub struct Estimator {
    config: EstimatorConfig,
    fitter: DeclineFitter,
}

impl Estimator {
    pub fn new(config: &EstimatorConfig) -> Self {
        Self {
            config: config.clone(),
            fitter: DeclineFitter::new(&config.bounds, &config.solver),
        }
    }

    /// One EUR record per distinct production `api`, in first-seen order.
    ///
    /// Wells are estimated on a worker pool; a failure in one well only marks
    /// that well undetermined.
    pub fn estimate_all(
        &self,
        wells: &[WellRecord],
        production: Vec<ProductionRecord>,
    ) -> Result<Vec<EurRecord>, EstimateError> {
        let lookup = well_lookup(wells);
        let groups: Vec<Group<String, ProductionRecord>> =
            group_by(production, |record| record.api.clone());

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.runtime.concurrency)
            .build()?;

        let records: Vec<EurRecord> = pool.install(|| {
            groups
                .par_iter()
                .map(|group| {
                    let well = lookup.get(group.key.as_str()).copied();
                    self.estimate_well(&group.key, &group.rows, well)
                })
                .collect()
        });

        Ok(records)
    }

    pub fn estimate_well(
        &self,
        api: &str,
        records: &[ProductionRecord],
        well: Option<&WellRecord>,
    ) -> EurRecord {
        let mut record = EurRecord {
            api: api.to_string(),
            eur: Eur::Undetermined(UndeterminedReason::InsufficientData { points: 0 }),
            operator_name: well.map(|w| w.operator_name.clone()),
            well_name: well.map(|w| w.well_name.clone()),
            params: None,
        };

        if well.is_none() {
            warn!(api, "production well missing from well table");
        }

        let series = match clean_series(records) {
            Ok(series) => series,
            Err(err) => {
                warn!(api, error = %err, "malformed production history");
                record.eur = Eur::Undetermined(UndeterminedReason::MalformedInput(err.to_string()));
                return record;
            }
        };

        if series.retained_points < self.config.reserve.min_points {
            debug!(api, points = series.retained_points, "insufficient post-peak history");
            record.eur = Eur::Undetermined(UndeterminedReason::InsufficientData {
                points: series.retained_points,
            });
            return record;
        }

        let outcome = self.fitter.fit(&series).and_then(|fit| {
            estimate_eur(
                &fit.params,
                self.config.reserve.horizon_months,
                &self.config.quadrature,
            )
            .map(|eur| (fit, eur))
        });

        match outcome {
            Ok((fit, eur)) => {
                debug!(
                    api,
                    qi = fit.params.qi,
                    b = fit.params.b,
                    di = fit.params.di,
                    iterations = fit.iterations,
                    eur,
                    "decline fit"
                );
                record.eur = Eur::Fitted(eur);
                record.params = Some(fit.params);
            }
            Err(err) => {
                warn!(api, error = %err, "decline fit failed");
                record.eur = Eur::Undetermined(UndeterminedReason::FitDivergence(err));
            }
        }

        record
    }
}

/// Index of the well table by `api`; a later row for an `api` replaces earlier ones.
pub fn well_lookup(wells: &[WellRecord]) -> HashMap<&str, &WellRecord> {
    let mut lookup: HashMap<&str, &WellRecord> = HashMap::with_capacity(wells.len());
    for well in wells {
        if let Some(replaced) = lookup.insert(well.api.as_str(), well) {
            if replaced.operator_name != well.operator_name || replaced.well_name != well.well_name
            {
                warn!(
                    api = %well.api,
                    kept = %well.operator_name,
                    replaced = %replaced.operator_name,
                    "conflicting duplicate well rows"
                );
            }
        }
    }
    lookup
}

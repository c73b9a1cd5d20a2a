use std::collections::HashMap;
use std::hash::Hash;
use std::ops::AddAssign;

use indexmap::IndexMap;

use crate::group::{group_by, unique_keys};
use crate::models::{
    EurRecord, MonthlyProduction, OperatorProduction, OperatorReserve, ProductionRecord,
    WellRecord,
};

/// Sums `values` per key, ordered by `canonical`.
///
/// Canonical keys without values sum to zero; keys missing from `canonical`
/// follow in first-seen order.
pub fn sum_by_key<K, V>(canonical: &[K], values: impl IntoIterator<Item = (K, V)>) -> Vec<(K, V)>
where
    K: Eq + Hash + Clone,
    V: AddAssign + Default,
{
    let mut totals: IndexMap<K, V> = canonical
        .iter()
        .map(|key| (key.clone(), V::default()))
        .collect();

    for (key, value) in values {
        *totals.entry(key).or_default() += value;
    }

    totals.into_iter().collect()
}

/// Operators in the order they first appear in the well table.
pub fn canonical_operators(wells: &[WellRecord]) -> Vec<String> {
    unique_keys(wells, |well| well.operator_name.clone())
}

/// Historical cumulative oil per operator.
pub fn operator_production(wells: &[WellRecord]) -> Vec<OperatorProduction> {
    let operators = canonical_operators(wells);
    sum_by_key(
        &operators,
        wells
            .iter()
            .map(|well| (well.operator_name.clone(), well.cum_oil)),
    )
    .into_iter()
    .map(|(operator_name, total_oil_production)| OperatorProduction {
        operator_name,
        total_oil_production,
    })
    .collect()
}

/// Estimated reserve per operator; undetermined wells add zero.
///
/// Wells with no operator (absent from the well table) are left out.
pub fn operator_reserves(wells: &[WellRecord], records: &[EurRecord]) -> Vec<OperatorReserve> {
    let operators = canonical_operators(wells);
    let attributed: Vec<(&str, &EurRecord)> = records
        .iter()
        .filter_map(|record| record.operator_name.as_deref().map(|op| (op, record)))
        .collect();

    let totals = sum_by_key(
        &operators,
        attributed
            .iter()
            .map(|(operator, record)| (operator.to_string(), record.eur.summable())),
    );

    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (operator, record) in &attributed {
        let entry = counts.entry(*operator).or_insert((0, 0));
        if record.eur.is_fitted() {
            entry.0 += 1;
        } else {
            entry.1 += 1;
        }
    }

    totals
        .into_iter()
        .map(|(operator_name, total_estimated_reserve)| {
            let (wells_estimated, wells_undetermined) = counts
                .get(operator_name.as_str())
                .copied()
                .unwrap_or((0, 0));
            OperatorReserve {
                operator_name,
                total_estimated_reserve,
                wells_estimated,
                wells_undetermined,
            }
        })
        .collect()
}

/// Field production per calendar month in first-seen order; undated rows are skipped.
pub fn production_by_date(production: &[ProductionRecord]) -> Vec<MonthlyProduction> {
    let dated = production
        .iter()
        .filter_map(|record| record.date.map(|date| (date, record)));

    group_by(dated, |(date, _)| *date)
        .into_iter()
        .map(|group| MonthlyProduction {
            date: group.key,
            oil_bbls: group.rows.iter().map(|(_, record)| record.oil_bbls).sum(),
            gas_mcf: group.rows.iter().map(|(_, record)| record.gas_mcf).sum(),
            well_count: group.rows.len(),
        })
        .collect()
}

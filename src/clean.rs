//! Turns one well's raw monthly records into the series used for decline fitting.
//!
//! The peak month is taken as the end of the clean-up transient: everything
//! before it is dropped, months are rebased so the peak becomes month 1, and
//! shut-in months (zero whole barrels) are removed. Gaps in the original
//! month index survive as gaps after rebasing.

use crate::error::SeriesError;
use crate::models::{CleanedSeries, ProductionRecord};

pub fn clean_series(records: &[ProductionRecord]) -> Result<CleanedSeries, SeriesError> {
    if records.is_empty() {
        return Err(SeriesError::Empty);
    }

    let mut points: Vec<(i64, f64)> = records
        .iter()
        .map(|record| (record.index, record.oil_bbls))
        .collect();
    // stable: equal indices keep input order
    points.sort_by_key(|point| point.0);

    if let Some(&(index, volume)) = points
        .iter()
        .find(|point| !point.1.is_finite() || point.1 < 0.0)
    {
        return Err(SeriesError::InvalidVolume { index, volume });
    }

    let peak = peak_position(&points).ok_or(SeriesError::NoProduction)?;
    let retained = &points[peak..];
    let first = retained[0].0;
    let offset = first
        .checked_sub(1)
        .ok_or(SeriesError::IndexOutOfRange { index: first })?;

    let mut series = CleanedSeries {
        months: Vec::with_capacity(retained.len()),
        oil: Vec::with_capacity(retained.len()),
        retained_points: retained.len(),
    };

    for &(index, volume) in retained {
        let barrels = volume.trunc();
        if barrels == 0.0 {
            continue;
        }
        let month = index
            .checked_sub(offset)
            .ok_or(SeriesError::IndexOutOfRange { index })?;
        series.months.push(month);
        series.oil.push(barrels);
    }

    Ok(series)
}

/// Position of the first maximum volume, or `None` when nothing was produced.
fn peak_position(points: &[(i64, f64)]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (position, &(_, volume)) in points.iter().enumerate() {
        match best {
            Some((_, peak)) if volume <= peak => {}
            _ => best = Some((position, volume)),
        }
    }
    best.filter(|(_, peak)| *peak > 0.0)
        .map(|(position, _)| position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(index: i64, oil_bbls: f64) -> ProductionRecord {
        ProductionRecord {
            api: "33-053-00001".to_string(),
            index,
            oil_bbls,
            gas_mcf: 0.0,
            date: None,
        }
    }

    #[test]
    fn drops_ramp_up_and_rebases_to_peak() {
        let records = vec![
            record(4, 300.0),
            record(1, 100.0),
            record(3, 900.0),
            record(2, 500.0),
            record(5, 250.0),
        ];
        let series = clean_series(&records).unwrap();
        assert_eq!(series.months, vec![1, 2, 3]);
        assert_eq!(series.oil, vec![900.0, 300.0, 250.0]);
        assert_eq!(series.retained_points, 3);
    }

    #[test]
    fn shut_in_months_leave_gaps() {
        let records = vec![
            record(10, 800.0),
            record(11, 0.0),
            record(12, 600.0),
            record(14, 400.5),
        ];
        let series = clean_series(&records).unwrap();
        assert_eq!(series.months, vec![1, 3, 5]);
        assert_eq!(series.oil, vec![800.0, 600.0, 400.0]);
        assert_eq!(series.retained_points, 4);
    }

    #[test]
    fn fractional_barrels_count_as_shut_in() {
        let records = vec![record(1, 50.0), record(2, 0.4), record(3, 30.0)];
        let series = clean_series(&records).unwrap();
        assert_eq!(series.months, vec![1, 3]);
        assert_eq!(series.retained_points, 3);
    }

    #[test]
    fn first_peak_wins_on_ties() {
        let records = vec![record(1, 10.0), record(2, 90.0), record(3, 90.0), record(4, 5.0)];
        let series = clean_series(&records).unwrap();
        assert_eq!(series.months, vec![1, 2, 3]);
        assert_eq!(series.oil, vec![90.0, 90.0, 5.0]);
    }

    #[test]
    fn later_secondary_peak_discards_earlier_history() {
        let records = vec![
            record(1, 500.0),
            record(2, 300.0),
            record(3, 200.0),
            record(4, 700.0),
            record(5, 400.0),
        ];
        let series = clean_series(&records).unwrap();
        assert_eq!(series.oil, vec![700.0, 400.0]);
    }

    #[test]
    fn degenerate_series_are_rejected() {
        assert_eq!(clean_series(&[]), Err(SeriesError::Empty));
        assert_eq!(
            clean_series(&[record(1, 0.0), record(2, 0.0)]),
            Err(SeriesError::NoProduction)
        );
        assert_eq!(
            clean_series(&[record(1, 10.0), record(2, -3.0)]),
            Err(SeriesError::InvalidVolume {
                index: 2,
                volume: -3.0
            })
        );
    }

    #[test]
    fn equal_indices_keep_input_order() {
        let records = vec![
            record(2, 300.0),
            record(1, 100.0),
            record(2, 900.0),
            record(3, 50.0),
            record(2, 900.0),
        ];
        let series = clean_series(&records).unwrap();
        assert_eq!(series.months, vec![1, 1, 2]);
        assert_eq!(series.oil, vec![900.0, 900.0, 50.0]);
        assert_eq!(series.retained_points, 3);
    }

    #[test]
    fn extreme_indices_are_rejected_not_wrapped() {
        assert_eq!(
            clean_series(&[record(i64::MIN, 500.0), record(i64::MIN + 1, 200.0)]),
            Err(SeriesError::IndexOutOfRange { index: i64::MIN })
        );
        assert_eq!(
            clean_series(&[record(-5, 500.0), record(i64::MAX, 200.0)]),
            Err(SeriesError::IndexOutOfRange { index: i64::MAX })
        );
    }

    proptest! {
        #[test]
        fn cleaned_series_invariants(
            raw in proptest::collection::vec((0i64..40, 0u32..2000), 1..50)
        ) {
            let records: Vec<ProductionRecord> = raw
                .iter()
                .map(|(index, volume)| record(*index, *volume as f64))
                .collect();
            match clean_series(&records) {
                Ok(series) => {
                    prop_assert_eq!(series.months.len(), series.oil.len());
                    prop_assert!(series.len() <= records.len());
                    prop_assert!(series.retained_points <= records.len());
                    prop_assert_eq!(series.months.first().copied(), Some(1));
                    prop_assert!(series.months.windows(2).all(|pair| pair[0] <= pair[1]));
                    prop_assert!(series.oil.iter().all(|volume| *volume > 0.0));
                }
                Err(err) => {
                    prop_assert_eq!(err, SeriesError::NoProduction);
                    prop_assert!(raw.iter().all(|(_, volume)| *volume == 0));
                }
            }
        }
    }
}

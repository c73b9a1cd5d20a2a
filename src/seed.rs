//! Deterministic sample well and production tables for trying the CLI.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Months, NaiveDate};
use serde::Serialize;

use crate::error::ExportError;
use crate::export::write_csv;
use crate::models::DeclineParams;

pub const SAMPLE_WELLS_FILE: &str = "wells.csv";
pub const SAMPLE_PRODUCTION_FILE: &str = "production.csv";

#[derive(Serialize)]
struct WellRow {
    api: &'static str,
    operator_name: &'static str,
    well_name: &'static str,
    cum_oil: f64,
    spud_date: NaiveDate,
}

#[derive(Serialize)]
struct ProductionRow {
    api: &'static str,
    date: NaiveDate,
    index: i64,
    volume_oil_formation_bbls: f64,
    volume_gas_formation_mcf: f64,
}

struct SampleWell {
    api: &'static str,
    operator_name: &'static str,
    well_name: &'static str,
    spud: (i32, u32),
    volumes: Vec<f64>,
}

fn decline(qi: f64, b: f64, di: f64, months: usize) -> Vec<f64> {
    let params = DeclineParams { qi, b, di };
    (1..=months).map(|t| params.rate(t as f64).round()).collect()
}

fn sample_wells() -> Vec<SampleWell> {
    let mut ramped = vec![420.0, 1_150.0];
    ramped.extend(decline(1_900.0, 0.9, 0.12, 34));
    ramped[9] = 0.0;

    vec![
        SampleWell {
            api: "33-105-02861",
            operator_name: "WPX ENERGY WILLISTON LLC",
            well_name: "LUCY 1H",
            spud: (2013, 4),
            volumes: ramped,
        },
        SampleWell {
            api: "33-105-02862",
            operator_name: "WPX ENERGY WILLISTON LLC",
            well_name: "ROSA 2H",
            spud: (2014, 1),
            volumes: decline(1_400.0, 1.1, 0.08, 24),
        },
        SampleWell {
            api: "33-053-04417",
            operator_name: "HESS BAKKEN INVESTMENTS II, LLC",
            well_name: "ELLA 3H",
            spud: (2015, 6),
            volumes: vec![380.0, 910.0, 760.0, 640.0],
        },
        SampleWell {
            api: "33-053-04418",
            operator_name: "HESS BAKKEN INVESTMENTS II, LLC",
            well_name: "OWEN 4H",
            spud: (2015, 8),
            volumes: vec![0.0; 7],
        },
        SampleWell {
            api: "33-061-03109",
            operator_name: "CONTINENTAL RESOURCES, INC.",
            well_name: "DORA 5H",
            spud: (2012, 9),
            volumes: decline(2_600.0, 0.6, 0.15, 48),
        },
    ]
}

/// Writes the sample tables into `out_dir`, returning (wells, production) paths.
pub fn write_sample_dataset(out_dir: &Path) -> Result<(PathBuf, PathBuf), ExportError> {
    fs::create_dir_all(out_dir).map_err(|source| ExportError::Io {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let mut well_rows = Vec::new();
    let mut production_rows = Vec::new();

    for well in sample_wells() {
        let Some(spud) = NaiveDate::from_ymd_opt(well.spud.0, well.spud.1, 1) else {
            continue;
        };
        well_rows.push(WellRow {
            api: well.api,
            operator_name: well.operator_name,
            well_name: well.well_name,
            cum_oil: well.volumes.iter().sum(),
            spud_date: spud,
        });

        let first_month = spud + Months::new(1);
        for (offset, volume) in well.volumes.iter().enumerate() {
            production_rows.push(ProductionRow {
                api: well.api,
                date: first_month + Months::new(offset as u32),
                index: offset as i64 + 1,
                volume_oil_formation_bbls: *volume,
                volume_gas_formation_mcf: (volume * 1.6).round(),
            });
        }
    }

    let wells_path = out_dir.join(SAMPLE_WELLS_FILE);
    let production_path = out_dir.join(SAMPLE_PRODUCTION_FILE);
    write_csv(&wells_path, &well_rows)?;
    write_csv(&production_path, &production_rows)?;

    Ok((wells_path, production_path))
}

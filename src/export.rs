use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::ExportError;
use crate::models::EurRecord;
use crate::pipeline::EstimateRun;

pub const OPERATOR_PRODUCTION_FILE: &str = "operator_oil_production.csv";
pub const WELL_EUR_FILE: &str = "well_eur.csv";
pub const OPERATOR_RESERVES_FILE: &str = "operator_reserves.csv";
pub const SUMMARY_FILE: &str = "summary.json";

/// Flat per-well row; undetermined EUR and missing parameters are blank cells.
#[derive(Debug, Serialize)]
pub struct WellEurRow<'a> {
    pub api: &'a str,
    pub eur_oil: Option<u64>,
    pub operator_name: Option<&'a str>,
    pub well_name: Option<&'a str>,
    pub status: &'static str,
    pub qi: Option<f64>,
    pub b: Option<f64>,
    pub di: Option<f64>,
}

impl<'a> From<&'a EurRecord> for WellEurRow<'a> {
    fn from(record: &'a EurRecord) -> Self {
        Self {
            api: &record.api,
            eur_oil: record.eur.barrels(),
            operator_name: record.operator_name.as_deref(),
            well_name: record.well_name.as_deref(),
            status: record.eur.status(),
            qi: record.params.map(|p| p.qi),
            b: record.params.map(|p| p.b),
            di: record.params.map(|p| p.di),
        }
    }
}

/// Writes the three result tables and the run summary into `out_dir`.
pub fn write_outputs(run: &EstimateRun, out_dir: &Path) -> Result<Vec<PathBuf>, ExportError> {
    fs::create_dir_all(out_dir).map_err(|source| ExportError::Io {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let production = out_dir.join(OPERATOR_PRODUCTION_FILE);
    write_csv(&production, &run.operator_production)?;

    let wells = out_dir.join(WELL_EUR_FILE);
    let rows: Vec<WellEurRow> = run.eur_records.iter().map(WellEurRow::from).collect();
    write_csv(&wells, &rows)?;

    let reserves = out_dir.join(OPERATOR_RESERVES_FILE);
    write_csv(&reserves, &run.operator_reserves)?;

    let summary = out_dir.join(SUMMARY_FILE);
    let file = fs::File::create(&summary).map_err(|source| ExportError::Io {
        path: summary.clone(),
        source,
    })?;
    serde_json::to_writer_pretty(file, &run.summary).map_err(|source| ExportError::Json {
        path: summary.clone(),
        source,
    })?;

    Ok(vec![production, wells, reserves, summary])
}

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), ExportError> {
    let csv_error = |source| ExportError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
    for row in rows {
        writer.serialize(row).map_err(csv_error)?;
    }
    writer.flush().map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

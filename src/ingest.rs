//! Reads the well and production tables.
//!
//! Columns are located by header name (trimmed, case-insensitive); extra
//! columns are ignored. A missing required column or input file stops the
//! run before any estimation starts.

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use tracing::info;

use crate::error::IngestError;
use crate::models::{ProductionRecord, WellRecord};

pub const WELL_COLUMNS: [&str; 5] = ["api", "operator_name", "well_name", "cum_oil", "spud_date"];
pub const PRODUCTION_COLUMNS: [&str; 5] = [
    "api",
    "index",
    "volume_oil_formation_bbls",
    "volume_gas_formation_mcf",
    "date",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%m/%d/%Y %H:%M"];

pub fn read_wells(path: &Path) -> Result<Vec<WellRecord>, IngestError> {
    let mut table = Table::open(path, &WELL_COLUMNS)?;
    let mut wells = Vec::new();

    while let Some(row) = table.next_row()? {
        wells.push(WellRecord {
            api: row.text(0).to_string(),
            operator_name: row.text(1).to_string(),
            well_name: row.text(2).to_string(),
            cum_oil: row.number(3)?,
            spud_date: row.date(4)?,
        });
    }

    info!(path = %path.display(), wells = wells.len(), "Loaded well table");
    Ok(wells)
}

pub fn read_production(path: &Path) -> Result<Vec<ProductionRecord>, IngestError> {
    let mut table = Table::open(path, &PRODUCTION_COLUMNS)?;
    let mut production = Vec::new();

    while let Some(row) = table.next_row()? {
        production.push(ProductionRecord {
            api: row.text(0).to_string(),
            index: row.month_index(1)?,
            oil_bbls: row.number(2)?,
            gas_mcf: row.number(3)?,
            date: row.date(4)?,
        });
    }

    info!(path = %path.display(), records = production.len(), "Loaded production table");
    Ok(production)
}

/// Parses the accepted date layouts; `Ok(None)` for a blank cell.
pub fn parse_date(value: &str) -> Result<Option<NaiveDate>, String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Ok(Some(date));
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(stamp) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Some(stamp.date()));
        }
    }
    Err(format!("unrecognized date `{value}`"))
}

struct Table<'a> {
    path: &'a Path,
    reader: csv::Reader<std::fs::File>,
    positions: Vec<usize>,
    record: StringRecord,
}

impl<'a> Table<'a> {
    fn open(path: &'a Path, required: &[&str]) -> Result<Self, IngestError> {
        if !path.exists() {
            return Err(IngestError::FileNotFound(path.to_path_buf()));
        }

        let csv_error = |source| IngestError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(path)
            .map_err(csv_error)?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(|header| header.trim().to_lowercase())
            .collect();

        let positions = required
            .iter()
            .map(|column| {
                headers
                    .iter()
                    .position(|header| header == column)
                    .ok_or_else(|| IngestError::MissingColumn {
                        path: path.to_path_buf(),
                        column: column.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            path,
            reader,
            positions,
            record: StringRecord::new(),
        })
    }

    fn next_row(&mut self) -> Result<Option<Row<'_>>, IngestError> {
        let more = self
            .reader
            .read_record(&mut self.record)
            .map_err(|source| IngestError::Csv {
                path: self.path.to_path_buf(),
                source,
            })?;
        if !more {
            return Ok(None);
        }
        Ok(Some(Row {
            path: self.path,
            line: self.record.position().map(|p| p.line()).unwrap_or(0),
            record: &self.record,
            positions: &self.positions,
        }))
    }
}

struct Row<'a> {
    path: &'a Path,
    line: u64,
    record: &'a StringRecord,
    positions: &'a [usize],
}

impl Row<'_> {
    fn text(&self, column: usize) -> &str {
        self.record.get(self.positions[column]).unwrap_or("")
    }

    /// Blank numeric cells read as zero.
    fn number(&self, column: usize) -> Result<f64, IngestError> {
        let value = self.text(column);
        if value.is_empty() {
            return Ok(0.0);
        }
        value
            .replace(',', "")
            .parse::<f64>()
            .map_err(|_| self.bad(format!("`{value}` is not a number")))
    }

    fn month_index(&self, column: usize) -> Result<i64, IngestError> {
        let value = self.text(column);
        if let Ok(index) = value.parse::<i64>() {
            return Ok(index);
        }
        match value.parse::<f64>() {
            Ok(index) if index.is_finite() && index.fract() == 0.0 => Ok(index as i64),
            _ => Err(self.bad(format!("`{value}` is not a whole month index"))),
        }
    }

    fn date(&self, column: usize) -> Result<Option<NaiveDate>, IngestError> {
        parse_date(self.text(column)).map_err(|message| self.bad(message))
    }

    fn bad(&self, message: String) -> IngestError {
        IngestError::BadRow {
            path: self.path.to_path_buf(),
            line: self.line,
            message,
        }
    }
}

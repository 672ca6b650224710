//! Per-day input files
//!
//! One CSV per calendar date with a header row. Columns are located by name,
//! so their order in the file does not matter.

use csv::{ReaderBuilder, StringRecord, Trim};
use std::io::Read;
use std::path::Path;
use thiserror::Error;

use crate::domain::RawObservation;

pub const COL_DATETIME: &str = "Datetime";
pub const COL_TEMPERATURE: &str = "Temperature";
pub const COL_HUMIDITY: &str = "Humidity";
pub const COL_WIND_SPEED: &str = "WindSpeed";
pub const COL_GENERAL_DIFFUSE_FLOWS: &str = "GeneralDiffuseFlows";
pub const COL_DIFFUSE_FLOWS: &str = "DiffuseFlows";
pub const COL_POWER_CONSUMPTION: &str = "PowerConsumption";

#[derive(Debug, Error)]
pub enum DayFileError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing column {0:?}")]
    MissingColumn(&'static str),

    #[error("row {row}: column {column:?} is not a number: {value:?}")]
    InvalidNumber {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("file has no data rows")]
    NoRows,
}

struct ColumnIndex {
    datetime: usize,
    temperature: usize,
    humidity: usize,
    wind_speed: usize,
    general_diffuse_flows: usize,
    diffuse_flows: usize,
    power_consumption: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self, DayFileError> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}') == name)
                .ok_or(DayFileError::MissingColumn(name))
        };
        Ok(Self {
            datetime: find(COL_DATETIME)?,
            temperature: find(COL_TEMPERATURE)?,
            humidity: find(COL_HUMIDITY)?,
            wind_speed: find(COL_WIND_SPEED)?,
            general_diffuse_flows: find(COL_GENERAL_DIFFUSE_FLOWS)?,
            diffuse_flows: find(COL_DIFFUSE_FLOWS)?,
            power_consumption: find(COL_POWER_CONSUMPTION)?,
        })
    }
}

fn number(record: &StringRecord, idx: usize, row: usize, column: &'static str) -> Result<f64, DayFileError> {
    let value = record.get(idx).unwrap_or_default();
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| DayFileError::InvalidNumber {
            row,
            column,
            value: value.to_string(),
        })
}

/// Read one day of observations from any CSV source
pub fn read_day<R: Read>(source: R) -> Result<Vec<RawObservation>, DayFileError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(source);

    let cols = ColumnIndex::from_headers(reader.headers()?)?;

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let row = i + 1;
        rows.push(RawObservation {
            datetime: record.get(cols.datetime).unwrap_or_default().to_string(),
            temperature: number(&record, cols.temperature, row, COL_TEMPERATURE)?,
            humidity: number(&record, cols.humidity, row, COL_HUMIDITY)?,
            wind_speed: number(&record, cols.wind_speed, row, COL_WIND_SPEED)?,
            general_diffuse_flows: number(&record, cols.general_diffuse_flows, row, COL_GENERAL_DIFFUSE_FLOWS)?,
            diffuse_flows: number(&record, cols.diffuse_flows, row, COL_DIFFUSE_FLOWS)?,
            power_consumption: number(&record, cols.power_consumption, row, COL_POWER_CONSUMPTION)?,
        });
    }

    if rows.is_empty() {
        return Err(DayFileError::NoRows);
    }
    Ok(rows)
}

/// Read a per-day file from disk
pub fn read_day_file(path: &Path) -> Result<Vec<RawObservation>, DayFileError> {
    let file = std::fs::File::open(path).map_err(csv::Error::from)?;
    read_day(std::io::BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const HEADER: &str =
        "Datetime,Temperature,Humidity,WindSpeed,GeneralDiffuseFlows,DiffuseFlows,PowerConsumption";

    #[test]
    fn test_read_day_in_file_order() {
        let data = format!(
            "{HEADER}\n2017-03-10 00:00:00,15.1,70.2,0.08,0.05,0.1,120.5\n2017-03-10 00:15:00,14.9,71.0,0.08,0.06,0.1,118.2\n"
        );
        let rows = read_day(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].datetime, "2017-03-10 00:00:00");
        assert_eq!(rows[0].power_consumption, 120.5);
        assert_eq!(rows[1].power_consumption, 118.2);
        assert_eq!(rows[1].humidity, 71.0);
    }

    #[test]
    fn test_read_day_columns_located_by_name() {
        let data = "PowerConsumption,DiffuseFlows,Datetime,Temperature,Humidity,WindSpeed,GeneralDiffuseFlows\n\
                    99.5,0.2,2017-03-10 00:00:00,10.0,50.0,1.0,0.3\n";
        let rows = read_day(data.as_bytes()).unwrap();
        assert_eq!(rows[0].power_consumption, 99.5);
        assert_eq!(rows[0].diffuse_flows, 0.2);
        assert_eq!(rows[0].general_diffuse_flows, 0.3);
        assert_eq!(rows[0].temperature, 10.0);
    }

    #[test]
    fn test_read_day_tolerates_spaces_and_bom() {
        let data = "\u{feff}Datetime, Temperature, Humidity, WindSpeed, GeneralDiffuseFlows, DiffuseFlows, PowerConsumption\n\
                    2017-03-10 00:00:00, 1, 2, 3, 4, 5, 6\n";
        let rows = read_day(data.as_bytes()).unwrap();
        assert_eq!(rows[0].power_consumption, 6.0);
    }

    #[test]
    fn test_missing_column() {
        let data = "Datetime,Temperature,Humidity,WindSpeed,GeneralDiffuseFlows,DiffuseFlows\n\
                    2017-03-10 00:00:00,1,2,3,4,5\n";
        let err = read_day(data.as_bytes()).unwrap_err();
        assert!(matches!(err, DayFileError::MissingColumn(COL_POWER_CONSUMPTION)));
    }

    #[test]
    fn test_invalid_number() {
        let data = format!("{HEADER}\n2017-03-10 00:00:00,1,2,three,4,5,6\n");
        match read_day(data.as_bytes()).unwrap_err() {
            DayFileError::InvalidNumber { row, column, value } => {
                assert_eq!(row, 1);
                assert_eq!(column, COL_WIND_SPEED);
                assert_eq!(value, "three");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[rstest]
    #[case("NaN")]
    #[case("inf")]
    #[case("-infinity")]
    fn test_non_finite_readings_are_rejected(#[case] reading: &str) {
        let data = format!("{HEADER}\n2017-03-10 00:00:00,{reading},2,3,4,5,6\n");
        match read_day(data.as_bytes()).unwrap_err() {
            DayFileError::InvalidNumber { column, value, .. } => {
                assert_eq!(column, COL_TEMPERATURE);
                assert_eq!(value, reading);
            }
            other => panic!("unexpected error: {other}"),
        }

        let data = format!("{HEADER}\n2017-03-10 00:00:00,1,2,3,4,5,{reading}\n");
        assert!(matches!(
            read_day(data.as_bytes()),
            Err(DayFileError::InvalidNumber { column: COL_POWER_CONSUMPTION, .. })
        ));
    }

    #[test]
    fn test_ragged_row_is_an_error() {
        let data = format!("{HEADER}\n2017-03-10 00:00:00,1,2,3\n");
        assert!(matches!(read_day(data.as_bytes()), Err(DayFileError::Csv(_))));
    }

    #[test]
    fn test_header_only_file_has_no_rows() {
        assert!(matches!(read_day(HEADER.as_bytes()), Err(DayFileError::NoRows)));
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_day_file(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, DayFileError::Csv(_)));
    }
}

//! Feature engineering for the load model
//!
//! Turns one day of raw readings into model-ready rows by adding cyclical
//! encodings of month and time-of-day. No scaling is applied.

use chrono::{Datelike, NaiveDateTime, Timelike};
use std::f64::consts::PI;
use thiserror::Error;

use crate::domain::{ObservationRow, RawObservation};

const MONTHS_PER_YEAR: f64 = 12.0;
const MINUTES_PER_DAY: f64 = 1440.0;

/// Timestamp layouts seen in exported day files
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeatureError {
    #[error("row {row}: unparseable timestamp {value:?}")]
    Timestamp { row: usize, value: String },
}

/// Parse a timestamp string from a day file
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

/// Sine/cosine encodings of month and time-of-day.
///
/// December sits next to January and 23:59 next to 00:00 on the unit circle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CyclicalEncoding {
    pub month_sin: f64,
    pub month_cos: f64,
    pub time_sin: f64,
    pub time_cos: f64,
}

impl CyclicalEncoding {
    pub fn from_datetime(datetime: &NaiveDateTime) -> Self {
        let month = datetime.month() as f64;
        let minutes = (datetime.hour() * 60 + datetime.minute()) as f64;
        let month_angle = 2.0 * PI * month / MONTHS_PER_YEAR;
        let time_angle = 2.0 * PI * minutes / MINUTES_PER_DAY;
        Self {
            month_sin: month_angle.sin(),
            month_cos: month_angle.cos(),
            time_sin: time_angle.sin(),
            time_cos: time_angle.cos(),
        }
    }
}

/// A reading plus its derived features
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub observation: ObservationRow,
    pub encoding: CyclicalEncoding,
}

impl FeatureRow {
    pub fn model_input(&self) -> ModelInput {
        ModelInput {
            month_sin: self.encoding.month_sin,
            month_cos: self.encoding.month_cos,
            time_sin: self.encoding.time_sin,
            time_cos: self.encoding.time_cos,
            temperature: self.observation.temperature,
            humidity: self.observation.humidity,
            wind_speed: self.observation.wind_speed,
            general_diffuse_flows: self.observation.general_diffuse_flows,
            diffuse_flows: self.observation.diffuse_flows,
        }
    }
}

/// The nine model columns, by name.
///
/// The tree model is positional; [`ModelInput::to_array`] is the only place
/// that decides column order and it follows [`ModelInput::FEATURE_NAMES`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelInput {
    pub month_sin: f64,
    pub month_cos: f64,
    pub time_sin: f64,
    pub time_cos: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub general_diffuse_flows: f64,
    pub diffuse_flows: f64,
}

impl ModelInput {
    pub const NUM_FEATURES: usize = 9;

    /// Column names as recorded in the trained artifact
    pub const FEATURE_NAMES: [&'static str; Self::NUM_FEATURES] = [
        "Month_sin",
        "Month_cos",
        "Time_sin",
        "Time_cos",
        "Temperature",
        "Humidity",
        "WindSpeed",
        "GeneralDiffuseFlows",
        "DiffuseFlows",
    ];

    pub fn to_array(&self) -> [f64; Self::NUM_FEATURES] {
        [
            self.month_sin,
            self.month_cos,
            self.time_sin,
            self.time_cos,
            self.temperature,
            self.humidity,
            self.wind_speed,
            self.general_diffuse_flows,
            self.diffuse_flows,
        ]
    }
}

/// Derive features for one day of readings.
///
/// Row order and count are preserved. A single malformed timestamp fails the
/// whole day.
pub fn transform_day(rows: &[RawObservation]) -> Result<Vec<FeatureRow>, FeatureError> {
    rows.iter()
        .enumerate()
        .map(|(i, raw)| {
            let datetime = parse_timestamp(&raw.datetime).ok_or_else(|| FeatureError::Timestamp {
                row: i + 1,
                value: raw.datetime.clone(),
            })?;
            Ok(FeatureRow {
                observation: ObservationRow::from_raw(raw, datetime),
                encoding: CyclicalEncoding::from_datetime(&datetime),
            })
        })
        .collect()
}

//! Day forecast service
//!
//! Resolves a calendar date to its per-day input file, derives features,
//! scores the whole day in one batch and packages predicted-vs-actual
//! series. Every failure collapses to "no result" at this boundary.

use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, warn};

use super::{read_day_file, transform_day, DayFileError, FeatureError, ForecastEngine, ModelInput};
use crate::domain::{DayForecast, SeriesLengthMismatch};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("not a calendar date: {0:?}")]
    InvalidDate(String),

    #[error("no input file at {0}")]
    NotFound(PathBuf),

    #[error("malformed input file: {0}")]
    DayFile(#[from] DayFileError),

    #[error("malformed input file: {0}")]
    Features(#[from] FeatureError),

    #[error(transparent)]
    Misaligned(#[from] SeriesLengthMismatch),
}

pub struct DayForecastService {
    data_dir: PathBuf,
    engine: Arc<ForecastEngine>,
}

impl DayForecastService {
    pub fn new(data_dir: impl Into<PathBuf>, engine: Arc<ForecastEngine>) -> Self {
        Self {
            data_dir: data_dir.into(),
            engine,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn engine(&self) -> &ForecastEngine {
        &self.engine
    }

    /// `<data_dir>/<YYYY-MM-DD>.csv`
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.data_dir.join(format!("{}.csv", date.format(DATE_FORMAT)))
    }

    /// Forecast for `date`, or `None` when the day is missing or unusable
    pub fn forecast(&self, date: &str) -> Option<DayForecast> {
        match self.try_forecast(date) {
            Ok(result) => Some(result),
            Err(e @ (ForecastError::InvalidDate(_) | ForecastError::NotFound(_))) => {
                debug!(date, error = %e, "no forecast input");
                None
            }
            Err(e) => {
                warn!(date, error = %e, "forecast input rejected");
                None
            }
        }
    }

    /// Same as [`Self::forecast`], with the file work moved off the async
    /// executor
    pub async fn forecast_async(self: &Arc<Self>, date: &str) -> Option<DayForecast> {
        let this = Arc::clone(self);
        let date = date.to_string();
        match tokio::task::spawn_blocking(move || this.forecast(&date)).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "forecast task failed");
                None
            }
        }
    }

    pub fn try_forecast(&self, date: &str) -> Result<DayForecast, ForecastError> {
        let day = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
            .map_err(|_| ForecastError::InvalidDate(date.to_string()))?;
        let path = self.path_for(day);
        if !path.is_file() {
            return Err(ForecastError::NotFound(path));
        }

        let raw = read_day_file(&path)?;
        let rows = transform_day(&raw)?;
        let inputs: Vec<ModelInput> = rows.iter().map(|r| r.model_input()).collect();
        let predicted = self.engine.score(&inputs);

        let timestamps = rows.iter().map(|r| r.observation.time_label()).collect();
        let actual = rows.iter().map(|r| r.observation.power_consumption).collect();
        Ok(DayForecast::new(timestamps, predicted, actual)?)
    }

    /// Dates with an input file, ascending
    pub fn available_dates(&self) -> Vec<String> {
        let entries = match std::fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %self.data_dir.display(), error = %e, "cannot list forecast data directory");
                return Vec::new();
            }
        };
        let mut dates: Vec<NaiveDate> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "csv"))
            .filter_map(|path| {
                let stem = path.file_stem()?.to_str()?;
                NaiveDate::parse_from_str(stem, DATE_FORMAT).ok()
            })
            .collect();
        dates.sort();
        dates
            .into_iter()
            .map(|d| d.format(DATE_FORMAT).to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::models::testing::LinearStub;
    use std::fs;
    use tempfile::TempDir;

    const HEADER: &str =
        "Datetime,Temperature,Humidity,WindSpeed,GeneralDiffuseFlows,DiffuseFlows,PowerConsumption";

    fn temperature_echo() -> Arc<ForecastEngine> {
        let mut weights = vec![0.0; ModelInput::NUM_FEATURES];
        weights[4] = 1.0;
        Arc::new(ForecastEngine::from_regressor(Arc::new(LinearStub::new(weights, 0.0))).unwrap())
    }

    fn service_with(files: &[(&str, &str)]) -> (TempDir, DayForecastService) {
        let dir = TempDir::new().unwrap();
        for (name, body) in files {
            fs::write(dir.path().join(name), body).unwrap();
        }
        let svc = DayForecastService::new(dir.path(), temperature_echo());
        (dir, svc)
    }

    #[test]
    fn test_forecast_aligns_series_with_rows() {
        let body = format!(
            "{HEADER}\n2017-03-10 00:00:00,15.1,70,0.08,0.05,0.1,120.5\n\
             2017-03-10 00:15:00,14.9,71,0.08,0.06,0.1,118.2\n\
             2017-03-10 13:05:00,21.0,60,0.08,300,20,140.0\n"
        );
        let (_dir, svc) = service_with(&[("2017-03-10.csv", &body)]);
        let f = svc.forecast("2017-03-10").unwrap();
        assert_eq!(f.timestamps, vec!["00:00", "00:15", "13:05"]);
        assert_eq!(f.predicted_values, vec![15.1, 14.9, 21.0]);
        assert_eq!(f.actual_values, vec![120.5, 118.2, 140.0]);
    }

    #[test]
    fn test_forecast_is_idempotent() {
        let body = format!("{HEADER}\n2017-03-10 00:00:00,15.1,70,0.08,0.05,0.1,120.5\n");
        let (_dir, svc) = service_with(&[("2017-03-10.csv", &body)]);
        assert_eq!(svc.forecast("2017-03-10"), svc.forecast("2017-03-10"));
    }

    #[test]
    fn test_missing_day_is_none() {
        let (_dir, svc) = service_with(&[]);
        assert!(svc.forecast("2099-99-99").is_none());
        assert!(svc.forecast("2099-01-01").is_none());
        assert!(matches!(svc.try_forecast("2099-01-01"), Err(ForecastError::NotFound(_))));
    }

    #[test]
    fn test_non_dates_are_none() {
        let (_dir, svc) = service_with(&[]);
        for date in ["", "../secrets", "2017-03-10/../../etc/passwd", "tomorrow"] {
            assert!(matches!(svc.try_forecast(date), Err(ForecastError::InvalidDate(_))));
            assert!(svc.forecast(date).is_none());
        }
    }

    #[test]
    fn test_malformed_days_are_none() {
        let bad_number = format!("{HEADER}\n2017-03-10 00:00:00,warm,70,0.08,0.05,0.1,120.5\n");
        let bad_time = format!("{HEADER}\n2017-03-11 00:00:00,1,2,3,4,5,6\nsoon,1,2,3,4,5,6\n");
        let missing_col = "Datetime,Temperature\n2017-03-12 00:00:00,1\n";
        let (_dir, svc) = service_with(&[
            ("2017-03-10.csv", &bad_number),
            ("2017-03-11.csv", &bad_time),
            ("2017-03-12.csv", missing_col),
        ]);
        assert!(matches!(svc.try_forecast("2017-03-10"), Err(ForecastError::DayFile(_))));
        assert!(matches!(svc.try_forecast("2017-03-11"), Err(ForecastError::Features(_))));
        assert!(matches!(svc.try_forecast("2017-03-12"), Err(ForecastError::DayFile(_))));
        for date in ["2017-03-10", "2017-03-11", "2017-03-12"] {
            assert!(svc.forecast(date).is_none());
        }
    }

    #[test]
    fn test_available_dates_sorted() {
        let body = format!("{HEADER}\n2017-03-10 00:00:00,1,2,3,4,5,6\n");
        let (_dir, svc) = service_with(&[
            ("2017-03-12.csv", &body),
            ("2017-03-10.csv", &body),
            ("notes.csv", &body),
            ("2017-03-11.txt", &body),
        ]);
        assert_eq!(svc.available_dates(), vec!["2017-03-10", "2017-03-12"]);
    }

    #[test]
    fn test_available_dates_without_directory() {
        let svc = DayForecastService::new("/no/such/dir", temperature_echo());
        assert!(svc.available_dates().is_empty());
    }

    #[tokio::test]
    async fn test_forecast_async() {
        let body = format!("{HEADER}\n2017-03-10 00:00:00,15.1,70,0.08,0.05,0.1,120.5\n");
        let (_dir, svc) = service_with(&[("2017-03-10.csv", &body)]);
        let svc = Arc::new(svc);
        let f = svc.forecast_async("2017-03-10").await.unwrap();
        assert_eq!(f.len(), 1);
        assert!(svc.forecast_async("1999-01-01").await.is_none());
    }
}

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Predicted-vs-actual series for one calendar day.
///
/// All three sequences share length and index alignment with the rows of the
/// source day file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayForecast {
    pub timestamps: Vec<String>,
    pub predicted_values: Vec<f64>,
    pub actual_values: Vec<f64>,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("series length mismatch: {timestamps} timestamps, {predicted} predicted, {actual} actual")]
pub struct SeriesLengthMismatch {
    pub timestamps: usize,
    pub predicted: usize,
    pub actual: usize,
}

impl DayForecast {
    pub fn new(
        timestamps: Vec<String>,
        predicted_values: Vec<f64>,
        actual_values: Vec<f64>,
    ) -> Result<Self, SeriesLengthMismatch> {
        if timestamps.len() != predicted_values.len() || timestamps.len() != actual_values.len() {
            return Err(SeriesLengthMismatch {
                timestamps: timestamps.len(),
                predicted: predicted_values.len(),
                actual: actual_values.len(),
            });
        }
        Ok(Self {
            timestamps,
            predicted_values,
            actual_values,
        })
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_accepts_aligned_series() {
        let f = DayForecast::new(
            vec!["00:00".to_string(), "00:15".to_string()],
            vec![1.0, 2.0],
            vec![3.0, 4.0],
        )
        .unwrap();
        assert_eq!(f.len(), 2);
        assert!(!f.is_empty());
    }

    #[test]
    fn test_new_rejects_misaligned_series() {
        let err = DayForecast::new(vec!["00:00".to_string()], vec![1.0, 2.0], vec![3.0])
            .unwrap_err();
        assert_eq!(err.predicted, 2);
    }

    #[test]
    fn test_serialization_uses_dashboard_field_names() {
        let f = DayForecast::new(vec!["00:00".to_string()], vec![1.5], vec![2.5]).unwrap();
        let json = serde_json::to_value(&f).unwrap();
        assert_eq!(json["timestamps"][0], "00:00");
        assert_eq!(json["predicted_values"][0], 1.5);
        assert_eq!(json["actual_values"][0], 2.5);
    }
}

//! Scoring interface shared by model implementations

/// A fitted regression model.
///
/// Features are positional: `features[i]` is column `i` of the training
/// matrix. Implementations must be immutable after construction so that one
/// instance can serve concurrent requests without locking.
pub trait Regressor: Send + Sync {
    /// Score one row
    fn predict_row(&self, features: &[f64]) -> f64;

    /// Number of input columns the model was trained on
    fn num_features(&self) -> usize;

    /// Column names recorded at training time, if any
    fn feature_names(&self) -> &[String];

    /// Score a batch of rows, one value per row in input order
    fn predict_batch(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|r| self.predict_row(r)).collect()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Regressor;

    /// Linear stand-in for a trained model: `sum(w_i * x_i) + bias`
    pub struct LinearStub {
        pub weights: Vec<f64>,
        pub bias: f64,
        pub names: Vec<String>,
    }

    impl LinearStub {
        pub fn new(weights: Vec<f64>, bias: f64) -> Self {
            let names = (0..weights.len()).map(|i| format!("Column_{i}")).collect();
            Self { weights, bias, names }
        }
    }

    impl Regressor for LinearStub {
        fn predict_row(&self, features: &[f64]) -> f64 {
            self.weights.iter().zip(features).map(|(w, x)| w * x).sum::<f64>() + self.bias
        }

        fn num_features(&self) -> usize {
            self.weights.len()
        }

        fn feature_names(&self) -> &[String] {
            &self.names
        }
    }

    #[test]
    fn test_predict_batch_keeps_row_order() {
        let stub = LinearStub::new(vec![1.0, 10.0], 0.5);
        let out = stub.predict_batch(&[vec![1.0, 0.0], vec![0.0, 1.0], vec![2.0, 2.0]]);
        assert_eq!(out, vec![1.5, 10.5, 22.5]);
    }
}

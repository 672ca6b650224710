use std::path::Path;
use std::sync::Arc;

use super::ModelInput;
use crate::ml::{ModelError, ModelSummary, Regressor, TreeEnsemble};

/// Scores model inputs against a pre-trained load model.
///
/// Loaded once at start-up and shared read-only by every request.
pub struct ForecastEngine {
    model: Arc<dyn Regressor>,
    summary: Option<ModelSummary>,
}

impl ForecastEngine {
    /// Load the tree ensemble at `path` and check its input schema
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let model = TreeEnsemble::from_file(path)?;
        let summary = model.summary();
        let mut engine = Self::from_regressor(Arc::new(model))?;
        engine.summary = Some(summary);
        Ok(engine)
    }

    /// Wrap an already constructed model.
    ///
    /// The model must take exactly the nine [`ModelInput`] columns. If it
    /// recorded real column names at training time they must match
    /// [`ModelInput::FEATURE_NAMES`] in order; a permuted schema is rejected.
    pub fn from_regressor(model: Arc<dyn Regressor>) -> Result<Self, ModelError> {
        check_schema(model.as_ref())?;
        Ok(Self {
            model,
            summary: None,
        })
    }

    pub fn summary(&self) -> Option<&ModelSummary> {
        self.summary.as_ref()
    }

    /// One prediction per input row, in input order
    pub fn score(&self, inputs: &[ModelInput]) -> Vec<f64> {
        let rows: Vec<Vec<f64>> = inputs.iter().map(|input| input.to_array().to_vec()).collect();
        self.model.predict_batch(&rows)
    }
}

fn check_schema(model: &dyn Regressor) -> Result<(), ModelError> {
    let expected: Vec<String> = ModelInput::FEATURE_NAMES.iter().map(|s| s.to_string()).collect();
    let found = model.feature_names().to_vec();

    if model.num_features() != ModelInput::NUM_FEATURES {
        return Err(ModelError::FeatureMismatch { expected, found });
    }
    // Models trained from an unnamed matrix carry placeholder names only
    let named = !found.iter().all(|n| n.starts_with("Column_"));
    if named && found != expected {
        return Err(ModelError::FeatureMismatch { expected, found });
    }
    Ok(())
}

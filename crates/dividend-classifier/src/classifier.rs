use async_trait::async_trait;
use serde::Serialize;
use statement_core::{ClassProbabilities, DividendChange, RatioRecord};

use crate::error::{ClassifierError, ClassifierResult};

/// Allowed drift of a probability vector's sum away from 1.0
const PROBABILITY_SUM_TOLERANCE: f64 = 1e-3;

/// Outcome of one classifier call
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub label: DividendChange,
    pub probabilities: ClassProbabilities,
}

/// Pre-trained dividend-change classifier.
///
/// Implemented by locally loaded model files and by the remote inference client.
#[async_trait]
pub trait DividendClassifier: Send + Sync {
    async fn predict(&self, features: &RatioRecord) -> ClassifierResult<DividendChange>;

    async fn predict_probabilities(&self, features: &RatioRecord) -> ClassifierResult<ClassProbabilities>;

    fn name(&self) -> &str;

    /// Label plus distribution, with the distribution checked for sanity.
    async fn classify(&self, features: &RatioRecord) -> ClassifierResult<Prediction> {
        let label = self.predict(features).await?;
        let probabilities = self.predict_probabilities(features).await?;
        validate_probabilities(&probabilities)?;
        Ok(Prediction {
            label,
            probabilities,
        })
    }
}

pub fn validate_probabilities(p: &ClassProbabilities) -> ClassifierResult<()> {
    if p.iter().any(|(_, v)| !v.is_finite() || v < 0.0) {
        return Err(ClassifierError::InvalidPrediction(format!(
            "probabilities must be finite and non-negative, got {:?}",
            p
        )));
    }
    if (p.total() - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
        return Err(ClassifierError::InvalidPrediction(format!(
            "probabilities sum to {:.4}, expected 1.0",
            p.total()
        )));
    }
    Ok(())
}

//! Multinomial logistic classifier loaded from an exported JSON model file.
//!
//! File layout:
//! ```json
//! {
//!   "name": "catboost_model_energy",
//!   "classes": [-1, 0, 1],
//!   "feature_names": ["dpr", "roe", "..."],
//!   "coefficients": [[...], [...], [...]],
//!   "intercepts": [0.0, 0.0, 0.0]
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use statement_core::{ClassProbabilities, DividendChange, RatioRecord};
use std::path::Path;

use crate::classifier::DividendClassifier;
use crate::error::{ClassifierError, ClassifierResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    #[serde(default)]
    pub name: Option<String>,
    pub classes: Vec<i64>,
    pub feature_names: Vec<String>,
    /// One row per class, one column per feature
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct LogisticClassifier {
    name: String,
    model: LogisticModel,
}

impl LogisticClassifier {
    pub fn new(model: LogisticModel, origin: &str) -> ClassifierResult<Self> {
        let invalid = |reason: String| ClassifierError::InvalidModel {
            path: origin.to_string(),
            reason,
        };

        let n_classes = model.classes.len();
        let mut sorted = model.classes.clone();
        sorted.sort_unstable();
        if sorted != [-1, 0, 1] {
            return Err(invalid(format!(
                "classes must be exactly -1, 0 and 1, got {:?}",
                model.classes
            )));
        }
        if model.coefficients.len() != n_classes || model.intercepts.len() != n_classes {
            return Err(invalid(format!(
                "expected {} coefficient rows and intercepts, got {} and {}",
                n_classes,
                model.coefficients.len(),
                model.intercepts.len()
            )));
        }
        let width = model.feature_names.len();
        if let Some(row) = model.coefficients.iter().position(|r| r.len() != width) {
            return Err(invalid(format!(
                "coefficient row {} has {} entries, expected {}",
                row,
                model.coefficients[row].len(),
                width
            )));
        }

        let name = model.name.clone().unwrap_or_else(|| origin.to_string());
        Ok(Self { name, model })
    }

    pub fn from_json_str(json: &str, origin: &str) -> ClassifierResult<Self> {
        let model: LogisticModel = serde_json::from_str(json).map_err(|e| ClassifierError::InvalidModel {
            path: origin.to_string(),
            reason: e.to_string(),
        })?;
        Self::new(model, origin)
    }

    pub fn load(path: &Path) -> ClassifierResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json, &path.display().to_string())
    }

    pub fn model(&self) -> &LogisticModel {
        &self.model
    }

    /// Features in model column order; names the record lacks read as 0.0
    fn feature_vector(&self, features: &RatioRecord) -> Vec<f64> {
        self.model
            .feature_names
            .iter()
            .map(|name| features.get_by_str(name).unwrap_or(0.0))
            .collect()
    }

    fn probabilities(&self, features: &RatioRecord) -> ClassifierResult<ClassProbabilities> {
        let x = self.feature_vector(features);
        let logits: Vec<f64> = self
            .model
            .coefficients
            .iter()
            .zip(&self.model.intercepts)
            .map(|(row, b)| b + row.iter().zip(&x).map(|(w, v)| w * v).sum::<f64>())
            .collect();

        let probs = softmax(&logits);
        ClassProbabilities::from_ordered(&self.model.classes, &probs).ok_or_else(|| {
            ClassifierError::InvalidPrediction(format!("cannot map classes {:?}", self.model.classes))
        })
    }
}

/// Numerically stable softmax; a non-finite logit yields a uniform distribution
pub fn softmax(logits: &[f64]) -> Vec<f64> {
    if logits.is_empty() {
        return Vec::new();
    }
    if logits.iter().any(|z| !z.is_finite()) {
        return vec![1.0 / logits.len() as f64; logits.len()];
    }
    let max = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|z| (z - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.iter().map(|e| e / total).collect()
}

#[async_trait]
impl DividendClassifier for LogisticClassifier {
    async fn predict(&self, features: &RatioRecord) -> ClassifierResult<DividendChange> {
        Ok(self.probabilities(features)?.most_likely())
    }

    async fn predict_probabilities(&self, features: &RatioRecord) -> ClassifierResult<ClassProbabilities> {
        self.probabilities(features)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use statement_core::RatioName;

    fn model_json() -> &'static str {
        r#"{
            "name": "test-model",
            "classes": [-1, 0, 1],
            "feature_names": ["dpr", "roe"],
            "coefficients": [[-4.0, 0.0], [0.0, 0.0], [4.0, 10.0]],
            "intercepts": [0.0, 0.5, 0.0]
        }"#
    }

    fn record(dpr: f64, roe: f64) -> RatioRecord {
        RatioRecord::sanitized(vec![(RatioName::Dpr, dpr), (RatioName::Roe, roe)]).0
    }

    #[test]
    fn test_softmax_is_a_distribution() {
        let p = softmax(&[1.0, 2.0, 3.0]);
        assert_relative_eq!(p.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert!(p[2] > p[1] && p[1] > p[0]);

        let big = softmax(&[1000.0, 0.0, -1000.0]);
        assert!(big.iter().all(|v| v.is_finite()));
        assert_relative_eq!(big[0], 1.0, epsilon = 1e-12);

        assert_eq!(softmax(&[f64::NAN, 0.0]), vec![0.5, 0.5]);
    }

    #[tokio::test]
    async fn test_all_zero_record_prefers_intercept() {
        let clf = LogisticClassifier::from_json_str(model_json(), "inline").unwrap();
        let zeros = record(0.0, 0.0);

        assert_eq!(clf.predict(&zeros).await.unwrap(), DividendChange::NoChange);
        let p = clf.predict_probabilities(&zeros).await.unwrap();
        assert_relative_eq!(p.total(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.decrease, p.increase, epsilon = 1e-12);
    }

    #[tokio::test]
    async fn test_strong_roe_predicts_increase() {
        let clf = LogisticClassifier::from_json_str(model_json(), "inline").unwrap();
        let prediction = clf.classify(&record(0.2, 0.3)).await.unwrap();

        assert_eq!(prediction.label, DividendChange::Increase);
        assert_eq!(prediction.probabilities.most_likely(), DividendChange::Increase);
        assert_eq!(clf.name(), "test-model");
    }

    #[tokio::test]
    async fn test_missing_features_read_as_zero() {
        let clf = LogisticClassifier::from_json_str(model_json(), "inline").unwrap();
        let empty = RatioRecord::default();
        assert_eq!(clf.predict(&empty).await.unwrap(), DividendChange::NoChange);
    }

    #[test]
    fn test_rejects_malformed_models() {
        let bad_classes = r#"{"classes": [0, 1], "feature_names": [], "coefficients": [[], []], "intercepts": [0, 0]}"#;
        assert!(matches!(
            LogisticClassifier::from_json_str(bad_classes, "a.json"),
            Err(ClassifierError::InvalidModel { .. })
        ));

        let bad_width = r#"{"classes": [-1, 0, 1], "feature_names": ["dpr"],
            "coefficients": [[1.0], [1.0, 2.0], [1.0]], "intercepts": [0, 0, 0]}"#;
        let err = LogisticClassifier::from_json_str(bad_width, "b.json").unwrap_err();
        assert!(err.to_string().contains("row 1"));

        assert!(LogisticClassifier::from_json_str("{", "c.json").is_err());
    }
}

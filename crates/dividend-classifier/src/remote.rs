use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use statement_core::{ClassProbabilities, DividendChange, Industry, ModelKind, RatioRecord};
use std::collections::HashMap;
use std::time::Duration;

use crate::classifier::{validate_probabilities, DividendClassifier, Prediction};
use crate::error::{ClassifierError, ClassifierResult};

#[derive(Debug, Clone, Serialize)]
struct PredictRequest<'a> {
    model: &'a str,
    industry: &'a str,
    features: HashMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: i64,
    pub probabilities: Vec<f64>,
    /// Class label of each probability column, in the order the service returns them
    #[serde(default = "default_classes")]
    pub classes: Vec<i64>,
}

fn default_classes() -> Vec<i64> {
    vec![-1, 0, 1]
}

impl PredictResponse {
    fn into_prediction(self) -> ClassifierResult<Prediction> {
        let label = DividendChange::from_class_label(self.prediction).ok_or_else(|| {
            ClassifierError::InvalidResponse(format!("unknown class label {}", self.prediction))
        })?;
        let probabilities = ClassProbabilities::from_ordered(&self.classes, &self.probabilities)
            .ok_or_else(|| {
                ClassifierError::InvalidResponse(format!(
                    "cannot map probabilities {:?} onto classes {:?}",
                    self.probabilities, self.classes
                ))
            })?;
        Ok(Prediction {
            label,
            probabilities,
        })
    }
}

/// Classifier served by an HTTP inference service
#[derive(Clone)]
pub struct RemoteClassifier {
    client: reqwest::Client,
    base_url: String,
    model: ModelKind,
    industry: Industry,
    name: String,
}

impl RemoteClassifier {
    pub fn new(
        base_url: String,
        model: ModelKind,
        industry: Industry,
        timeout: Duration,
    ) -> ClassifierResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let name = format!("{}@{}", model.display_name(), industry.key());

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            industry,
            name,
        })
    }

    async fn infer(&self, features: &RatioRecord) -> ClassifierResult<Prediction> {
        let request = PredictRequest {
            model: self.model.key(),
            industry: self.industry.key(),
            features: features.to_feature_map(),
        };

        tracing::debug!("Requesting {} prediction from {}", self.name, self.base_url);

        let response = self
            .client
            .post(format!("{}/predict", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClassifierError::ServiceUnavailable(format!(
                "Status: {}",
                response.status()
            )));
        }

        let result = response.json::<PredictResponse>().await?;
        result.into_prediction()
    }

    /// Check service health
    pub async fn health(&self) -> ClassifierResult<bool> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;

        Ok(response.status().is_success())
    }
}

#[async_trait]
impl DividendClassifier for RemoteClassifier {
    async fn predict(&self, features: &RatioRecord) -> ClassifierResult<DividendChange> {
        Ok(self.infer(features).await?.label)
    }

    async fn predict_probabilities(&self, features: &RatioRecord) -> ClassifierResult<ClassProbabilities> {
        Ok(self.infer(features).await?.probabilities)
    }

    fn name(&self) -> &str {
        &self.name
    }

    /// One round trip for both label and distribution
    async fn classify(&self, features: &RatioRecord) -> ClassifierResult<Prediction> {
        let prediction = self.infer(features).await?;
        validate_probabilities(&prediction.probabilities)?;
        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statement_core::RatioName;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> RemoteClassifier {
        RemoteClassifier::new(
            server.uri(),
            ModelKind::XGBoost,
            Industry::Energy,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn features() -> RatioRecord {
        RatioRecord::sanitized(vec![(RatioName::Dpr, 0.4), (RatioName::Roe, 0.12)]).0
    }

    #[tokio::test]
    async fn test_classify_maps_probabilities_by_class() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .and(body_partial_json(serde_json::json!({
                "model": "xgboost",
                "industry": "energy",
                "features": {"dpr": 0.4}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "prediction": 1,
                "probabilities": [0.7, 0.1, 0.2],
                "classes": [1, -1, 0]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let prediction = client(&server).classify(&features()).await.unwrap();
        assert_eq!(prediction.label, DividendChange::Increase);
        assert_eq!(prediction.probabilities.increase, 0.7);
        assert_eq!(prediction.probabilities.decrease, 0.1);
        assert_eq!(prediction.probabilities.no_change, 0.2);
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client(&server).predict(&features()).await.unwrap_err();
        assert!(matches!(err, ClassifierError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_unknown_label_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "prediction": 7,
                "probabilities": [0.2, 0.3, 0.5]
            })))
            .mount(&server)
            .await;

        let err = client(&server).classify(&features()).await.unwrap_err();
        assert!(matches!(err, ClassifierError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_unnormalized_probabilities_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "prediction": 0,
                "probabilities": [0.2, 0.3, 0.9]
            })))
            .mount(&server)
            .await;

        let err = client(&server).classify(&features()).await.unwrap_err();
        assert!(matches!(err, ClassifierError::InvalidPrediction(_)));
    }

    #[tokio::test]
    async fn test_health() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        assert!(client(&server).health().await.unwrap());
    }
}

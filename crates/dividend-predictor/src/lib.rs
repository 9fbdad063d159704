//! Prediction pipeline: statements in, ratio record and dividend-change call out.

use chrono::{DateTime, Utc};
use dividend_classifier::{ClassifierError, ClassifierRegistry};
use ratio_features::{FeatureConfig, RatioBuilder, RatioReport};
use serde::Serialize;
use statement_core::{
    ClassProbabilities, DividendChange, FeatureError, Industry, MissingDataError, ModelKind,
    RatioRecord, StatementSet, StatementSource,
};
use std::sync::Arc;
use thiserror::Error;

pub mod session;
pub mod source;

pub use session::PredictionSession;
pub use source::JsonFileSource;

#[derive(Error, Debug)]
pub enum PredictionError {
    #[error(transparent)]
    MissingData(#[from] MissingDataError),

    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("Statement source error: {0}")]
    Source(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No statement source configured")]
    NoSource,
}

impl From<FeatureError> for PredictionError {
    fn from(err: FeatureError) -> Self {
        match err {
            FeatureError::MissingData(missing) => PredictionError::MissingData(missing),
            FeatureError::Config(msg) => PredictionError::Config(msg),
            other => PredictionError::Source(other.to_string()),
        }
    }
}

impl PredictionError {
    pub fn is_missing_data(&self) -> bool {
        matches!(self, PredictionError::MissingData(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredictionRequest {
    pub ticker: String,
    pub industry: Industry,
    pub model: ModelKind,
}

impl PredictionRequest {
    pub fn new(ticker: &str, industry: Industry, model: ModelKind) -> Self {
        Self {
            ticker: ticker.trim().to_uppercase(),
            industry,
            model,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictionOutcome {
    pub ticker: String,
    pub industry: Industry,
    pub model: ModelKind,
    pub classifier: String,
    pub label: DividendChange,
    pub probabilities: ClassProbabilities,
    pub ratios: RatioRecord,
    /// Share of referenced line items that were actually reported
    pub coverage: f64,
    pub advisories: Vec<String>,
    pub predicted_at: DateTime<Utc>,
}

impl PredictionOutcome {
    pub fn label_text(&self) -> &'static str {
        self.label.to_label()
    }
}

pub struct DividendPredictor {
    builder: RatioBuilder,
    registry: Arc<ClassifierRegistry>,
    source: Option<Arc<dyn StatementSource>>,
}

impl DividendPredictor {
    pub fn new(builder: RatioBuilder, registry: Arc<ClassifierRegistry>) -> Self {
        Self {
            builder,
            registry,
            source: None,
        }
    }

    /// Feature config and classifier config both read from the environment
    pub fn from_env() -> Result<Self, PredictionError> {
        let config = FeatureConfig::from_env()?;
        Ok(Self::new(
            RatioBuilder::new(config),
            Arc::new(ClassifierRegistry::with_defaults()),
        ))
    }

    pub fn with_source(mut self, source: Arc<dyn StatementSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn builder(&self) -> &RatioBuilder {
        &self.builder
    }

    pub fn registry(&self) -> &ClassifierRegistry {
        &self.registry
    }

    /// Ratio report only; no classifier involved
    pub fn ratios(&self, statements: &StatementSet) -> Result<RatioReport, PredictionError> {
        Ok(self.builder.build_report_for(statements)?)
    }

    pub async fn fetch(&self, ticker: &str) -> Result<StatementSet, PredictionError> {
        let source = self.source.as_ref().ok_or(PredictionError::NoSource)?;
        tracing::debug!("Fetching statements for {} from {}", ticker, source.source_name());
        Ok(source.fetch(ticker).await?)
    }

    pub async fn predict(
        &self,
        request: &PredictionRequest,
        statements: &StatementSet,
    ) -> Result<PredictionOutcome, PredictionError> {
        let report = self.ratios(statements)?;
        let classifier = self.registry.get(request.model, request.industry)?;
        let prediction = classifier.classify(&report.record).await?;

        tracing::info!(
            "{}: {} predicts {} (coverage {:.0}%)",
            request.ticker,
            classifier.name(),
            prediction.label,
            report.coverage * 100.0
        );

        Ok(PredictionOutcome {
            ticker: request.ticker.clone(),
            industry: request.industry,
            model: request.model,
            classifier: classifier.name().to_string(),
            label: prediction.label,
            probabilities: prediction.probabilities,
            advisories: report.advisories(),
            coverage: report.coverage,
            ratios: report.record,
            predicted_at: Utc::now(),
        })
    }

    /// Fetch through the configured source, then predict
    pub async fn predict_ticker(&self, request: &PredictionRequest) -> Result<PredictionOutcome, PredictionError> {
        let statements = self.fetch(&request.ticker).await?;
        self.predict(request, &statements).await
    }
}

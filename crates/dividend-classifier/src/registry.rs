use dashmap::DashMap;
use statement_core::{Industry, ModelKind};
use std::path::PathBuf;
use std::sync::Arc;

use crate::classifier::DividendClassifier;
use crate::error::{ClassifierError, ClassifierResult};
use crate::logistic::LogisticClassifier;
use crate::remote::RemoteClassifier;
use crate::ClassifierConfig;

/// Classifiers keyed by model family and industry, loaded on first use.
///
/// Lookup order: explicitly registered instances, then
/// `{models_dir}/{model}_model_{industry}.json`, then the remote service
/// if one is configured.
pub struct ClassifierRegistry {
    config: ClassifierConfig,
    loaded: DashMap<(ModelKind, Industry), Arc<dyn DividendClassifier>>,
}

impl ClassifierRegistry {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            loaded: DashMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(ClassifierConfig::default())
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Install a classifier for a (model, industry) pair, replacing any cached one.
    pub fn register(&self, model: ModelKind, industry: Industry, classifier: Arc<dyn DividendClassifier>) {
        self.loaded.insert((model, industry), classifier);
    }

    pub fn model_path(&self, model: ModelKind, industry: Industry) -> PathBuf {
        self.config
            .models_dir
            .join(format!("{}_model_{}.json", model.key(), industry.key()))
    }

    pub fn get(&self, model: ModelKind, industry: Industry) -> ClassifierResult<Arc<dyn DividendClassifier>> {
        if let Some(entry) = self.loaded.get(&(model, industry)) {
            return Ok(Arc::clone(entry.value()));
        }

        let classifier = self.load(model, industry)?;
        // A concurrent load of the same pair keeps whichever landed first
        let entry = self.loaded.entry((model, industry)).or_insert(classifier);
        Ok(Arc::clone(entry.value()))
    }

    fn load(&self, model: ModelKind, industry: Industry) -> ClassifierResult<Arc<dyn DividendClassifier>> {
        let path = self.model_path(model, industry);

        if path.is_file() {
            let classifier = LogisticClassifier::load(&path)?;
            tracing::info!("Loaded {} model for {} from {}", model, industry, path.display());
            return Ok(Arc::new(classifier));
        }

        if let Some(url) = &self.config.service_url {
            tracing::info!("No local {} model for {}, using service at {}", model, industry, url);
            let classifier = RemoteClassifier::new(url.clone(), model, industry, self.config.timeout)?;
            return Ok(Arc::new(classifier));
        }

        tracing::warn!("No {} model available for {} (looked for {})", model, industry, path.display());
        Err(ClassifierError::ModelNotFound {
            model,
            industry,
            path: path.display().to_string(),
        })
    }

    /// Pairs that are registered or have a model file on disk
    pub fn available(&self) -> Vec<(ModelKind, Industry)> {
        let mut pairs = Vec::new();
        for model in ModelKind::ALL {
            for industry in Industry::ALL {
                if self.loaded.contains_key(&(model, industry)) || self.model_path(model, industry).is_file() {
                    pairs.push((model, industry));
                }
            }
        }
        pairs
    }
}

impl Default for ClassifierRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

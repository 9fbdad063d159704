pub mod classifier;
pub mod error;
pub mod logistic;
pub mod registry;
pub mod remote;

pub use classifier::{validate_probabilities, DividendClassifier, Prediction};
pub use error::{ClassifierError, ClassifierResult};
pub use logistic::{LogisticClassifier, LogisticModel};
pub use registry::ClassifierRegistry;
pub use remote::RemoteClassifier;

use std::path::PathBuf;
use std::time::Duration;

/// Where classifiers come from
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Directory holding `{model}_model_{industry}.json` files
    pub models_dir: PathBuf,
    /// Inference service used when no local model file exists
    pub service_url: Option<String>,
    pub timeout: Duration,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            models_dir: std::env::var("DIVIDEND_MODELS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./models")),
            service_url: std::env::var("DIVIDEND_CLASSIFIER_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            timeout: Duration::from_secs(10),
        }
    }
}

impl ClassifierConfig {
    pub fn with_models_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.models_dir = dir.into();
        self
    }
}

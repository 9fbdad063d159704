use statement_core::{Industry, ModelKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No {model} model for industry '{industry}' (looked for {path})")]
    ModelNotFound {
        model: ModelKind,
        industry: Industry,
        path: String,
    },

    #[error("Invalid model file {path}: {reason}")]
    InvalidModel { path: String, reason: String },

    #[error("Invalid prediction: {0}")]
    InvalidPrediction(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ClassifierResult<T> = Result<T, ClassifierError>;

use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Invalid search config: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse search config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Predictor error: {0}")]
    Predictor(#[from] PredictorError),
}

/// Failures of a predictor that are not part of normal sampling.
///
/// An inconsistent draw is not an error; see [`crate::DrawOutcome`].
#[derive(Error, Debug)]
pub enum PredictorError {
    #[error("Model artifact error: {0}")]
    Artifact(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Evidence config error: {0}")]
    Evidence(#[from] bayou_evidence::EvidenceError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PredictorError {
    pub fn artifact(msg: impl Into<String>) -> Self {
        Self::Artifact(msg.into())
    }
}

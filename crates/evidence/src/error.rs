use thiserror::Error;

/// Result type for evidence operations
pub type Result<T> = std::result::Result<T, EvidenceError>;

/// Errors raised while reading evidence requests or evidence configuration
#[derive(Error, Debug)]
pub enum EvidenceError {
    /// Request body is not a JSON object or a category is not a string list
    #[error("Malformed evidence: {0}")]
    Malformed(String),

    /// Evidence category name that no encoder exists for
    #[error("Invalid evidence name: {0}")]
    InvalidName(String),

    /// Category that is recognized but has no implementation
    #[error("Evidence '{0}' is not supported")]
    Unsupported(String),

    /// Required configuration attribute is missing or has the wrong type
    #[error("Evidence config for '{name}' has invalid '{field}'")]
    InvalidConfig { name: String, field: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EvidenceError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    pub fn invalid_config(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::InvalidConfig {
            name: name.into(),
            field: field.into(),
        }
    }
}

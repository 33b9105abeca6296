use std::fmt;

use serde::{Deserialize, Serialize};

use crate::call::{apicalls_from, context_from, types_from};
use crate::error::{EvidenceError, Result};

/// Evidence categories understood by the model.
///
/// Javadoc evidence exists in trained configs but is not implemented; asking
/// for it yields [`EvidenceError::Unsupported`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceKind {
    #[serde(rename = "apicalls")]
    ApiCalls,
    Types,
    Context,
}

impl EvidenceKind {
    /// All categories in request/config order.
    pub const ALL: [Self; 3] = [Self::ApiCalls, Self::Types, Self::Context];

    /// Name used for this category in requests and model configs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ApiCalls => "apicalls",
            Self::Types => "types",
            Self::Context => "context",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "apicalls" => Ok(Self::ApiCalls),
            "types" => Ok(Self::Types),
            "context" => Ok(Self::Context),
            "javadoc" => Err(EvidenceError::Unsupported(name.to_string())),
            other => Err(EvidenceError::InvalidName(other.to_string())),
        }
    }

    /// Tokens of this category implied by a single call signature.
    #[must_use]
    pub fn extract(self, call: &str) -> Vec<String> {
        let extractor: fn(&str) -> Vec<String> = match self {
            Self::ApiCalls => apicalls_from,
            Self::Types => types_from,
            Self::Context => context_from,
        };
        extractor(call)
    }
}

impl fmt::Display for EvidenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

use bayou_evidence::EvidenceRequest;
use serde::Serialize;
use serde_json::Value;

use crate::candidate::CandidateAst;

/// Body of a server response: the request echoed back and the ranked ASTs.
#[derive(Debug, Clone, Serialize)]
pub struct SynthesisResponse {
    pub evidences: Value,
    pub asts: Vec<CandidateAst>,
}

impl SynthesisResponse {
    /// Sent when a request could not be answered.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            evidences: Value::Array(Vec::new()),
            asts: Vec::new(),
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[must_use]
pub fn assemble(request: &EvidenceRequest, asts: Vec<CandidateAst>) -> SynthesisResponse {
    SynthesisResponse {
        evidences: request.payload.clone(),
        asts,
    }
}

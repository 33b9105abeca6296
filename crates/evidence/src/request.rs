use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{EvidenceError, Result};
use crate::kind::EvidenceKind;

/// Evidence supplied by a caller. Missing categories are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    #[serde(default)]
    pub apicalls: BTreeSet<String>,
    #[serde(default)]
    pub types: BTreeSet<String>,
    #[serde(default)]
    pub context: BTreeSet<String>,
}

impl Evidence {
    /// Add tokens to one category.
    #[must_use]
    pub fn with<I, S>(mut self, kind: EvidenceKind, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.get_mut(kind).extend(tokens.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn get(&self, kind: EvidenceKind) -> &BTreeSet<String> {
        match kind {
            EvidenceKind::ApiCalls => &self.apicalls,
            EvidenceKind::Types => &self.types,
            EvidenceKind::Context => &self.context,
        }
    }

    pub fn get_mut(&mut self, kind: EvidenceKind) -> &mut BTreeSet<String> {
        match kind {
            EvidenceKind::ApiCalls => &mut self.apicalls,
            EvidenceKind::Types => &mut self.types,
            EvidenceKind::Context => &mut self.context,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        EvidenceKind::ALL.iter().all(|kind| self.get(*kind).is_empty())
    }
}

/// A parsed request: typed evidence plus the untouched JSON it came from.
///
/// `payload` is echoed back in the response, so passthrough fields the model
/// does not look at survive the round trip unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceRequest {
    pub evidence: Evidence,
    pub payload: Value,
}

impl EvidenceRequest {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let payload: Value = serde_json::from_str(raw)?;
        Self::from_value(payload)
    }

    pub fn from_value(payload: Value) -> Result<Self> {
        if !payload.is_object() {
            return Err(EvidenceError::malformed("request must be a JSON object"));
        }
        let evidence = Evidence::deserialize(&payload)
            .map_err(|err| EvidenceError::malformed(err.to_string()))?;
        Ok(Self { evidence, payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parses_categories_and_keeps_payload() {
        let raw = r#"{
            "apicalls": ["setTitle", "setMessage", "setTitle"],
            "types": ["AlertDialog"],
            "context": [],
            "javadoc": "show a dialog"
        }"#;
        let request = EvidenceRequest::from_json_str(raw).unwrap();

        let expected = Evidence::default()
            .with(EvidenceKind::ApiCalls, ["setMessage", "setTitle"])
            .with(EvidenceKind::Types, ["AlertDialog"]);
        assert_eq!(request.evidence, expected);
        assert_eq!(request.payload["javadoc"], json!("show a dialog"));
        assert_eq!(request.payload["apicalls"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn accessors_address_the_same_category() {
        for kind in EvidenceKind::ALL {
            let mut evidence = Evidence::default().with(kind, ["x"]);
            evidence.get_mut(kind).insert("y".to_string());
            assert_eq!(evidence.get(kind).len(), 2);
            assert_eq!(
                EvidenceKind::ALL.iter().filter(|k| !evidence.get(**k).is_empty()).count(),
                1
            );
        }
    }

    #[test]
    fn missing_categories_are_empty() {
        let request = EvidenceRequest::from_json_str("{}").unwrap();
        assert!(request.evidence.is_empty());
    }

    #[test]
    fn rejects_non_object_and_bad_category() {
        assert!(matches!(
            EvidenceRequest::from_json_str("[1, 2]"),
            Err(EvidenceError::Malformed(_))
        ));
        assert!(matches!(
            EvidenceRequest::from_json_str(r#"{"apicalls": "readLine"}"#),
            Err(EvidenceError::Malformed(_))
        ));
        assert!(matches!(
            EvidenceRequest::from_json_str("{not json"),
            Err(EvidenceError::Json(_))
        ));
    }
}

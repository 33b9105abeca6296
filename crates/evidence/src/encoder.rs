use std::collections::HashMap;

use ndarray::{Array1, Array2, Array3, Axis};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::{EvidenceError, Result};
use crate::kind::EvidenceKind;

/// Token vocabulary of one evidence category, most frequent token first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    chars: Vec<String>,
    index: HashMap<String, usize>,
}

impl Vocabulary {
    #[must_use]
    pub fn from_chars(chars: Vec<String>) -> Self {
        let index = chars
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Self { chars, index }
    }

    /// Build from observed data points. Ties keep first-occurrence order.
    #[must_use]
    pub fn from_data(data: &[Vec<String>]) -> Self {
        let mut order: Vec<&String> = Vec::new();
        let mut counts: HashMap<&String, usize> = HashMap::new();
        for token in data.iter().flatten() {
            let count = counts.entry(token).or_insert(0);
            if *count == 0 {
                order.push(token);
            }
            *count += 1;
        }
        order.sort_by(|a, b| counts[b].cmp(&counts[a]));
        Self::from_chars(order.into_iter().cloned().collect())
    }

    #[must_use]
    pub fn get(&self, token: &str) -> Option<usize> {
        self.index.get(token).copied()
    }

    #[must_use]
    pub fn chars(&self) -> &[String] {
        &self.chars
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Write `chars`, `vocab` and `vocab_size` into a saved config object.
    pub fn dump_into(&self, js: &mut Map<String, Value>) {
        let index: Map<String, Value> = self
            .chars
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), json!(i)))
            .collect();
        js.insert("chars".into(), json!(self.chars));
        js.insert("vocab".into(), Value::Object(index));
        js.insert("vocab_size".into(), json!(self.len()));
    }
}

#[derive(Debug, Deserialize)]
struct RawEncoderConfig {
    name: String,
    units: Option<usize>,
    tile: Option<usize>,
    max_num: Option<usize>,
    chars: Option<Vec<String>>,
    vocab: Option<HashMap<String, usize>>,
    vocab_size: Option<usize>,
}

/// Per-category encoder settings from a trained model config, plus the
/// category's vocabulary once it is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceEncoder {
    pub kind: EvidenceKind,
    pub units: usize,
    pub tile: usize,
    pub max_num: usize,
    pub vocab: Option<Vocabulary>,
}

impl EvidenceEncoder {
    /// Read the `evidence` list of a model config.
    pub fn read_configs(js: &Value, chars_vocab: bool) -> Result<Vec<Self>> {
        let entries = js
            .as_array()
            .ok_or_else(|| EvidenceError::malformed("evidence config must be a list"))?;
        entries
            .iter()
            .map(|entry| Self::read_config(entry, chars_vocab))
            .collect()
    }

    /// Read one encoder entry. Vocabulary fields are only read with `chars_vocab`.
    pub fn read_config(js: &Value, chars_vocab: bool) -> Result<Self> {
        let raw = RawEncoderConfig::deserialize(js)
            .map_err(|err| EvidenceError::malformed(err.to_string()))?;
        let kind = EvidenceKind::from_name(&raw.name)?;
        let name = raw.name.as_str();

        let units = raw.units.ok_or_else(|| EvidenceError::invalid_config(name, "units"))?;
        let tile = raw.tile.ok_or_else(|| EvidenceError::invalid_config(name, "tile"))?;
        let max_num = raw
            .max_num
            .ok_or_else(|| EvidenceError::invalid_config(name, "max_num"))?;

        let vocab = if chars_vocab {
            let chars = raw.chars.ok_or_else(|| EvidenceError::invalid_config(name, "chars"))?;
            let vocab = Vocabulary::from_chars(chars);
            if raw.vocab_size != Some(vocab.len()) {
                return Err(EvidenceError::invalid_config(name, "vocab_size"));
            }
            if let Some(index) = raw.vocab {
                if index != vocab.index {
                    return Err(EvidenceError::invalid_config(name, "vocab"));
                }
            }
            Some(vocab)
        } else {
            None
        };

        Ok(Self {
            kind,
            units,
            tile,
            max_num,
            vocab,
        })
    }

    #[must_use]
    pub fn dump_config(&self) -> Value {
        let mut js = Map::new();
        js.insert("name".into(), json!(self.kind.name()));
        js.insert("units".into(), json!(self.units));
        js.insert("tile".into(), json!(self.tile));
        js.insert("max_num".into(), json!(self.max_num));
        if let Some(vocab) = &self.vocab {
            vocab.dump_into(&mut js);
        }
        Value::Object(js)
    }

    /// Deduplicated tokens of this category in a program record.
    #[must_use]
    pub fn read_data_point(&self, program: &Value) -> Vec<String> {
        let mut tokens: Vec<String> = Vec::new();
        let Some(items) = program.get(self.kind.name()).and_then(Value::as_array) else {
            return tokens;
        };
        for token in items.iter().filter_map(Value::as_str) {
            if !tokens.iter().any(|t| t == token) {
                tokens.push(token.to_string());
            }
        }
        tokens
    }

    pub fn set_chars_vocab(&mut self, data: &[Vec<String>]) {
        let vocab = Vocabulary::from_data(data);
        log::debug!("{} vocabulary: {} tokens", self.kind, vocab.len());
        self.vocab = Some(vocab);
    }

    #[must_use]
    pub fn vocab_size(&self) -> usize {
        self.vocab.as_ref().map_or(0, Vocabulary::len)
    }

    /// One-hot rows `(max_num, vocab_size)` for one data point.
    #[must_use]
    pub fn encode(&self, tokens: &[String]) -> Array2<i32> {
        let mut encoded = Array2::zeros((self.max_num, self.vocab_size()));
        let Some(vocab) = &self.vocab else {
            return encoded;
        };
        for (j, token) in tokens.iter().take(self.max_num).enumerate() {
            if let Some(k) = vocab.get(token) {
                encoded[[j, k]] = 1;
            }
        }
        encoded
    }

    /// One-hot tensor `(data.len(), max_num, vocab_size)`.
    #[must_use]
    pub fn wrangle(&self, data: &[Vec<String>]) -> Array3<i32> {
        let mut wrangled = Array3::zeros((data.len(), self.max_num, self.vocab_size()));
        for (i, tokens) in data.iter().enumerate() {
            wrangled
                .index_axis_mut(Axis(0), i)
                .assign(&self.encode(tokens));
        }
        wrangled
    }

    /// Per-vocabulary-entry presence of the tokens.
    #[must_use]
    pub fn presence(&self, tokens: &[String]) -> Array1<i32> {
        self.encode(tokens).sum_axis(Axis(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tokens(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    fn encoder(kind: EvidenceKind, max_num: usize) -> EvidenceEncoder {
        EvidenceEncoder {
            kind,
            units: 8,
            tile: 1,
            max_num,
            vocab: None,
        }
    }

    #[test]
    fn vocabulary_orders_by_frequency_then_first_occurrence() {
        let data = vec![
            tokens(&["close", "read"]),
            tokens(&["write", "read"]),
            tokens(&["flush"]),
        ];
        let vocab = Vocabulary::from_data(&data);
        assert_eq!(vocab.chars(), tokens(&["read", "close", "write", "flush"]));
        assert_eq!(vocab.get("write"), Some(2));
        assert_eq!(vocab.get("missing"), None);
    }

    #[test]
    fn read_data_point_deduplicates_in_order() {
        let enc = encoder(EvidenceKind::Types, 4);
        let program = serde_json::json!({"types": ["File", "Reader", "File"], "apicalls": ["x"]});
        assert_eq!(enc.read_data_point(&program), tokens(&["File", "Reader"]));
        assert!(enc.read_data_point(&serde_json::json!({})).is_empty());
    }

    #[test]
    fn wrangle_skips_unknown_tokens_and_overflow_positions() {
        let mut enc = encoder(EvidenceKind::ApiCalls, 2);
        enc.set_chars_vocab(&[tokens(&["a", "b"]), tokens(&["a"])]);

        let data = vec![tokens(&["b", "zzz", "a"]), tokens(&["a"])];
        let wrangled = enc.wrangle(&data);
        assert_eq!(wrangled.shape(), &[2, 2, 2]);
        assert_eq!(wrangled[[0, 0, 1]], 1);
        assert_eq!(wrangled.index_axis(Axis(0), 0).sum(), 1);
        assert_eq!(wrangled[[1, 0, 0]], 1);
    }

    #[test]
    fn presence_sums_positions() {
        let mut enc = encoder(EvidenceKind::Context, 3);
        enc.set_chars_vocab(&[tokens(&["File", "String"])]);
        let presence = enc.presence(&tokens(&["String", "File", "Object"]));
        assert_eq!(presence.to_vec(), vec![1, 1]);
    }

    #[test]
    fn config_round_trips_through_dump() {
        let js = serde_json::json!({
            "name": "apicalls",
            "units": 64,
            "tile": 1,
            "max_num": 10,
            "chars": ["readLine", "close"],
            "vocab": {"readLine": 0, "close": 1},
            "vocab_size": 2
        });
        let enc = EvidenceEncoder::read_config(&js, true).unwrap();
        assert_eq!(enc.vocab_size(), 2);
        assert_eq!(enc.dump_config(), js);

        let without_vocab = EvidenceEncoder::read_config(&js, false).unwrap();
        assert!(without_vocab.vocab.is_none());
    }

    #[test]
    fn config_reports_missing_fields() {
        let js = serde_json::json!({"name": "types", "units": 64, "tile": 1});
        let err = EvidenceEncoder::read_config(&js, false).unwrap_err();
        assert!(err.to_string().contains("max_num"), "unexpected error: {err}");

        let js = serde_json::json!({"name": "javadoc", "units": 64, "tile": 1, "max_num": 1});
        assert!(matches!(
            EvidenceEncoder::read_config(&js, false),
            Err(EvidenceError::Unsupported(_))
        ));
    }
}

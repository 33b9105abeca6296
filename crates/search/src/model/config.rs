use std::path::Path;

use bayou_evidence::{EvidenceEncoder, EvidenceKind, Vocabulary};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::PredictorError;

pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    pub units: usize,
    pub max_ast_depth: usize,
    pub vocab: Option<Vocabulary>,
}

/// Configuration a model was trained with, as saved next to its checkpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub latent_size: usize,
    pub batch_size: usize,
    pub num_epochs: usize,
    pub learning_rate: f64,
    pub print_step: usize,
    pub alpha: f64,
    pub beta: f64,
    pub evidence: Vec<EvidenceEncoder>,
    pub decoder: DecoderConfig,
}

#[derive(Debug, Deserialize)]
struct RawModelConfig {
    latent_size: usize,
    batch_size: usize,
    num_epochs: usize,
    learning_rate: f64,
    print_step: usize,
    alpha: f64,
    beta: f64,
    evidence: Value,
    decoder: RawDecoderConfig,
}

#[derive(Debug, Deserialize)]
struct RawDecoderConfig {
    units: usize,
    max_ast_depth: usize,
    chars: Option<Vec<String>>,
    vocab_size: Option<usize>,
}

impl ModelConfig {
    /// Parse a config. With `chars_vocab` the saved vocabularies are read too.
    pub fn read(js: &Value, chars_vocab: bool) -> Result<Self, PredictorError> {
        let raw = RawModelConfig::deserialize(js)
            .map_err(|err| PredictorError::artifact(format!("invalid model config: {err}")))?;

        let evidence = EvidenceEncoder::read_configs(&raw.evidence, chars_vocab)?;
        let mut seen = Vec::new();
        for encoder in &evidence {
            if seen.contains(&encoder.kind) {
                return Err(PredictorError::artifact(format!(
                    "evidence '{}' is configured twice",
                    encoder.kind
                )));
            }
            seen.push(encoder.kind);
        }

        let vocab = if chars_vocab {
            let chars = raw
                .decoder
                .chars
                .ok_or_else(|| PredictorError::artifact("decoder config has no 'chars'"))?;
            let vocab = Vocabulary::from_chars(chars);
            if raw.decoder.vocab_size != Some(vocab.len()) {
                return Err(PredictorError::artifact(
                    "decoder 'vocab_size' does not match 'chars'",
                ));
            }
            Some(vocab)
        } else {
            None
        };

        Ok(Self {
            latent_size: raw.latent_size,
            batch_size: raw.batch_size,
            num_epochs: raw.num_epochs,
            learning_rate: raw.learning_rate,
            print_step: raw.print_step,
            alpha: raw.alpha,
            beta: raw.beta,
            evidence,
            decoder: DecoderConfig {
                units: raw.decoder.units,
                max_ast_depth: raw.decoder.max_ast_depth,
                vocab,
            },
        })
    }

    /// Read `config.json`, including vocabularies when every encoder saved one.
    pub fn load(path: &Path) -> Result<Self, PredictorError> {
        let bytes = std::fs::read(path)?;
        let js: Value = serde_json::from_slice(&bytes)?;
        let chars_vocab = js["evidence"]
            .as_array()
            .is_some_and(|entries| {
                !entries.is_empty() && entries.iter().all(|e| e.get("chars").is_some())
            })
            && js["decoder"].get("chars").is_some();
        Self::read(&js, chars_vocab)
    }

    #[must_use]
    pub fn dump(&self) -> Value {
        let mut decoder = Map::new();
        decoder.insert("units".into(), json!(self.decoder.units));
        decoder.insert("max_ast_depth".into(), json!(self.decoder.max_ast_depth));
        if let Some(vocab) = &self.decoder.vocab {
            vocab.dump_into(&mut decoder);
        }

        json!({
            "latent_size": self.latent_size,
            "batch_size": self.batch_size,
            "num_epochs": self.num_epochs,
            "learning_rate": self.learning_rate,
            "print_step": self.print_step,
            "alpha": self.alpha,
            "beta": self.beta,
            "evidence": self.evidence.iter().map(EvidenceEncoder::dump_config).collect::<Vec<_>>(),
            "decoder": Value::Object(decoder),
        })
    }

    #[must_use]
    pub fn encoder(&self, kind: EvidenceKind) -> Option<&EvidenceEncoder> {
        self.evidence.iter().find(|encoder| encoder.kind == kind)
    }
}

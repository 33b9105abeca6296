//! Persisted model artifacts and the corpus-backed predictor.
//!
//! A model directory holds `config.json` (the trained model's configuration)
//! and `corpus.json` (the programs the predictor samples from).

mod config;
mod corpus;
mod tree;

pub use config::{DecoderConfig, ModelConfig, CONFIG_FILE};
pub use corpus::{CorpusPredictor, CORPUS_FILE};
pub use tree::{collect_calls, node_depth};

use std::path::Path;

use bayou_evidence::{derive_evidence_tokens, Evidence, EvidenceTokens};
use ndarray::Array1;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;

use super::config::{ModelConfig, CONFIG_FILE};
use super::tree::{collect_calls, node_depth};
use crate::candidate::AstTree;
use crate::error::PredictorError;
use crate::predictor::{Draw, DrawOutcome, Predictor};

pub const CORPUS_FILE: &str = "corpus.json";

#[derive(Debug, Deserialize)]
struct RawCorpus {
    programs: Vec<RawProgram>,
}

#[derive(Debug, Deserialize)]
struct RawProgram {
    ast: AstTree,
}

#[derive(Debug)]
struct Program {
    tree: AstTree,
    calls: Vec<String>,
    depth: usize,
    /// Evidence presence vectors, one per configured encoder.
    presence: Vec<Array1<i32>>,
}

/// Predictor that samples whole programs from a stored corpus.
///
/// Programs whose implied evidence overlaps the request are favoured: each
/// program is weighted by `(1 + overlap)^2`, where `overlap` is the dot
/// product of the request's and the program's encoded evidence. Programs
/// deeper than the decoder's `max_ast_depth` come back as inconsistent draws.
#[derive(Debug)]
pub struct CorpusPredictor {
    config: ModelConfig,
    programs: Vec<Program>,
    rng: StdRng,
    /// Sampling distribution for the most recent evidence. A search draws
    /// many times with the same evidence.
    cached: Option<(Evidence, WeightedIndex<f64>)>,
}

impl CorpusPredictor {
    /// Load `config.json` and `corpus.json` from a model directory.
    pub fn load(save_dir: &Path, seed: Option<u64>) -> Result<Self, PredictorError> {
        let config_path = save_dir.join(CONFIG_FILE);
        let config = ModelConfig::load(&config_path).map_err(|err| {
            PredictorError::artifact(format!("{}: {err}", config_path.display()))
        })?;

        let corpus_path = save_dir.join(CORPUS_FILE);
        let bytes = std::fs::read(&corpus_path).map_err(|err| {
            PredictorError::artifact(format!("{}: {err}", corpus_path.display()))
        })?;
        let corpus: RawCorpus = serde_json::from_slice(&bytes)?;

        log::info!(
            "loaded model from {} ({} programs)",
            save_dir.display(),
            corpus.programs.len()
        );
        Self::from_parts(
            config,
            corpus.programs.into_iter().map(|p| p.ast).collect(),
            seed,
        )
    }

    /// Build from an already-parsed config and program trees.
    ///
    /// Encoders without a saved vocabulary get one built from the corpus.
    pub fn from_parts(
        mut config: ModelConfig,
        trees: Vec<AstTree>,
        seed: Option<u64>,
    ) -> Result<Self, PredictorError> {
        if trees.is_empty() {
            return Err(PredictorError::artifact("corpus has no programs"));
        }

        let derived: Vec<(AstTree, Vec<String>, EvidenceTokens)> = trees
            .into_iter()
            .map(|tree| {
                let calls = collect_calls(&tree);
                let tokens = derive_evidence_tokens(calls.iter().map(String::as_str));
                (tree, calls, tokens)
            })
            .collect();

        for encoder in &mut config.evidence {
            if encoder.vocab.is_none() {
                let data: Vec<Vec<String>> = derived
                    .iter()
                    .map(|(_, _, tokens)| tokens.get(encoder.kind).iter().cloned().collect())
                    .collect();
                encoder.set_chars_vocab(&data);
            }
        }

        let programs = derived
            .into_iter()
            .map(|(tree, calls, tokens)| {
                let presence = config
                    .evidence
                    .iter()
                    .map(|encoder| {
                        let items: Vec<String> = tokens.get(encoder.kind).iter().cloned().collect();
                        encoder.presence(&items)
                    })
                    .collect();
                Program {
                    depth: node_depth(&tree),
                    tree,
                    calls,
                    presence,
                }
            })
            .collect();

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            config,
            programs,
            rng,
            cached: None,
        })
    }

    #[must_use]
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    fn weights(&self, evidence: &Evidence) -> Vec<f64> {
        let requested: Vec<Array1<i32>> = self
            .config
            .evidence
            .iter()
            .map(|encoder| {
                let items: Vec<String> = evidence.get(encoder.kind).iter().cloned().collect();
                encoder.presence(&items)
            })
            .collect();

        self.programs
            .iter()
            .map(|program| {
                let overlap: i32 = requested
                    .iter()
                    .zip(&program.presence)
                    .map(|(req, prog)| req.dot(prog))
                    .sum();
                let base = 1.0 + f64::from(overlap);
                base * base
            })
            .collect()
    }

    fn refresh_distribution(&mut self, evidence: &Evidence) -> Result<(), PredictorError> {
        if matches!(&self.cached, Some((key, _)) if key == evidence) {
            return Ok(());
        }
        let dist = WeightedIndex::new(self.weights(evidence))
            .map_err(|err| PredictorError::Inference(format!("invalid sampling weights: {err}")))?;
        self.cached = Some((evidence.clone(), dist));
        Ok(())
    }
}

impl Predictor for CorpusPredictor {
    fn draw(&mut self, evidence: &Evidence) -> Result<DrawOutcome, PredictorError> {
        self.refresh_distribution(evidence)?;
        let Some((_, dist)) = &self.cached else {
            return Err(PredictorError::Inference("sampling weights missing".into()));
        };
        let program = &self.programs[dist.sample(&mut self.rng)];

        let max_depth = self.config.decoder.max_ast_depth;
        if program.depth > max_depth {
            return Ok(DrawOutcome::Inconsistent(format!(
                "AST depth {} exceeds max_ast_depth {max_depth}",
                program.depth
            )));
        }

        Ok(DrawOutcome::Sampled(Draw {
            tree: program.tree.clone(),
            calls: program.calls.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bayou_evidence::EvidenceKind;
    use serde_json::json;

    fn predictor() -> CorpusPredictor {
        let config = ModelConfig::read(
            &json!({
                "latent_size": 8,
                "batch_size": 1,
                "num_epochs": 1,
                "learning_rate": 0.001,
                "print_step": 1,
                "alpha": 1e-05,
                "beta": 1e-05,
                "evidence": [{"name": "apicalls", "units": 8, "tile": 1, "max_num": 4}],
                "decoder": {"units": 16, "max_ast_depth": 8}
            }),
            false,
        )
        .unwrap();
        let trees = ["java.io.File.exists()", "java.io.File.delete()"]
            .iter()
            .map(|call| {
                let mut tree = AstTree::new();
                tree.insert("node".into(), json!("DSubTree"));
                tree.insert("_nodes".into(), json!([{"node": "DAPICall", "_call": call}]));
                tree
            })
            .collect();
        CorpusPredictor::from_parts(config, trees, Some(5)).unwrap()
    }

    fn cached_key(predictor: &CorpusPredictor) -> Option<&Evidence> {
        predictor.cached.as_ref().map(|(key, _)| key)
    }

    #[test]
    fn weights_are_reused_until_evidence_changes() {
        let mut predictor = predictor();
        assert!(cached_key(&predictor).is_none());

        let exists = Evidence::default().with(EvidenceKind::ApiCalls, ["exists"]);
        let delete = Evidence::default().with(EvidenceKind::ApiCalls, ["delete"]);

        predictor.draw(&exists).unwrap();
        let first = predictor.cached.as_ref().map(|(_, dist)| dist.clone());
        predictor.draw(&exists).unwrap();
        assert_eq!(cached_key(&predictor), Some(&exists));
        assert_eq!(predictor.cached.as_ref().map(|(_, dist)| dist.clone()), first);

        predictor.draw(&delete).unwrap();
        assert_eq!(cached_key(&predictor), Some(&delete));
    }

    #[test]
    fn switching_evidence_switches_the_favoured_program() {
        let mut predictor = predictor();
        for (token, call) in [("exists", "java.io.File.exists()"), ("delete", "java.io.File.delete()")] {
            let evidence = Evidence::default().with(EvidenceKind::ApiCalls, [token]);
            let hits = (0..100)
                .filter(|_| match predictor.draw(&evidence).unwrap() {
                    DrawOutcome::Sampled(draw) => draw.calls == [call],
                    DrawOutcome::Inconsistent(_) => false,
                })
                .count();
            // Weight 4 against 1: about 80 of 100.
            assert!(hits > 60, "{token}: only {hits} of 100 draws matched");
        }
    }
}

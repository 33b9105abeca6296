use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{Context as AnyhowContext, Result};
use bayou_evidence::{derive_evidence_tokens, EvidenceKind, EvidenceTokens};
use rand::rngs::StdRng;
use rand::seq::IteratorRandom;
use rand::{Rng, SeedableRng};
use serde_json::{json, Map, Value};

pub const DEFAULT_MAX_SEQS: usize = 9999;
pub const DEFAULT_MAX_SEQ_LENGTH: usize = 9999;

/// Filters and sampling for turning a driver dump into training evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Programs with more sequences are skipped.
    pub max_seqs: usize,
    /// Programs with any longer sequence are skipped.
    pub max_seq_length: usize,
    /// Random evidence subsets per program; 0 keeps the full evidence once.
    pub num_samples: usize,
    pub seed: Option<u64>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_seqs: DEFAULT_MAX_SEQS,
            max_seq_length: DEFAULT_MAX_SEQ_LENGTH,
            num_samples: 0,
            seed: None,
        }
    }
}

/// Attach `apicalls`, `types` and `context` to every program of
/// `{"programs": [{"sequences": [{"calls": [...]}], ...}]}`.
pub fn extract_evidence(input: &Value, options: &ExtractOptions) -> Result<Value> {
    let programs = input
        .get("programs")
        .and_then(Value::as_array)
        .context("input has no \"programs\" list")?;

    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut extracted = Vec::new();
    let mut kept = 0usize;
    for (i, program) in programs.iter().enumerate() {
        let record = program
            .as_object()
            .with_context(|| format!("program {i} is not an object"))?;
        let sequences = sequence_calls(record).with_context(|| format!("program {i}"))?;

        if sequences.len() > options.max_seqs
            || sequences.iter().any(|calls| calls.len() > options.max_seq_length)
        {
            continue;
        }
        kept += 1;

        let calls: BTreeSet<&str> = sequences.into_iter().flatten().collect();
        let tokens = derive_evidence_tokens(calls);

        if options.num_samples == 0 {
            extracted.push(Value::Object(with_evidence(record, |kind| {
                tokens.get(kind).iter().cloned().collect()
            })));
            continue;
        }

        for _ in 0..options.num_samples {
            let sample = sample_tokens(&tokens, &mut rng);
            if sample.is_empty() {
                continue;
            }
            extracted.push(Value::Object(with_evidence(record, |kind| {
                sample.get(kind).iter().cloned().collect()
            })));
        }
    }

    log::info!(
        "extracted evidence for {kept} of {} programs ({} records)",
        programs.len(),
        extracted.len()
    );
    Ok(json!({ "programs": extracted }))
}

/// Read `input`, extract, and write pretty JSON to `output`.
pub fn extract_evidence_file(input: &Path, output: &Path, options: &ExtractOptions) -> Result<()> {
    let raw = fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let js: Value = serde_json::from_slice(&raw)
        .with_context(|| format!("Failed to parse {}", input.display()))?;
    let extracted = extract_evidence(&js, options)?;
    fs::write(output, serde_json::to_string_pretty(&extracted)?)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(())
}

fn sequence_calls(record: &Map<String, Value>) -> Result<Vec<Vec<&str>>> {
    let sequences = record
        .get("sequences")
        .and_then(Value::as_array)
        .context("missing \"sequences\" list")?;
    sequences
        .iter()
        .map(|sequence| {
            let calls = sequence
                .get("calls")
                .and_then(Value::as_array)
                .context("sequence without \"calls\" list")?;
            Ok(calls.iter().filter_map(Value::as_str).collect())
        })
        .collect()
}

fn with_evidence<F>(record: &Map<String, Value>, tokens_for: F) -> Map<String, Value>
where
    F: Fn(EvidenceKind) -> Vec<String>,
{
    let mut out = record.clone();
    for kind in EvidenceKind::ALL {
        out.insert(kind.name().to_string(), json!(tokens_for(kind)));
    }
    out
}

/// Per category, keep a random subset of random size (possibly empty).
fn sample_tokens(tokens: &EvidenceTokens, rng: &mut StdRng) -> EvidenceTokens {
    let mut sample = EvidenceTokens::default();
    for kind in EvidenceKind::ALL {
        let pool = tokens.get(kind);
        let size = rng.gen_range(0..=pool.len());
        sample
            .get_mut(kind)
            .extend(pool.iter().cloned().choose_multiple(rng, size));
    }
    sample
}

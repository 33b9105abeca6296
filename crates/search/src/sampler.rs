use std::fmt;
use std::path::Path;

use bayou_evidence::{derive_evidence_tokens, is_consistent, missing_evidence, Evidence};
use serde::{Deserialize, Serialize};

use crate::candidate::CandidateAst;
use crate::error::{Result, SearchError};
use crate::pool::RankedPool;
use crate::predictor::{DrawOutcome, Predictor};

pub const DEFAULT_MAX_DRAWS: usize = 100;
pub const DEFAULT_GAP_THRESHOLD: u32 = 10;
pub const DEFAULT_TOP_K: usize = 10;

/// Bounds of one sampling search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Draw attempts per request, inconsistent draws included
    pub max_draws: usize,

    /// Lead of the top AST over the runner-up that ends sampling early
    pub gap_threshold: u32,

    /// ASTs kept before consistency filtering
    pub top_k: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_draws: DEFAULT_MAX_DRAWS,
            gap_threshold: DEFAULT_GAP_THRESHOLD,
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl SearchConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_draws == 0 {
            return Err(SearchError::InvalidConfig("max_draws must be > 0".to_string()));
        }
        if self.gap_threshold == 0 {
            return Err(SearchError::InvalidConfig(
                "gap_threshold must be > 0".to_string(),
            ));
        }
        if self.top_k == 0 {
            return Err(SearchError::InvalidConfig("top_k must be > 0".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The top AST led the runner-up by at least `gap_threshold`.
    ConfidenceGap,
    /// All `max_draws` attempts were used.
    BudgetExhausted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfidenceGap => f.write_str("confidence-gap"),
            Self::BudgetExhausted => f.write_str("budget-exhausted"),
        }
    }
}

/// State left behind by the sampling phase.
#[derive(Debug, Clone)]
pub struct SamplingRun {
    pool: RankedPool,
    attempts: usize,
    rejected: usize,
    stop: StopReason,
}

impl SamplingRun {
    #[must_use]
    pub fn pool(&self) -> &RankedPool {
        &self.pool
    }

    /// Draws requested from the predictor.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Draws the predictor reported as inconsistent.
    #[must_use]
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    #[must_use]
    pub fn stop(&self) -> StopReason {
        self.stop
    }
}

/// Bounded, frequency-ranked sampling over a [`Predictor`].
#[derive(Debug, Clone)]
pub struct SamplingSearch {
    config: SearchConfig,
}

impl SamplingSearch {
    pub fn new(config: SearchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Sample, then keep the top ASTs that cover the requested evidence.
    pub fn search<P>(&self, predictor: &mut P, evidence: &Evidence) -> Result<Vec<CandidateAst>>
    where
        P: Predictor + ?Sized,
    {
        let run = self.sample(predictor, evidence)?;
        Ok(self.select(run, evidence))
    }

    /// Draw until the budget runs out or the top AST dominates.
    ///
    /// Inconsistent draws use up an attempt and are otherwise ignored. Any
    /// other predictor failure aborts the search.
    pub fn sample<P>(&self, predictor: &mut P, evidence: &Evidence) -> Result<SamplingRun>
    where
        P: Predictor + ?Sized,
    {
        let mut pool = RankedPool::new();
        let mut attempts = 0;
        let mut rejected = 0;
        let mut stop = StopReason::BudgetExhausted;

        while attempts < self.config.max_draws {
            attempts += 1;

            let draw = match predictor.draw(evidence)? {
                DrawOutcome::Sampled(draw) => draw,
                DrawOutcome::Inconsistent(reason) => {
                    log::debug!("draw {attempts} discarded: {reason}");
                    rejected += 1;
                    continue;
                }
            };

            pool.observe(CandidateAst::new(draw.tree, draw.calls));

            if pool
                .leading_gap()
                .is_some_and(|gap| gap >= self.config.gap_threshold)
            {
                stop = StopReason::ConfidenceGap;
                break;
            }
        }

        log::debug!(
            "sampling stopped ({stop}) after {attempts} draws: {} distinct, {rejected} discarded",
            pool.len()
        );

        Ok(SamplingRun {
            pool,
            attempts,
            rejected,
            stop,
        })
    }

    /// Attach counts, keep the first `top_k` entries in pool order, and drop
    /// those whose calls do not cover `evidence`. Dropped entries are not
    /// replaced.
    #[must_use]
    pub fn select(&self, run: SamplingRun, evidence: &Evidence) -> Vec<CandidateAst> {
        let mut ranked = run.pool.into_ranked();
        ranked.truncate(self.config.top_k);

        ranked
            .into_iter()
            .filter(|ast| {
                let calls = ast.calls().iter().map(String::as_str);
                if is_consistent(evidence, calls) {
                    return true;
                }
                if log::log_enabled!(log::Level::Debug) {
                    let derived = derive_evidence_tokens(ast.calls().iter().map(String::as_str));
                    log::debug!(
                        "dropping AST drawn {} times, missing evidence {:?}",
                        ast.count(),
                        missing_evidence(evidence, &derived)
                    );
                }
                false
            })
            .collect()
    }
}

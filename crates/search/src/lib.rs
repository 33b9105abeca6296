//! # Bayou Search
//!
//! Turns a generative model into a ranked list of programs. The model is
//! sampled repeatedly; structurally equal ASTs are merged and counted, and
//! sampling stops early once one AST clearly dominates.
//!
//! ```text
//! Evidence ──> Predictor::draw ──┐  (up to max_draws)
//!                 ▲              │
//!                 └── RankedPool::observe ──> gap check
//!                                │
//!                                └──> top_k ──> consistency filter ──> SynthesisResponse
//! ```

mod assemble;
mod candidate;
mod error;
pub mod model;
mod pool;
mod predictor;
mod sampler;

pub use assemble::{assemble, SynthesisResponse};
pub use candidate::{AstTree, CandidateAst};
pub use error::{PredictorError, Result, SearchError};
pub use pool::{Observation, RankedPool};
pub use predictor::{Draw, DrawOutcome, Predictor};
pub use sampler::{
    SamplingRun, SamplingSearch, SearchConfig, StopReason, DEFAULT_GAP_THRESHOLD,
    DEFAULT_MAX_DRAWS, DEFAULT_TOP_K,
};

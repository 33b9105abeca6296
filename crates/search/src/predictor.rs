use bayou_evidence::Evidence;

use crate::candidate::AstTree;
use crate::error::PredictorError;

/// One program sampled from the model.
#[derive(Debug, Clone, PartialEq)]
pub struct Draw {
    pub tree: AstTree,
    /// Call signatures the decoder emitted while producing `tree`.
    pub calls: Vec<String>,
}

/// Result of a single draw that did not fail outright.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOutcome {
    Sampled(Draw),
    /// The model produced an internally inconsistent program. The draw is
    /// discarded and sampling continues.
    Inconsistent(String),
}

/// A stateful model session that maps evidence to sampled ASTs.
///
/// Sessions are not shareable between concurrent searches; callers hand one
/// to the search by `&mut` and serialize access themselves.
pub trait Predictor {
    fn draw(&mut self, evidence: &Evidence) -> Result<DrawOutcome, PredictorError>;
}

impl<P: Predictor + ?Sized> Predictor for &mut P {
    fn draw(&mut self, evidence: &Evidence) -> Result<DrawOutcome, PredictorError> {
        (**self).draw(evidence)
    }
}

impl<P: Predictor + ?Sized> Predictor for Box<P> {
    fn draw(&mut self, evidence: &Evidence) -> Result<DrawOutcome, PredictorError> {
        (**self).draw(evidence)
    }
}

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context as AnyhowContext, Result};
use bayou_evidence::EvidenceRequest;
use bayou_search::{assemble, Predictor, SamplingSearch, SynthesisResponse};

/// A predictor session plus the search that drives it.
///
/// The session is shared behind a mutex: one search holds it at a time.
pub struct SynthesisEngine<P> {
    predictor: Arc<Mutex<P>>,
    search: Arc<SamplingSearch>,
}

impl<P> Clone for SynthesisEngine<P> {
    fn clone(&self) -> Self {
        Self {
            predictor: Arc::clone(&self.predictor),
            search: Arc::clone(&self.search),
        }
    }
}

impl<P> SynthesisEngine<P>
where
    P: Predictor + Send + 'static,
{
    pub fn new(predictor: P, search: SamplingSearch) -> Self {
        Self {
            predictor: Arc::new(Mutex::new(predictor)),
            search: Arc::new(search),
        }
    }

    /// Run one search synchronously.
    pub fn generate(&self, request: &EvidenceRequest) -> Result<SynthesisResponse> {
        // A panicking draw poisons the lock but leaves the session usable for
        // the next request.
        let mut predictor = self.predictor.lock().unwrap_or_else(|poisoned| {
            log::warn!("predictor panicked during an earlier request; reusing session");
            self.predictor.clear_poison();
            PoisonError::into_inner(poisoned)
        });
        let asts = self
            .search
            .search(&mut *predictor, &request.evidence)
            .context("AST search failed")?;
        Ok(assemble(request, asts))
    }

    /// Parse a raw request body, search on a blocking worker, and render the
    /// response as pretty JSON.
    pub async fn generate_json(&self, raw: String) -> Result<String> {
        let engine = self.clone();
        tokio::task::spawn_blocking(move || -> Result<String> {
            let request = EvidenceRequest::from_json_str(&raw).context("invalid evidence")?;
            log::debug!("evidence: {:?}", request.evidence);
            let response = engine.generate(&request)?;
            log::debug!("returning {} ASTs", response.asts.len());
            Ok(response.to_json_pretty()?)
        })
        .await
        .context("search worker panicked")?
    }
}

use crate::kind::EvidenceKind;
use crate::request::Evidence;

/// Deduplicated tokens implied by a set of call signatures. Same per-category
/// shape as requested evidence, so the two compare directly.
pub type EvidenceTokens = Evidence;

/// Apply every extractor to every call and collect the results per category.
pub fn derive_evidence_tokens<'a, I>(calls: I) -> EvidenceTokens
where
    I: IntoIterator<Item = &'a str>,
{
    let mut tokens = EvidenceTokens::default();
    for call in calls {
        for kind in EvidenceKind::ALL {
            tokens.get_mut(kind).extend(kind.extract(call));
        }
    }
    tokens
}

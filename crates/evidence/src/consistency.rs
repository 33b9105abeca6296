use crate::kind::EvidenceKind;
use crate::request::Evidence;
use crate::tokens::{derive_evidence_tokens, EvidenceTokens};

/// True when the calls imply every requested token.
///
/// The candidate may use more than was asked for; it may not use less.
pub fn is_consistent<'a, I>(requested: &Evidence, calls: I) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    let derived = derive_evidence_tokens(calls);
    EvidenceKind::ALL
        .iter()
        .all(|kind| requested.get(*kind).is_subset(derived.get(*kind)))
}

/// Requested tokens that the derived tokens do not cover, in category order.
#[must_use]
pub fn missing_evidence(
    requested: &Evidence,
    derived: &EvidenceTokens,
) -> Vec<(EvidenceKind, String)> {
    EvidenceKind::ALL
        .iter()
        .flat_map(|kind| {
            requested
                .get(*kind)
                .difference(derived.get(*kind))
                .map(move |token| (*kind, token.clone()))
        })
        .collect()
}

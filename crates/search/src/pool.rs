use crate::candidate::CandidateAst;

#[derive(Debug, Clone)]
struct PoolEntry {
    ast: CandidateAst,
    count: u32,
}

/// Where an observed AST ended up after [`RankedPool::observe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub position: usize,
    pub count: u32,
    pub first_seen: bool,
}

/// Distinct sampled ASTs with their draw counts, most frequent first.
///
/// Order is maintained incrementally: a repeat moves its entry at most one
/// slot up, and only when its count now exceeds its upper neighbour's. Ties
/// keep first-draw order. Because of the one-slot limit the pool can end up
/// only partially sorted, e.g. counts `[1, 1, 1]` followed by a repeat of the
/// last entry give `[1, 2, 1]`.
#[derive(Debug, Clone, Default)]
pub struct RankedPool {
    entries: Vec<PoolEntry>,
}

impl RankedPool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one draw of `ast`, merging it with a structurally equal entry.
    ///
    /// The first occurrence's `calls` are kept on merge.
    pub fn observe(&mut self, ast: CandidateAst) -> Observation {
        let Some(index) = self.entries.iter().position(|entry| entry.ast == ast) else {
            self.entries.push(PoolEntry { ast, count: 1 });
            return Observation {
                position: self.entries.len() - 1,
                count: 1,
                first_seen: true,
            };
        };

        self.entries[index].count += 1;
        let count = self.entries[index].count;

        let mut position = index;
        if index > 0 && count > self.entries[index - 1].count {
            self.entries.swap(index, index - 1);
            position = index - 1;
        }

        Observation {
            position,
            count,
            first_seen: false,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Counts in pool order.
    #[must_use]
    pub fn counts(&self) -> Vec<u32> {
        self.entries.iter().map(|entry| entry.count).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CandidateAst, u32)> {
        self.entries.iter().map(|entry| (&entry.ast, entry.count))
    }

    /// `count[0] - count[1]` once the pool holds more than two entries.
    ///
    /// Saturates at zero when the partial ordering leaves the second entry
    /// ahead of the first.
    #[must_use]
    pub fn leading_gap(&self) -> Option<u32> {
        match self.entries.as_slice() {
            [first, second, _, ..] => Some(first.count.saturating_sub(second.count)),
            _ => None,
        }
    }

    /// Consume the pool, writing each entry's count onto its AST.
    #[must_use]
    pub fn into_ranked(self) -> Vec<CandidateAst> {
        self.entries
            .into_iter()
            .map(|PoolEntry { mut ast, count }| {
                ast.set_count(count);
                ast
            })
            .collect()
    }
}

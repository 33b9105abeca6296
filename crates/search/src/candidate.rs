use std::collections::BTreeSet;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

/// A program tree as emitted by the decoder (`{"node": "DSubTree", "_nodes": [...]}`).
pub type AstTree = Map<String, Value>;

const CALLS_KEY: &str = "calls";
const COUNT_KEY: &str = "count";

/// A sampled program with the calls used to build it and how often it was drawn.
///
/// Two candidates are equal when their trees are equal; `calls` and `count`
/// are metadata.
#[derive(Debug, Clone)]
pub struct CandidateAst {
    tree: AstTree,
    calls: BTreeSet<String>,
    count: u32,
}

impl CandidateAst {
    pub fn new<I, S>(tree: AstTree, calls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tree,
            calls: calls.into_iter().map(Into::into).collect(),
            count: 0,
        }
    }

    #[must_use]
    pub fn tree(&self) -> &AstTree {
        &self.tree
    }

    #[must_use]
    pub fn calls(&self) -> &BTreeSet<String> {
        &self.calls
    }

    /// Number of draws that produced this tree. Zero until the search finishes.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    pub(crate) fn set_count(&mut self, count: u32) {
        self.count = count;
    }
}

impl PartialEq for CandidateAst {
    fn eq(&self, other: &Self) -> bool {
        self.tree == other.tree
    }
}

impl Serialize for CandidateAst {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = self
            .tree
            .iter()
            .filter(|(key, _)| key.as_str() != CALLS_KEY && key.as_str() != COUNT_KEY);

        let mut map = serializer.serialize_map(None)?;
        for (key, value) in fields {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry(CALLS_KEY, &self.calls)?;
        map.serialize_entry(COUNT_KEY, &self.count)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(value: Value) -> AstTree {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn equality_ignores_metadata() {
        let t = tree(json!({"node": "DSubTree", "_nodes": []}));
        let mut a = CandidateAst::new(t.clone(), ["java.io.File.exists()"]);
        let b = CandidateAst::new(t, Vec::<String>::new());
        a.set_count(7);
        assert_eq!(a, b);
    }

    #[test]
    fn different_trees_are_not_equal() {
        let a = CandidateAst::new(tree(json!({"node": "DSubTree", "_nodes": []})), ["x.Y.z()"]);
        let b = CandidateAst::new(tree(json!({"node": "DSubTree", "_nodes": [{"node": "DAPICall", "_call": "x.Y.z()"}]})), ["x.Y.z()"]);
        assert_ne!(a, b);
    }

    #[test]
    fn serializes_tree_fields_with_calls_and_count() {
        let mut ast = CandidateAst::new(
            tree(json!({"node": "DSubTree", "_nodes": [], "count": 99})),
            ["b.C.d()", "a.B.c()", "a.B.c()"],
        );
        ast.set_count(3);
        let js = serde_json::to_value(&ast).unwrap();
        assert_eq!(
            js,
            json!({"node": "DSubTree", "_nodes": [], "calls": ["a.B.c()", "b.C.d()"], "count": 3})
        );
    }
}

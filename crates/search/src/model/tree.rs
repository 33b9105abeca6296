use serde_json::Value;

use crate::candidate::AstTree;

const CALL_KEY: &str = "_call";
const NODE_KEY: &str = "node";

/// Every `_call` signature in the tree, duplicates kept.
#[must_use]
pub fn collect_calls(tree: &AstTree) -> Vec<String> {
    let mut calls = Vec::new();
    for (key, value) in tree {
        collect_value(key, value, &mut calls);
    }
    calls
}

fn collect_value(key: &str, value: &Value, calls: &mut Vec<String>) {
    match value {
        Value::String(call) if key == CALL_KEY => calls.push(call.clone()),
        Value::Array(items) => items.iter().for_each(|item| collect_value("", item, calls)),
        Value::Object(map) => {
            for (key, value) in map {
                collect_value(key, value, calls);
            }
        }
        _ => {}
    }
}

/// Longest chain of nested `node` objects, counting the root.
#[must_use]
pub fn node_depth(tree: &AstTree) -> usize {
    let own = usize::from(tree.contains_key(NODE_KEY));
    own + tree.values().map(value_depth).max().unwrap_or(0)
}

fn value_depth(value: &Value) -> usize {
    match value {
        Value::Array(items) => items.iter().map(value_depth).max().unwrap_or(0),
        Value::Object(map) => node_depth(map),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample_tree() -> AstTree {
        let js = json!({
            "node": "DSubTree",
            "_nodes": [
                {"node": "DAPICall", "_call": "java.io.BufferedReader.readLine()"},
                {
                    "node": "DLoop",
                    "_cond": [{"node": "DAPICall", "_call": "java.io.BufferedReader.ready()"}],
                    "_body": [{"node": "DAPICall", "_call": "java.io.BufferedReader.readLine()"}]
                }
            ]
        });
        match js {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn collects_every_call() {
        let mut calls = collect_calls(&sample_tree());
        calls.sort();
        assert_eq!(
            calls,
            vec![
                "java.io.BufferedReader.readLine()",
                "java.io.BufferedReader.readLine()",
                "java.io.BufferedReader.ready()",
            ]
        );
    }

    #[test]
    fn depth_counts_nested_nodes() {
        assert_eq!(node_depth(&sample_tree()), 3);
        assert_eq!(node_depth(&AstTree::new()), 0);
    }
}

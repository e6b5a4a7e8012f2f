// Response normalisation
// A decoded XML field is a single value when it occurs once and a list when it repeats.
// `normalise` rewrites a tree so that the value at a key path is always a list.

use crate::tree::Node;

// Canonicalises the cardinality of the value at `path` inside `tree`.
// Intermediate keys are created as empty maps when missing. When an
// intermediate value is not a map (the XML omitted a wrapper element), it is
// rewrapped as `{next_key: value}`. The final value becomes a list with null
// entries removed. Running this twice with the same path changes nothing.
pub fn normalise(tree: &mut Node, path: &[&str]) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };

    let mut current = tree;
    for (depth, key) in parents.iter().enumerate() {
        if !current.is_map() {
            return;
        }
        let next_key = path[depth + 1];
        let Some(child) = current.entry_or_insert_with(key, Node::map) else {
            return;
        };
        if !child.is_map() {
            let value = std::mem::take(child);
            *child = Node::Map(vec![(next_key.to_string(), value)]);
        }
        current = child;
    }

    let Some(leaf) = current.entry_or_insert_with(last, || Node::List(Vec::new())) else {
        return;
    };
    let items = match std::mem::take(leaf) {
        Node::List(items) => items,
        Node::Null => Vec::new(),
        other => vec![other],
    };
    *leaf = Node::List(items.into_iter().filter(|item| !item.is_null()).collect());
}

pub fn normalise_all(tree: &mut Node, paths: &[&[&str]]) {
    for path in paths {
        normalise(tree, path);
    }
}

pub fn apply_defaults(tree: &mut Node, defaults: &[(&str, &str)]) {
    for (key, value) in defaults {
        tree.set_default(key, *value);
    }
}

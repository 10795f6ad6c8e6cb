//! Dotted-path access into nested trees
//!
//! Paths are split on `.` with no escaping; empty segments are ordinary
//! keys equal to the empty string.

use std::collections::BTreeMap;

use crate::value::Value;

/// Separator between path segments
pub const PATH_SEPARATOR: char = '.';

/// A tree node that can be descended one key at a time
pub trait PathNode {
    fn child(&self, key: &str) -> Option<&Self>;
}

impl PathNode for Value {
    fn child(&self, key: &str) -> Option<&Self> {
        self.member(key)
    }
}

/// Resolve `path` under `root` for reading.
///
/// Stops at the first missing level and returns `None`; never fails.
pub fn resolve_read<'a, N: PathNode>(root: &'a N, path: &str) -> Option<&'a N> {
    path.split(PATH_SEPARATOR)
        .try_fold(root, |node, key| node.child(key))
}

/// Parse a canonical array index: ASCII digits with no sign and no leading
/// zero, except for `"0"` itself.
pub fn array_index(key: &str) -> Option<usize> {
    let canonical = !key.is_empty()
        && key.bytes().all(|b| b.is_ascii_digit())
        && (key == "0" || !key.starts_with('0'));
    if canonical {
        key.parse().ok()
    } else {
        None
    }
}

/// Store `value` at `path` under `root`, creating intermediate mappings on demand.
///
/// Whatever sits at the final segment is overwritten. An intermediate level
/// that cannot hold children (a primitive or `null`) is replaced by an empty
/// mapping. On arrays, a segment may assign an existing index or append at
/// `len`; any other segment leaves the array untouched and nothing is written.
pub fn resolve_write(root: &mut Value, path: &str, value: Value) {
    let (parents, last) = match path.rsplit_once(PATH_SEPARATOR) {
        Some((parents, last)) => (Some(parents), last),
        None => (None, path),
    };

    let mut node = root;
    if let Some(parents) = parents {
        for key in parents.split(PATH_SEPARATOR) {
            let Some(child) = slot(node, key) else {
                return;
            };
            if !matches!(child, Value::Object(_) | Value::Array(_)) {
                *child = Value::object();
            }
            node = child;
        }
    }

    if let Some(target) = slot(node, last) {
        *target = value;
    }
}

/// Mutable location for `key` inside `node`, inserted as `null` when missing.
/// `None` when `node` is an array and `key` does not address it.
fn slot<'a>(node: &'a mut Value, key: &str) -> Option<&'a mut Value> {
    match node {
        Value::Array(items) => {
            let index = array_index(key).filter(|index| *index <= items.len())?;
            if index == items.len() {
                items.push(Value::Null);
            }
            items.get_mut(index)
        }
        node => Some(
            ensure_object(node)
                .entry(key.to_string())
                .or_insert(Value::Null),
        ),
    }
}

fn ensure_object(node: &mut Value) -> &mut BTreeMap<String, Value> {
    if !matches!(node, Value::Object(_)) {
        *node = Value::object();
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced by a mapping"),
    }
}

//! Turns raw JSON field values into [`FieldNode`] trees.
//!
//! Declared field kinds are applied where the content system provides them.
//! Everything else is classified by shape: densely index-keyed mappings
//! (`"0"`..`"n-1"`) are lists and other mappings are keyed groups. Layout
//! blocks only come from a declared flexible-content field; an untyped map
//! that happens to carry the layout key is an ordinary keyed group. Values
//! that are none of text, list or mapping are dropped.

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::{FieldKind, FieldNode, DEFAULT_LAYOUT_KEY};

/// Nesting depth past which subtrees are left as `FieldNode::Unknown` and
/// resolved by the (iterative) extractor instead.
const MAX_DEPTH: usize = 256;

/// Structural classification of a raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Text,
    List,
    Keyed,
    /// Empty, null, boolean: carries no text.
    Skip,
}

pub fn classify(value: &Value) -> Shape {
    match value {
        Value::Null | Value::Bool(_) => Shape::Skip,
        Value::String(s) if s.is_empty() => Shape::Skip,
        Value::String(_) | Value::Number(_) => Shape::Text,
        Value::Array(items) if items.is_empty() => Shape::Skip,
        Value::Array(_) => Shape::List,
        Value::Object(map) if map.is_empty() => Shape::Skip,
        Value::Object(map) if is_dense_index(map) => Shape::List,
        Value::Object(_) => Shape::Keyed,
    }
}

/// Text carried by a scalar value. Zero and `"0"` count as text.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn is_dense_index(map: &Map<String, Value>) -> bool {
    map.keys().enumerate().all(|(i, key)| *key == i.to_string())
}

/// Child values of a list-like or mapping value, in order.
fn children(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => map.values().collect(),
        _ => Vec::new(),
    }
}

#[derive(Debug, Clone)]
pub struct Reconciler {
    kinds: HashMap<String, FieldKind>,
    layout_key: String,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(HashMap::new(), DEFAULT_LAYOUT_KEY)
    }
}

impl Reconciler {
    pub fn new(kinds: HashMap<String, FieldKind>, layout_key: impl Into<String>) -> Self {
        Self {
            kinds,
            layout_key: layout_key.into(),
        }
    }

    pub fn layout_key(&self) -> &str {
        &self.layout_key
    }

    /// Reconciles a record's raw field map. Returns `None` when nothing in
    /// the value can carry text.
    pub fn reconcile(&self, value: &Value) -> Option<FieldNode> {
        self.untyped(value, 0)
    }

    fn untyped(&self, value: &Value, depth: usize) -> Option<FieldNode> {
        if depth > MAX_DEPTH {
            return Some(FieldNode::Unknown(value.clone()));
        }

        match (classify(value), value) {
            (Shape::Skip, _) => None,
            (Shape::Text, _) => scalar_text(value).map(FieldNode::Scalar),
            (Shape::List, _) => Some(FieldNode::List(
                children(value)
                    .into_iter()
                    .filter_map(|item| self.untyped(item, depth + 1))
                    .collect(),
            )),
            (Shape::Keyed, Value::Object(map)) => Some(FieldNode::Keyed(self.entries(map, depth))),
            _ => None,
        }
    }

    fn entries(&self, map: &Map<String, Value>, depth: usize) -> Vec<(String, FieldNode)> {
        map.iter()
            .filter_map(|(name, value)| {
                self.field(name, value, depth + 1)
                    .map(|node| (name.clone(), node))
            })
            .collect()
    }

    fn field(&self, name: &str, value: &Value, depth: usize) -> Option<FieldNode> {
        if depth > MAX_DEPTH {
            return Some(FieldNode::Unknown(value.clone()));
        }

        let kind = self.kinds.get(name).copied().unwrap_or(FieldKind::Unknown);
        match kind {
            k if k.is_textual() => scalar_text(value).map(FieldNode::Scalar),
            FieldKind::Repeater => self.repeater(value, depth),
            FieldKind::Group => match value {
                Value::Object(map) => Some(FieldNode::Keyed(self.entries(map, depth))),
                Value::Array(_) => self.untyped(value, depth),
                _ => None,
            },
            FieldKind::FlexibleContent => self.flexible_content(value, depth),
            _ => self.untyped(value, depth),
        }
    }

    fn repeater(&self, value: &Value, depth: usize) -> Option<FieldNode> {
        if !(value.is_array() || value.is_object()) {
            return None;
        }

        let rows = children(value)
            .into_iter()
            .filter_map(|row| match row {
                Value::Object(map) => Some(FieldNode::Keyed(self.entries(map, depth + 1))),
                Value::Array(_) => self.untyped(row, depth + 1),
                other => scalar_text(other).map(FieldNode::Scalar),
            })
            .collect();

        Some(FieldNode::List(rows))
    }

    fn flexible_content(&self, value: &Value, depth: usize) -> Option<FieldNode> {
        if !(value.is_array() || value.is_object()) {
            return None;
        }

        let blocks = children(value)
            .into_iter()
            .filter_map(|block| match block {
                Value::Object(map) => Some(self.layout_block(map, depth + 1)),
                _ => None,
            })
            .collect();

        Some(FieldNode::List(blocks))
    }

    fn layout_block(&self, map: &Map<String, Value>, depth: usize) -> FieldNode {
        let tag = map
            .get(&self.layout_key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let fields = map
            .iter()
            .filter(|(name, _)| **name != self.layout_key)
            .filter_map(|(name, value)| {
                self.field(name, value, depth + 1)
                    .map(|node| (name.clone(), node))
            })
            .collect();

        FieldNode::Layout { tag, fields }
    }
}

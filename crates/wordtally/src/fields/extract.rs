//! Depth-first flattening of a [`FieldNode`] tree into text fragments.

use serde_json::Value;

use super::reconcile::{classify, scalar_text, Shape};
use super::{FieldNode, DEFAULT_LAYOUT_KEY};

/// Flattens field trees into ordered text fragments.
///
/// Traversal uses an explicit stack, so arbitrarily deep trees cannot
/// exhaust the call stack. Output order is the depth-first visiting order,
/// so identical input always yields identical fragments.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    layout_key: String,
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_LAYOUT_KEY)
    }
}

enum Pending<'a> {
    Node(&'a FieldNode),
    Raw(&'a Value),
}

impl FieldExtractor {
    pub fn new(layout_key: impl Into<String>) -> Self {
        Self {
            layout_key: layout_key.into(),
        }
    }

    pub fn extract(&self, root: &FieldNode) -> Vec<String> {
        let mut fragments = Vec::new();
        let mut stack = vec![Pending::Node(root)];

        while let Some(pending) = stack.pop() {
            match pending {
                Pending::Node(node) => self.visit_node(node, &mut stack, &mut fragments),
                Pending::Raw(value) => self.visit_raw(value, &mut stack, &mut fragments),
            }
        }

        fragments
    }

    fn visit_node<'a>(
        &self,
        node: &'a FieldNode,
        stack: &mut Vec<Pending<'a>>,
        fragments: &mut Vec<String>,
    ) {
        match node {
            FieldNode::Scalar(text) => {
                if !text.is_empty() {
                    fragments.push(text.clone());
                }
            }
            FieldNode::List(items) => {
                stack.extend(items.iter().rev().map(Pending::Node));
            }
            FieldNode::Keyed(entries) => {
                stack.extend(entries.iter().rev().map(|(_, child)| Pending::Node(child)));
            }
            FieldNode::Layout { fields, .. } => {
                stack.extend(
                    fields
                        .iter()
                        .rev()
                        .filter(|(name, _)| *name != self.layout_key)
                        .map(|(_, child)| Pending::Node(child)),
                );
            }
            FieldNode::Unknown(value) => stack.push(Pending::Raw(value)),
        }
    }

    fn visit_raw<'a>(
        &self,
        value: &'a Value,
        stack: &mut Vec<Pending<'a>>,
        fragments: &mut Vec<String>,
    ) {
        match (classify(value), value) {
            (Shape::Text, _) => fragments.extend(scalar_text(value)),
            (Shape::List, Value::Array(items)) => {
                stack.extend(items.iter().rev().map(Pending::Raw));
            }
            (Shape::List | Shape::Keyed, Value::Object(map)) => {
                let children: Vec<&Value> = map.values().collect();
                stack.extend(children.into_iter().rev().map(Pending::Raw));
            }
            _ => {}
        }
    }
}

/// Flattens `root` using the default layout key.
pub fn extract(root: &FieldNode) -> Vec<String> {
    FieldExtractor::default().extract(root)
}

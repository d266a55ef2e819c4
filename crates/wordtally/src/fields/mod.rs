//! Structured field values attached to content records.
//!
//! Field trees have no fixed schema. A [`FieldNode`] is either already typed
//! (scalar, list, keyed group, layout block) or an [`FieldNode::Unknown`] raw
//! value whose shape is inferred when it is traversed.

pub mod extract;
pub mod reconcile;

use serde::{Deserialize, Serialize};

pub use extract::{extract, FieldExtractor};
pub use reconcile::{classify, Reconciler, Shape};

/// Reserved key carrying a layout block's discriminator.
pub const DEFAULT_LAYOUT_KEY: &str = "acf_fc_layout";

#[derive(Debug, Clone, PartialEq)]
pub enum FieldNode {
    Scalar(String),
    List(Vec<FieldNode>),
    /// Named children in insertion order. Keys are never counted.
    Keyed(Vec<(String, FieldNode)>),
    /// A layout block: like `Keyed`, plus a discriminator naming the layout.
    Layout {
        tag: String,
        fields: Vec<(String, FieldNode)>,
    },
    /// A raw value not yet classified.
    Unknown(serde_json::Value),
}

impl FieldNode {
    pub fn scalar(text: impl Into<String>) -> Self {
        Self::Scalar(text.into())
    }

    pub fn keyed<K: Into<String>>(entries: impl IntoIterator<Item = (K, FieldNode)>) -> Self {
        Self::Keyed(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn layout<K: Into<String>>(
        tag: impl Into<String>,
        entries: impl IntoIterator<Item = (K, FieldNode)>,
    ) -> Self {
        Self::Layout {
            tag: tag.into(),
            fields: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Declared kind of a named field, as reported by the content system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Textarea,
    Wysiwyg,
    Email,
    Url,
    Repeater,
    Group,
    FlexibleContent,
    /// Any kind this crate does not know; classified from its shape.
    #[serde(other)]
    Unknown,
}

impl FieldKind {
    /// Kinds whose value is a single piece of text.
    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            Self::Text | Self::Textarea | Self::Wysiwyg | Self::Email | Self::Url
        )
    }
}

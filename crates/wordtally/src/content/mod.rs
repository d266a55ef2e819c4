//! Structured content records and their word-count aggregate.

pub mod aggregator;
pub mod directory;

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::SourceError;
use crate::fields::FieldNode;

pub use aggregator::ContentAggregator;
pub use directory::DirectoryContentSource;

/// Snapshot of one content record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: String,
    pub category: String,
    /// Title, body and any other raw text blocks, in order.
    pub text_sources: Vec<String>,
}

/// Which records take part in an aggregate. Every category is included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentFilter {
    pub inclusion_state: String,
}

impl ContentFilter {
    pub fn new(inclusion_state: impl Into<String>) -> Self {
        Self {
            inclusion_state: inclusion_state.into(),
        }
    }
}

impl Default for ContentFilter {
    fn default() -> Self {
        Self::new("publish")
    }
}

/// Read access to the store holding content records.
///
/// `Ok(None)` means the record vanished; errors mean it exists but cannot
/// be read. Callers skip both.
pub trait ContentSource: Send + Sync {
    fn list_ids(&self, filter: &ContentFilter) -> Result<Vec<String>, SourceError>;
    fn get(&self, id: &str) -> Result<Option<ContentRecord>, SourceError>;
    fn get_structured_fields(&self, id: &str) -> Result<Option<FieldNode>, SourceError>;
}

/// Word totals per category, largest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryTotals(Vec<(String, u64)>);

impl CategoryTotals {
    /// Sorts by count descending, then by name. Zero counts are dropped.
    pub fn from_counts(counts: HashMap<String, u64>) -> Self {
        let mut entries: Vec<(String, u64)> =
            counts.into_iter().filter(|(_, count)| *count > 0).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Self(entries)
    }

    pub fn get(&self, category: &str) -> Option<u64> {
        self.0
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, count)| *count)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(name, count)| (name.as_str(), *count))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn sum(&self) -> u64 {
        self.0.iter().map(|(_, count)| count).sum()
    }
}

impl Serialize for CategoryTotals {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, count) in &self.0 {
            map.serialize_entry(name, count)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CategoryTotals {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TotalsVisitor;

        impl<'de> Visitor<'de> for TotalsVisitor {
            type Value = CategoryTotals;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map from category to word count")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, count)) = access.next_entry::<String, u64>()? {
                    entries.push((name, count));
                }
                Ok(CategoryTotals(entries))
            }
        }

        deserializer.deserialize_map(TotalsVisitor)
    }
}

/// Aggregate word count over all included records.
///
/// `by_category` always sums to `total_words`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub total_words: u64,
    pub by_category: CategoryTotals,
    pub computed_at: DateTime<Utc>,
}

impl AggregateResult {
    pub fn from_counts(counts: HashMap<String, u64>) -> Self {
        let by_category = CategoryTotals::from_counts(counts);
        Self {
            total_words: by_category.sum(),
            by_category,
            computed_at: Utc::now(),
        }
    }

    pub fn empty() -> Self {
        Self::from_counts(HashMap::new())
    }
}

use std::collections::HashMap;

use tracing::{debug, info, info_span, warn};

use crate::content::{AggregateResult, ContentFilter, ContentSource};
use crate::fields::FieldExtractor;
use crate::tokenize;

/// Counts words across every included record, grouped by category.
///
/// Identifiers are listed up front and records are materialized one at a
/// time. A record that cannot be read is skipped. Persisting the result is
/// left to the caller.
pub struct ContentAggregator {
    filter: ContentFilter,
    extractor: FieldExtractor,
}

impl ContentAggregator {
    pub fn new(filter: ContentFilter, extractor: FieldExtractor) -> Self {
        Self { filter, extractor }
    }

    pub fn aggregate(&self, source: &dyn ContentSource) -> AggregateResult {
        let _span = info_span!("content.aggregate", state = %self.filter.inclusion_state).entered();

        let ids = match source.list_ids(&self.filter) {
            Ok(ids) => ids,
            Err(e) => {
                warn!("Content source unavailable, reporting empty aggregate: {}", e);
                return AggregateResult::empty();
            }
        };

        let mut counts: HashMap<String, u64> = HashMap::new();
        let mut skipped = 0usize;

        for id in &ids {
            match self.count_record(source, id) {
                Some((category, words)) => {
                    if words > 0 {
                        *counts.entry(category).or_insert(0) += words;
                    }
                }
                None => skipped += 1,
            }
        }

        let result = AggregateResult::from_counts(counts);
        info!(
            records = ids.len(),
            skipped,
            total_words = result.total_words,
            "Content aggregate computed"
        );
        result
    }

    /// Category and word count of one record, or `None` if it could not be read.
    fn count_record(&self, source: &dyn ContentSource, id: &str) -> Option<(String, u64)> {
        let record = match source.get(id) {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!(id, "Record vanished before it could be read");
                return None;
            }
            Err(e) => {
                warn!(id, "Skipping unreadable record: {}", e);
                return None;
            }
        };

        let mut text = record.text_sources.join(" ");

        match source.get_structured_fields(id) {
            Ok(Some(fields)) => {
                let fragments = self.extractor.extract(&fields);
                if !fragments.is_empty() {
                    text.push(' ');
                    text.push_str(&fragments.join(" "));
                }
            }
            Ok(None) => {}
            Err(e) => warn!(id, "Ignoring unreadable structured fields: {}", e),
        }

        Some((record.category, tokenize::count_words(&text)))
    }
}

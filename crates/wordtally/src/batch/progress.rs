use serde::{Deserialize, Serialize};

/// Continuation state for the chunked attachment protocol, owned by the
/// caller and replayed call by call.
///
/// Ids are claimed before their chunk runs, so a chunk whose call fails is
/// passed over rather than retried.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BatchProgress {
    pub attachment_ids: Vec<String>,
    pub cursor: usize,
    pub running_total: u64,
}

impl BatchProgress {
    pub fn new(attachment_ids: Vec<String>) -> Self {
        Self {
            attachment_ids,
            cursor: 0,
            running_total: 0,
        }
    }

    /// Claims up to `size` ids from the cursor. A size of zero claims one.
    pub fn next_chunk(&mut self, size: usize) -> Vec<String> {
        let start = self.cursor.min(self.attachment_ids.len());
        let end = start.saturating_add(size.max(1)).min(self.attachment_ids.len());
        self.cursor = end;
        self.attachment_ids[start..end].to_vec()
    }

    pub fn record(&mut self, chunk_words: u64) {
        self.running_total = self.running_total.saturating_add(chunk_words);
    }

    pub fn remaining(&self) -> usize {
        self.attachment_ids.len().saturating_sub(self.cursor)
    }

    pub fn is_complete(&self) -> bool {
        self.remaining() == 0
    }
}

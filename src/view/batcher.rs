//! Splits an index range into lookup batches that respect the per-call key cap.

use std::ops::Range;

use ledger_client::LedgerKey;

/// Ordered keys sent in one lookup.
pub type KeyBatch = Vec<LedgerKey>;

/// Builds the chat-record keys of `[0, count)` in page-sized batches.
#[derive(Debug, Clone)]
pub struct KeyBatcher {
    contract_id: String,
    page_size: usize,
}

impl KeyBatcher {
    pub fn new(contract_id: &str, page_size: usize) -> Self {
        Self {
            contract_id: contract_id.to_string(),
            page_size,
        }
    }

    /// `ceil(count / page_size)` batches covering every index exactly once,
    /// in index order. Empty when `count` is zero.
    pub fn batch(&self, count: u32) -> Vec<KeyBatch> {
        index_ranges(count, self.page_size)
            .into_iter()
            .map(|range| {
                range
                    .map(|index| LedgerKey::chat(&self.contract_id, index))
                    .collect()
            })
            .collect()
    }
}

/// Consecutive index ranges of at most `page_size` covering `[0, count)`.
fn index_ranges(count: u32, page_size: usize) -> Vec<Range<u32>> {
    // zero would never advance
    let page = u32::try_from(page_size.max(1)).unwrap_or(u32::MAX);
    (0..count)
        .step_by(page as usize)
        .map(|start| start..start.saturating_add(page).min(count))
        .collect()
}

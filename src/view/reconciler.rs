//! Rebuilds the index-keyed entry set from a sequence of batched lookups.
//!
//! Batches are dispatched one after another. Returned records are decoded
//! individually: a record that fails to decode is skipped and reported, a
//! lookup that fails aborts the whole reconciliation. The result is always a
//! brand-new mapping, never a patch of the previous one.

use std::collections::BTreeMap;
use std::future::Future;

use log::{debug, warn};

use ledger_client::{LedgerEntriesResponse, LedgerKey};

use crate::error::{DecodeError, LogViewError};
use crate::message::IndexedEntry;
use crate::view::batcher::KeyBatch;

/// A ledger record left out of the view.
#[derive(Debug)]
pub struct SkippedEntry {
    pub key: LedgerKey,
    pub reason: DecodeError,
}

/// Outcome of one complete pass over every batch.
#[derive(Debug, Default)]
pub struct Reconciled {
    pub entries: BTreeMap<u32, IndexedEntry>,
    /// Latest ledger reported by the last lookup; `None` if no lookup was made.
    pub latest_ledger: Option<u32>,
    pub skipped: Vec<SkippedEntry>,
    pub batches: usize,
}

#[derive(Debug, Clone)]
pub struct Reconciler {
    contract_id: String,
}

impl Reconciler {
    pub fn new(contract_id: &str) -> Self {
        Self {
            contract_id: contract_id.to_string(),
        }
    }

    /// Dispatch `batches` in order through `fetch` and decode what comes back.
    ///
    /// Only chat records of this contract with an index below `next_index`
    /// are accepted.
    pub async fn reconcile<F, Fut>(
        &self,
        next_index: u32,
        batches: Vec<KeyBatch>,
        mut fetch: F,
    ) -> Result<Reconciled, LogViewError>
    where
        F: FnMut(KeyBatch) -> Fut,
        Fut: Future<Output = Result<LedgerEntriesResponse, LogViewError>>,
    {
        let total = batches.len();
        let mut reconciled = Reconciled::default();

        for (n, batch) in batches.into_iter().enumerate() {
            debug!("dispatching batch {}/{total} ({} keys)", n + 1, batch.len());
            let response = fetch(batch).await?;
            reconciled.batches += 1;
            reconciled.latest_ledger = Some(response.latest_ledger);

            for record in response.entries {
                match self.accept(next_index, &record) {
                    Ok(entry) => {
                        reconciled.entries.insert(entry.index, entry);
                    }
                    Err(reason) => {
                        warn!("skipping ledger record {:?}: {reason}", record.key);
                        reconciled.skipped.push(SkippedEntry {
                            key: record.key,
                            reason,
                        });
                    }
                }
            }
        }

        Ok(reconciled)
    }

    fn accept(
        &self,
        next_index: u32,
        record: &ledger_client::LedgerEntryResult,
    ) -> Result<IndexedEntry, DecodeError> {
        let entry = IndexedEntry::decode(&self.contract_id, record)?;
        if entry.index >= next_index {
            return Err(DecodeError::IndexOutOfRange {
                index: entry.index,
                next_index,
            });
        }
        Ok(entry)
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use ledger_client::{LedgerClient, LedgerKey, StorageKey};

use crate::error::{DecodeError, LogViewError};

/// Counter read from the ledger, with the ledger it was read at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexObservation {
    /// Number of messages ever written; the next index to be assigned.
    pub next_index: u32,
    pub latest_ledger: u32,
}

/// Source of the authoritative next-write index.
#[async_trait]
pub trait IndexResolver: Send + Sync {
    async fn resolve(&self) -> Result<IndexObservation, LogViewError>;
}

/// Reads the contract's `NextIndex` record.
///
/// A missing record means nothing was ever written.
pub struct LedgerIndexResolver<L> {
    ledger: Arc<L>,
    contract_id: String,
}

impl<L: LedgerClient> LedgerIndexResolver<L> {
    pub fn new(ledger: Arc<L>, contract_id: &str) -> Self {
        Self {
            ledger,
            contract_id: contract_id.to_string(),
        }
    }
}

#[async_trait]
impl<L: LedgerClient> IndexResolver for LedgerIndexResolver<L> {
    async fn resolve(&self) -> Result<IndexObservation, LogViewError> {
        let key = LedgerKey::new(&self.contract_id, StorageKey::NextIndex);
        let response = self
            .ledger
            .get_ledger_entries(vec![key.clone()])
            .await
            .map_err(LogViewError::RemoteUnavailable)?;

        let next_index = match response.entries.iter().find(|e| e.key == key) {
            Some(entry) => serde_json::from_slice::<u32>(&entry.value)
                .map_err(|e| LogViewError::InvalidNextIndex(DecodeError::InvalidJson(e)))?,
            None => 0,
        };
        debug!(
            "next index {next_index} at ledger {}",
            response.latest_ledger
        );

        Ok(IndexObservation {
            next_index,
            latest_ledger: response.latest_ledger,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_client::MemoryLedger;

    #[tokio::test]
    async fn test_resolve_counter() {
        let ledger = Arc::new(MemoryLedger::new("CCHAT"));
        let resolver = LedgerIndexResolver::new(ledger.clone(), "CCHAT");

        let empty = resolver.resolve().await.unwrap();
        assert_eq!(empty.next_index, 0);

        ledger.append("GALICE", "one").unwrap();
        ledger.append("GALICE", "two").unwrap();
        let observed = resolver.resolve().await.unwrap();
        assert_eq!(observed.next_index, 2);
        assert_eq!(observed.latest_ledger, ledger.latest_ledger().unwrap());
    }

    #[tokio::test]
    async fn test_resolve_failures() {
        let ledger = Arc::new(MemoryLedger::new("CCHAT"));
        let resolver = LedgerIndexResolver::new(ledger.clone(), "CCHAT");

        ledger.fail_lookup_in(1).unwrap();
        assert!(matches!(
            resolver.resolve().await,
            Err(LogViewError::RemoteUnavailable(_))
        ));

        ledger
            .insert_raw(StorageKey::NextIndex, b"\"three\"".to_vec())
            .unwrap();
        assert!(matches!(
            resolver.resolve().await,
            Err(LogViewError::InvalidNextIndex(_))
        ));
    }
}

//! In-memory ledger and wallet.
//!
//! All data is lost on drop. Useful for development, demos and tests: the
//! ledger can be told to fail specific lookups and to advance its sequence
//! while serving them.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;
use log::debug;

use crate::{
    ChatMessage, ContractClient, LedgerClient, LedgerEntriesResponse, LedgerEntryResult,
    LedgerError, LedgerKey, SignedTransaction, Signer, StorageKey, UnsignedTransaction,
    MAX_KEYS_PER_REQUEST,
};

/// Default lifetime of a freshly written record, in ledgers.
pub const DEFAULT_ENTRY_TTL: u32 = 17_280;

const INITIAL_LEDGER: u32 = 1;

struct StoredEntry {
    value: Vec<u8>,
    last_modified: u32,
    live_until: u32,
}

struct LedgerState {
    latest_ledger: u32,
    next_index: u32,
    entries: HashMap<LedgerKey, StoredEntry>,
    submitted: HashSet<String>,
    lookup_sizes: Vec<usize>,
    // absolute, 1-based lookup numbers
    failing_lookups: HashSet<usize>,
    ledgers_per_lookup: u32,
}

/// In-memory chat ledger implementing [`LedgerClient`] and [`ContractClient`].
pub struct MemoryLedger {
    contract_id: String,
    entry_ttl: u32,
    state: RwLock<LedgerState>,
}

impl MemoryLedger {
    pub fn new(contract_id: &str) -> Self {
        Self::with_entry_ttl(contract_id, DEFAULT_ENTRY_TTL)
    }

    pub fn with_entry_ttl(contract_id: &str, entry_ttl: u32) -> Self {
        Self {
            contract_id: contract_id.to_string(),
            entry_ttl,
            state: RwLock::new(LedgerState {
                latest_ledger: INITIAL_LEDGER,
                next_index: 0,
                entries: HashMap::new(),
                submitted: HashSet::new(),
                lookup_sizes: Vec::new(),
                failing_lookups: HashSet::new(),
                ledgers_per_lookup: 0,
            }),
        }
    }

    pub fn contract_id(&self) -> &str {
        &self.contract_id
    }

    pub fn latest_ledger(&self) -> Result<u32, LedgerError> {
        Ok(self.read()?.latest_ledger)
    }

    /// Commit a message directly, as if a `send` transaction had landed.
    /// Returns the index assigned to it.
    pub fn append(&self, author: &str, message: &str) -> Result<u32, LedgerError> {
        let value = serde_json::to_vec(&ChatMessage {
            author: author.to_string(),
            message: message.to_string(),
            timestamp: now_secs(),
        })?;

        let mut state = self.write()?;
        state.latest_ledger = state.latest_ledger.saturating_add(1);
        let index = state.next_index;
        state.next_index = state.next_index.saturating_add(1);
        let next_index = serde_json::to_vec(&state.next_index)?;
        self.store(&mut state, StorageKey::Chat(index), value);
        self.store(&mut state, StorageKey::NextIndex, next_index);
        Ok(index)
    }

    /// Write arbitrary bytes under a key of this contract.
    pub fn insert_raw(&self, key: StorageKey, value: Vec<u8>) -> Result<(), LedgerError> {
        let mut state = self.write()?;
        self.store(&mut state, key, value);
        Ok(())
    }

    /// Overwrite the message counter without writing any messages.
    pub fn set_next_index(&self, next_index: u32) -> Result<(), LedgerError> {
        let value = serde_json::to_vec(&next_index)?;
        let mut state = self.write()?;
        state.next_index = next_index;
        self.store(&mut state, StorageKey::NextIndex, value);
        Ok(())
    }

    /// Close `ledgers` ledgers. Records whose lifetime ended before the new
    /// latest ledger stay stored but are no longer served by lookups.
    pub fn advance(&self, ledgers: u32) -> Result<u32, LedgerError> {
        let mut state = self.write()?;
        state.latest_ledger = state.latest_ledger.saturating_add(ledgers);
        Ok(state.latest_ledger)
    }

    /// Make the `n`-th lookup from now fail (1 is the next one).
    pub fn fail_lookup_in(&self, n: usize) -> Result<(), LedgerError> {
        let mut state = self.write()?;
        let target = state.lookup_sizes.len() + n;
        state.failing_lookups.insert(target);
        Ok(())
    }

    /// Close this many ledgers after serving every lookup.
    pub fn set_ledgers_per_lookup(&self, ledgers: u32) -> Result<(), LedgerError> {
        self.write()?.ledgers_per_lookup = ledgers;
        Ok(())
    }

    /// Number of keys requested by every lookup served or refused so far.
    pub fn lookup_sizes(&self) -> Result<Vec<usize>, LedgerError> {
        Ok(self.read()?.lookup_sizes.clone())
    }

    fn store(&self, state: &mut LedgerState, key: StorageKey, value: Vec<u8>) {
        let entry = StoredEntry {
            value,
            last_modified: state.latest_ledger,
            live_until: state.latest_ledger.saturating_add(self.entry_ttl),
        };
        state
            .entries
            .insert(LedgerKey::new(&self.contract_id, key), entry);
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, LedgerState>, LedgerError> {
        self.state.read().map_err(|e| LedgerError::Lock(e.to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, LedgerState>, LedgerError> {
        self.state
            .write()
            .map_err(|e| LedgerError::Lock(e.to_string()))
    }
}

#[async_trait]
impl LedgerClient for MemoryLedger {
    async fn get_ledger_entries(
        &self,
        keys: Vec<LedgerKey>,
    ) -> Result<LedgerEntriesResponse, LedgerError> {
        let mut state = self.write()?;
        state.lookup_sizes.push(keys.len());
        let lookup = state.lookup_sizes.len();

        if state.failing_lookups.remove(&lookup) {
            return Err(LedgerError::RemoteUnavailable(format!(
                "lookup {lookup} refused"
            )));
        }
        if keys.len() > MAX_KEYS_PER_REQUEST {
            return Err(LedgerError::RequestTooLarge {
                requested: keys.len(),
                max: MAX_KEYS_PER_REQUEST,
            });
        }

        let latest_ledger = state.latest_ledger;
        let entries = keys
            .into_iter()
            .filter_map(|key| {
                let stored = state.entries.get(&key)?;
                if stored.live_until < latest_ledger {
                    return None;
                }
                Some(LedgerEntryResult {
                    value: stored.value.clone(),
                    last_modified_ledger: stored.last_modified,
                    live_until_ledger: Some(stored.live_until),
                    key,
                })
            })
            .collect::<Vec<_>>();
        debug!(
            "lookup {lookup}: {} live entries at ledger {latest_ledger}",
            entries.len()
        );

        state.latest_ledger = state.latest_ledger.saturating_add(state.ledgers_per_lookup);
        Ok(LedgerEntriesResponse {
            entries,
            latest_ledger,
        })
    }

    async fn send_transaction(&self, tx: SignedTransaction) -> Result<String, LedgerError> {
        if tx.tx.contract_id != self.contract_id {
            return Err(LedgerError::Rejected(format!(
                "unknown contract {}",
                tx.tx.contract_id
            )));
        }
        if tx.signature != signature_for(&tx.key_id, &tx.tx.hash) {
            return Err(LedgerError::Rejected("bad signature".to_string()));
        }
        if tx.signer != tx.tx.author {
            return Err(LedgerError::Rejected(format!(
                "{} is not authorized to post as {}",
                tx.signer, tx.tx.author
            )));
        }
        if !self.write()?.submitted.insert(tx.tx.hash.clone()) {
            return Err(LedgerError::Rejected(format!(
                "transaction {} already submitted",
                tx.tx.hash
            )));
        }

        let index = self.append(&tx.tx.author, &tx.tx.message)?;
        debug!("transaction {} wrote chat {index}", tx.tx.hash);
        Ok(tx.tx.hash)
    }
}

#[async_trait]
impl ContractClient for MemoryLedger {
    async fn send(&self, author: &str, message: &str) -> Result<UnsignedTransaction, LedgerError> {
        if author.is_empty() {
            return Err(LedgerError::Simulation("author is required".to_string()));
        }
        if message.is_empty() {
            return Err(LedgerError::Simulation("message is empty".to_string()));
        }
        Ok(UnsignedTransaction {
            hash: uuid::Uuid::new_v4().simple().to_string(),
            contract_id: self.contract_id.clone(),
            author: author.to_string(),
            message: message.to_string(),
            simulated_ledger: self.latest_ledger()?,
        })
    }
}

/// In-memory wallet mapping key ids to the address they sign for.
#[derive(Default)]
pub struct MemoryWallet {
    keys: RwLock<HashMap<String, String>>,
}

impl MemoryWallet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_key(&self, key_id: &str, address: &str) -> Result<(), LedgerError> {
        self.keys
            .write()
            .map_err(|e| LedgerError::Lock(e.to_string()))?
            .insert(key_id.to_string(), address.to_string());
        Ok(())
    }
}

#[async_trait]
impl Signer for MemoryWallet {
    async fn sign(
        &self,
        tx: UnsignedTransaction,
        key_id: &str,
    ) -> Result<SignedTransaction, LedgerError> {
        let signer = self
            .keys
            .read()
            .map_err(|e| LedgerError::Lock(e.to_string()))?
            .get(key_id)
            .cloned()
            .ok_or_else(|| LedgerError::Signing(format!("unknown key id {key_id}")))?;
        Ok(SignedTransaction {
            signature: signature_for(key_id, &tx.hash),
            key_id: key_id.to_string(),
            signer,
            tx,
        })
    }
}

fn signature_for(key_id: &str, hash: &str) -> Vec<u8> {
    format!("{key_id}:{hash}").into_bytes()
}

fn now_secs() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

use serde::{Deserialize, Serialize};

/// Contract storage layout of the chat contract.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "tag", content = "values")]
pub enum StorageKey {
    /// A message record, keyed by its index in the log.
    Chat(u32),
    /// The counter of messages ever written.
    NextIndex,
}

/// A contract-data key on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LedgerKey {
    pub contract_id: String,
    pub key: StorageKey,
}

impl LedgerKey {
    pub fn new(contract_id: &str, key: StorageKey) -> Self {
        Self {
            contract_id: contract_id.to_string(),
            key,
        }
    }

    pub fn chat(contract_id: &str, index: u32) -> Self {
        Self::new(contract_id, StorageKey::Chat(index))
    }
}

/// A live record returned by a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntryResult {
    pub key: LedgerKey,
    /// Serialized contract value. Not guaranteed to decode.
    pub value: Vec<u8>,
    pub last_modified_ledger: u32,
    /// Last ledger at which the record is still live, if the ledger reports it.
    pub live_until_ledger: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntriesResponse {
    pub entries: Vec<LedgerEntryResult>,
    /// Latest ledger sequence observed when the lookup was served.
    pub latest_ledger: u32,
}

/// Value layout of a `StorageKey::Chat` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub author: String,
    pub message: String,
    pub timestamp: u64,
}

/// A simulated, not yet authorized `send` invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTransaction {
    pub hash: String,
    pub contract_id: String,
    pub author: String,
    pub message: String,
    /// Ledger the simulation ran against.
    pub simulated_ledger: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub tx: UnsignedTransaction,
    pub key_id: String,
    /// Address the signing key authorizes.
    pub signer: String,
    pub signature: Vec<u8>,
}

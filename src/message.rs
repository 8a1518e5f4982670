use ledger_client::{ChatMessage, LedgerEntryResult, StorageKey};

use crate::error::DecodeError;

/// A chat message as committed to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub author: String,
    pub body: String,
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
}

impl From<ChatMessage> for Message {
    fn from(msg: ChatMessage) -> Self {
        Self {
            author: msg.author,
            body: msg.message,
            timestamp: msg.timestamp,
        }
    }
}

/// A message together with its position in the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedEntry {
    pub index: u32,
    pub message: Message,
    pub expiration_ledger: Option<u32>,
}

impl IndexedEntry {
    /// Decode a chat record of `contract_id`.
    pub fn decode(contract_id: &str, entry: &LedgerEntryResult) -> Result<Self, DecodeError> {
        if entry.key.contract_id != contract_id {
            return Err(DecodeError::ForeignContract {
                expected: contract_id.to_string(),
                found: entry.key.contract_id.clone(),
            });
        }
        let index = match entry.key.key {
            StorageKey::Chat(index) => index,
            ref other => return Err(DecodeError::UnexpectedKey(format!("{other:?}"))),
        };
        let chat: ChatMessage = serde_json::from_slice(&entry.value)?;

        Ok(Self {
            index,
            message: chat.into(),
            expiration_ledger: entry.live_until_ledger,
        })
    }
}

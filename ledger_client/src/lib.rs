//! Collaborator contracts for talking to the chat ledger.
//!
//! The chat log lives in contract storage on a remote ledger. This crate
//! describes the three collaborators the log view needs and the wire types
//! they exchange:
//!
//! - [`LedgerClient`] - batched key lookups and transaction submission
//! - [`ContractClient`] - builds (simulates) a `send` invocation
//! - [`Signer`] - turns an unsigned transaction into a signed one
//!
//! [`MemoryLedger`] and [`MemoryWallet`] implement all three in memory for
//! development and testing.

mod error;
pub mod memory;
mod types;

pub use error::LedgerError;
pub use memory::{MemoryLedger, MemoryWallet, DEFAULT_ENTRY_TTL};
pub use types::{
    ChatMessage, LedgerEntriesResponse, LedgerEntryResult, LedgerKey, SignedTransaction,
    StorageKey, UnsignedTransaction,
};

use async_trait::async_trait;

/// Maximum number of keys a single `get_ledger_entries` call accepts.
pub const MAX_KEYS_PER_REQUEST: usize = 200;

/// Read/write access to the remote ledger.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Look up a batch of keys.
    ///
    /// Keys without a live record are simply missing from the response.
    async fn get_ledger_entries(
        &self,
        keys: Vec<LedgerKey>,
    ) -> Result<LedgerEntriesResponse, LedgerError>;

    /// Submit a signed transaction and return its hash.
    async fn send_transaction(&self, tx: SignedTransaction) -> Result<String, LedgerError>;
}

/// The chat contract's single state-changing operation.
#[async_trait]
pub trait ContractClient: Send + Sync {
    /// Build and simulate a `send` invocation.
    async fn send(&self, author: &str, message: &str) -> Result<UnsignedTransaction, LedgerError>;
}

/// Wallet able to authorize transactions for a key.
#[async_trait]
pub trait Signer: Send + Sync {
    async fn sign(
        &self,
        tx: UnsignedTransaction,
        key_id: &str,
    ) -> Result<SignedTransaction, LedgerError>;
}

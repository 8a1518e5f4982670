//! Posting new messages: simulate, sign, submit.

use std::sync::Arc;

use log::info;

use ledger_client::{ContractClient, LedgerClient, Signer};

use crate::error::LogViewError;

/// Runs the `send` flow against injected contract, wallet and ledger clients.
pub struct MessagePoster<C, S, L> {
    contract: Arc<C>,
    signer: Arc<S>,
    ledger: Arc<L>,
}

impl<C, S, L> MessagePoster<C, S, L>
where
    C: ContractClient,
    S: Signer,
    L: LedgerClient,
{
    pub fn new(contract: Arc<C>, signer: Arc<S>, ledger: Arc<L>) -> Self {
        Self {
            contract,
            signer,
            ledger,
        }
    }

    /// Post `body` as `author`, authorized by `key_id`. Returns the transaction hash.
    pub async fn post(
        &self,
        author: &str,
        body: &str,
        key_id: &str,
    ) -> Result<String, LogViewError> {
        let unsigned = self
            .contract
            .send(author, body)
            .await
            .map_err(LogViewError::PostFailed)?;
        let signed = self
            .signer
            .sign(unsigned, key_id)
            .await
            .map_err(LogViewError::PostFailed)?;
        let hash = self
            .ledger
            .send_transaction(signed)
            .await
            .map_err(LogViewError::PostFailed)?;
        info!("{author} posted a message in transaction {hash}");
        Ok(hash)
    }
}

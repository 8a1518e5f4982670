/// Errors returned by ledger, contract and wallet collaborators.
///
/// String payloads carry the remote side's message. Treat them as opaque
/// diagnostic text.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Remote ledger unavailable: {0}")]
    RemoteUnavailable(String),
    #[error("Too many keys in one request: {requested} (max {max})")]
    RequestTooLarge { requested: usize, max: usize },
    #[error("Transaction simulation failed: {0}")]
    Simulation(String),
    #[error("Unable to sign transaction: {0}")]
    Signing(String),
    #[error("Transaction rejected: {0}")]
    Rejected(String),

    #[error("JSON processing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Lock poisoned: {0}")]
    Lock(String),
}

use ledger_client::LedgerError;

/// Errors that abort a refresh or a post.
///
/// A failed refresh never touches the published snapshot.
#[derive(Debug, thiserror::Error)]
pub enum LogViewError {
    #[error("Remote ledger unavailable: {0}")]
    RemoteUnavailable(LedgerError),
    #[error("Unable to read the message counter: {0}")]
    InvalidNextIndex(DecodeError),
    #[error("Refresh cancelled")]
    Cancelled,
    #[error("Invalid refresh state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Failed to post message: {0}")]
    PostFailed(LedgerError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Reasons a single ledger record cannot become a log entry.
///
/// These are absorbed by the reconciler: the record is skipped and the
/// refresh goes on.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Unexpected storage key: {0}")]
    UnexpectedKey(String),
    #[error("Record belongs to contract {found}, expected {expected}")]
    ForeignContract { expected: String, found: String },
    #[error("Index {index} is outside the log (next index {next_index})")]
    IndexOutOfRange { index: u32, next_index: u32 },
    #[error("JSON processing error: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

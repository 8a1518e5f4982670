//! Client-side view of an append-only chat log kept in ledger contract storage.
//!
//! The ledger reports how many messages were ever written; the view turns
//! that count into page-limited key lookups, rebuilds its index-keyed entry
//! map from the answers, and tracks how long each entry stays live.
//!
//! ```ignore
//! use std::sync::Arc;
//! use ledger_client::MemoryLedger;
//! use snapchain_log::{LogViewConfig, MessageLogView, TextRenderer};
//!
//! let ledger = Arc::new(MemoryLedger::new("CCHAT"));
//! let view = MessageLogView::new(ledger, "CCHAT", LogViewConfig::default())?;
//! view.refresh().await?;
//! println!("{}", view.render_with(&TextRenderer::new()).await);
//! ```

pub mod config;
pub mod error;
pub mod message;
pub mod poster;
pub mod render;
pub mod view;

pub use config::{LogViewConfig, NetworkConfig, DEFAULT_PAGE_SIZE};
pub use error::{DecodeError, LogViewError};
pub use message::{IndexedEntry, Message};
pub use poster::MessagePoster;
pub use render::{RenderItem, Renderer, TextRenderer};
pub use view::{
    batcher::KeyBatcher,
    expiry::remaining,
    index_resolver::{IndexObservation, IndexResolver, LedgerIndexResolver},
    reconciler::{Reconciled, Reconciler, SkippedEntry},
    state_machine::RefreshState,
    LogView, MessageLogView, RefreshReport,
};

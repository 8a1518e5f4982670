//! Local view of the on-ledger chat log.
//!
//! A [`MessageLogView`] owns the published [`LogView`] snapshot and the
//! refresh cycle that replaces it:
//!
//! ```text
//! refresh()
//!   IndexResolver::resolve()        -> next_index, latest ledger
//!   KeyBatcher::batch(next_index)   -> ceil(next_index / page_size) key batches
//!   Reconciler::reconcile(batches)  -> fresh entry map (batches sent one by one)
//!   swap snapshot                   -> readers see the new view
//! ```
//!
//! Refreshes on one view are serialized. A refresh requested while another
//! is running waits for it; if a cycle that started after the request has
//! already succeeded, the request is answered with that cycle's snapshot.
//! Any failure (remote error, cancellation) leaves the previous snapshot in
//! place.

pub mod batcher;
pub mod expiry;
pub mod index_resolver;
pub mod reconciler;
pub mod state_machine;

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock as StdRwLock};

use log::{debug, error, info, warn};
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use ledger_client::{ContractClient, LedgerClient, Signer};

use crate::config::LogViewConfig;
use crate::error::LogViewError;
use crate::message::IndexedEntry;
use crate::poster::MessagePoster;
use crate::render::{RenderItem, Renderer};

use batcher::KeyBatcher;
use index_resolver::{IndexResolver, LedgerIndexResolver};
use reconciler::{Reconciler, SkippedEntry};
use state_machine::{RefreshState, RefreshStateMachine};

/// A fully reconciled snapshot of the log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogView {
    pub entries: BTreeMap<u32, IndexedEntry>,
    /// `None` until the first successful refresh.
    pub next_index: Option<u32>,
    /// Observed in the same refresh as `next_index`.
    pub latest_ledger_height: Option<u32>,
}

impl LogView {
    pub fn get(&self, index: u32) -> Option<&IndexedEntry> {
        self.entries.get(&index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ledgers left before the entry at `index` expires.
    pub fn remaining(&self, index: u32) -> Option<u32> {
        self.get(index)
            .and_then(|entry| expiry::remaining(entry, self.latest_ledger_height))
    }

    /// Entries in index order, ready for a [`Renderer`].
    pub fn render_items(&self) -> Vec<RenderItem> {
        self.entries
            .values()
            .map(|entry| RenderItem {
                index: entry.index,
                message: entry.message.clone(),
                latest_ledger_height: self.latest_ledger_height,
                expiration_ledger: entry.expiration_ledger,
            })
            .collect()
    }
}

/// What a call to [`MessageLogView::refresh`] produced.
#[derive(Debug)]
pub struct RefreshReport {
    pub view: Arc<LogView>,
    /// Lookups issued for message records (the counter lookup excluded).
    pub batches: usize,
    pub skipped: Vec<SkippedEntry>,
    /// The request was answered by a cycle started by another caller.
    pub coalesced: bool,
}

pub struct MessageLogView<L> {
    ledger: Arc<L>,
    resolver: Arc<dyn IndexResolver>,
    batcher: KeyBatcher,
    reconciler: Reconciler,
    snapshot: RwLock<Arc<LogView>>,
    state: StdRwLock<RefreshStateMachine>,
    // held for the whole refresh cycle
    gate: Mutex<()>,
    cycles_started: AtomicU64,
    last_successful_cycle: AtomicU64,
    cancel: CancellationToken,
}

impl<L: LedgerClient + 'static> MessageLogView<L> {
    /// Create an empty view reading the log of `contract_id` through `ledger`.
    pub fn new(
        ledger: Arc<L>,
        contract_id: &str,
        config: LogViewConfig,
    ) -> Result<Self, LogViewError> {
        let resolver = Arc::new(LedgerIndexResolver::new(ledger.clone(), contract_id));
        Self::with_resolver(ledger, resolver, contract_id, config)
    }

    /// Like [`MessageLogView::new`], with a custom source for the message counter.
    pub fn with_resolver(
        ledger: Arc<L>,
        resolver: Arc<dyn IndexResolver>,
        contract_id: &str,
        config: LogViewConfig,
    ) -> Result<Self, LogViewError> {
        config.validate()?;
        Ok(Self {
            ledger,
            resolver,
            batcher: KeyBatcher::new(contract_id, config.page_size),
            reconciler: Reconciler::new(contract_id),
            snapshot: RwLock::new(Arc::new(LogView::default())),
            state: StdRwLock::new(RefreshStateMachine::new()),
            gate: Mutex::new(()),
            cycles_started: AtomicU64::new(0),
            last_successful_cycle: AtomicU64::new(0),
            cancel: CancellationToken::new(),
        })
    }

    /// The last fully reconciled view.
    pub async fn snapshot(&self) -> Arc<LogView> {
        self.snapshot.read().await.clone()
    }

    pub fn state(&self) -> RefreshState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .current_state()
    }

    /// Cancel any in-flight refresh and refuse new ones.
    ///
    /// The current snapshot stays readable.
    pub fn shutdown(&self) {
        info!("log view shutting down");
        self.cancel.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Bring the view in line with the ledger.
    pub async fn refresh(&self) -> Result<RefreshReport, LogViewError> {
        if self.cancel.is_cancelled() {
            return Err(LogViewError::Cancelled);
        }
        let ticket = self.cycles_started.load(Ordering::SeqCst);

        let _gate = tokio::select! {
            _ = self.cancel.cancelled() => return Err(LogViewError::Cancelled),
            gate = self.gate.lock() => gate,
        };

        let last_ok = self.last_successful_cycle.load(Ordering::SeqCst);
        if last_ok > ticket {
            debug!("refresh request coalesced into cycle {last_ok}");
            return Ok(RefreshReport {
                view: self.snapshot().await,
                batches: 0,
                skipped: Vec::new(),
                coalesced: true,
            });
        }

        let cycle = self.cycles_started.fetch_add(1, Ordering::SeqCst) + 1;
        info!("refresh cycle {cycle} started");
        let report = self.run_cycle().await?;
        self.last_successful_cycle.store(cycle, Ordering::SeqCst);
        info!(
            "refresh cycle {cycle} reconciled {} entries in {} batches ({} skipped)",
            report.view.len(),
            report.batches,
            report.skipped.len()
        );
        Ok(report)
    }

    /// Post `body` as `author`, signed with `key_id`, then refresh.
    ///
    /// The view is only refreshed once the transaction was accepted.
    pub async fn send_message<C, S, P>(
        &self,
        poster: &MessagePoster<C, S, P>,
        body: &str,
        author: &str,
        key_id: &str,
    ) -> Result<RefreshReport, LogViewError>
    where
        C: ContractClient,
        S: Signer,
        P: LedgerClient,
    {
        let hash = poster.post(author, body, key_id).await?;
        debug!("message posted in transaction {hash}");
        self.refresh().await
    }

    /// Hand the current snapshot to `renderer`.
    pub async fn render_with<R: Renderer>(&self, renderer: &R) -> R::Output {
        renderer.render(&self.snapshot().await.render_items())
    }

    async fn run_cycle(&self) -> Result<RefreshReport, LogViewError> {
        self.with_state(RefreshStateMachine::start_resolving)?;
        // fails and resets the cycle if this future is dropped before it ends
        let cycle = CycleGuard::new(&self.state);

        match self.resolve_and_fetch().await {
            Ok((view, batches, skipped)) => {
                let view = Arc::new(view);
                *self.snapshot.write().await = view.clone();
                cycle.finish(RefreshStateMachine::complete)?;
                Ok(RefreshReport {
                    view,
                    batches,
                    skipped,
                    coalesced: false,
                })
            }
            Err(e) => {
                error!("refresh failed in state {}: {e}", self.state());
                cycle.finish(RefreshStateMachine::fail)?;
                Err(e)
            }
        }
    }

    fn with_state<T>(
        &self,
        f: impl FnOnce(&mut RefreshStateMachine) -> Result<T, LogViewError>,
    ) -> Result<T, LogViewError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut *state)
    }

    async fn resolve_and_fetch(
        &self,
    ) -> Result<(LogView, usize, Vec<SkippedEntry>), LogViewError> {
        let observed = self.cancellable(self.resolver.resolve()).await?;
        self.with_state(RefreshStateMachine::start_fetching)?;
        if observed.next_index == 0 {
            info!("no messages on the ledger yet");
        }

        let batches = self.batcher.batch(observed.next_index);
        let reconciled = self
            .reconciler
            .reconcile(observed.next_index, batches, |batch| {
                let ledger = self.ledger.clone();
                let cancel = self.cancel.clone();
                async move {
                    tokio::select! {
                        _ = cancel.cancelled() => Err(LogViewError::Cancelled),
                        response = ledger.get_ledger_entries(batch) => {
                            response.map_err(LogViewError::RemoteUnavailable)
                        }
                    }
                }
            })
            .await?;

        if self.cancel.is_cancelled() {
            return Err(LogViewError::Cancelled);
        }

        let view = LogView {
            entries: reconciled.entries,
            next_index: Some(observed.next_index),
            latest_ledger_height: Some(
                reconciled.latest_ledger.unwrap_or(observed.latest_ledger),
            ),
        };
        Ok((view, reconciled.batches, reconciled.skipped))
    }

    async fn cancellable<T>(
        &self,
        fut: impl Future<Output = Result<T, LogViewError>>,
    ) -> Result<T, LogViewError> {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(LogViewError::Cancelled),
            result = fut => result,
        }
    }
}

/// Returns the refresh state machine to `Idle` however the cycle ends.
struct CycleGuard<'a> {
    state: &'a StdRwLock<RefreshStateMachine>,
    finished: bool,
}

impl<'a> CycleGuard<'a> {
    fn new(state: &'a StdRwLock<RefreshStateMachine>) -> Self {
        Self {
            state,
            finished: false,
        }
    }

    /// Apply the terminal transition, then go back to `Idle`.
    fn finish(
        mut self,
        terminal: fn(&mut RefreshStateMachine) -> Result<(), LogViewError>,
    ) -> Result<(), LogViewError> {
        self.finished = true;
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        terminal(&mut *state)?;
        state.reset()
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        warn!(
            "refresh dropped in state {}; previous snapshot kept",
            state.current_state()
        );
        if state.fail().is_err() || state.reset().is_err() {
            *state = RefreshStateMachine::new();
        }
    }
}

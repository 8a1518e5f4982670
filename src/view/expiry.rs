//! Remaining lifetime of log entries.

use crate::message::IndexedEntry;

/// Ledgers left before `entry` expires, as seen at `latest_ledger`.
///
/// `None` when either height is unknown or zero: no countdown should be
/// shown then. An entry already past its expiration reports `Some(0)`.
pub fn remaining(entry: &IndexedEntry, latest_ledger: Option<u32>) -> Option<u32> {
    remaining_ledgers(entry.expiration_ledger, latest_ledger)
}

pub fn remaining_ledgers(
    expiration_ledger: Option<u32>,
    latest_ledger: Option<u32>,
) -> Option<u32> {
    match (expiration_ledger, latest_ledger) {
        (Some(expiration), Some(latest)) if expiration > 0 && latest > 0 => {
            Some(expiration.saturating_sub(latest))
        }
        _ => None,
    }
}

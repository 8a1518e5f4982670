use std::sync::Arc;

use ledger_client::{MemoryLedger, MemoryWallet, StorageKey};
use snapchain_log::{
    DecodeError, LogViewConfig, LogViewError, MessageLogView, MessagePoster, RefreshState,
    Renderer, TextRenderer,
};

const CONTRACT: &str = "CCHAT";

fn new_view(ledger: &Arc<MemoryLedger>, page_size: usize) -> MessageLogView<MemoryLedger> {
    MessageLogView::new(
        ledger.clone(),
        CONTRACT,
        LogViewConfig::with_page_size(page_size),
    )
    .expect("Failed to create view")
}

fn append_many(ledger: &MemoryLedger, count: u32) {
    for i in 0..count {
        ledger
            .append("GALICE", &format!("message {i}"))
            .expect("Failed to append");
    }
}

#[tokio::test]
async fn test_empty_log_issues_no_batch() {
    let ledger = Arc::new(MemoryLedger::new(CONTRACT));
    let view = new_view(&ledger, 200);

    let report = view.refresh().await.expect("Failed to refresh");

    assert!(report.view.is_empty());
    assert_eq!(report.view.next_index, Some(0));
    assert_eq!(report.batches, 0);
    // only the counter was read
    assert_eq!(ledger.lookup_sizes().unwrap(), vec![1]);
    assert_eq!(
        report.view.latest_ledger_height,
        Some(ledger.latest_ledger().unwrap())
    );
    assert_eq!(
        view.render_with(&TextRenderer::new()).await,
        "No messages to display..."
    );
}

#[tokio::test]
async fn test_450_messages_fetched_in_three_batches() {
    let ledger = Arc::new(MemoryLedger::new(CONTRACT));
    append_many(&ledger, 450);
    let view = new_view(&ledger, 200);

    let report = view.refresh().await.expect("Failed to refresh");

    assert_eq!(ledger.lookup_sizes().unwrap(), vec![1, 200, 200, 50]);
    assert_eq!(report.batches, 3);
    assert_eq!(report.view.len(), 450);
    assert_eq!(report.view.next_index, Some(450));
    assert_eq!(
        report.view.get(449).map(|e| e.message.body.as_str()),
        Some("message 449")
    );
}

#[tokio::test]
async fn test_sparse_log_only_holds_live_records() {
    let ledger = Arc::new(MemoryLedger::new(CONTRACT));
    append_many(&ledger, 2);
    // counter moved on but records 2..5 were never stored
    ledger.set_next_index(5).unwrap();
    let view = new_view(&ledger, 2);

    let report = view.refresh().await.expect("Failed to refresh");

    assert_eq!(ledger.lookup_sizes().unwrap(), vec![1, 2, 2, 1]);
    assert_eq!(
        report.view.entries.keys().copied().collect::<Vec<_>>(),
        vec![0, 1]
    );
    assert!(report.skipped.is_empty());
}

#[tokio::test]
async fn test_remaining_lifetime_of_entry() {
    let ledger = Arc::new(MemoryLedger::with_entry_ttl(CONTRACT, 993));
    // the sixth append lands at ledger 7 and lives until 1000
    append_many(&ledger, 6);
    ledger.advance(983).unwrap();
    let view = new_view(&ledger, 200);

    let report = view.refresh().await.expect("Failed to refresh");

    assert_eq!(report.view.latest_ledger_height, Some(990));
    assert_eq!(report.view.get(5).unwrap().expiration_ledger, Some(1000));
    assert_eq!(report.view.remaining(5), Some(10));

    let items = report.view.render_items();
    assert_eq!(items[5].remaining(), Some(10));
    assert!(TextRenderer::new()
        .render(&items)
        .contains("Chat(5) | GALICE"));
}

#[tokio::test]
async fn test_refresh_is_idempotent() {
    let ledger = Arc::new(MemoryLedger::new(CONTRACT));
    append_many(&ledger, 7);
    let view = new_view(&ledger, 3);

    let first = view.refresh().await.expect("Failed to refresh").view;
    let second = view.refresh().await.expect("Failed to refresh").view;

    assert_eq!(*first, *second);
    assert!(!Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn test_latest_ledger_comes_from_last_batch() {
    let ledger = Arc::new(MemoryLedger::new(CONTRACT));
    append_many(&ledger, 4);
    let start = ledger.latest_ledger().unwrap();
    ledger.set_ledgers_per_lookup(5).unwrap();
    let view = new_view(&ledger, 2);

    let report = view.refresh().await.expect("Failed to refresh");

    // counter at `start`, batches at start + 5 and start + 10
    assert_eq!(report.view.latest_ledger_height, Some(start + 10));
}

#[tokio::test]
async fn test_failed_batch_keeps_previous_view() {
    let ledger = Arc::new(MemoryLedger::new(CONTRACT));
    append_many(&ledger, 450);
    let view = new_view(&ledger, 200);
    let before = view.refresh().await.expect("Failed to refresh").view;

    ledger.append("GBOB", "late").unwrap();
    // counter, batch 1, then batch 2 of 3 fails
    ledger.fail_lookup_in(3).unwrap();
    let result = view.refresh().await;

    assert!(matches!(result, Err(LogViewError::RemoteUnavailable(_))));
    let after = view.snapshot().await;
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(after.next_index, Some(450));
    assert!(after.get(450).is_none());
    assert_eq!(view.state(), RefreshState::Idle);

    // the next refresh recovers
    let recovered = view.refresh().await.expect("Failed to refresh").view;
    assert_eq!(recovered.len(), 451);
}

#[tokio::test]
async fn test_failure_on_second_of_two_batches() {
    let ledger = Arc::new(MemoryLedger::new(CONTRACT));
    append_many(&ledger, 3);
    let view = new_view(&ledger, 2);
    let before = view.refresh().await.expect("Failed to refresh").view;

    ledger.fail_lookup_in(3).unwrap();
    assert!(view.refresh().await.is_err());

    assert_eq!(*view.snapshot().await, *before);
}

#[tokio::test]
async fn test_counter_failure_keeps_previous_view() {
    let ledger = Arc::new(MemoryLedger::new(CONTRACT));
    append_many(&ledger, 2);
    let view = new_view(&ledger, 200);
    let before = view.refresh().await.expect("Failed to refresh").view;

    ledger.fail_lookup_in(1).unwrap();
    assert!(matches!(
        view.refresh().await,
        Err(LogViewError::RemoteUnavailable(_))
    ));
    assert!(Arc::ptr_eq(&before, &view.snapshot().await));
}

#[tokio::test]
async fn test_malformed_record_is_skipped() {
    let ledger = Arc::new(MemoryLedger::new(CONTRACT));
    append_many(&ledger, 3);
    ledger
        .insert_raw(StorageKey::Chat(1), b"garbage".to_vec())
        .unwrap();
    let view = new_view(&ledger, 200);

    let report = view.refresh().await.expect("Failed to refresh");

    assert_eq!(
        report.view.entries.keys().copied().collect::<Vec<_>>(),
        vec![0, 2]
    );
    assert_eq!(report.skipped.len(), 1);
    assert!(matches!(
        report.skipped[0].reason,
        DecodeError::InvalidJson(_)
    ));
}

#[tokio::test]
async fn test_expired_messages_are_dropped_on_refresh() {
    let ledger = Arc::new(MemoryLedger::with_entry_ttl(CONTRACT, 50));
    append_many(&ledger, 2);
    let view = new_view(&ledger, 200);
    assert_eq!(view.refresh().await.unwrap().view.len(), 2);

    ledger.advance(60).unwrap();
    ledger.append("GBOB", "still here").unwrap();
    let report = view.refresh().await.expect("Failed to refresh");

    assert_eq!(report.view.next_index, Some(3));
    assert_eq!(
        report.view.entries.keys().copied().collect::<Vec<_>>(),
        vec![2]
    );
    assert_eq!(report.view.remaining(2), Some(50));
}

#[tokio::test]
async fn test_send_message_then_refresh() {
    let ledger = Arc::new(MemoryLedger::new(CONTRACT));
    let wallet = Arc::new(MemoryWallet::new());
    wallet.add_key("alice-key", "GALICE").unwrap();
    let poster = MessagePoster::new(ledger.clone(), wallet, ledger.clone());
    let view = new_view(&ledger, 200);

    let report = view
        .send_message(&poster, "Hi!", "GALICE", "alice-key")
        .await
        .expect("Failed to send message");

    let entry = report.view.get(0).expect("message is in the view");
    assert_eq!(entry.message.author, "GALICE");
    assert_eq!(entry.message.body, "Hi!");
    assert_eq!(report.view.next_index, Some(1));

    // a rejected post does not refresh
    let lookups = ledger.lookup_sizes().unwrap().len();
    assert!(matches!(
        view.send_message(&poster, "Hi!", "GBOB", "alice-key").await,
        Err(LogViewError::PostFailed(_))
    ));
    assert_eq!(ledger.lookup_sizes().unwrap().len(), lookups);
}

#[tokio::test]
async fn test_zero_page_size_is_rejected() {
    let ledger = Arc::new(MemoryLedger::new(CONTRACT));
    let result = MessageLogView::new(ledger, CONTRACT, LogViewConfig::with_page_size(0));
    assert!(matches!(result, Err(LogViewError::InvalidConfig(_))));
}

#[tokio::test]
async fn test_page_size_above_ledger_cap_is_rejected() {
    let ledger = Arc::new(MemoryLedger::new(CONTRACT));
    append_many(&ledger, 250);

    let result = MessageLogView::new(ledger, CONTRACT, LogViewConfig::with_page_size(300));

    assert!(matches!(result, Err(LogViewError::InvalidConfig(_))));
}

//! Turning a reconciled log into display units.

use chrono::{DateTime, Local, Utc};

use crate::message::Message;
use crate::view::expiry::remaining_ledgers;

const EMPTY_LOG: &str = "No messages to display...";

/// One message with the metadata needed to display it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderItem {
    pub index: u32,
    pub message: Message,
    pub latest_ledger_height: Option<u32>,
    pub expiration_ledger: Option<u32>,
}

impl RenderItem {
    /// Ledgers left before expiry, or `None` if no countdown should be shown.
    pub fn remaining(&self) -> Option<u32> {
        remaining_ledgers(self.expiration_ledger, self.latest_ledger_height)
    }
}

pub trait Renderer {
    type Output;

    fn render(&self, items: &[RenderItem]) -> Self::Output;
}

/// Plain-text message cards.
///
/// ```text
/// Chat(0) | GALICE | 2023-11-14 22:13:20 UTC
/// gm
/// expires in 17280 ledgers
/// ```
#[derive(Debug, Clone, Default)]
pub struct TextRenderer {
    local_time: bool,
}

impl TextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show timestamps in the local time zone instead of UTC.
    pub fn with_local_time(mut self) -> Self {
        self.local_time = true;
        self
    }

    fn timestamp(&self, secs: u64) -> String {
        let Some(utc) = i64::try_from(secs)
            .ok()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        else {
            return format!("@{secs}");
        };
        if self.local_time {
            utc.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        } else {
            utc.format("%Y-%m-%d %H:%M:%S UTC").to_string()
        }
    }

    fn card(&self, item: &RenderItem) -> String {
        let mut card = format!(
            "Chat({}) | {} | {}\n{}",
            item.index,
            item.message.author,
            self.timestamp(item.message.timestamp),
            item.message.body
        );
        if let Some(remaining) = item.remaining() {
            card.push_str(&format!("\nexpires in {remaining} ledgers"));
        }
        card
    }
}

impl Renderer for TextRenderer {
    type Output = String;

    fn render(&self, items: &[RenderItem]) -> String {
        if items.is_empty() {
            return EMPTY_LOG.to_string();
        }
        items
            .iter()
            .map(|item| self.card(item))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(index: u32, latest: Option<u32>, expiration: Option<u32>) -> RenderItem {
        RenderItem {
            index,
            message: Message {
                author: "GALICE".to_string(),
                body: "gm".to_string(),
                timestamp: 1_700_000_000,
            },
            latest_ledger_height: latest,
            expiration_ledger: expiration,
        }
    }

    #[test]
    fn test_empty_log() {
        assert_eq!(TextRenderer::new().render(&[]), "No messages to display...");
    }

    #[test]
    fn test_card_with_countdown() {
        let text = TextRenderer::new().render(&[item(5, Some(990), Some(1000))]);
        assert_eq!(
            text,
            "Chat(5) | GALICE | 2023-11-14 22:13:20 UTC\ngm\nexpires in 10 ledgers"
        );
    }

    #[test]
    fn test_countdown_hidden_without_heights() {
        let renderer = TextRenderer::new();
        let text = renderer.render(&[item(0, Some(0), Some(1000)), item(1, Some(990), None)]);
        assert!(!text.contains("expires in"));
        assert_eq!(text.matches("Chat(").count(), 2);
    }
}

//! Message history port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::IncomingMessage;
use crate::domain::entities::ChannelId;
use crate::domain::errors::ChatError;

/// Options for fetching a page of history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    pub cursor: Option<String>,
    pub limit: Option<u16>,
}

impl HistoryQuery {
    #[must_use]
    pub const fn with_limit(mut self, limit: u16) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn before(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// One page of history, oldest message first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPage {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub messages: Vec<IncomingMessage>,
    #[serde(default)]
    pub pagination: Pagination,
}

fn default_success() -> bool {
    true
}

impl HistoryPage {
    #[must_use]
    pub const fn new(messages: Vec<IncomingMessage>, has_more: bool) -> Self {
        Self {
            success: true,
            messages,
            pagination: Pagination {
                has_more,
                next_cursor: None,
            },
        }
    }

    #[must_use]
    pub fn with_next_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.pagination.next_cursor = Some(cursor.into());
        self
    }
}

/// Port for the backend history API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoryPort: Send + Sync {
    /// Fetches a page of messages for a channel.
    ///
    /// # Errors
    ///
    /// Returns `ChatError` if the request fails.
    async fn get_messages(
        &self,
        channel_id: &ChannelId,
        query: HistoryQuery,
    ) -> Result<HistoryPage, ChatError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_history_page() {
        let json = r#"{
            "success": true,
            "messages": [
                {"id": "m1", "channelId": "general", "content": "hi", "userId": "u2", "username": "bob"}
            ],
            "pagination": {"hasMore": true, "nextCursor": "m1"}
        }"#;

        let page: HistoryPage = serde_json::from_str(json).unwrap();

        assert!(page.success);
        assert_eq!(page.messages.len(), 1);
        assert!(page.pagination.has_more);
        assert_eq!(page.pagination.next_cursor.as_deref(), Some("m1"));
    }

    #[test]
    fn test_missing_pagination_defaults() {
        let page: HistoryPage = serde_json::from_str(r#"{"messages": []}"#).unwrap();

        assert!(page.success);
        assert!(!page.pagination.has_more);
    }
}

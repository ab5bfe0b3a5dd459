//! HTTP client for the message history API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::entities::ChannelId;
use crate::domain::errors::ChatError;
use crate::domain::ports::{HistoryPage, HistoryPort, HistoryQuery};

const USER_AGENT: &str = concat!("chatcore/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default, alias = "error")]
    message: String,
}

/// Fetches history pages from `{base}/channels/{id}/messages`.
pub struct HttpHistoryClient {
    client: Client,
    base_url: Url,
}

impl HttpHistoryClient {
    /// Creates a client for the given base URL.
    ///
    /// # Errors
    /// Returns error if the base URL is invalid or HTTP client creation fails.
    pub fn new(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self, ChatError> {
        let base_url = Url::parse(base_url.as_ref())
            .map_err(|e| ChatError::transport(format!("invalid history URL: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ChatError::transport(format!(
                "invalid history URL: {base_url} cannot carry a path"
            )));
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ChatError::transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// The channel id is one percent-encoded path segment.
    ///
    /// # Errors
    /// Returns error if the base URL cannot carry a path.
    pub fn messages_url(&self, channel_id: &ChannelId) -> Result<Url, ChatError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ChatError::history(channel_id, "history URL cannot carry a path"))?
            .pop_if_empty()
            .extend(["channels", channel_id.as_str(), "messages"]);
        Ok(url)
    }

    async fn handle_error_response(
        channel_id: &ChannelId,
        status: StatusCode,
        response: reqwest::Response,
    ) -> ChatError {
        let detail = match response.json::<ErrorResponse>().await {
            Ok(error) if !error.message.is_empty() => error.message,
            _ => format!("HTTP {status}"),
        };

        match status {
            StatusCode::NOT_FOUND => ChatError::history(channel_id, "channel not found"),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                ChatError::history(channel_id, format!("access denied: {detail}"))
            }
            _ => ChatError::history(channel_id, detail),
        }
    }
}

#[async_trait]
impl HistoryPort for HttpHistoryClient {
    async fn get_messages(
        &self,
        channel_id: &ChannelId,
        query: HistoryQuery,
    ) -> Result<HistoryPage, ChatError> {
        let url = self.messages_url(channel_id)?;

        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(limit) = query.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(cursor) = query.cursor {
            params.push(("cursor", cursor));
        }

        debug!(%channel_id, ?params, "Fetching message history");

        let response = self
            .client
            .get(url)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, %channel_id, "History request failed");
                if e.is_timeout() {
                    ChatError::history(channel_id, "request timed out")
                } else if e.is_connect() {
                    ChatError::history(channel_id, "failed to connect to history service")
                } else {
                    ChatError::history(channel_id, e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::handle_error_response(channel_id, status, response).await);
        }

        let page: HistoryPage = response.json().await.map_err(|e| {
            warn!(error = %e, "Failed to parse history response");
            ChatError::history(channel_id, format!("failed to parse response: {e}"))
        })?;

        debug!(
            %channel_id,
            count = page.messages.len(),
            has_more = page.pagination.has_more,
            "History page received"
        );

        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use test_case::test_case;
    use tokio::sync::oneshot;

    /// Serves a single HTTP response and reports the request line.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (line_tx, line_rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = stream.read(&mut buf).await.unwrap();
            let request = String::from_utf8_lossy(&buf[..n]).to_string();
            let _ = line_tx.send(request.lines().next().unwrap_or_default().to_string());

            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
        });

        (format!("http://{addr}/api"), line_rx)
    }

    #[test]
    fn test_messages_url_trims_trailing_slash() {
        let client = HttpHistoryClient::new("http://localhost/api/", Duration::from_secs(1)).unwrap();

        assert_eq!(
            client.messages_url(&ChannelId::from("general")).unwrap().as_str(),
            "http://localhost/api/channels/general/messages"
        );
    }

    #[test_case("team/ops", "team%2Fops" ; "slash")]
    #[test_case("a?b#c", "a%3Fb%23c" ; "query and fragment")]
    #[test_case("two words", "two%20words" ; "space")]
    fn test_messages_url_encodes_channel_id(id: &str, encoded: &str) {
        let client = HttpHistoryClient::new("http://localhost/api", Duration::from_secs(1)).unwrap();

        let url = client.messages_url(&ChannelId::from(id)).unwrap();

        assert_eq!(url.path(), format!("/api/channels/{encoded}/messages"));
        assert!(url.query().is_none());
        assert!(url.fragment().is_none());
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        assert!(HttpHistoryClient::new("not a url", Duration::from_secs(1)).is_err());
        assert!(HttpHistoryClient::new("mailto:ops@example.com", Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn test_get_messages_sends_limit_and_cursor() {
        let (base, request_line) = serve_once(
            "200 OK",
            r#"{"success":true,"messages":[{"id":"m1","channelId":"general","content":"hi","userId":"u2","username":"bob"}],"pagination":{"hasMore":true,"nextCursor":"m1"}}"#,
        )
        .await;
        let client = HttpHistoryClient::new(base, Duration::from_secs(5)).unwrap();

        let page = client
            .get_messages(
                &ChannelId::from("general"),
                HistoryQuery::default().with_limit(50).before("m9"),
            )
            .await
            .unwrap();

        assert_eq!(page.messages.len(), 1);
        assert!(page.pagination.has_more);
        let line = request_line.await.unwrap();
        assert!(line.starts_with("GET /api/channels/general/messages?limit=50&cursor=m9 "));
    }

    #[tokio::test]
    async fn test_server_error_maps_to_history_error() {
        let (base, _line) = serve_once("500 Internal Server Error", r#"{"message":"database down"}"#).await;
        let client = HttpHistoryClient::new(base, Duration::from_secs(5)).unwrap();

        let result = client
            .get_messages(&ChannelId::from("random"), HistoryQuery::default())
            .await;

        assert_eq!(result, Err(ChatError::history("random", "database down")));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_history_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = HttpHistoryClient::new(format!("http://{addr}"), Duration::from_secs(5)).unwrap();

        let result = client
            .get_messages(&ChannelId::from("general"), HistoryQuery::default())
            .await;

        assert!(matches!(result, Err(ChatError::History { .. })));
    }
}

//! Message history over HTTP.

mod http_client;

pub use http_client::HttpHistoryClient;

//! Infrastructure layer with external service adapters.

/// Application configuration.
pub mod config;
/// Message history over HTTP.
pub mod history;
/// Realtime socket transport.
pub mod socket;

pub use config::{AppConfig, CliArgs, ConfigOrigin, LoadedConfig, LogLevel, StorageManager};
pub use history::HttpHistoryClient;
pub use socket::{ListenerRegistry, WsSocketClient};

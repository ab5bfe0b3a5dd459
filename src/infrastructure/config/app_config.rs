//! Application configuration.

use crate::application::ChatConfig;
use crate::domain::entities::{Channel, LocalUser};
use crate::domain::keybinding::Action;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

const APP_NAME: &str = "chatcore";
const APP_QUALIFIER: &str = "com";
const APP_ORGANIZATION: &str = "linuxmobile";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    /// Converts to tracing level.
    #[must_use]
    pub const fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Application configuration, read from TOML and overridden by CLI flags.
#[derive(Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration file path.
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[serde(skip)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Backend endpoints.
    #[serde(default)]
    pub server: ServerConfig,

    /// Identity of the local user.
    #[serde(default)]
    pub user: UserConfig,

    /// Chat core tunables.
    #[serde(default)]
    pub chat: ChatConfig,

    /// Channels offered at startup. The first one is focused.
    #[serde(default = "default_channels")]
    pub channels: Vec<Channel>,

    /// Custom keybindings, e.g. `"Ctrl+p" = "OpenSearch"`.
    #[serde(default)]
    pub keybindings: HashMap<String, Action>,
}

/// Backend endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// WebSocket endpoint of the realtime service.
    #[serde(default = "default_socket_url")]
    pub socket_url: String,

    /// Base URL of the history API.
    #[serde(default = "default_history_url")]
    pub history_url: String,

    /// Timeout for socket requests and history calls in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            socket_url: default_socket_url(),
            history_url: default_history_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Local user identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    /// Server-side user id.
    #[serde(default = "default_user_id")]
    pub id: String,

    /// Name shown on optimistic messages.
    #[serde(default = "default_username")]
    pub username: String,

    /// Avatar URL.
    #[serde(default)]
    pub avatar: Option<String>,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            id: default_user_id(),
            username: default_username(),
            avatar: None,
        }
    }
}

impl UserConfig {
    /// Builds the local user entity.
    #[must_use]
    pub fn to_local_user(&self) -> LocalUser {
        let user = LocalUser::new(self.id.as_str(), self.username.as_str());
        match &self.avatar {
            Some(avatar) => user.with_avatar(avatar.as_str()),
            None => user,
        }
    }
}

fn default_socket_url() -> String {
    "ws://127.0.0.1:3001/ws".to_string()
}

fn default_history_url() -> String {
    "http://127.0.0.1:3001/api".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_user_id() -> String {
    "local".to_string()
}

fn default_username() -> String {
    "me".to_string()
}

fn default_channels() -> Vec<Channel> {
    vec![
        Channel::text("general", "general"),
        Channel::text("random", "random"),
    ]
}

use super::args::CliArgs;

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: CliArgs) {
        if let Some(config_path) = args.config {
            self.config = Some(config_path);
        }
        if let Some(log_path) = args.log_path {
            self.log_path = Some(log_path);
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(socket_url) = args.socket_url {
            self.server.socket_url = socket_url;
        }
        if let Some(history_url) = args.history_url {
            self.server.history_url = history_url;
        }
        if let Some(user_id) = args.user_id {
            self.user.id = user_id;
        }
        if let Some(username) = args.username {
            self.user.username = username;
        }
        if let Some(typing_timeout_ms) = args.typing_timeout_ms {
            self.chat.typing_timeout_ms = typing_timeout_ms;
        }
        if let Some(page_size) = args.history_page_size {
            self.chat.history_page_size = page_size;
        }
    }

    /// Returns default config directory.
    #[must_use]
    pub fn default_config_dir() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns default log file path.
    #[must_use]
    pub fn default_log_path() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.data_dir().join("chatcore.log"))
    }

    /// Returns effective log path.
    #[must_use]
    pub fn effective_log_path(&self) -> Option<PathBuf> {
        self.log_path.clone().or_else(Self::default_log_path)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config: None,
            log_path: None,
            log_level: LogLevel::Info,
            server: ServerConfig::default(),
            user: UserConfig::default(),
            chat: ChatConfig::default(),
            channels: default_channels(),
            keybindings: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ChannelKind;
    use clap::Parser;

    #[test]
    fn test_parse_config_with_nested_sections() {
        let toml_content = r#"
            log_level = "debug"

            [server]
            socket_url = "wss://chat.example.com/ws"

            [user]
            id = "u-7"
            username = "ana"

            [chat]
            typing_timeout_ms = 5000

            [[channels]]
            id = "general"
            name = "general"

            [[channels]]
            id = "lounge"
            name = "Lounge"
            type = "voice"

            [keybindings]
            "Ctrl+p" = "OpenSearch"
        "#;

        let config: AppConfig = toml::from_str(toml_content).expect("Failed to parse config");

        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.server.socket_url, "wss://chat.example.com/ws");
        assert_eq!(config.server.history_url, default_history_url());
        assert_eq!(config.user.to_local_user().username(), "ana");
        assert_eq!(config.chat.typing_timeout_ms, 5000);
        assert_eq!(config.chat.history_page_size, 50);
        assert_eq!(config.channels.len(), 2);
        assert_eq!(config.channels[1].kind(), ChannelKind::Voice);
        assert_eq!(config.keybindings.get("Ctrl+p"), Some(&Action::OpenSearch));
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert!(config.keybindings.is_empty());
        assert_eq!(config.channels.len(), 2);
        assert_eq!(config.chat, ChatConfig::default());
    }

    #[test]
    fn test_merge_with_args_overrides_file_values() {
        let mut config = AppConfig::default();
        let args = CliArgs::parse_from([
            "chatcore",
            "--socket-url",
            "ws://localhost:9000",
            "--username",
            "ana",
            "--log-level",
            "trace",
        ]);

        config.merge_with_args(args);

        assert_eq!(config.server.socket_url, "ws://localhost:9000");
        assert_eq!(config.user.username, "ana");
        assert_eq!(config.log_level, LogLevel::Trace);
        assert_eq!(config.user.id, default_user_id());
    }
}

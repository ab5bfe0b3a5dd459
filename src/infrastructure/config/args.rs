use super::app_config::LogLevel;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "chatcore",
    version,
    about = "Headless real-time chat client core",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// WebSocket endpoint of the realtime service.
    #[arg(long, env = "CHATCORE_SOCKET_URL", value_name = "URL")]
    pub socket_url: Option<String>,

    /// Base URL of the history API.
    #[arg(long, env = "CHATCORE_HISTORY_URL", value_name = "URL")]
    pub history_url: Option<String>,

    /// Local user id.
    #[arg(long, env = "CHATCORE_USER_ID")]
    pub user_id: Option<String>,

    /// Local username.
    #[arg(long, env = "CHATCORE_USERNAME")]
    pub username: Option<String>,

    /// Typing indicator timeout in milliseconds.
    #[arg(long)]
    pub typing_timeout_ms: Option<u64>,

    /// Messages per history page.
    #[arg(long)]
    pub history_page_size: Option<u16>,
}

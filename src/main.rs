use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use chatcore::application::{ChatIntent, ChatOrchestrator};
use chatcore::domain::ports::{HistoryPort, SocketPort};
use chatcore::infrastructure::{
    AppConfig, CliArgs, ConfigOrigin, HttpHistoryClient, LoadedConfig, StorageManager,
    WsSocketClient,
};
use chatcore::presentation::commands::describe_key;
use chatcore::presentation::{CommandRegistry, input, parse_key, parse_line, render_snapshot};

const INTENT_CAPACITY: usize = 32;
const VISIBLE_MESSAGES: usize = 20;

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = config.effective_log_path() {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry().with(filter).init();
    }

    Ok(())
}

fn load_config() -> Result<LoadedConfig> {
    let args = CliArgs::parse();
    let storage = StorageManager::new()?;
    let mut loaded = storage.load_config(args.config.as_deref())?;
    loaded.config.merge_with_args(args);
    Ok(loaded)
}

fn report_config(loaded: &LoadedConfig) {
    let path = loaded.path.display();
    match &loaded.origin {
        ConfigOrigin::File => info!(path = %path, "Config loaded"),
        ConfigOrigin::Created => info!(path = %path, "Default config written"),
        ConfigOrigin::Fallback { reason } => {
            warn!(path = %path, reason = %reason, "Config did not parse, using defaults");
        }
    }
}

/// Resolves `/key <combo>` through the shortcut registry.
fn shortcut_intent(registry: &CommandRegistry, line: &str) -> Option<Result<ChatIntent, String>> {
    let combo = line.strip_prefix("/key")?.trim();
    Some(
        parse_key(combo)
            .and_then(|key| registry.find_action(key))
            .map(ChatIntent::Shortcut)
            .ok_or_else(|| format!("no shortcut bound to {combo:?}")),
    )
}

fn print_help(registry: &CommandRegistry) {
    println!("{}", input::HELP);
    println!("/key <combo>           run a shortcut:");
    for keybind in registry.keybinds() {
        println!("    {:<20} {}", describe_key(keybind.key), keybind.label);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    let loaded = load_config()?;
    init_logging(&loaded.config)?;

    info!(version = chatcore::VERSION, "Starting {}", chatcore::NAME);
    report_config(&loaded);
    let config = loaded.config;

    let request_timeout = std::time::Duration::from_millis(config.server.request_timeout_ms);
    let socket: Arc<dyn SocketPort> = Arc::new(WsSocketClient::new(
        config.server.socket_url.clone(),
        request_timeout,
    ));
    let history: Arc<dyn HistoryPort> = Arc::new(HttpHistoryClient::new(
        &config.server.history_url,
        request_timeout,
    )?);

    let registry = CommandRegistry::with_overrides(&config.keybindings);
    let mut orchestrator = ChatOrchestrator::new(
        Arc::clone(&socket),
        history,
        config.user.to_local_user(),
        config.chat.clone(),
    );
    orchestrator.mount(config.channels.clone()).await;

    let (handle, intents) = orchestrator.handle(INTENT_CAPACITY);
    let mut snapshots = handle.subscribe();
    let printer = tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            println!("{}", render_snapshot(&snapshot, VISIBLE_MESSAGES));
        }
    });
    let runner = tokio::spawn(orchestrator.run(intents));

    print_help(&registry);
    println!("{}", render_snapshot(&handle.snapshot(), VISIBLE_MESSAGES));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim() == "/quit" {
            break;
        }
        if line.trim() == "/help" {
            print_help(&registry);
            continue;
        }

        let intent = match shortcut_intent(&registry, &line) {
            Some(Ok(intent)) => Some(intent),
            Some(Err(e)) => {
                println!("{e}");
                continue;
            }
            None => match parse_line(&line) {
                Ok(intent) => intent,
                Err(e) => {
                    println!("{e}");
                    continue;
                }
            },
        };

        if let Some(intent) = intent
            && let Err(e) = handle.dispatch(intent).await
        {
            warn!(error = %e, "Dispatch failed");
            break;
        }
    }

    drop(handle);
    if let Err(e) = runner.await {
        warn!(error = %e, "Orchestrator task failed");
    }
    printer.abort();
    socket.disconnect();

    info!("Shutting down");
    Ok(())
}

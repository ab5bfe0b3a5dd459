//! Realtime socket transport.

pub mod frames;
mod registry;
mod ws_client;

pub use registry::ListenerRegistry;
pub use ws_client::WsSocketClient;

//! Application layer with the chat services and their orchestrator.

/// Event loop composing the chat services.
pub mod orchestrator;
/// Message, typing, notification, panel and voice state.
pub mod services;

#[cfg(test)]
pub(crate) mod test_support;

pub use orchestrator::{ChatConfig, ChatHandle, ChatIntent, ChatOrchestrator, ChatSnapshot};
pub use services::{MessageStore, NotificationRouter, PanelController, TypingTracker};

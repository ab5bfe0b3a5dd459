//! Chatcore - real-time chat orchestration core.
//!
//! This crate owns channel and message state for a chat client, reconciles
//! optimistic sends against server events, tracks typing and presence,
//! routes cross-channel notifications and arbitrates the auxiliary panel.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing the chat services and orchestrator.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for external services.
pub mod infrastructure;
/// Presentation layer translating keys and commands into intents.
pub mod presentation;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "chatcore";

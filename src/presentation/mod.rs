//! Presentation layer: key bindings, the line composer and text rendering.

/// Keyboard shortcut registry.
pub mod commands;
/// Slash-command parsing.
pub mod input;
/// Snapshot rendering.
pub mod view;

pub use commands::{CommandRegistry, parse_key};
pub use input::{CommandError, parse_line};
pub use view::render_snapshot;

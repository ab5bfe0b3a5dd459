//! Stateful chat services composed by the orchestrator.

pub mod event_bridge;
pub mod message_store;
pub mod notification_router;
pub mod panel_controller;
pub mod presence;
pub mod typing_tracker;
pub mod voice_session;

pub use event_bridge::EventBridge;
pub use message_store::{MessageStore, ReconcileOutcome};
pub use notification_router::NotificationRouter;
pub use panel_controller::PanelController;
pub use presence::PresenceRoster;
pub use typing_tracker::TypingTracker;
pub use voice_session::VoiceSessionController;

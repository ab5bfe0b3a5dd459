use tracing::debug;

use crate::domain::entities::{PanelKind, PanelState};
use crate::domain::keybinding::Action;

/// Holds the one auxiliary panel that may be visible at a time.
#[derive(Debug, Default)]
pub struct PanelController {
    current: PanelState,
}

impl PanelController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn current(&self) -> &PanelState {
        &self.current
    }

    #[must_use]
    pub const fn kind(&self) -> Option<PanelKind> {
        self.current.kind()
    }

    /// Shows `state`, replacing whatever panel was open.
    pub fn open(&mut self, state: PanelState) {
        debug!(from = ?self.current.kind(), to = ?state.kind(), "Panel opened");
        self.current = state;
    }

    pub fn close(&mut self) {
        self.current = PanelState::None;
    }

    /// Closes the panel if `state` is already showing, otherwise opens it.
    ///
    /// Threads compare their parent message; any other kind matches on kind
    /// alone.
    pub fn toggle(&mut self, state: PanelState) {
        let same = match (&self.current, &state) {
            (
                PanelState::Thread { parent_message: a },
                PanelState::Thread { parent_message: b },
            ) => a.key() == b.key(),
            (current, requested) => {
                current.is_open() && current.kind() == requested.kind()
            }
        };

        if same {
            self.close();
        } else {
            self.open(state);
        }
    }

    /// Applies a global keyboard action. Returns `true` if it was handled.
    pub fn handle_action(&mut self, action: Action) -> bool {
        match action {
            Action::OpenSearch => {
                self.open(PanelState::Search);
                true
            }
            Action::ClosePanel => {
                self.close();
                true
            }
            Action::ToggleMembers => {
                self.toggle(PanelState::Members);
                true
            }
            Action::LoadHistory | Action::ClearNotifications => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{ChannelId, Message, MessageAuthor};
    use chrono::{DateTime, Utc};
    use test_case::test_case;

    fn parent(id: &str) -> Message {
        Message::new(
            id,
            ChannelId::from("general"),
            MessageAuthor::new("bob", "Bob", None),
            "root",
            DateTime::<Utc>::UNIX_EPOCH,
        )
    }

    #[test_case(PanelState::Search, PanelState::Members ; "search_then_members")]
    #[test_case(PanelState::Members, PanelState::Search ; "members_then_search")]
    #[test_case(PanelState::Search, PanelState::thread(parent("m1")) ; "search_then_thread")]
    #[test_case(PanelState::thread(parent("m1")), PanelState::direct_message("dm-1") ; "thread_then_dm")]
    fn test_open_replaces_previous(first: PanelState, second: PanelState) {
        let mut panels = PanelController::new();

        panels.open(first);
        panels.open(second.clone());

        assert_eq!(panels.current(), &second);
    }

    #[test_case(PanelState::Search ; "search")]
    #[test_case(PanelState::Members ; "members")]
    #[test_case(PanelState::direct_message("dm-1") ; "direct_message")]
    #[test_case(PanelState::thread(parent("m1")) ; "thread")]
    fn test_toggle_twice_closes(state: PanelState) {
        let mut panels = PanelController::new();

        panels.toggle(state.clone());
        assert_eq!(panels.current(), &state);

        panels.toggle(state);
        assert_eq!(panels.current(), &PanelState::None);
    }

    #[test]
    fn test_toggle_other_thread_switches() {
        let mut panels = PanelController::new();

        let other = PanelState::thread(parent("m2"));

        panels.toggle(PanelState::thread(parent("m1")));
        panels.toggle(other.clone());

        assert_eq!(panels.current(), &other);
    }

    #[test]
    fn test_toggle_other_dm_closes() {
        let mut panels = PanelController::new();

        panels.toggle(PanelState::direct_message("dm-1"));
        panels.toggle(PanelState::direct_message("dm-2"));

        assert_eq!(panels.current(), &PanelState::None);
    }

    #[test_case(PanelState::None ; "from_closed")]
    #[test_case(PanelState::Members ; "from_members")]
    #[test_case(PanelState::Search ; "from_search")]
    fn test_open_search_action_forces_search(initial: PanelState) {
        let mut panels = PanelController::new();
        panels.open(initial);

        assert!(panels.handle_action(Action::OpenSearch));

        assert_eq!(panels.current(), &PanelState::Search);
    }

    #[test]
    fn test_close_action_always_closes() {
        let mut panels = PanelController::new();
        panels.open(PanelState::Members);

        assert!(panels.handle_action(Action::ClosePanel));
        assert!(panels.handle_action(Action::ClosePanel));

        assert!(!panels.current().is_open());
    }

    #[test]
    fn test_unrelated_action_is_not_handled() {
        let mut panels = PanelController::new();

        assert!(!panels.handle_action(Action::LoadHistory));
    }
}

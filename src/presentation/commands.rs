use crate::domain::keybinding::{Action, Keybind};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;
use tracing::warn;

pub struct CommandRegistry {
    display_bindings: HashMap<Action, KeyEvent>,
    input_bindings: Vec<(KeyEvent, Action)>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        let mut display_bindings = HashMap::new();
        let mut input_bindings = Vec::new();

        let mut register = |action: Action, key: KeyEvent, is_primary: bool| {
            if is_primary {
                display_bindings.insert(action, key);
            }
            input_bindings.push((key, action));
        };

        register(
            Action::OpenSearch,
            KeyEvent::new(KeyCode::Char('k'), KeyModifiers::CONTROL),
            true,
        );
        register(
            Action::OpenSearch,
            KeyEvent::new(KeyCode::Char('k'), KeyModifiers::SUPER),
            false,
        );
        register(
            Action::ClosePanel,
            KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE),
            true,
        );
        register(
            Action::ToggleMembers,
            KeyEvent::new(KeyCode::Char('m'), KeyModifiers::CONTROL),
            true,
        );
        register(
            Action::LoadHistory,
            KeyEvent::new(KeyCode::PageUp, KeyModifiers::NONE),
            true,
        );
        register(
            Action::ClearNotifications,
            KeyEvent::new(KeyCode::Char('l'), KeyModifiers::CONTROL),
            true,
        );

        Self {
            display_bindings,
            input_bindings,
        }
    }
}

impl CommandRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the default registry with user bindings layered on top.
    ///
    /// A custom binding becomes the displayed key for its action. Unparseable
    /// keys are logged and skipped.
    #[must_use]
    pub fn with_overrides(overrides: &HashMap<String, Action>) -> Self {
        let mut registry = Self::default();
        for (combo, action) in overrides {
            match parse_key(combo) {
                Some(key) => registry.bind(key, *action),
                None => warn!(key = %combo, "Ignoring unparseable keybinding"),
            }
        }
        registry
    }

    pub fn bind(&mut self, key: KeyEvent, action: Action) {
        self.input_bindings
            .retain(|(k, _)| !(k.code == key.code && k.modifiers == key.modifiers));
        self.input_bindings.insert(0, (key, action));
        self.display_bindings.insert(action, key);
    }

    #[must_use]
    pub fn get(&self, action: Action) -> Option<KeyEvent> {
        self.display_bindings.get(&action).copied()
    }

    #[must_use]
    pub fn find_action(&self, key: KeyEvent) -> Option<Action> {
        self.input_bindings
            .iter()
            .find(|(k, _)| k.code == key.code && k.modifiers == key.modifiers)
            .map(|(_, a)| *a)
    }

    /// Primary bindings for a help line, in a stable order.
    #[must_use]
    pub fn keybinds(&self) -> Vec<Keybind> {
        [
            (Action::OpenSearch, "Search"),
            (Action::ToggleMembers, "Members"),
            (Action::ClosePanel, "Close"),
            (Action::LoadHistory, "Older"),
            (Action::ClearNotifications, "Clear"),
        ]
        .into_iter()
        .filter_map(|(action, label)| self.get(action).map(|key| Keybind::new(key, action, label)))
        .collect()
    }
}

/// Parses a key description such as `Ctrl+k`, `Super+K`, `Esc` or `PageUp`.
#[must_use]
pub fn parse_key(combo: &str) -> Option<KeyEvent> {
    let mut modifiers = KeyModifiers::NONE;
    let mut parts: Vec<&str> = combo.split('+').map(str::trim).collect();
    let key = parts.pop().filter(|k| !k.is_empty())?;

    for part in parts {
        modifiers |= match part.to_ascii_lowercase().as_str() {
            "ctrl" | "control" => KeyModifiers::CONTROL,
            "alt" => KeyModifiers::ALT,
            "shift" => KeyModifiers::SHIFT,
            "super" | "cmd" | "meta" => KeyModifiers::SUPER,
            _ => return None,
        };
    }

    let code = match key.to_ascii_lowercase().as_str() {
        "esc" | "escape" => KeyCode::Esc,
        "enter" => KeyCode::Enter,
        "tab" => KeyCode::Tab,
        "pageup" => KeyCode::PageUp,
        "pagedown" => KeyCode::PageDown,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        "space" => KeyCode::Char(' '),
        lower => {
            let mut chars = key.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => KeyCode::Char(c.to_ascii_lowercase()),
                _ => {
                    let n = lower.strip_prefix('f')?.parse::<u8>().ok()?;
                    KeyCode::F(n)
                }
            }
        }
    };

    Some(KeyEvent::new(code, modifiers))
}

/// Formats a key the way [`parse_key`] reads it, e.g. `Ctrl+k`.
#[must_use]
pub fn describe_key(key: KeyEvent) -> String {
    let mut parts: Vec<String> = Vec::new();
    for (flag, name) in [
        (KeyModifiers::CONTROL, "Ctrl"),
        (KeyModifiers::ALT, "Alt"),
        (KeyModifiers::SHIFT, "Shift"),
        (KeyModifiers::SUPER, "Super"),
    ] {
        if key.modifiers.contains(flag) {
            parts.push(name.to_string());
        }
    }
    parts.push(match key.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::PageUp => "PageUp".to_string(),
        KeyCode::PageDown => "PageDown".to_string(),
        other => other.to_string(),
    });
    parts.join("+")
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(KeyCode::Char('k'), KeyModifiers::CONTROL, Some(Action::OpenSearch) ; "ctrl k")]
    #[test_case(KeyCode::Char('k'), KeyModifiers::SUPER, Some(Action::OpenSearch) ; "cmd k")]
    #[test_case(KeyCode::Esc, KeyModifiers::NONE, Some(Action::ClosePanel) ; "escape")]
    #[test_case(KeyCode::Char('m'), KeyModifiers::CONTROL, Some(Action::ToggleMembers) ; "members")]
    #[test_case(KeyCode::PageUp, KeyModifiers::NONE, Some(Action::LoadHistory) ; "page up")]
    #[test_case(KeyCode::Char('k'), KeyModifiers::NONE, None ; "plain k")]
    fn test_default_bindings(code: KeyCode, modifiers: KeyModifiers, expected: Option<Action>) {
        let registry = CommandRegistry::new();

        assert_eq!(registry.find_action(KeyEvent::new(code, modifiers)), expected);
    }

    #[test_case("Ctrl+k", Some(KeyEvent::new(KeyCode::Char('k'), KeyModifiers::CONTROL)) ; "ctrl")]
    #[test_case("Super+K", Some(KeyEvent::new(KeyCode::Char('k'), KeyModifiers::SUPER)) ; "super")]
    #[test_case("Esc", Some(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)) ; "esc")]
    #[test_case("Ctrl+Shift+F5", Some(KeyEvent::new(KeyCode::F(5), KeyModifiers::CONTROL | KeyModifiers::SHIFT)) ; "function key")]
    #[test_case("Hyper+k", None ; "unknown modifier")]
    #[test_case("Ctrl+", None ; "missing key")]
    fn test_parse_key(combo: &str, expected: Option<KeyEvent>) {
        assert_eq!(parse_key(combo), expected);
    }

    #[test_case("Ctrl+k" ; "ctrl")]
    #[test_case("Esc" ; "esc")]
    #[test_case("PageUp" ; "page up")]
    fn test_describe_key_reads_back(combo: &str) {
        let key = parse_key(combo).unwrap();

        assert_eq!(describe_key(key), combo);
        assert_eq!(parse_key(&describe_key(key)), Some(key));
    }

    #[test]
    fn test_overrides_replace_display_key() {
        let overrides = HashMap::from([("Ctrl+p".to_string(), Action::OpenSearch)]);
        let registry = CommandRegistry::with_overrides(&overrides);

        let ctrl_p = KeyEvent::new(KeyCode::Char('p'), KeyModifiers::CONTROL);
        assert_eq!(registry.get(Action::OpenSearch), Some(ctrl_p));
        assert_eq!(registry.find_action(ctrl_p), Some(Action::OpenSearch));
        assert_eq!(
            registry.find_action(KeyEvent::new(KeyCode::Char('k'), KeyModifiers::CONTROL)),
            Some(Action::OpenSearch)
        );
    }

    #[test]
    fn test_override_rebinds_existing_key() {
        let overrides = HashMap::from([("Ctrl+l".to_string(), Action::LoadHistory)]);
        let registry = CommandRegistry::with_overrides(&overrides);

        assert_eq!(
            registry.find_action(KeyEvent::new(KeyCode::Char('l'), KeyModifiers::CONTROL)),
            Some(Action::LoadHistory)
        );
    }

    #[test]
    fn test_keybinds_lists_primary_keys() {
        let keybinds = CommandRegistry::new().keybinds();

        assert_eq!(keybinds.len(), 5);
        assert_eq!(keybinds[0].action, Action::OpenSearch);
        assert_eq!(keybinds[0].label, "Search");
    }
}

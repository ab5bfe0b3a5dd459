//! Plain-text rendering of chat snapshots.

use std::fmt::Write;

use crate::application::ChatSnapshot;
use crate::domain::entities::{Message, MessageStatus, PanelState};

/// Renders the header, the last `tail` messages and the status lines.
#[must_use]
pub fn render_snapshot(snapshot: &ChatSnapshot, tail: usize) -> String {
    let mut out = String::new();

    let channel = snapshot
        .focused()
        .map_or_else(|| "(no channel)".to_string(), |c| c.display_name());
    let _ = write!(out, "[{}] {channel}", snapshot.connection);
    if let Some(panel) = panel_label(&snapshot.panel) {
        let _ = write!(out, " | panel: {panel}");
    }
    if let Some(voice) = &snapshot.voice_session {
        let _ = write!(
            out,
            " | voice: {} ({})",
            voice.channel_name,
            voice.participant_count()
        );
    }
    out.push('\n');

    let unread: Vec<String> = snapshot
        .channels
        .iter()
        .filter_map(|c| {
            let count = snapshot.unread(c.id());
            (count > 0).then(|| format!("{} {count}", c.display_name()))
        })
        .collect();
    if !unread.is_empty() {
        let _ = writeln!(out, "unread: {}", unread.join(", "));
    }

    if snapshot.loading {
        out.push_str("loading history...\n");
    } else if snapshot.has_more {
        out.push_str("(older messages available: /more)\n");
    }
    if let Some(error) = &snapshot.history_error {
        let _ = writeln!(out, "history error: {error}");
    }

    let skip = snapshot.messages.len().saturating_sub(tail);
    for message in &snapshot.messages[skip..] {
        out.push_str(&render_message(message));
        out.push('\n');
    }

    if let Some(indicator) = &snapshot.typing_indicator {
        let _ = writeln!(out, "{indicator}");
    }
    for item in &snapshot.notifications {
        let _ = writeln!(out, "! [{}] #{} {}", item.id, item.channel_id, item.summary());
    }
    if !snapshot.composer_enabled {
        out.push_str("(select a channel with /join to start typing)\n");
    }

    out
}

#[must_use]
pub fn render_message(message: &Message) -> String {
    let id = match (message.id(), message.temp_id()) {
        (Some(id), _) => id.to_string(),
        (None, Some(temp)) => temp.to_string(),
        (None, None) => String::new(),
    };
    let mut line = format!(
        "{} {} <{}> {}",
        message.formatted_timestamp(),
        id,
        message.author().username(),
        message.content()
    );
    if message.is_edited() {
        line.push_str(" (edited)");
    }
    for reaction in message.reactions() {
        let _ = write!(line, " [{} {}]", reaction.emoji, reaction.count);
    }
    match message.status() {
        MessageStatus::Pending => line.push_str(" (sending)"),
        MessageStatus::Failed { action, reason } => {
            let _ = write!(line, " ({action} failed: {reason})");
        }
        MessageStatus::Sent => {}
    }
    line
}

fn panel_label(panel: &PanelState) -> Option<String> {
    match panel {
        PanelState::None => None,
        PanelState::Thread { parent_message } => Some(format!(
            "thread on <{}> {}",
            parent_message.author().username(),
            parent_message.content()
        )),
        PanelState::DirectMessage { conversation_id } => Some(format!("dm {conversation_id}")),
        other => other.kind().map(|kind| kind.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ConnectionStatus;
    use crate::domain::entities::{
        Channel, ChannelId, MessageAction, MessageAuthor, MessageId, TempId,
    };
    use chrono::{TimeZone, Utc};

    fn message(id: &str, content: &str) -> Message {
        Message::new(
            MessageId::from(id),
            ChannelId::from("general"),
            MessageAuthor::new("u2", "bob", None),
            content,
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap(),
        )
    }

    #[test]
    fn test_render_header_and_tail() {
        let snapshot = ChatSnapshot {
            channels: vec![Channel::text("general", "general"), Channel::text("random", "random")],
            focused_channel: Some(ChannelId::from("general")),
            messages: vec![message("m1", "first"), message("m2", "second")],
            unread_counts: [(ChannelId::from("random"), 2)].into_iter().collect(),
            connection: ConnectionStatus::Connected,
            composer_enabled: true,
            typing_indicator: Some("alice is typing...".to_string()),
            panel: PanelState::Members,
            ..ChatSnapshot::default()
        };

        let text = render_snapshot(&snapshot, 1);

        assert!(text.starts_with("[Connected] #general | panel: members\n"));
        assert!(text.contains("unread: #random 2"));
        assert!(!text.contains("first"));
        assert!(text.contains("10:30 m2 <bob> second"));
        assert!(text.contains("alice is typing..."));
    }

    #[test]
    fn test_render_failed_optimistic_message() {
        let mut pending = Message::optimistic(
            TempId::from("temp-1"),
            ChannelId::from("general"),
            MessageAuthor::new("me", "me", None),
            "hello",
            Utc::now(),
        );
        pending.set_status(MessageStatus::Failed {
            action: MessageAction::Send,
            reason: "connection reset".to_string(),
        });

        let line = render_message(&pending);

        assert!(line.contains("temp-1 <me> hello"));
        assert!(line.ends_with("(send failed: connection reset)"));
    }

    #[test]
    fn test_render_without_focus() {
        let text = render_snapshot(&ChatSnapshot::default(), 10);

        assert!(text.starts_with("[Disconnected] (no channel)"));
        assert!(text.contains("/join"));
    }
}

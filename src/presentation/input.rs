//! Line-oriented composer: slash commands and plain messages.

use thiserror::Error;

use crate::application::ChatIntent;
use crate::domain::entities::{NotificationId, PanelState};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command: /{0}")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
}

/// Commands shown by `/help`.
pub const HELP: &str = "\
/join <channel>        focus a channel
/search                open search
/members               toggle the member list
/thread <message>      open a thread
/dm <conversation>     open a direct message
/close                 close the panel
/voice <channel>       join a voice channel
/leave-voice           leave voice
/edit <message> <text> edit a message
/delete <message>      delete a message
/react <message> <emoji>
/retry <temp id>       resend a failed message
/more                  load older messages
/open <n> /dismiss <n> notifications
/clear                 clear notifications
//text                 send text starting with /
/help /quit";

/// Parses one composer line.
///
/// Returns `Ok(None)` for blank lines and `/help`.
///
/// # Errors
///
/// Returns `CommandError` for unknown commands or missing arguments.
pub fn parse_line(line: &str) -> Result<Option<ChatIntent>, CommandError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Ok(None);
    }

    let Some(command) = line.strip_prefix('/') else {
        return Ok(Some(send(line)));
    };
    if command.starts_with('/') {
        return Ok(Some(send(command)));
    }

    let (name, rest) = command
        .split_once(char::is_whitespace)
        .map_or((command, ""), |(name, rest)| (name, rest.trim()));

    let intent = match name {
        "help" => return Ok(None),
        "join" => ChatIntent::SelectChannel(required(rest, "/join <channel>")?.into()),
        "search" => ChatIntent::OpenPanel(PanelState::Search),
        "members" => ChatIntent::TogglePanel(PanelState::Members),
        "thread" => ChatIntent::OpenThread(required(rest, "/thread <message>")?.into()),
        "dm" => ChatIntent::OpenDirectMessage(required(rest, "/dm <conversation>")?.into()),
        "close" => ChatIntent::ClosePanel,
        "voice" => ChatIntent::JoinVoice {
            channel_id: required(rest, "/voice <channel>")?.into(),
            participants: Vec::new(),
        },
        "leave-voice" => ChatIntent::LeaveVoice,
        "edit" => {
            let (id, content) = split_pair(rest, "/edit <message> <text>")?;
            ChatIntent::Edit {
                message_id: id.into(),
                content: content.to_string(),
            }
        }
        "delete" => ChatIntent::Delete(required(rest, "/delete <message>")?.into()),
        "react" => {
            let (id, emoji) = split_pair(rest, "/react <message> <emoji>")?;
            ChatIntent::React {
                message_id: id.into(),
                emoji: emoji.to_string(),
            }
        }
        "retry" => ChatIntent::RetrySend(required(rest, "/retry <temp id>")?.into()),
        "more" => ChatIntent::LoadOlder,
        "open" => ChatIntent::OpenNotification(notification(rest, "/open <n>")?),
        "dismiss" => ChatIntent::DismissNotification(notification(rest, "/dismiss <n>")?),
        "clear" => ChatIntent::ClearNotifications,
        other => return Err(CommandError::Unknown(other.to_string())),
    };

    Ok(Some(intent))
}

fn send(content: &str) -> ChatIntent {
    ChatIntent::Send {
        content: content.to_string(),
        attachments: Vec::new(),
    }
}

fn required<'a>(rest: &'a str, usage: &'static str) -> Result<&'a str, CommandError> {
    if rest.is_empty() {
        Err(CommandError::Usage(usage))
    } else {
        Ok(rest)
    }
}

fn split_pair<'a>(rest: &'a str, usage: &'static str) -> Result<(&'a str, &'a str), CommandError> {
    rest.split_once(char::is_whitespace)
        .map(|(first, second)| (first, second.trim()))
        .filter(|(_, second)| !second.is_empty())
        .ok_or(CommandError::Usage(usage))
}

fn notification(rest: &str, usage: &'static str) -> Result<NotificationId, CommandError> {
    rest.parse::<u64>()
        .map(NotificationId)
        .map_err(|_| CommandError::Usage(usage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{ChannelId, MessageId};
    use test_case::test_case;

    #[test_case("hello there", send("hello there") ; "plain text")]
    #[test_case("//shrug", send("/shrug") ; "escaped slash")]
    #[test_case("/join random", ChatIntent::SelectChannel(ChannelId::from("random")) ; "join")]
    #[test_case("/members", ChatIntent::TogglePanel(PanelState::Members) ; "members")]
    #[test_case("/more", ChatIntent::LoadOlder ; "more")]
    #[test_case("/open 3", ChatIntent::OpenNotification(NotificationId(3)) ; "open")]
    #[test_case("/delete msg-1", ChatIntent::Delete(MessageId::from("msg-1")) ; "delete")]
    fn test_parse_line(line: &str, expected: ChatIntent) {
        assert_eq!(parse_line(line), Ok(Some(expected)));
    }

    #[test]
    fn test_edit_keeps_spaces_in_content() {
        assert_eq!(
            parse_line("/edit msg-1 fixed  the typo"),
            Ok(Some(ChatIntent::Edit {
                message_id: MessageId::from("msg-1"),
                content: "fixed  the typo".to_string(),
            }))
        );
    }

    #[test]
    fn test_voice_join_without_participants() {
        assert_eq!(
            parse_line("/voice lounge"),
            Ok(Some(ChatIntent::JoinVoice {
                channel_id: ChannelId::from("lounge"),
                participants: Vec::new(),
            }))
        );
    }

    #[test_case("" ; "empty")]
    #[test_case("   \n" ; "whitespace")]
    #[test_case("/help" ; "help")]
    fn test_lines_without_intent(line: &str) {
        assert_eq!(parse_line(line), Ok(None));
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            parse_line("/frobnicate"),
            Err(CommandError::Unknown("frobnicate".to_string()))
        );
        assert_eq!(
            parse_line("/react msg-1"),
            Err(CommandError::Usage("/react <message> <emoji>"))
        );
        assert_eq!(parse_line("/open x"), Err(CommandError::Usage("/open <n>")));
        assert_eq!(parse_line("/join"), Err(CommandError::Usage("/join <channel>")));
    }
}

//! Core types shared by every part of the greeter.
//!
//! - [`PlayerId`] - stable identifier naming a player across sessions
//! - [`ConnectionEvent`] - lifecycle notification produced by the host
//! - [`ChatMessage`] - styled text handed to the host for delivery

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a player.
///
/// Wraps a UUID so player IDs cannot be confused with other identifiers.
/// `Display` yields the canonical lowercase hyphenated form, which is also
/// the on-disk format of the known-players file.
///
/// # Examples
///
/// ```rust
/// use plugin_greeter::PlayerId;
///
/// let player_id: PlayerId = "550e8400-e29b-41d4-a716-446655440000".parse().unwrap();
/// assert_eq!(player_id.to_string(), "550e8400-e29b-41d4-a716-446655440000");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Creates a new random player ID using UUID v4.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::str::FromStr for PlayerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// The lifecycle stage a [`ConnectionEvent`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionEventKind {
    /// The player entity was placed into a world. The host is about to
    /// announce the join with its own built-in message.
    AddedToWorld,
    /// The player's session is fully established.
    Ready,
    /// The player left the server.
    Disconnect,
}

impl std::fmt::Display for ConnectionEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConnectionEventKind::AddedToWorld => "added_to_world",
            ConnectionEventKind::Ready => "ready",
            ConnectionEventKind::Disconnect => "disconnect",
        };
        f.write_str(name)
    }
}

/// A connection lifecycle event emitted by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionEvent {
    pub kind: ConnectionEventKind,
    pub player_id: PlayerId,
    pub display_name: String,
}

impl ConnectionEvent {
    pub fn added_to_world(player_id: PlayerId, display_name: impl Into<String>) -> Self {
        Self {
            kind: ConnectionEventKind::AddedToWorld,
            player_id,
            display_name: display_name.into(),
        }
    }

    pub fn ready(player_id: PlayerId, display_name: impl Into<String>) -> Self {
        Self {
            kind: ConnectionEventKind::Ready,
            player_id,
            display_name: display_name.into(),
        }
    }

    pub fn disconnect(player_id: PlayerId, display_name: impl Into<String>) -> Self {
        Self {
            kind: ConnectionEventKind::Disconnect,
            player_id,
            display_name: display_name.into(),
        }
    }
}

/// Display colors used by the greeter's messages.
///
/// The values are opaque to the greeter and passed through to the host.
pub mod palette {
    pub const GOLD: &str = "#FFD700";
    pub const YELLOW: &str = "#FFFF00";
    pub const GREEN: &str = "#55FF55";
    pub const GRAY: &str = "#AAAAAA";
    pub const RED: &str = "#FF5555";
}

/// A piece of styled text sent to one player.
///
/// `extra` holds child segments appended after `text`, each with its own
/// styling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub text: String,
    pub color: String,
    #[serde(default)]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<ChatMessage>,
}

impl ChatMessage {
    pub fn new(text: impl Into<String>, color: &str) -> Self {
        Self {
            text: text.into(),
            color: color.to_string(),
            bold: false,
            extra: Vec::new(),
        }
    }

    pub fn bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    /// Appends a child segment.
    pub fn insert(mut self, segment: ChatMessage) -> Self {
        self.extra.push(segment);
        self
    }

    /// The text of this message and all of its segments, without styling.
    pub fn plain_text(&self) -> String {
        let mut out = self.text.clone();
        for segment in &self.extra {
            out.push_str(&segment.plain_text());
        }
        out
    }
}

impl std::fmt::Display for ChatMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.plain_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_display_is_lowercase_hyphenated() {
        let id: PlayerId = "550E8400-E29B-41D4-A716-446655440000".parse().unwrap();
        assert_eq!(id.to_string(), "550e8400-e29b-41d4-a716-446655440000");
    }

    #[test]
    fn test_player_id_rejects_garbage() {
        assert!("not-a-uuid".parse::<PlayerId>().is_err());
        assert!("".parse::<PlayerId>().is_err());
    }

    #[test]
    fn test_chat_message_plain_text_includes_segments() {
        let message = ChatMessage::new("Join Messages: ", palette::GRAY)
            .insert(ChatMessage::new("Enabled", palette::GREEN));
        assert_eq!(message.plain_text(), "Join Messages: Enabled");
        assert_eq!(message.extra[0].color, palette::GREEN);
        assert!(!message.bold);
    }

    #[test]
    fn test_event_constructors() {
        let id = PlayerId::new();
        let event = ConnectionEvent::ready(id, "Nova");
        assert_eq!(event.kind, ConnectionEventKind::Ready);
        assert_eq!(event.player_id, id);
        assert_eq!(event.display_name, "Nova");
        assert_eq!(ConnectionEventKind::AddedToWorld.to_string(), "added_to_world");
    }
}

//! In-memory connected-player directory used by the console host.
//!
//! Delivered messages are queued on a channel instead of being written
//! directly, so the console can print them in order after each command.

use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use plugin_greeter::{ChatMessage, DeliveryError, PlayerDirectory, PlayerId};
use tokio::sync::mpsc;

/// One message handed to one player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub recipient_name: String,
    pub message: ChatMessage,
}

impl std::fmt::Display for Delivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[to {}] {}", self.recipient_name, self.message)
    }
}

/// Players currently connected to the console host, keyed by ID.
#[derive(Debug)]
pub struct ConsoleDirectory {
    players: DashMap<PlayerId, String>,
    outbox: mpsc::UnboundedSender<Delivery>,
}

impl ConsoleDirectory {
    /// Creates an empty directory and the receiving end of its outbox.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Delivery>) {
        let (outbox, inbox) = mpsc::unbounded_channel();
        let directory = Self {
            players: DashMap::new(),
            outbox,
        };
        (directory, inbox)
    }

    /// Marks a player as connected. Returns `false` if they already were.
    pub fn connect(&self, player_id: PlayerId, name: impl Into<String>) -> bool {
        match self.players.entry(player_id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(name.into());
                true
            }
        }
    }

    /// Removes a player, returning their display name.
    pub fn disconnect(&self, player_id: &PlayerId) -> Option<String> {
        self.players.remove(player_id).map(|(_, name)| name)
    }

    pub fn name_of(&self, player_id: &PlayerId) -> Option<String> {
        self.players.get(player_id).map(|entry| entry.value().clone())
    }

    /// Connected players sorted by display name.
    pub fn players(&self) -> Vec<(PlayerId, String)> {
        let mut players: Vec<(PlayerId, String)> = self
            .players
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        players.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
        players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }
}

#[async_trait]
impl PlayerDirectory for ConsoleDirectory {
    async fn connected_players(&self) -> Vec<PlayerId> {
        self.players.iter().map(|entry| *entry.key()).collect()
    }

    async fn send_message(&self, player_id: PlayerId, message: &ChatMessage) -> Result<(), DeliveryError> {
        let recipient_name = self
            .name_of(&player_id)
            .ok_or(DeliveryError::PlayerUnreachable(player_id))?;

        self.outbox
            .send(Delivery {
                recipient_name,
                message: message.clone(),
            })
            .map_err(|e| DeliveryError::Transport(e.to_string()))
    }
}

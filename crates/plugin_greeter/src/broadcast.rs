//! Message delivery through the host's connected-player directory.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, error};

use crate::error::DeliveryError;
use crate::types::{ChatMessage, PlayerId};

/// The host's view of who is online and how to reach them.
///
/// Injected into the greeter instead of being looked up globally, so tests
/// can substitute a fake.
#[async_trait]
pub trait PlayerDirectory: Send + Sync {
    /// Snapshot of the players connected right now.
    async fn connected_players(&self) -> Vec<PlayerId>;

    /// Delivers `message` to one player.
    async fn send_message(&self, player_id: PlayerId, message: &ChatMessage) -> Result<(), DeliveryError>;
}

/// Counts of successful and failed deliveries.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

impl DeliveryReport {
    fn record(&mut self, result: &Result<(), DeliveryError>) {
        match result {
            Ok(()) => self.delivered += 1,
            Err(_) => self.failed += 1,
        }
    }

    pub fn merge(&mut self, other: DeliveryReport) {
        self.delivered += other.delivered;
        self.failed += other.failed;
    }
}

/// Best-effort sender over a [`PlayerDirectory`].
///
/// A failure to reach one recipient is logged and never stops delivery to
/// the others.
#[derive(Clone)]
pub struct BroadcastSink {
    directory: Arc<dyn PlayerDirectory>,
}

impl BroadcastSink {
    pub fn new(directory: Arc<dyn PlayerDirectory>) -> Self {
        Self { directory }
    }

    pub fn directory(&self) -> &Arc<dyn PlayerDirectory> {
        &self.directory
    }

    /// Sends `message` to a single player.
    pub async fn send_to(&self, player_id: PlayerId, message: &ChatMessage) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        let result = self.deliver(player_id, message).await;
        report.record(&result);
        report
    }

    /// Sends `message` to every player connected when the call starts.
    pub async fn broadcast(&self, message: &ChatMessage) -> DeliveryReport {
        let recipients = self.directory.connected_players().await;
        debug!("Broadcasting to {} players: {}", recipients.len(), message);

        let results = join_all(
            recipients
                .into_iter()
                .map(|player_id| self.deliver(player_id, message)),
        )
        .await;

        let mut report = DeliveryReport::default();
        for result in &results {
            report.record(result);
        }
        report
    }

    async fn deliver(&self, player_id: PlayerId, message: &ChatMessage) -> Result<(), DeliveryError> {
        let result = self.directory.send_message(player_id, message).await;
        if let Err(e) = &result {
            error!("Failed to deliver message to {}: {}", player_id, e);
        }
        result
    }
}

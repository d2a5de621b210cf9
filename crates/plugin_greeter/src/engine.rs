//! Greeting decision engine.
//!
//! Deciding and sending are kept apart. [`decision_for`] maps each event kind
//! to a pure function of (event, config, registry membership) that returns a
//! [`Decision`]; [`GreetingEngine`] evaluates it under the registry lock,
//! applies the registry mutation and then delivers the messages.

use std::sync::Arc;

use tracing::info;

use crate::broadcast::{BroadcastSink, DeliveryReport};
use crate::config::{ConfigStore, GreeterConfig};
use crate::registry::KnownPlayerRegistry;
use crate::template::render;
use crate::types::{palette, ChatMessage, ConnectionEvent, ConnectionEventKind, PlayerId};

/// Who an outbound message goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    Player(PlayerId),
    /// Every player connected at delivery time.
    Everyone,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub recipient: Recipient,
    pub message: ChatMessage,
}

impl Outbound {
    fn direct(player_id: PlayerId, message: ChatMessage) -> Self {
        Self {
            recipient: Recipient::Player(player_id),
            message,
        }
    }

    fn broadcast(message: ChatMessage) -> Self {
        Self {
            recipient: Recipient::Everyone,
            message,
        }
    }
}

/// How a ready player was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Greeting {
    FirstVisit,
    Returning,
}

/// What to do in response to one event.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Add the player to the registry and persist it before sending.
    pub register_player: bool,
    pub greeting: Option<Greeting>,
    /// Messages in send order.
    pub messages: Vec<Outbound>,
    /// Ask the host to skip its own join announcement.
    pub suppress_native_join: bool,
}

/// Signature shared by every entry of the dispatch table. The `bool` is
/// registry membership before the event.
pub type DecisionFn = fn(&ConnectionEvent, &GreeterConfig, bool) -> Decision;

/// Dispatch table from event kind to decision function.
pub fn decision_for(kind: ConnectionEventKind) -> DecisionFn {
    match kind {
        ConnectionEventKind::AddedToWorld => decide_added_to_world,
        ConnectionEventKind::Ready => decide_ready,
        ConnectionEventKind::Disconnect => decide_disconnect,
    }
}

/// Evaluates the decision for `event` without touching any state.
pub fn decide(event: &ConnectionEvent, config: &GreeterConfig, known: bool) -> Decision {
    decision_for(event.kind)(event, config, known)
}

fn decide_added_to_world(_event: &ConnectionEvent, config: &GreeterConfig, _known: bool) -> Decision {
    Decision {
        suppress_native_join: config.suppress_native_welcome,
        ..Decision::default()
    }
}

fn decide_ready(event: &ConnectionEvent, config: &GreeterConfig, known: bool) -> Decision {
    if !config.enable_join_messages {
        return Decision::default();
    }

    let name = event.display_name.as_str();
    let player_id = event.player_id;

    // Unknown players with the first-time welcome disabled take the
    // returning branch and are never recorded.
    if !known && config.enable_first_time_welcome {
        Decision {
            register_player: true,
            greeting: Some(Greeting::FirstVisit),
            messages: vec![
                Outbound::direct(
                    player_id,
                    ChatMessage::new(render(&config.welcome_message, name), palette::GOLD).bold(true),
                ),
                Outbound::direct(
                    player_id,
                    ChatMessage::new(render(&config.first_time_message, name), palette::YELLOW),
                ),
                Outbound::broadcast(ChatMessage::new(
                    render(&config.new_player_broadcast, name),
                    palette::GREEN,
                )),
            ],
            suppress_native_join: false,
        }
    } else {
        Decision {
            register_player: false,
            greeting: Some(Greeting::Returning),
            messages: vec![
                Outbound::direct(
                    player_id,
                    ChatMessage::new(render(&config.return_message, name), palette::GREEN),
                ),
                Outbound::broadcast(ChatMessage::new(render(&config.join_broadcast, name), palette::GRAY)),
            ],
            suppress_native_join: false,
        }
    }
}

fn decide_disconnect(event: &ConnectionEvent, config: &GreeterConfig, _known: bool) -> Decision {
    if !config.enable_leave_messages {
        return Decision::default();
    }

    Decision {
        messages: vec![Outbound::broadcast(ChatMessage::new(
            render(&config.leave_broadcast, &event.display_name),
            palette::GRAY,
        ))],
        ..Decision::default()
    }
}

/// Result of handling one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventOutcome {
    pub kind: ConnectionEventKind,
    pub greeting: Option<Greeting>,
    /// The player was newly added to the registry.
    pub registered: bool,
    pub suppress_native_join: bool,
    pub deliveries: DeliveryReport,
}

/// Applies decisions: registry mutation first, then delivery.
pub struct GreetingEngine {
    config: Arc<ConfigStore>,
    registry: Arc<KnownPlayerRegistry>,
    sink: BroadcastSink,
}

impl GreetingEngine {
    pub fn new(config: Arc<ConfigStore>, registry: Arc<KnownPlayerRegistry>, sink: BroadcastSink) -> Self {
        Self { config, registry, sink }
    }

    pub fn sink(&self) -> &BroadcastSink {
        &self.sink
    }

    pub async fn handle(&self, event: &ConnectionEvent) -> EventOutcome {
        let config = self.config.get().await;

        // Membership check, insert and save form one critical section so a
        // player cannot be classified first-time twice.
        let (decision, registered) = {
            let mut registry = self.registry.lock().await;
            let known = registry.contains(&event.player_id);
            let decision = decide(event, &config, known);

            let registered = decision.register_player && registry.add(event.player_id);
            if registered {
                registry.persist().await;
            }
            (decision, registered)
        };

        match (event.kind, decision.greeting) {
            (ConnectionEventKind::Ready, Some(Greeting::FirstVisit)) => {
                info!("New player joined: {}", event.display_name)
            }
            (ConnectionEventKind::Ready, Some(Greeting::Returning)) => {
                info!("Player rejoined: {}", event.display_name)
            }
            (ConnectionEventKind::Disconnect, _) if !decision.messages.is_empty() => {
                info!("Player left: {}", event.display_name)
            }
            _ => {}
        }

        let mut deliveries = DeliveryReport::default();
        for outbound in &decision.messages {
            let report = match outbound.recipient {
                Recipient::Player(player_id) => self.sink.send_to(player_id, &outbound.message).await,
                Recipient::Everyone => self.sink.broadcast(&outbound.message).await,
            };
            deliveries.merge(report);
        }

        EventOutcome {
            kind: event.kind,
            greeting: decision.greeting,
            registered,
            suppress_native_join: decision.suppress_native_join,
            deliveries,
        }
    }
}

//! Operator console.
//!
//! Reads one command per line and turns it into connection events or
//! greeter commands:
//!
//! ```text
//! join <uuid> <name>    player connects (added-to-world, then ready)
//! leave <uuid>          player disconnects
//! players               list connected players
//! greeter [reload|status]
//! help
//! quit
//! ```

use std::sync::Arc;

use plugin_greeter::{ConnectionEvent, GreeterPlugin, PlayerId};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use crate::directory::{ConsoleDirectory, Delivery};

/// A parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Join { player_id: PlayerId, name: String },
    Leave { player_id: PlayerId },
    Players,
    Greeter(Vec<String>),
    Help,
    Quit,
    Empty,
}

fn parse_player_id(raw: Option<&str>, usage: &str) -> Result<PlayerId, String> {
    let raw = raw.ok_or_else(|| format!("Usage: {usage}"))?;
    raw.parse()
        .map_err(|e| format!("Invalid player id '{raw}': {e}"))
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(ConsoleCommand::Empty);
        };

        match head.trim_start_matches('/').to_ascii_lowercase().as_str() {
            "join" => {
                let player_id = parse_player_id(words.next(), "join <uuid> <name>")?;
                let name = words.collect::<Vec<_>>().join(" ");
                if name.is_empty() {
                    return Err("Usage: join <uuid> <name>".to_string());
                }
                Ok(ConsoleCommand::Join { player_id, name })
            }
            "leave" => Ok(ConsoleCommand::Leave {
                player_id: parse_player_id(words.next(), "leave <uuid>")?,
            }),
            "players" | "list" => Ok(ConsoleCommand::Players),
            "greeter" => Ok(ConsoleCommand::Greeter(words.map(str::to_string).collect())),
            "help" | "?" => Ok(ConsoleCommand::Help),
            "quit" | "exit" | "stop" => Ok(ConsoleCommand::Quit),
            other => Err(format!("Unknown command: {other} (type 'help')")),
        }
    }
}

/// Output of one console command.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConsoleReply {
    pub lines: Vec<String>,
    pub quit: bool,
}

impl ConsoleReply {
    fn line(text: impl Into<String>) -> Self {
        Self {
            lines: vec![text.into()],
            quit: false,
        }
    }
}

pub struct Console {
    plugin: Arc<GreeterPlugin>,
    directory: Arc<ConsoleDirectory>,
    deliveries: Mutex<mpsc::UnboundedReceiver<Delivery>>,
}

impl Console {
    pub fn new(
        plugin: Arc<GreeterPlugin>,
        directory: Arc<ConsoleDirectory>,
        deliveries: mpsc::UnboundedReceiver<Delivery>,
    ) -> Self {
        Self {
            plugin,
            directory,
            deliveries: Mutex::new(deliveries),
        }
    }

    /// Parses and executes one line.
    pub async fn execute_line(&self, line: &str) -> ConsoleReply {
        match ConsoleCommand::parse(line) {
            Ok(command) => self.execute(command).await,
            Err(message) => ConsoleReply::line(message),
        }
    }

    pub async fn execute(&self, command: ConsoleCommand) -> ConsoleReply {
        debug!("Console command: {:?}", command);

        let mut reply = match command {
            ConsoleCommand::Empty => ConsoleReply::default(),
            ConsoleCommand::Join { player_id, name } => self.join(player_id, name).await,
            ConsoleCommand::Leave { player_id } => self.leave(player_id).await,
            ConsoleCommand::Players => self.players().await,
            ConsoleCommand::Greeter(args) => ConsoleReply {
                lines: self
                    .plugin
                    .execute_command(args.as_slice())
                    .await
                    .iter()
                    .map(|m| m.plain_text())
                    .collect(),
                quit: false,
            },
            ConsoleCommand::Help => ConsoleReply {
                lines: vec![
                    "join <uuid> <name>  - connect a player".to_string(),
                    "leave <uuid>        - disconnect a player".to_string(),
                    "players             - list connected players".to_string(),
                    "greeter [reload|status]".to_string(),
                    "quit                - save and exit".to_string(),
                ],
                quit: false,
            },
            ConsoleCommand::Quit => ConsoleReply {
                lines: Vec::new(),
                quit: true,
            },
        };

        self.drain_deliveries(&mut reply.lines).await;
        reply
    }

    async fn join(&self, player_id: PlayerId, name: String) -> ConsoleReply {
        if !self.directory.connect(player_id, name.clone()) {
            return ConsoleReply::line(format!("{player_id} is already connected"));
        }

        let mut reply = ConsoleReply::default();
        let placed = self
            .plugin
            .handle_event(&ConnectionEvent::added_to_world(player_id, name.clone()))
            .await;
        if !placed.suppress_native_join {
            reply.lines.push(format!("[native] {name} joined the world."));
        }

        self.plugin
            .handle_event(&ConnectionEvent::ready(player_id, name))
            .await;
        reply
    }

    async fn leave(&self, player_id: PlayerId) -> ConsoleReply {
        match self.directory.disconnect(&player_id) {
            Some(name) => {
                self.plugin
                    .handle_event(&ConnectionEvent::disconnect(player_id, name))
                    .await;
                ConsoleReply::default()
            }
            None => ConsoleReply::line(format!("No connected player with id {player_id}")),
        }
    }

    async fn players(&self) -> ConsoleReply {
        let online = self.directory.players();
        let names: Vec<String> = online.iter().map(|(_, name)| name.clone()).collect();
        ConsoleReply {
            lines: vec![
                format!("Online ({}): {}", online.len(), names.join(", ")),
                format!("Known players: {}", self.plugin.registry().len().await),
            ],
            quit: false,
        }
    }

    async fn drain_deliveries(&self, lines: &mut Vec<String>) {
        let mut deliveries = self.deliveries.lock().await;
        while let Ok(delivery) = deliveries.try_recv() {
            lines.push(delivery.to_string());
        }
    }

    /// Reads commands from `reader` until `quit` or end of input, writing
    /// replies to `writer`.
    pub async fn run<R, W>(&self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            let reply = self.execute_line(&line).await;
            for text in &reply.lines {
                writer.write_all(text.as_bytes()).await?;
                writer.write_all(b"\n").await?;
            }
            writer.flush().await?;

            if reply.quit {
                break;
            }
        }
        Ok(())
    }
}

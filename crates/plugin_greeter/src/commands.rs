//! The `greeter` operator command.
//!
//! ```text
//! /greeter          usage summary
//! /greeter reload   re-read config.json
//! /greeter status   show the active settings
//! ```

use std::str::FromStr;

use tracing::{error, info};

use crate::config::ConfigStore;
use crate::registry::KnownPlayerRegistry;
use crate::types::{palette, ChatMessage};

/// A parsed `greeter` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GreeterCommand {
    Usage,
    Reload,
    Status,
    Unknown(String),
}

impl GreeterCommand {
    /// Parses the arguments following `greeter`.
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Self {
        match args.first().map(|s| s.as_ref().trim()) {
            None | Some("") => GreeterCommand::Usage,
            Some(sub) => match sub.to_ascii_lowercase().as_str() {
                "reload" => GreeterCommand::Reload,
                "status" => GreeterCommand::Status,
                _ => GreeterCommand::Unknown(sub.to_string()),
            },
        }
    }
}

impl FromStr for GreeterCommand {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let args: Vec<&str> = s.split_whitespace().collect();
        Ok(Self::parse(&args))
    }
}

/// Usage lines shown for a bare `greeter`.
pub fn usage() -> Vec<ChatMessage> {
    vec![
        ChatMessage::new("Greeter Commands:", palette::GREEN),
        ChatMessage::new("  /greeter reload - Reload config", palette::GRAY),
        ChatMessage::new("  /greeter status - Show current settings", palette::GRAY),
    ]
}

fn flag_line(label: &str, enabled: bool) -> ChatMessage {
    let (text, color) = if enabled {
        ("Enabled", palette::GREEN)
    } else {
        ("Disabled", palette::RED)
    };
    ChatMessage::new(format!("{label}: "), palette::GRAY).insert(ChatMessage::new(text, color))
}

/// Renders the `status` snapshot. Read-only.
pub async fn status(config: &ConfigStore, registry: &KnownPlayerRegistry) -> Vec<ChatMessage> {
    let cfg = config.get().await;
    let known = registry.len().await;

    vec![
        ChatMessage::new("=== Greeter Status ===", palette::GREEN),
        flag_line("Join Messages", cfg.enable_join_messages),
        flag_line("Leave Messages", cfg.enable_leave_messages),
        flag_line("First-Time Welcome", cfg.enable_first_time_welcome),
        flag_line("Suppress Native", cfg.suppress_native_welcome),
        ChatMessage::new("Welcome Message: ", palette::GRAY)
            .insert(ChatMessage::new(cfg.welcome_message.clone(), palette::YELLOW)),
        ChatMessage::new("Known Players: ", palette::GRAY)
            .insert(ChatMessage::new(known.to_string(), palette::YELLOW)),
    ]
}

/// Runs a config reload and reports the outcome to the operator.
pub async fn reload(config: &ConfigStore) -> Vec<ChatMessage> {
    match config.load().await {
        Ok(_) => vec![ChatMessage::new("Greeter config reloaded!", palette::GREEN)],
        Err(e) => {
            error!("Config reload failed: {}", e);
            vec![ChatMessage::new(format!("Failed to reload Greeter config: {e}"), palette::RED)]
        }
    }
}

/// Executes `command`, returning the reply lines.
pub async fn execute(
    command: &GreeterCommand,
    config: &ConfigStore,
    registry: &KnownPlayerRegistry,
) -> Vec<ChatMessage> {
    match command {
        GreeterCommand::Usage => usage(),
        GreeterCommand::Reload => {
            info!("Reloading greeter config from {}", config.path().display());
            reload(config).await
        }
        GreeterCommand::Status => status(config, registry).await,
        GreeterCommand::Unknown(sub) => {
            let mut reply = vec![ChatMessage::new(format!("Unknown subcommand: {sub}"), palette::RED)];
            reply.extend(usage());
            reply
        }
    }
}

//! # Greeter
//!
//! Remembers every player who has ever joined and greets them accordingly:
//! a first-time welcome plus a "new player" broadcast on their first visit,
//! a welcome-back plus a join broadcast afterwards, and a leave broadcast
//! when they go.
//!
//! ## Pieces
//!
//! - [`config`] - the active [`GreeterConfig`] and its JSON file
//! - [`registry`] - the known-players set and its text file
//! - [`template`] - `{player}` substitution
//! - [`engine`] - per-event decisions and their application
//! - [`broadcast`] - delivery through the host's [`PlayerDirectory`]
//! - [`commands`] - the `greeter reload|status` operator command
//!
//! [`GreeterPlugin`] wires them together and exposes the lifecycle the host
//! drives: `setup`, `handle_event`, `execute_command` and `shutdown`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info, warn};

pub mod broadcast;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod registry;
pub mod template;
pub mod types;

pub use broadcast::{BroadcastSink, DeliveryReport, PlayerDirectory};
pub use commands::GreeterCommand;
pub use config::{ConfigStore, GreeterConfig};
pub use engine::{decide, decision_for, Decision, EventOutcome, Greeting, GreetingEngine, Outbound, Recipient};
pub use error::{ConfigError, DeliveryError, GreeterError, GreeterResult, RegistryError};
pub use registry::KnownPlayerRegistry;
pub use template::render;
pub use types::{palette, ChatMessage, ConnectionEvent, ConnectionEventKind, PlayerId};

/// File name of the greeter configuration inside the data directory.
pub const CONFIG_FILE_NAME: &str = "config.json";
/// File name of the known-players list inside the data directory.
pub const KNOWN_PLAYERS_FILE_NAME: &str = "known_players.txt";

/// The greeter as seen by its host.
pub struct GreeterPlugin {
    name: String,
    data_dir: PathBuf,
    config: Arc<ConfigStore>,
    registry: Arc<KnownPlayerRegistry>,
    engine: GreetingEngine,
}

impl GreeterPlugin {
    /// Creates the plugin with its files under `data_dir`.
    ///
    /// Nothing touches the disk until [`GreeterPlugin::setup`].
    pub fn new(data_dir: impl Into<PathBuf>, directory: Arc<dyn PlayerDirectory>) -> Self {
        let data_dir = data_dir.into();
        let config = Arc::new(ConfigStore::new(data_dir.join(CONFIG_FILE_NAME)));
        let registry = Arc::new(KnownPlayerRegistry::new(data_dir.join(KNOWN_PLAYERS_FILE_NAME)));
        let engine = GreetingEngine::new(config.clone(), registry.clone(), BroadcastSink::new(directory));

        Self {
            name: "greeter".to_string(),
            data_dir,
            config,
            registry,
            engine,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn registry(&self) -> &Arc<KnownPlayerRegistry> {
        &self.registry
    }

    pub fn config_store(&self) -> &Arc<ConfigStore> {
        &self.config
    }

    /// Prepares the data directory, config and registry.
    ///
    /// Storage problems are logged and leave the defaults (or an empty
    /// registry) in place; setup itself never fails.
    pub async fn setup(&self) {
        info!("Greeter is setting up...");

        if let Err(e) = tokio::fs::create_dir_all(&self.data_dir).await {
            error!("Failed to create data directory {}: {}", self.data_dir.display(), e);
        }

        if let Err(e) = self.config.ensure_exists().await {
            warn!("Using default greeter config: {}", e);
        }

        self.registry.load().await;

        info!("Greeter setup complete!");
    }

    /// Returns the active configuration.
    pub async fn config(&self) -> Arc<GreeterConfig> {
        self.config.get().await
    }

    /// Re-reads `config.json`; the previous config stays active on failure.
    pub async fn reload_config(&self) -> GreeterResult<Arc<GreeterConfig>> {
        Ok(self.config.load().await?)
    }

    /// Handles one lifecycle event from the host.
    pub async fn handle_event(&self, event: &ConnectionEvent) -> EventOutcome {
        self.engine.handle(event).await
    }

    /// Runs `greeter <args>` and returns the reply for the operator.
    pub async fn execute_command<S: AsRef<str>>(&self, args: &[S]) -> Vec<ChatMessage> {
        let command = GreeterCommand::parse(args);
        commands::execute(&command, &self.config, &self.registry).await
    }

    /// Persists the registry one last time.
    pub async fn shutdown(&self) {
        info!("Greeter is shutting down...");
        self.registry.save().await;
    }
}

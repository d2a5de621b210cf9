//! Console host for the greeter plugin.
//!
//! Loads the host configuration, installs logging, sets up the greeter and
//! feeds it connection events typed at the console until `quit`, end of
//! input, or a termination signal. The known-players file is always saved
//! on the way out.

mod cli;
mod config;
mod console;
mod directory;
mod logging;
mod signals;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use plugin_greeter::GreeterPlugin;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::cli::CliArgs;
use crate::config::AppConfig;
use crate::console::Console;
use crate::directory::{ConsoleDirectory, Delivery};

/// The running host: configuration, directory and plugin.
pub struct Application {
    config: AppConfig,
    directory: Arc<ConsoleDirectory>,
    deliveries: mpsc::UnboundedReceiver<Delivery>,
    plugin: Arc<GreeterPlugin>,
}

impl Application {
    pub async fn new(args: CliArgs) -> Result<Self> {
        let mut config = AppConfig::load_from_file(&args.config_path)
            .await
            .map_err(|e| anyhow!("Failed to load {}: {e}", args.config_path.display()))?;
        config.apply_overrides(&args);
        config
            .validate()
            .map_err(|e| anyhow!("Configuration validation failed: {e}"))?;

        logging::setup_logging(&config.logging)?;

        let (directory, deliveries) = ConsoleDirectory::new();
        let directory = Arc::new(directory);
        let plugin = Arc::new(GreeterPlugin::new(config.data_directory(), directory.clone()));

        info!(
            "👋 Greeter Host v{} | Config: {} | Data: {}",
            env!("CARGO_PKG_VERSION"),
            args.config_path.display(),
            config.greeter.data_directory
        );

        Ok(Self {
            config,
            directory,
            deliveries,
            plugin,
        })
    }

    pub async fn run(self) -> Result<()> {
        self.plugin.setup().await;
        info!("Greeter has started!");
        info!("Type 'help' for console commands, 'quit' to exit");

        let console = Console::new(self.plugin.clone(), self.directory.clone(), self.deliveries);
        let stdin = BufReader::new(tokio::io::stdin());

        tokio::select! {
            result = console.run(stdin, tokio::io::stdout()) => {
                if let Err(e) = result {
                    error!("Console error: {}", e);
                }
            }
            result = signals::wait_for_shutdown_signal() => {
                if let Err(e) = result {
                    error!("Signal handling failed: {}", e);
                }
            }
        }

        info!("{} players still connected at shutdown", self.directory.len());
        self.plugin.shutdown().await;
        info!(
            "✅ Greeter Host shutdown complete ({} known players in {})",
            self.plugin.registry().len().await,
            self.config.greeter.data_directory
        );
        Ok(())
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let args = CliArgs::parse();

    let app = match Application::new(args).await {
        Ok(app) => app,
        Err(e) => {
            eprintln!("❌ Failed to start application: {e:?}");
            std::process::exit(1);
        }
    };

    if let Err(e) = app.run().await {
        error!("❌ Application error: {:?}", e);
        std::process::exit(1);
    }

    // A pending stdin read keeps a blocking thread alive past shutdown.
    std::process::exit(0);
}

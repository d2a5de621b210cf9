//! Greeter configuration and its store.
//!
//! The configuration lives in a JSON file next to the known-players file.
//! Every key is optional; missing keys take the defaults below, so a
//! [`GreeterConfig`] is always fully populated.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::fs as tokio_fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, instrument};

use crate::error::{ConfigError, ConfigResult};

/// Greeting settings.
///
/// Serialized with PascalCase keys, e.g. `EnableJoinMessages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GreeterConfig {
    /// Greet players when their session becomes ready
    pub enable_join_messages: bool,
    /// Announce players leaving
    pub enable_leave_messages: bool,
    /// Give never-seen players the first-time welcome and record them
    pub enable_first_time_welcome: bool,
    /// Ask the host to skip its built-in join announcement
    pub suppress_native_welcome: bool,
    pub welcome_message: String,
    pub first_time_message: String,
    pub return_message: String,
    pub new_player_broadcast: String,
    pub join_broadcast: String,
    pub leave_broadcast: String,
}

impl Default for GreeterConfig {
    fn default() -> Self {
        Self {
            enable_join_messages: true,
            enable_leave_messages: true,
            enable_first_time_welcome: true,
            suppress_native_welcome: false,
            welcome_message: "*** WELCOME TO THE SERVER! ***".to_string(),
            first_time_message: "This is your first time here!".to_string(),
            return_message: "Welcome back!".to_string(),
            new_player_broadcast: "[NEW] {player} has joined for the first time!".to_string(),
            join_broadcast: "[+] {player} has joined.".to_string(),
            leave_broadcast: "[-] {player} has left.".to_string(),
        }
    }
}

impl GreeterConfig {
    /// Parses a configuration document, applying defaults for absent keys.
    pub fn from_json(path: &Path, contents: &str) -> ConfigResult<Self> {
        serde_json::from_str(contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)
    }
}

/// Holds the active [`GreeterConfig`] and syncs it with durable storage.
///
/// Readers get an `Arc` snapshot, so a reload swaps the whole value at once.
/// Storage access (load and save) is serialized by `io_lock`.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    current: RwLock<Arc<GreeterConfig>>,
    io_lock: Mutex<()>,
}

impl ConfigStore {
    /// Creates a store holding the default configuration. Nothing is read yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_config(path, GreeterConfig::default())
    }

    pub fn with_config(path: impl Into<PathBuf>, config: GreeterConfig) -> Self {
        Self {
            path: path.into(),
            current: RwLock::new(Arc::new(config)),
            io_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the configuration file is present.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Returns the active configuration.
    pub async fn get(&self) -> Arc<GreeterConfig> {
        self.current.read().await.clone()
    }

    /// Re-reads the configuration file and swaps it in.
    ///
    /// On failure the previous configuration stays active and the error is
    /// returned.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn load(&self) -> ConfigResult<Arc<GreeterConfig>> {
        let _io = self.io_lock.lock().await;

        let contents = tokio_fs::read_to_string(&self.path)
            .await
            .map_err(|e| ConfigError::Read(self.path.clone(), e))?;
        let config = Arc::new(GreeterConfig::from_json(&self.path, &contents)?);

        *self.current.write().await = config.clone();
        info!("Config reloaded!");
        Ok(config)
    }

    /// Writes the active configuration, creating the file if needed.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn save(&self) -> ConfigResult<()> {
        let _io = self.io_lock.lock().await;
        let json = self.get().await.to_json()?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio_fs::create_dir_all(parent)
                .await
                .map_err(|e| ConfigError::CreateDirectory(parent.to_path_buf(), e))?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        let written = async {
            let mut file = tokio_fs::File::create(&temp_path).await?;
            file.write_all(json.as_bytes()).await?;
            file.sync_all().await
        }
        .await;

        if let Err(e) = written {
            let _ = tokio_fs::remove_file(&temp_path).await;
            return Err(ConfigError::Write(temp_path, e));
        }

        if let Err(e) = tokio_fs::rename(&temp_path, &self.path).await {
            let _ = tokio_fs::remove_file(&temp_path).await;
            return Err(ConfigError::Write(self.path.clone(), e));
        }

        Ok(())
    }

    /// Saves the defaults when the file is missing, otherwise loads it.
    ///
    /// Returns `true` when a new file was generated.
    pub async fn ensure_exists(&self) -> ConfigResult<bool> {
        if self.exists() {
            self.load().await?;
            Ok(false)
        } else {
            info!("Generating default config...");
            self.save().await?;
            Ok(true)
        }
    }
}

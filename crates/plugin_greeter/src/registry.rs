//! Known-player registry.
//!
//! An in-memory set of every [`PlayerId`] ever greeted as a first-time
//! player, mirrored to a plain text file with one canonical UUID per line.
//! Storage failures are logged and degrade to "empty registry" on load or
//! "save skipped" on save; they never propagate into the host.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tokio::fs as tokio_fs;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info, instrument, warn};

use crate::error::{RegistryError, RegistryResult};
use crate::types::PlayerId;

/// Result of parsing a known-players file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RegistryLoadReport {
    pub players: HashSet<PlayerId>,
    /// Lines that were not valid identifiers, as they appeared in the file.
    pub invalid_lines: Vec<String>,
}

/// Parses known-players file contents.
///
/// Lines are trimmed and blank lines ignored. Lines that are not valid UUIDs,
/// including lines that are not valid UTF-8, are skipped with a warning and
/// recorded in the report.
pub fn parse_known_players(contents: impl AsRef<[u8]>) -> RegistryLoadReport {
    let mut report = RegistryLoadReport::default();

    for raw in contents.as_ref().split(|b| *b == b'\n') {
        let line = match std::str::from_utf8(raw) {
            Ok(line) => line.trim_end_matches('\r'),
            Err(e) => {
                let lossy = String::from_utf8_lossy(raw);
                let lossy = lossy.trim_end_matches('\r');
                warn!("Invalid UUID in player data: {} ({})", lossy, e);
                report.invalid_lines.push(lossy.to_string());
                continue;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match trimmed.parse::<PlayerId>() {
            Ok(player_id) => {
                report.players.insert(player_id);
            }
            Err(e) => {
                warn!("Invalid UUID in player data: {} ({})", line, e);
                report.invalid_lines.push(line.to_string());
            }
        }
    }

    report
}

/// Renders the known-players file, one identifier per line in sorted order.
pub fn render_known_players(players: &HashSet<PlayerId>) -> String {
    let mut ids: Vec<&PlayerId> = players.iter().collect();
    ids.sort();

    let mut out = String::with_capacity(ids.len() * 37);
    for id in ids {
        out.push_str(&id.to_string());
        out.push('\n');
    }
    out
}

/// Reads the known-players file at `path`.
///
/// A missing file yields an empty report.
#[instrument]
pub async fn load_known_players(path: &Path) -> RegistryResult<RegistryLoadReport> {
    match tokio_fs::read(path).await {
        Ok(contents) => Ok(parse_known_players(contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No known players file at {}", path.display());
            Ok(RegistryLoadReport::default())
        }
        Err(e) => Err(RegistryError::FileRead(path.to_path_buf(), e)),
    }
}

/// Truncates and rewrites the known-players file at `path`.
#[instrument(skip(players), fields(count = players.len()))]
pub async fn save_known_players(path: &Path, players: &HashSet<PlayerId>) -> RegistryResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio_fs::create_dir_all(parent)
            .await
            .map_err(|e| RegistryError::CreateDirectory(parent.to_path_buf(), e))?;
    }

    tokio_fs::write(path, render_known_players(players))
        .await
        .map_err(|e| RegistryError::FileWrite(path.to_path_buf(), e))
}

/// What [`KnownPlayerRegistry::load`] did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    /// Identifiers read from the file (including ones already known).
    pub loaded: usize,
    pub invalid_lines: Vec<String>,
    /// Set when the file could not be read at all.
    pub error: Option<String>,
}

/// Durable set of known players.
///
/// The set sits behind a single async mutex. [`KnownPlayerRegistry::lock`]
/// hands out a guard so callers can run contains, add and persist as one
/// critical section.
#[derive(Debug)]
pub struct KnownPlayerRegistry {
    path: PathBuf,
    players: Mutex<HashSet<PlayerId>>,
}

impl KnownPlayerRegistry {
    /// Creates an empty registry backed by `path`. Nothing is read yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            players: Mutex::new(HashSet::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Merges the backing file into the in-memory set.
    pub async fn load(&self) -> LoadSummary {
        match load_known_players(&self.path).await {
            Ok(report) => {
                let mut players = self.players.lock().await;
                let loaded = report.players.len();
                players.extend(report.players);
                info!("Loaded {} known players.", players.len());
                LoadSummary {
                    loaded,
                    invalid_lines: report.invalid_lines,
                    error: None,
                }
            }
            Err(e) => {
                error!("Failed to load known players: {}", e);
                LoadSummary {
                    error: Some(e.to_string()),
                    ..LoadSummary::default()
                }
            }
        }
    }

    pub async fn contains(&self, player_id: &PlayerId) -> bool {
        self.players.lock().await.contains(player_id)
    }

    /// Inserts `player_id`, returning `false` if it was already known.
    /// Does not persist.
    pub async fn add(&self, player_id: PlayerId) -> bool {
        self.players.lock().await.insert(player_id)
    }

    pub async fn len(&self) -> usize {
        self.players.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.players.lock().await.is_empty()
    }

    pub async fn snapshot(&self) -> HashSet<PlayerId> {
        self.players.lock().await.clone()
    }

    /// Writes the set to the backing file. Returns whether the save happened.
    pub async fn save(&self) -> bool {
        let players = self.players.lock().await;
        persist(&self.path, &players).await
    }

    /// Locks the set for a contains/add/persist sequence.
    pub async fn lock(&self) -> RegistryGuard<'_> {
        RegistryGuard {
            path: &self.path,
            players: self.players.lock().await,
        }
    }
}

/// Exclusive access to the registry contents.
pub struct RegistryGuard<'a> {
    path: &'a Path,
    players: MutexGuard<'a, HashSet<PlayerId>>,
}

impl RegistryGuard<'_> {
    pub fn contains(&self, player_id: &PlayerId) -> bool {
        self.players.contains(player_id)
    }

    pub fn add(&mut self, player_id: PlayerId) -> bool {
        self.players.insert(player_id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Writes the set while the lock is still held.
    pub async fn persist(&self) -> bool {
        persist(self.path, &self.players).await
    }
}

async fn persist(path: &Path, players: &HashSet<PlayerId>) -> bool {
    match save_known_players(path, players).await {
        Ok(()) => {
            info!("Saved {} known players.", players.len());
            true
        }
        Err(e) => {
            error!("Failed to save known players: {}", e);
            false
        }
    }
}

//! JSON persistence for homes, warps and last locations.
//!
//! Layout under the data directory:
//! - `warps.json`: array of warps
//! - `players/<uuid>.json`: one player's homes and last location

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use essentials_core::{NamedLocation, PlayerId, PlayerLocations, RegistrySnapshot};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

const WARPS_FILE: &str = "warps.json";
const PLAYERS_DIR: &str = "players";

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("player id is not usable as a file name: {0}")]
    InvalidPlayerId(String),
}

/// Reads and writes the registry snapshot as JSON files.
#[derive(Debug, Clone)]
pub struct LocationStore {
    dir: PathBuf,
}

impl LocationStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load everything on disk. A missing directory is an empty snapshot;
    /// unreadable or corrupt files are logged and skipped.
    pub fn load_all(&self) -> Result<RegistrySnapshot, PersistenceError> {
        let mut snapshot = RegistrySnapshot::default();

        let warps_path = self.dir.join(WARPS_FILE);
        if warps_path.exists() {
            match read_json::<Vec<NamedLocation>>(&warps_path) {
                Ok(warps) => snapshot.warps = warps,
                Err(e) => warn!("Failed to load {}: {e}", warps_path.display()),
            }
        }

        let players_dir = self.dir.join(PLAYERS_DIR);
        let entries = match fs::read_dir(&players_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(snapshot),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match read_json::<PlayerLocations>(&path) {
                Ok(data) => {
                    snapshot.players.insert(PlayerId::from(stem), data);
                }
                Err(e) => warn!("Failed to load {}: {e}", path.display()),
            }
        }

        info!(
            "Loaded {} warps and data for {} players from {}",
            snapshot.warps.len(),
            snapshot.players.len(),
            self.dir.display()
        );
        Ok(snapshot)
    }

    /// Write every player file and the warps file.
    pub fn save_all(&self, snapshot: &RegistrySnapshot) -> Result<(), PersistenceError> {
        self.save_warps(&snapshot.warps)?;
        for (player, data) in &snapshot.players {
            self.save_player(player, data)?;
        }
        debug!(
            "Saved {} warps and {} players",
            snapshot.warps.len(),
            snapshot.players.len()
        );
        Ok(())
    }

    pub fn save_warps(&self, warps: &[NamedLocation]) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.dir)?;
        write_json(&self.dir.join(WARPS_FILE), &warps)
    }

    pub fn save_player(
        &self,
        player: &PlayerId,
        data: &PlayerLocations,
    ) -> Result<(), PersistenceError> {
        let path = self.player_path(player)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        write_json(&path, data)
    }

    /// `None` when the player has never been saved.
    pub fn load_player(&self, player: &PlayerId) -> Result<Option<PlayerLocations>, PersistenceError> {
        let path = self.player_path(player)?;
        if !path.exists() {
            return Ok(None);
        }
        read_json(&path).map(Some)
    }

    fn player_path(&self, player: &PlayerId) -> Result<PathBuf, PersistenceError> {
        let id = player.as_str();
        let usable = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !usable {
            return Err(PersistenceError::InvalidPlayerId(id.to_string()));
        }
        Ok(self.dir.join(PLAYERS_DIR).join(format!("{id}.json")))
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, PersistenceError> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Write through a temp file so a crash never leaves a half-written file.
fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PersistenceError> {
    let json = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

//! Named location registry: per-player homes, global warps and the
//! single-slot last location used before a teleport.
//!
//! Names are keyed case-insensitively (lower-cased) while the casing last
//! supplied to `set_*` is kept for display.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::HomeLimitReached;

// ─── Types ───────────────────────────────────────────────────────────────────

/// Opaque player identity (the host's UUID string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PlayerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A position in a world with orientation. Replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    /// Namespaced world id, e.g. `minecraft:overworld`.
    pub world: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f32,
    pub pitch: f32,
}

impl LocationRecord {
    pub fn new(world: impl Into<String>, position: (f64, f64, f64), yaw: f32, pitch: f32) -> Self {
        Self {
            world: world.into(),
            x: position.0,
            y: position.1,
            z: position.2,
            yaw,
            pitch,
        }
    }

    /// Floored block coordinates.
    pub fn block_position(&self) -> (i64, i64, i64) {
        (
            self.x.floor() as i64,
            self.y.floor() as i64,
            self.z.floor() as i64,
        )
    }
}

/// A location stored under a name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedLocation {
    /// Name as the player typed it the last time it was set.
    pub name: String,
    pub location: LocationRecord,
}

/// Everything stored for one player.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerLocations {
    #[serde(default)]
    pub homes: Vec<NamedLocation>,
    #[serde(default)]
    pub last_location: Option<LocationRecord>,
}

/// Point-in-time copy of the whole registry, handed to persistence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub players: BTreeMap<PlayerId, PlayerLocations>,
    pub warps: Vec<NamedLocation>,
}

// ─── NamedMap ────────────────────────────────────────────────────────────────

/// Case-insensitive name → location map.
#[derive(Debug, Clone, Default)]
struct NamedMap {
    entries: HashMap<String, NamedLocation>,
}

fn key_of(name: &str) -> String {
    name.to_lowercase()
}

impl NamedMap {
    fn insert(&mut self, name: &str, location: LocationRecord) -> Option<NamedLocation> {
        self.entries.insert(
            key_of(name),
            NamedLocation {
                name: name.to_string(),
                location,
            },
        )
    }

    fn get(&self, name: &str) -> Option<&NamedLocation> {
        self.entries.get(&key_of(name))
    }

    fn remove(&mut self, name: &str) -> Option<NamedLocation> {
        self.entries.remove(&key_of(name))
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries in ascending case-insensitive name order.
    fn sorted(&self) -> Vec<NamedLocation> {
        let mut keyed: Vec<(&String, &NamedLocation)> = self.entries.iter().collect();
        keyed.sort_by(|a, b| a.0.cmp(b.0));
        keyed.into_iter().map(|(_, entry)| entry.clone()).collect()
    }

    fn from_entries(entries: Vec<NamedLocation>) -> Self {
        let mut map = Self::default();
        for entry in entries {
            map.insert(&entry.name, entry.location);
        }
        map
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ─── LocationRegistry ────────────────────────────────────────────────────────

/// Homes, warps and last locations, each behind its own lock.
#[derive(Debug, Default)]
pub struct LocationRegistry {
    homes: Mutex<HashMap<PlayerId, NamedMap>>,
    warps: Mutex<NamedMap>,
    last_locations: Mutex<HashMap<PlayerId, LocationRecord>>,
}

impl LocationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Homes ---

    /// Insert or overwrite a home. Returns the entry it replaced, if any.
    pub fn set_home(
        &self,
        player: &PlayerId,
        name: &str,
        location: LocationRecord,
    ) -> Option<NamedLocation> {
        debug!("set home '{name}' for {player}");
        lock(&self.homes)
            .entry(player.clone())
            .or_default()
            .insert(name, location)
    }

    /// Like [`set_home`](Self::set_home), but refuses a new name once the
    /// player has `limit` homes. Overwrites always pass; 0 means no limit.
    pub fn set_home_within(
        &self,
        player: &PlayerId,
        name: &str,
        location: LocationRecord,
        limit: usize,
    ) -> Result<Option<NamedLocation>, HomeLimitReached> {
        let mut homes = lock(&self.homes);
        let map = homes.entry(player.clone()).or_default();
        if limit > 0 && map.get(name).is_none() && map.len() >= limit {
            return Err(HomeLimitReached(limit));
        }
        debug!("set home '{name}' for {player}");
        Ok(map.insert(name, location))
    }

    pub fn get_home(&self, player: &PlayerId, name: &str) -> Option<LocationRecord> {
        lock(&self.homes)
            .get(player)
            .and_then(|homes| homes.get(name))
            .map(|entry| entry.location.clone())
    }

    /// Remove a home. `None` means there was no such home.
    pub fn delete_home(&self, player: &PlayerId, name: &str) -> Option<NamedLocation> {
        let removed = lock(&self.homes)
            .get_mut(player)
            .and_then(|homes| homes.remove(name));
        if removed.is_some() {
            debug!("deleted home '{name}' for {player}");
        }
        removed
    }

    pub fn list_homes(&self, player: &PlayerId) -> Vec<NamedLocation> {
        lock(&self.homes)
            .get(player)
            .map(NamedMap::sorted)
            .unwrap_or_default()
    }

    pub fn home_count(&self, player: &PlayerId) -> usize {
        lock(&self.homes).get(player).map_or(0, NamedMap::len)
    }

    // --- Warps ---

    pub fn set_warp(&self, name: &str, location: LocationRecord) -> Option<NamedLocation> {
        debug!("set warp '{name}'");
        lock(&self.warps).insert(name, location)
    }

    pub fn get_warp(&self, name: &str) -> Option<LocationRecord> {
        lock(&self.warps)
            .get(name)
            .map(|entry| entry.location.clone())
    }

    pub fn delete_warp(&self, name: &str) -> Option<NamedLocation> {
        let removed = lock(&self.warps).remove(name);
        if removed.is_some() {
            debug!("deleted warp '{name}'");
        }
        removed
    }

    pub fn list_warps(&self) -> Vec<NamedLocation> {
        lock(&self.warps).sorted()
    }

    // --- Last location ---

    /// Overwrite the player's pre-teleport position.
    pub fn set_last_location(&self, player: &PlayerId, location: LocationRecord) {
        lock(&self.last_locations).insert(player.clone(), location);
    }

    pub fn last_location(&self, player: &PlayerId) -> Option<LocationRecord> {
        lock(&self.last_locations).get(player).cloned()
    }

    // --- Snapshot / restore ---

    /// Copy of one player's data. Locks are released before returning.
    pub fn player_snapshot(&self, player: &PlayerId) -> PlayerLocations {
        let homes = self.list_homes(player);
        let last_location = self.last_location(player);
        PlayerLocations {
            homes,
            last_location,
        }
    }

    /// Replace one player's homes and last location.
    pub fn restore_player(&self, player: &PlayerId, data: PlayerLocations) {
        lock(&self.homes).insert(player.clone(), NamedMap::from_entries(data.homes));
        let mut last = lock(&self.last_locations);
        match data.last_location {
            Some(location) => {
                last.insert(player.clone(), location);
            }
            None => {
                last.remove(player);
            }
        }
    }

    /// Drop one player's homes and last location, returning what was held.
    pub fn remove_player(&self, player: &PlayerId) -> PlayerLocations {
        let homes = lock(&self.homes)
            .remove(player)
            .map(|map| map.sorted())
            .unwrap_or_default();
        let last_location = lock(&self.last_locations).remove(player);
        PlayerLocations {
            homes,
            last_location,
        }
    }

    /// Copy of everything. Each map is copied under its own lock.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let mut players: BTreeMap<PlayerId, PlayerLocations> = BTreeMap::new();
        {
            let homes = lock(&self.homes);
            for (player, map) in homes.iter() {
                players.entry(player.clone()).or_default().homes = map.sorted();
            }
        }
        {
            let last = lock(&self.last_locations);
            for (player, location) in last.iter() {
                players.entry(player.clone()).or_default().last_location = Some(location.clone());
            }
        }
        let warps = self.list_warps();
        RegistrySnapshot { players, warps }
    }

    /// Replace the whole registry with the contents of `snapshot`.
    pub fn restore(&self, snapshot: RegistrySnapshot) {
        let mut homes = HashMap::new();
        let mut last_locations = HashMap::new();
        for (player, data) in snapshot.players {
            if let Some(location) = data.last_location {
                last_locations.insert(player.clone(), location);
            }
            if !data.homes.is_empty() {
                homes.insert(player, NamedMap::from_entries(data.homes));
            }
        }
        *lock(&self.homes) = homes;
        *lock(&self.last_locations) = last_locations;
        *lock(&self.warps) = NamedMap::from_entries(snapshot.warps);
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

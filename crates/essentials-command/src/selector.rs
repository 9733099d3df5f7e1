//! Player argument resolution: @s, @a, @p, @r, @e, or a player name.
//!
//! Names match case-insensitively. No bracket arguments (e.g. `[r=10]`).

use std::cmp::Ordering;

use essentials_plugin_api::PluginPlayer;
use rand::Rng;

/// A parsed entity selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// @s: the command sender.
    Sender,
    /// @a: all online players.
    AllPlayers,
    /// @p: nearest player to the sender, in the sender's world.
    NearestPlayer,
    /// @r: a random online player.
    RandomPlayer,
    /// @e: all entities (players only here).
    AllEntities,
}

/// Try to parse a string as an entity selector.
///
/// Returns `None` if the string is not a valid selector.
pub fn parse_selector(s: &str) -> Option<Selector> {
    match s {
        "@s" => Some(Selector::Sender),
        "@a" => Some(Selector::AllPlayers),
        "@p" => Some(Selector::NearestPlayer),
        "@r" => Some(Selector::RandomPlayer),
        "@e" => Some(Selector::AllEntities),
        _ => None,
    }
}

/// Resolve a selector to the matching players.
pub fn resolve_selector(
    selector: Selector,
    sender: &PluginPlayer,
    players: &[PluginPlayer],
) -> Result<Vec<PluginPlayer>, String> {
    match selector {
        Selector::Sender => Ok(vec![sender.clone()]),
        Selector::AllPlayers | Selector::AllEntities => {
            if players.is_empty() {
                Err("No player was found".to_string())
            } else {
                Ok(players.to_vec())
            }
        }
        Selector::NearestPlayer => players
            .iter()
            .filter(|p| p.world == sender.world)
            .min_by(|a, b| {
                let da = distance_sq(sender.position, a.position);
                let db = distance_sq(sender.position, b.position);
                da.partial_cmp(&db).unwrap_or(Ordering::Equal)
            })
            .map(|p| vec![p.clone()])
            .ok_or_else(|| "No player was found".to_string()),
        Selector::RandomPlayer => {
            if players.is_empty() {
                Err("No player was found".to_string())
            } else {
                let idx = rand::thread_rng().gen_range(0..players.len());
                Ok(vec![players[idx].clone()])
            }
        }
    }
}

/// Resolve a target argument: a selector or a player name.
pub fn resolve_target(
    target: &str,
    sender: &PluginPlayer,
    players: &[PluginPlayer],
) -> Result<Vec<PluginPlayer>, String> {
    if let Some(selector) = parse_selector(target) {
        return resolve_selector(selector, sender, players);
    }
    players
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(target))
        .map(|p| vec![p.clone()])
        .ok_or_else(|| format!("Player not found: {target}"))
}

/// Resolve an argument that must name exactly one player.
pub fn resolve_single_player(
    target: &str,
    sender: &PluginPlayer,
    players: &[PluginPlayer],
) -> Result<PluginPlayer, String> {
    let mut matched = resolve_target(target, sender, players)?;
    if matched.len() > 1 {
        return Err("Only one player is allowed, but the provided selector allows more than one".to_string());
    }
    matched
        .pop()
        .ok_or_else(|| "No player was found".to_string())
}

fn distance_sq(a: (f64, f64, f64), b: (f64, f64, f64)) -> f64 {
    (a.0 - b.0).powi(2) + (a.1 - b.1).powi(2) + (a.2 - b.2).powi(2)
}

// ===========================================================================
// Tests
// ===========================================================================

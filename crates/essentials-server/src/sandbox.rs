//! Console-driven host with simulated players.
//!
//! Players exist only as positions. Chat sent to them is printed; teleports
//! move them. Operators type verbs at the console to play them.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use essentials_command::{parse_command_line, tokenize};
use essentials_plugin_api::{CommandResult, Plugin, PluginEvent, PluginPlayer};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::plugin_manager::{PendingAction, PluginManager, ServerSnapshot};

/// Sender name for commands typed at the console.
pub const CONSOLE: &str = "CONSOLE";
const CONSOLE_LEVEL: u8 = 4;

const HELP: &[&str] = &[
    "join <name> [world]          add a player at spawn",
    "leave <name>                 remove a player",
    "move <name> <x> <y> <z> [world]",
    "as <name> <command...>       run a command as a player",
    "/<command...>                run a command as the console",
    "op <name> [level] | deop <name>",
    "grant <name> <node> | revoke <name> <node>",
    "list                         online players",
    "stop",
];

pub struct Sandbox {
    plugins: PluginManager,
    plugins_dir: PathBuf,
    worlds: HashSet<String>,
    default_world: String,
    spawn: (f64, f64, f64),
    op_level: u8,
    players: Vec<PluginPlayer>,
    /// Keyed by lower-cased player name.
    levels: HashMap<String, u8>,
    nodes: HashMap<(String, String), bool>,
    stopping: bool,
}

impl Sandbox {
    pub fn new(config: &ServerConfig) -> Self {
        let [x, y, z] = config.world.spawn;
        let op_level = config.permissions.op_level;
        Self {
            plugins: PluginManager::new(),
            plugins_dir: PathBuf::from(&config.server.plugins_dir),
            worlds: config.world.worlds.iter().cloned().collect(),
            default_world: config.world.default_world.clone(),
            spawn: (x, y, z),
            op_level,
            players: Vec::new(),
            levels: config
                .permissions
                .ops
                .iter()
                .map(|name| (name.to_lowercase(), op_level))
                .collect(),
            nodes: HashMap::new(),
            stopping: false,
        }
    }

    pub fn register_plugin(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins.register(plugin);
    }

    /// Load plugin configs, enable plugins and announce the start.
    pub fn start(&mut self) -> Vec<String> {
        self.plugins.load_configs(&self.plugins_dir);
        let snapshot = self.snapshot();
        let mut actions = self.plugins.enable_all(&snapshot);
        let (_, started) = self.plugins.dispatch(&PluginEvent::ServerStarted, &snapshot);
        actions.extend(started);
        info!("{} commands available", self.plugins.commands().len());
        self.apply(actions)
    }

    /// One 50 ms game tick.
    pub fn tick(&mut self) -> Vec<String> {
        let snapshot = self.snapshot();
        let actions = self.plugins.tick_scheduler(&snapshot);
        self.apply(actions)
    }

    pub fn shutdown(&mut self) {
        let snapshot = self.snapshot();
        let (_, actions) = self.plugins.dispatch(&PluginEvent::ServerStopping, &snapshot);
        self.apply(actions);
        self.plugins.disable_all();
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping
    }

    pub fn player(&self, name: &str) -> Option<&PluginPlayer> {
        self.players.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Handle one console line and return what to print.
    pub fn handle_console_line(&mut self, line: &str) -> Vec<String> {
        let line = line.trim();
        if line.starts_with('/') {
            return self.run_command(CONSOLE, line);
        }
        let tokens = tokenize(line);
        let Some((verb, args)) = tokens.split_first() else {
            return Vec::new();
        };
        match (verb.as_str(), args) {
            ("join", [name]) => self.join(name, None),
            ("join", [name, world]) => self.join(name, Some(world)),
            ("leave", [name]) => self.leave(name),
            ("move", [name, x, y, z, rest @ ..]) if rest.len() <= 1 => {
                self.move_player(name, [x, y, z], rest.first())
            }
            ("as", [name, ..]) => {
                let command = skip_words(line, 2);
                match self.player(name).map(|p| p.name.clone()) {
                    Some(name) => self.run_command(&name, command),
                    None => vec![format!("{name} is not online")],
                }
            }
            ("op", [name]) => self.set_level(name, self.op_level),
            ("op", [name, level]) => match level.parse::<u8>() {
                Ok(level) => self.set_level(name, level),
                Err(_) => vec![format!("Invalid level: {level}")],
            },
            ("deop", [name]) => self.set_level(name, 0),
            ("grant", [name, node]) => self.set_node(name, node, true),
            ("revoke", [name, node]) => self.set_node(name, node, false),
            ("list", []) => self.list(),
            ("help", []) => HELP.iter().map(|s| s.to_string()).collect(),
            ("stop", []) => {
                self.stopping = true;
                vec!["Stopping...".into()]
            }
            _ => vec![format!("Unknown or malformed input: {line}. Type help.")],
        }
    }

    /// Permissions are handed to plugins under the online players' own names.
    fn snapshot(&self) -> ServerSnapshot {
        let mut levels = HashMap::new();
        let mut nodes = HashMap::new();
        for player in &self.players {
            let key = player.name.to_lowercase();
            if let Some(level) = self.levels.get(&key) {
                levels.insert(player.name.clone(), *level);
            }
            for ((name, node), granted) in &self.nodes {
                if *name == key {
                    nodes.insert((player.name.clone(), node.clone()), *granted);
                }
            }
        }
        levels.insert(CONSOLE.into(), CONSOLE_LEVEL);
        ServerSnapshot {
            players: self.players.clone(),
            worlds: self.worlds.clone(),
            levels,
            nodes,
        }
    }

    fn join(&mut self, name: &str, world: Option<&String>) -> Vec<String> {
        if self.player(name).is_some() {
            return vec![format!("{name} is already online")];
        }
        let world = world.cloned().unwrap_or_else(|| self.default_world.clone());
        if !self.worlds.contains(&world) {
            return vec![format!("Unknown world: {world}")];
        }
        let player = PluginPlayer {
            name: name.to_string(),
            uuid: offline_uuid(name),
            world,
            position: self.spawn,
            yaw: 0.0,
            pitch: 0.0,
        };
        info!("{} joined ({})", player.name, player.uuid);
        self.players.push(player.clone());

        let snapshot = self.snapshot();
        let (_, actions) = self.plugins.dispatch(&PluginEvent::PlayerJoin { player }, &snapshot);
        let mut out = vec![format!("{name} joined the game")];
        out.extend(self.apply(actions));
        out
    }

    fn leave(&mut self, name: &str) -> Vec<String> {
        let Some(index) = self
            .players
            .iter()
            .position(|p| p.name.eq_ignore_ascii_case(name))
        else {
            return vec![format!("{name} is not online")];
        };
        let snapshot = self.snapshot();
        let player = self.players.remove(index);
        info!("{} left", player.name);
        let out = format!("{} left the game", player.name);
        let (_, actions) = self.plugins.dispatch(&PluginEvent::PlayerQuit { player }, &snapshot);
        let mut out = vec![out];
        out.extend(self.apply(actions));
        out
    }

    fn move_player(&mut self, name: &str, coords: [&String; 3], world: Option<&String>) -> Vec<String> {
        let parsed: Result<Vec<f64>, _> = coords.iter().map(|c| c.parse::<f64>()).collect();
        let Ok(parsed) = parsed else {
            return vec!["Coordinates must be numbers".into()];
        };
        if let Some(world) = world {
            if !self.worlds.contains(world.as_str()) {
                return vec![format!("Unknown world: {world}")];
            }
        }
        let Some(player) = self
            .players
            .iter_mut()
            .find(|p| p.name.eq_ignore_ascii_case(name))
        else {
            return vec![format!("{name} is not online")];
        };
        player.position = (parsed[0], parsed[1], parsed[2]);
        if let Some(world) = world {
            player.world = world.clone();
        }
        vec![describe(player)]
    }

    fn set_level(&mut self, name: &str, level: u8) -> Vec<String> {
        let key = name.to_lowercase();
        if level == 0 {
            self.levels.remove(&key);
        } else {
            self.levels.insert(key, level);
        }
        vec![format!("{name} now has operator level {level}")]
    }

    /// `revoke` records an explicit denial, which beats operator level.
    fn set_node(&mut self, name: &str, node: &str, granted: bool) -> Vec<String> {
        self.nodes
            .insert((name.to_lowercase(), node.to_string()), granted);
        let verb = if granted { "granted" } else { "denied" };
        vec![format!("{node} {verb} for {name}")]
    }

    fn list(&self) -> Vec<String> {
        let mut out = vec![format!("{} players online", self.players.len())];
        out.extend(self.players.iter().map(describe));
        out
    }

    fn run_command(&mut self, sender: &str, line: &str) -> Vec<String> {
        let Some((name, args)) = parse_command_line(line) else {
            return Vec::new();
        };
        debug!("{sender} issued /{name}");
        let snapshot = self.snapshot();
        let (response, actions) = self
            .plugins
            .handle_command(&name, &args, sender, &snapshot);
        let response = response.unwrap_or_else(|| CommandResult::err(format!("Unknown command: {name}.")));

        let mut out: Vec<String> = response
            .messages
            .iter()
            .map(|m| reply_line(sender, response.success, m))
            .collect();
        out.extend(self.apply(actions));
        out
    }

    /// Carry out deferred plugin actions, returning the lines to print.
    fn apply(&mut self, actions: Vec<PendingAction>) -> Vec<String> {
        let mut out = Vec::new();
        for action in actions {
            match action {
                PendingAction::SendMessage {
                    player_name,
                    message,
                } => out.push(format!("[to {player_name}] {}", plain(&message))),
                PendingAction::TeleportPlayer {
                    player_name,
                    target,
                } => {
                    if !self.worlds.contains(&target.world) {
                        warn!("Teleport of {player_name} to unknown world {}", target.world);
                        continue;
                    }
                    let Some(player) = self.players.iter_mut().find(|p| p.name == player_name) else {
                        debug!("Teleport of offline player {player_name} skipped");
                        continue;
                    };
                    player.world = target.world;
                    player.position = (target.x, target.y, target.z);
                    player.yaw = target.yaw;
                    player.pitch = target.pitch;
                    out.push(format!("* {}", describe(player)));
                }
                other => debug!("Unhandled plugin action: {other:?}"),
            }
        }
        out
    }
}

/// `line` without its first `count` whitespace-separated words.
fn skip_words(line: &str, count: usize) -> &str {
    let mut rest = line.trim_start();
    for _ in 0..count {
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        rest = rest[end..].trim_start();
    }
    rest
}

fn reply_line(sender: &str, success: bool, message: &str) -> String {
    let marker = if success { "" } else { "(error) " };
    format!("[to {sender}] {marker}{}", plain(message))
}

fn describe(player: &PluginPlayer) -> String {
    let (x, y, z) = player.position;
    format!("{} is in {} at {x:.1}, {y:.1}, {z:.1}", player.name, player.world)
}

/// Strip `§x` formatting codes.
fn plain(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '§' {
            chars.next();
        } else {
            out.push(c);
        }
    }
    out
}

/// Offline-mode id: the same name always maps to the same UUID, so saved
/// player data is found again after a rejoin or restart.
fn offline_uuid(name: &str) -> String {
    let seed = format!("OfflinePlayer:{}", name.to_lowercase());
    Uuid::new_v3(&Uuid::NAMESPACE_OID, seed.as_bytes()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use essentials_plugin::EssentialsPlugin;
    use std::fs;

    fn sandbox() -> (Sandbox, PathBuf) {
        let root = std::env::temp_dir().join(format!("essentials_sandbox_{}", rand::random::<u64>()));
        let config: ServerConfig = toml::from_str(&format!(
            r#"
            [server]
            name = "Test"
            plugins_dir = "{}"

            [world]
            spawn = [0.5, 64.0, 0.5]

            [logging]
            level = "info"

            [permissions]
            ops = ["Admin"]
        "#,
            root.join("plugins").display()
        ))
        .unwrap();

        let plugin_dir = root.join("plugins").join("Essentials");
        fs::create_dir_all(&plugin_dir).unwrap();
        fs::write(
            plugin_dir.join("config.json"),
            serde_json::json!({ "data_dir": root.join("data") }).to_string(),
        )
        .unwrap();

        let mut sandbox = Sandbox::new(&config);
        sandbox.register_plugin(Box::new(EssentialsPlugin::new()));
        sandbox.start();
        (sandbox, root)
    }

    #[test]
    fn plain_strips_formatting_codes() {
        assert_eq!(plain("§a§lok§r done"), "ok done");
        assert_eq!(plain("trailing§"), "trailing");
    }

    #[test]
    fn skip_words_tolerates_extra_spaces() {
        assert_eq!(skip_words("as  Steve   /home base", 2), "/home base");
        assert_eq!(skip_words("as Steve", 2), "");
    }

    #[test]
    fn offline_uuid_is_stable_per_name() {
        let uuid = offline_uuid("Steve");
        assert_eq!(uuid, offline_uuid("steve"));
        assert_ne!(uuid, offline_uuid("Alex"));
        let parsed = Uuid::parse_str(&uuid).unwrap();
        assert_eq!(parsed.get_version_num(), 3);
    }

    #[test]
    fn homes_survive_leave_and_rejoin() {
        let (mut sb, root) = sandbox();
        sb.handle_console_line("join Steve");
        sb.handle_console_line("as Steve /sethome base");
        sb.handle_console_line("leave Steve");
        sb.handle_console_line("join Steve");

        let out = sb.handle_console_line("as Steve /home base");
        assert_eq!(out[0], "[to Steve] Teleported to home: base");
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn op_and_grant_ignore_name_casing() {
        let (mut sb, root) = sandbox();
        sb.handle_console_line("join Steve");
        sb.handle_console_line("join Alex");

        sb.handle_console_line("op steve");
        assert!(sb.handle_console_line("as steve /setwarp spawn")[0].contains("Warp 'spawn' set"));

        sb.handle_console_line("grant ALEX essentials.setwarp");
        assert!(sb.handle_console_line("as Alex /setwarp mine")[0].contains("Warp 'mine' set"));

        sb.handle_console_line("deop STEVE");
        assert!(sb.handle_console_line("as Steve /setwarp other")[0].contains("(error)"));
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn join_move_and_list() {
        let (mut sb, root) = sandbox();
        assert_eq!(sb.handle_console_line("join Steve")[0], "Steve joined the game");
        assert!(sb.handle_console_line("join steve")[0].contains("already online"));
        assert!(sb.handle_console_line("join Alex minecraft:moon")[0].contains("Unknown world"));

        sb.handle_console_line("move Steve 10 70 -5 minecraft:the_nether");
        let steve = sb.player("Steve").unwrap();
        assert_eq!(steve.world, "minecraft:the_nether");
        assert_eq!(steve.position, (10.0, 70.0, -5.0));

        let list = sb.handle_console_line("list");
        assert_eq!(list[0], "1 players online");
        assert!(list[1].contains("Steve is in minecraft:the_nether"));
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn home_round_trip_through_console() {
        let (mut sb, root) = sandbox();
        sb.handle_console_line("join Steve");
        sb.handle_console_line("move Steve 100 70 100");

        let out = sb.handle_console_line("as Steve /sethome \"my base\"");
        assert_eq!(out, vec!["[to Steve] Home 'my base' set"]);

        sb.handle_console_line("move Steve 0 64 0");
        let out = sb.handle_console_line("as steve home \"MY BASE\"");
        assert_eq!(out[0], "[to Steve] Teleported to home: MY BASE");
        assert!(out[1].starts_with("* Steve is in minecraft:overworld at 100.0, 70.0, 100.0"));
        assert_eq!(sb.player("Steve").unwrap().position, (100.0, 70.0, 100.0));
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn ops_and_nodes_gate_warps() {
        let (mut sb, root) = sandbox();
        sb.handle_console_line("join Admin");
        sb.handle_console_line("join Steve");

        let out = sb.handle_console_line("as Steve /setwarp spawn");
        assert!(out[0].contains("(error)"));
        assert!(sb.handle_console_line("as Admin /setwarp spawn")[0].contains("Warp 'spawn' set"));

        sb.handle_console_line("grant Steve essentials.setwarp");
        assert!(sb.handle_console_line("as Steve /setwarp mine")[0].contains("set"));

        sb.handle_console_line("revoke Admin essentials.setwarp");
        assert!(sb.handle_console_line("as Admin /setwarp other")[0].contains("(error)"));

        sb.handle_console_line("op Steve 1");
        sb.handle_console_line("deop Steve");
        assert!(sb.handle_console_line("/delwarp mine")[0].contains("Warp 'mine' deleted"));
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn tpa_flow_between_two_players() {
        let (mut sb, root) = sandbox();
        sb.handle_console_line("join Steve");
        sb.handle_console_line("join Alex minecraft:the_end");

        let out = sb.handle_console_line("as Steve /tpa Alex");
        assert!(out.contains(&"[to Steve] Teleport request sent to Alex".to_string()));
        assert!(out.contains(&"[to Alex] Steve has requested to teleport to you.".to_string()));

        let out = sb.handle_console_line("as Alex /tpaccept");
        assert!(out.contains(&"[to Alex] Accepted teleport request from Steve".to_string()));
        assert_eq!(sb.player("Steve").unwrap().world, "minecraft:the_end");
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn unknown_command_and_verbs() {
        let (mut sb, root) = sandbox();
        sb.handle_console_line("join Steve");
        assert_eq!(
            sb.handle_console_line("as Steve /fly"),
            vec!["[to Steve] (error) Unknown command: fly."]
        );
        assert!(sb.handle_console_line("dance")[0].contains("Type help"));
        assert!(sb.handle_console_line("as Nobody /homes")[0].contains("not online"));
        assert!(sb.handle_console_line("help").len() > 5);
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn leave_saves_player_data_and_stop_sets_flag() {
        let (mut sb, root) = sandbox();
        sb.handle_console_line("join Steve");
        sb.handle_console_line("as Steve /sethome");
        sb.handle_console_line("leave Steve");
        assert!(sb.player("Steve").is_none());

        let saved = fs::read_dir(root.join("data").join("players")).unwrap().count();
        assert_eq!(saved, 1);

        assert!(!sb.is_stopping());
        sb.handle_console_line("stop");
        assert!(sb.is_stopping());
        sb.shutdown();
        assert!(root.join("data").join("warps.json").exists());
        fs::remove_dir_all(&root).ok();
    }
}

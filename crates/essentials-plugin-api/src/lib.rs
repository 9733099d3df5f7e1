//! Plugin API: traits, events, and server API shared by the host and plugins.
//!
//! This crate defines the boundary between a host game server and the
//! plugins it loads. It has no dependency on the plugin implementations.

// ─── Types ───────────────────────────────────────────────────────────────────

/// Snapshot of an online player, supplied by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginPlayer {
    pub name: String,
    pub uuid: String,
    /// Namespaced world id, e.g. `minecraft:overworld`.
    pub world: String,
    pub position: (f64, f64, f64),
    pub yaw: f32,
    pub pitch: f32,
}

/// Where to move a player.
#[derive(Debug, Clone, PartialEq)]
pub struct TeleportTarget {
    pub world: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f32,
    pub pitch: f32,
}

impl TeleportTarget {
    /// The player's current spot with someone else's orientation.
    pub fn at_player(player: &PluginPlayer, yaw: f32, pitch: f32) -> Self {
        Self {
            world: player.world.clone(),
            x: player.position.0,
            y: player.position.1,
            z: player.position.2,
            yaw,
            pitch,
        }
    }
}

/// Result of dispatching an event to a plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    /// Continue normal handling.
    Continue,
    /// Event was cancelled by this plugin.
    Cancelled,
}

/// Outcome of a command, shown to the sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub success: bool,
    pub messages: Vec<String>,
}

impl CommandResult {
    /// A successful result with a single message.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            messages: vec![message.into()],
        }
    }

    /// A failed result with a single message.
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            messages: vec![message.into()],
        }
    }

    /// A successful result with several lines.
    pub fn lines(messages: Vec<String>) -> Self {
        Self {
            success: true,
            messages,
        }
    }
}

// ─── Events ──────────────────────────────────────────────────────────────────

/// Events delivered to plugins.
#[derive(Debug, Clone)]
pub enum PluginEvent {
    PlayerJoin { player: PluginPlayer },
    PlayerQuit { player: PluginPlayer },
    ServerStarted,
    ServerStopping,
}

// ─── Plugin trait ────────────────────────────────────────────────────────────

/// Metadata about a plugin.
#[derive(Debug, Clone)]
pub struct PluginInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
}

/// Implemented by every plugin the host loads.
pub trait Plugin: Send {
    /// Return plugin metadata.
    fn info(&self) -> PluginInfo;

    /// Called when the plugin is loaded. Use `api` to register commands, schedule tasks.
    fn on_enable(&mut self, api: &mut dyn ServerApi);

    /// Called when the plugin is unloaded.
    fn on_disable(&mut self) {}

    /// Called for every dispatched event.
    fn on_event(&mut self, event: &PluginEvent, api: &mut dyn ServerApi) -> EventResult {
        let _ = (event, api);
        EventResult::Continue
    }

    /// Called when a scheduled task fires.
    fn on_task(&mut self, task_id: u32, api: &mut dyn ServerApi) {
        let _ = (task_id, api);
    }

    /// Called when a plugin-registered command is executed by `sender`.
    fn on_command(
        &mut self,
        command: &str,
        args: &[String],
        sender: &str,
        api: &mut dyn ServerApi,
    ) -> Option<CommandResult> {
        let _ = (command, args, sender, api);
        None
    }

    /// Return a default config as JSON. If `Some`, the plugin gets a config file.
    fn default_config(&self) -> Option<serde_json::Value> {
        None
    }

    /// Called with the loaded config (from `plugins/<name>/config.json`).
    fn load_config(&mut self, _config: serde_json::Value) {}
}

// ─── Server API ──────────────────────────────────────────────────────────────

/// Access to host state during plugin callbacks.
///
/// Read methods answer immediately. Write methods may be deferred by the host
/// until the callback returns.
pub trait ServerApi {
    // --- Players ---
    fn online_players(&self) -> Vec<PluginPlayer>;
    fn get_player(&self, name: &str) -> Option<PluginPlayer>;
    fn get_player_by_uuid(&self, uuid: &str) -> Option<PluginPlayer>;
    fn send_message(&mut self, player_name: &str, message: &str);
    fn teleport_player(&mut self, player_name: &str, target: TeleportTarget);

    // --- Worlds ---
    fn world_exists(&self, world: &str) -> bool;

    // --- Permissions ---
    /// Operator level, 0 for regular players.
    fn permission_level(&self, player_name: &str) -> u8;
    /// Explicit grant or denial of a permission node, `None` if unset.
    fn permission_node(&self, player_name: &str, node: &str) -> Option<bool>;

    // --- Scheduler ---
    fn schedule_repeating(
        &mut self,
        plugin_name: &str,
        delay_ticks: u64,
        interval_ticks: u64,
        task_id: u32,
    );
    fn cancel_task(&mut self, plugin_name: &str, task_id: u32);

    // --- Commands ---
    fn register_command(&mut self, name: &str, description: &str, plugin_name: &str);
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn test_player() -> PluginPlayer {
        PluginPlayer {
            name: "TestPlayer".into(),
            uuid: "00000000-0000-0000-0000-000000000001".into(),
            world: "minecraft:overworld".into(),
            position: (0.5, 65.0, 0.5),
            yaw: 45.0,
            pitch: 0.0,
        }
    }

    // Minimal ServerApi implementation for testing.
    struct MockApi {
        messages: Vec<(String, String)>,
        commands: Vec<(String, String)>,
        teleports: Vec<(String, TeleportTarget)>,
    }

    impl MockApi {
        fn new() -> Self {
            Self {
                messages: Vec::new(),
                commands: Vec::new(),
                teleports: Vec::new(),
            }
        }
    }

    impl ServerApi for MockApi {
        fn online_players(&self) -> Vec<PluginPlayer> {
            vec![test_player()]
        }
        fn get_player(&self, name: &str) -> Option<PluginPlayer> {
            (name == "TestPlayer").then(test_player)
        }
        fn get_player_by_uuid(&self, uuid: &str) -> Option<PluginPlayer> {
            Some(test_player()).filter(|p| p.uuid == uuid)
        }
        fn send_message(&mut self, player_name: &str, message: &str) {
            self.messages
                .push((player_name.to_string(), message.to_string()));
        }
        fn teleport_player(&mut self, player_name: &str, target: TeleportTarget) {
            self.teleports.push((player_name.to_string(), target));
        }
        fn world_exists(&self, world: &str) -> bool {
            world == "minecraft:overworld"
        }
        fn permission_level(&self, _player_name: &str) -> u8 {
            0
        }
        fn permission_node(&self, _player_name: &str, _node: &str) -> Option<bool> {
            None
        }
        fn schedule_repeating(
            &mut self,
            _plugin_name: &str,
            _delay_ticks: u64,
            _interval_ticks: u64,
            _task_id: u32,
        ) {
        }
        fn cancel_task(&mut self, _plugin_name: &str, _task_id: u32) {}
        fn register_command(&mut self, name: &str, description: &str, _plugin_name: &str) {
            self.commands
                .push((name.to_string(), description.to_string()));
        }
    }

    // Sends a player back to spawn on `/spawn`.
    struct SpawnPlugin {
        spawn: (f64, f64, f64),
    }

    impl Plugin for SpawnPlugin {
        fn info(&self) -> PluginInfo {
            PluginInfo {
                name: "SpawnPlugin".into(),
                version: "1.0.0".into(),
                description: "Teleports players to spawn".into(),
                author: "Test".into(),
            }
        }

        fn on_enable(&mut self, api: &mut dyn ServerApi) {
            api.register_command("spawn", "Go to spawn", "SpawnPlugin");
        }

        fn on_event(&mut self, event: &PluginEvent, api: &mut dyn ServerApi) -> EventResult {
            if let PluginEvent::PlayerJoin { player } = event {
                api.send_message(&player.name, &format!("Welcome, {}!", player.name));
            }
            EventResult::Continue
        }

        fn on_command(
            &mut self,
            command: &str,
            _args: &[String],
            sender: &str,
            api: &mut dyn ServerApi,
        ) -> Option<CommandResult> {
            if command != "spawn" {
                return None;
            }
            let Some(player) = api.get_player(sender) else {
                return Some(CommandResult::err("Players only"));
            };
            let (x, y, z) = self.spawn;
            api.teleport_player(
                &player.name,
                TeleportTarget {
                    world: "minecraft:overworld".into(),
                    x,
                    y,
                    z,
                    yaw: player.yaw,
                    pitch: player.pitch,
                },
            );
            Some(CommandResult::ok("Teleported to spawn"))
        }

        fn default_config(&self) -> Option<serde_json::Value> {
            Some(serde_json::json!({ "spawn": [0.5, 64.0, 0.5] }))
        }
    }

    #[test]
    fn plugin_on_enable_registers_command() {
        let mut plugin = SpawnPlugin { spawn: (0.0, 64.0, 0.0) };
        let mut api = MockApi::new();
        plugin.on_enable(&mut api);
        assert_eq!(api.commands, vec![("spawn".into(), "Go to spawn".into())]);
    }

    #[test]
    fn plugin_greets_on_join() {
        let mut plugin = SpawnPlugin { spawn: (0.0, 64.0, 0.0) };
        let mut api = MockApi::new();
        let event = PluginEvent::PlayerJoin {
            player: test_player(),
        };
        assert_eq!(plugin.on_event(&event, &mut api), EventResult::Continue);
        assert_eq!(api.messages.len(), 1);
        assert!(api.messages[0].1.contains("Welcome"));
    }

    #[test]
    fn plugin_command_teleports_sender() {
        let mut plugin = SpawnPlugin { spawn: (1.0, 70.0, 2.0) };
        let mut api = MockApi::new();
        let result = plugin
            .on_command("spawn", &[], "TestPlayer", &mut api)
            .unwrap();
        assert!(result.success);
        assert_eq!(api.teleports.len(), 1);
        assert_eq!(api.teleports[0].1.y, 70.0);
        assert_eq!(api.teleports[0].1.yaw, 45.0);
    }

    #[test]
    fn plugin_command_from_unknown_sender_fails() {
        let mut plugin = SpawnPlugin { spawn: (0.0, 64.0, 0.0) };
        let mut api = MockApi::new();
        let result = plugin.on_command("spawn", &[], "Ghost", &mut api).unwrap();
        assert!(!result.success);
        assert!(api.teleports.is_empty());
    }

    #[test]
    fn default_hooks_are_noops() {
        let mut plugin = SpawnPlugin { spawn: (0.0, 64.0, 0.0) };
        let mut api = MockApi::new();
        assert!(plugin.on_command("other", &[], "TestPlayer", &mut api).is_none());
        plugin.on_task(1, &mut api);
        assert!(api.messages.is_empty());
        assert!(plugin.default_config().is_some());
    }

    #[test]
    fn teleport_target_keeps_given_orientation() {
        let target = TeleportTarget::at_player(&test_player(), 180.0, -10.0);
        assert_eq!(target.world, "minecraft:overworld");
        assert_eq!((target.x, target.y, target.z), (0.5, 65.0, 0.5));
        assert_eq!((target.yaw, target.pitch), (180.0, -10.0));
    }

    #[test]
    fn command_result_helpers() {
        let ok = CommandResult::ok("done");
        assert!(ok.success);
        assert_eq!(ok.messages, vec!["done".to_string()]);
        let err = CommandResult::err("failed");
        assert!(!err.success);
        let lines = CommandResult::lines(vec!["a".into(), "b".into()]);
        assert!(lines.success);
        assert_eq!(lines.messages.len(), 2);
    }
}

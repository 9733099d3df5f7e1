//! Plugin manager: loads, enables, and dispatches events to plugins.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use essentials_plugin_api::{
    CommandResult, EventResult, Plugin, PluginEvent, PluginPlayer, ServerApi,
    TeleportTarget,
};
use tracing::{info, warn};

// ─── Types ───────────────────────────────────────────────────────────────────

/// A repeating task owned by a plugin.
#[derive(Debug)]
pub struct ScheduledTask {
    pub plugin_name: String,
    pub task_id: u32,
    pub remaining_ticks: u64,
    pub interval: u64,
}

/// Host state for plugin API reads, built before each dispatch.
#[derive(Debug, Default)]
pub struct ServerSnapshot {
    pub players: Vec<PluginPlayer>,
    pub worlds: HashSet<String>,
    /// Operator levels by player name.
    pub levels: HashMap<String, u8>,
    /// Explicit permission nodes by (player name, node).
    pub nodes: HashMap<(String, String), bool>,
}

/// Deferred side-effect requested by a plugin during a callback.
#[derive(Debug)]
pub enum PendingAction {
    SendMessage {
        player_name: String,
        message: String,
    },
    TeleportPlayer {
        player_name: String,
        target: TeleportTarget,
    },
    RegisterCommand {
        name: String,
        description: String,
        plugin_name: String,
    },
    ScheduleTask {
        task: ScheduledTask,
    },
    CancelTask {
        plugin_name: String,
        task_id: u32,
    },
}

// ─── ServerApiImpl ───────────────────────────────────────────────────────────

/// Implements `ServerApi` using a snapshot for reads and accumulating PendingActions for writes.
struct ServerApiImpl<'a> {
    snapshot: &'a ServerSnapshot,
    actions: Vec<PendingAction>,
}

impl<'a> ServerApiImpl<'a> {
    fn new(snapshot: &'a ServerSnapshot) -> Self {
        Self {
            snapshot,
            actions: Vec::new(),
        }
    }

    fn take_actions(self) -> Vec<PendingAction> {
        self.actions
    }
}

impl ServerApi for ServerApiImpl<'_> {
    fn online_players(&self) -> Vec<PluginPlayer> {
        self.snapshot.players.clone()
    }

    fn get_player(&self, name: &str) -> Option<PluginPlayer> {
        self.snapshot
            .players
            .iter()
            .find(|p| p.name == name)
            .cloned()
    }

    fn get_player_by_uuid(&self, uuid: &str) -> Option<PluginPlayer> {
        self.snapshot
            .players
            .iter()
            .find(|p| p.uuid == uuid)
            .cloned()
    }

    fn send_message(&mut self, player_name: &str, message: &str) {
        self.actions.push(PendingAction::SendMessage {
            player_name: player_name.to_string(),
            message: message.to_string(),
        });
    }

    fn teleport_player(&mut self, player_name: &str, target: TeleportTarget) {
        self.actions.push(PendingAction::TeleportPlayer {
            player_name: player_name.to_string(),
            target,
        });
    }

    fn world_exists(&self, world: &str) -> bool {
        self.snapshot.worlds.contains(world)
    }

    fn permission_level(&self, player_name: &str) -> u8 {
        self.snapshot.levels.get(player_name).copied().unwrap_or(0)
    }

    fn permission_node(&self, player_name: &str, node: &str) -> Option<bool> {
        self.snapshot
            .nodes
            .get(&(player_name.to_string(), node.to_string()))
            .copied()
    }

    fn schedule_repeating(
        &mut self,
        plugin_name: &str,
        delay_ticks: u64,
        interval_ticks: u64,
        task_id: u32,
    ) {
        self.actions.push(PendingAction::ScheduleTask {
            task: ScheduledTask {
                plugin_name: plugin_name.to_string(),
                task_id,
                remaining_ticks: delay_ticks,
                interval: interval_ticks.max(1),
            },
        });
    }

    fn cancel_task(&mut self, plugin_name: &str, task_id: u32) {
        self.actions.push(PendingAction::CancelTask {
            plugin_name: plugin_name.to_string(),
            task_id,
        });
    }

    fn register_command(&mut self, name: &str, description: &str, plugin_name: &str) {
        self.actions.push(PendingAction::RegisterCommand {
            name: name.to_string(),
            description: description.to_string(),
            plugin_name: plugin_name.to_string(),
        });
    }
}

// ─── PluginManager ───────────────────────────────────────────────────────────

/// Manages all loaded plugins, their scheduled tasks, and command registrations.
///
/// Every entry point applies scheduler and command actions itself and hands
/// back the rest (messages, teleports) for the host to carry out.
#[derive(Default)]
pub struct PluginManager {
    plugins: Vec<Box<dyn Plugin>>,
    tasks: Vec<ScheduledTask>,
    /// Commands registered by plugins: command_name → (plugin_name, description).
    plugin_commands: HashMap<String, (String, String)>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin (call before enable_all).
    pub fn register(&mut self, plugin: Box<dyn Plugin>) {
        info!("Registered plugin: {}", plugin.info().name);
        self.plugins.push(plugin);
    }

    /// Enable all registered plugins.
    pub fn enable_all(&mut self, snapshot: &ServerSnapshot) -> Vec<PendingAction> {
        let mut all_actions = Vec::new();
        for plugin in &mut self.plugins {
            let mut api = ServerApiImpl::new(snapshot);
            plugin.on_enable(&mut api);
            let info = plugin.info();
            info!("Enabled {} v{}", info.name, info.version);
            all_actions.extend(api.take_actions());
        }
        self.apply_internal_actions(all_actions)
    }

    /// Disable all registered plugins.
    pub fn disable_all(&mut self) {
        for plugin in &mut self.plugins {
            plugin.on_disable();
        }
    }

    /// Dispatch an event to all plugins. Propagation stops at the first plugin
    /// that cancels it.
    pub fn dispatch(
        &mut self,
        event: &PluginEvent,
        snapshot: &ServerSnapshot,
    ) -> (EventResult, Vec<PendingAction>) {
        let mut all_actions = Vec::new();
        let mut final_result = EventResult::Continue;

        for plugin in &mut self.plugins {
            let mut api = ServerApiImpl::new(snapshot);
            let result = plugin.on_event(event, &mut api);
            all_actions.extend(api.take_actions());

            if result == EventResult::Cancelled {
                final_result = EventResult::Cancelled;
                break;
            }
        }

        (final_result, self.apply_internal_actions(all_actions))
    }

    /// Tick the scheduler. Returns pending actions from fired tasks.
    pub fn tick_scheduler(&mut self, snapshot: &ServerSnapshot) -> Vec<PendingAction> {
        let mut all_actions = Vec::new();
        let mut fired: Vec<(String, u32)> = Vec::new();

        for task in &mut self.tasks {
            task.remaining_ticks = task.remaining_ticks.saturating_sub(1);
            if task.remaining_ticks == 0 {
                fired.push((task.plugin_name.clone(), task.task_id));
                task.remaining_ticks = task.interval;
            }
        }

        for (plugin_name, task_id) in fired {
            if let Some(plugin) = self
                .plugins
                .iter_mut()
                .find(|p| p.info().name == plugin_name)
            {
                let mut api = ServerApiImpl::new(snapshot);
                plugin.on_task(task_id, &mut api);
                all_actions.extend(api.take_actions());
            }
        }

        self.apply_internal_actions(all_actions)
    }

    /// Route a command to the plugin that registered it. `None` when no
    /// plugin owns `command`.
    pub fn handle_command(
        &mut self,
        command: &str,
        args: &[String],
        sender: &str,
        snapshot: &ServerSnapshot,
    ) -> (Option<CommandResult>, Vec<PendingAction>) {
        let Some((plugin_name, _)) = self.plugin_commands.get(command) else {
            return (None, Vec::new());
        };
        let plugin_name = plugin_name.clone();

        let Some(plugin) = self
            .plugins
            .iter_mut()
            .find(|p| p.info().name == plugin_name)
        else {
            return (None, Vec::new());
        };
        let mut api = ServerApiImpl::new(snapshot);
        let response = plugin.on_command(command, args, sender, &mut api);
        let actions = api.take_actions();
        (response, self.apply_internal_actions(actions))
    }

    /// Registered commands and their descriptions, sorted by name.
    pub fn commands(&self) -> Vec<(&str, &str)> {
        let mut commands: Vec<_> = self
            .plugin_commands
            .iter()
            .map(|(name, (_, description))| (name.as_str(), description.as_str()))
            .collect();
        commands.sort();
        commands
    }

    /// Load `<dir>/<plugin>/config.json` for every plugin that has a config,
    /// writing the default when the file is missing.
    pub fn load_configs(&mut self, dir: &Path) {
        for plugin in &mut self.plugins {
            let info = plugin.info();
            let Some(default_config) = plugin.default_config() else {
                continue;
            };
            let plugin_dir = dir.join(&info.name);
            let config_path = plugin_dir.join("config.json");

            let config = if config_path.exists() {
                match fs::read_to_string(&config_path) {
                    Ok(data) => match serde_json::from_str(&data) {
                        Ok(v) => v,
                        Err(e) => {
                            warn!("Failed to parse config for {}: {e}", info.name);
                            default_config
                        }
                    },
                    Err(e) => {
                        warn!("Failed to read config for {}: {e}", info.name);
                        default_config
                    }
                }
            } else {
                if let Err(e) = write_default_config(&plugin_dir, &config_path, &default_config) {
                    warn!("Failed to write default config for {}: {e}", info.name);
                }
                default_config
            };

            plugin.load_config(config);
        }
    }

    /// Apply command and scheduler actions; return the ones the host must handle.
    fn apply_internal_actions(&mut self, actions: Vec<PendingAction>) -> Vec<PendingAction> {
        let mut external = Vec::new();
        for action in actions {
            match action {
                PendingAction::RegisterCommand {
                    name,
                    description,
                    plugin_name,
                } => {
                    if let Some((owner, _)) = self.plugin_commands.get(&name) {
                        warn!("/{name} from {plugin_name} replaces the one from {owner}");
                    }
                    self.plugin_commands.insert(name, (plugin_name, description));
                }
                PendingAction::ScheduleTask { task } => {
                    self.tasks
                        .retain(|t| !(t.plugin_name == task.plugin_name && t.task_id == task.task_id));
                    self.tasks.push(task);
                }
                PendingAction::CancelTask {
                    plugin_name,
                    task_id,
                } => {
                    self.tasks
                        .retain(|t| !(t.plugin_name == plugin_name && t.task_id == task_id));
                }
                other => external.push(other),
            }
        }
        external
    }
}

fn write_default_config(
    plugin_dir: &Path,
    config_path: &Path,
    config: &serde_json::Value,
) -> std::io::Result<()> {
    fs::create_dir_all(plugin_dir)?;
    let json = serde_json::to_string_pretty(config)?;
    fs::write(config_path, json)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

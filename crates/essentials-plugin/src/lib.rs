//! Homes, warps and teleport requests for players.
//!
//! [`EssentialsPlugin`] plugs into any host through the plugin API. State lives
//! in [`Essentials`]; command handlers only borrow it.

mod commands;
pub mod config;
pub mod persistence;
pub mod text;

use std::sync::Arc;

use essentials_command::{CommandContext, CommandRegistry, CommandResult};
use essentials_core::{Clock, LocationRegistry, MonotonicClock, PlayerId, TeleportRequestBroker};
use essentials_plugin_api::{EventResult, Plugin, PluginEvent, PluginInfo, ServerApi};
use tracing::{debug, info, warn};

pub use config::EssentialsConfig;
pub use persistence::{LocationStore, PersistenceError};

pub const PLUGIN_NAME: &str = "Essentials";

const AUTOSAVE_TASK: u32 = 1;
const REQUEST_SWEEP_TASK: u32 = 2;

/// Everything the command handlers read and write.
pub struct Essentials {
    pub locations: Arc<LocationRegistry>,
    pub requests: Arc<TeleportRequestBroker>,
    pub config: EssentialsConfig,
}

impl Essentials {
    pub fn new(config: EssentialsConfig) -> Self {
        Self::with_clock(config, Arc::new(MonotonicClock))
    }

    /// Request expiry measured against `clock`.
    pub fn with_clock(config: EssentialsConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            locations: Arc::new(LocationRegistry::new()),
            requests: Arc::new(TeleportRequestBroker::with_clock(clock)),
            config,
        }
    }

    pub fn store(&self) -> LocationStore {
        LocationStore::new(&self.config.data_dir)
    }

    /// Write all homes, warps and last locations.
    pub fn save(&self) -> Result<(), PersistenceError> {
        self.store().save_all(&self.locations.snapshot())
    }

    pub fn save_player(&self, player: &PlayerId) -> Result<(), PersistenceError> {
        self.store()
            .save_player(player, &self.locations.player_snapshot(player))
    }
}

pub struct EssentialsPlugin {
    state: Essentials,
    commands: CommandRegistry<Essentials>,
}

impl EssentialsPlugin {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(MonotonicClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let mut registry = CommandRegistry::new();
        commands::register_all(&mut registry);
        Self {
            state: Essentials::with_clock(EssentialsConfig::default(), clock),
            commands: registry,
        }
    }

    pub fn state(&self) -> &Essentials {
        &self.state
    }

    fn save_all(&self) {
        if let Err(e) = self.state.save() {
            warn!("Failed to save essentials data: {e}");
        }
    }
}

impl Default for EssentialsPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for EssentialsPlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo {
            name: PLUGIN_NAME.into(),
            version: env!("CARGO_PKG_VERSION").into(),
            description: "Homes, warps and teleport requests".into(),
            author: "Essentials contributors".into(),
        }
    }

    fn on_enable(&mut self, api: &mut dyn ServerApi) {
        match self.state.store().load_all() {
            Ok(snapshot) => self.state.locations.restore(snapshot),
            Err(e) => warn!("Failed to load essentials data: {e}"),
        }

        let mut entries: Vec<_> = self.commands.get_commands().values().collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        for entry in entries {
            api.register_command(&entry.name, &entry.description, PLUGIN_NAME);
        }

        let config = &self.state.config;
        if config.autosave_interval_ticks > 0 {
            let every = config.autosave_interval_ticks;
            api.schedule_repeating(PLUGIN_NAME, every, every, AUTOSAVE_TASK);
        }
        if config.request_sweep_interval_ticks > 0 {
            let every = config.request_sweep_interval_ticks;
            api.schedule_repeating(PLUGIN_NAME, every, every, REQUEST_SWEEP_TASK);
        }
        info!(
            "Essentials enabled with {} commands",
            self.commands.get_commands().len()
        );
    }

    fn on_disable(&mut self) {
        self.save_all();
    }

    fn on_event(&mut self, event: &PluginEvent, _api: &mut dyn ServerApi) -> EventResult {
        match event {
            PluginEvent::PlayerJoin { player } => {
                let id = PlayerId::from(player.uuid.as_str());
                match self.state.store().load_player(&id) {
                    Ok(Some(data)) => self.state.locations.restore_player(&id, data),
                    Ok(None) => {}
                    Err(e) => warn!("Failed to load data for {}: {e}", player.name),
                }
            }
            PluginEvent::PlayerQuit { player } => {
                let id = PlayerId::from(player.uuid.as_str());
                match self.state.save_player(&id) {
                    Ok(()) => {
                        self.state.locations.remove_player(&id);
                    }
                    Err(e) => warn!("Failed to save data for {}: {e}", player.name),
                }
            }
            PluginEvent::ServerStopping => self.save_all(),
            PluginEvent::ServerStarted => {}
        }
        EventResult::Continue
    }

    fn on_task(&mut self, task_id: u32, _api: &mut dyn ServerApi) {
        match task_id {
            AUTOSAVE_TASK => self.save_all(),
            REQUEST_SWEEP_TASK => {
                let purged = self.state.requests.purge_expired();
                if purged > 0 {
                    debug!("Dropped {purged} expired teleport requests");
                }
            }
            _ => {}
        }
    }

    fn on_command(
        &mut self,
        command: &str,
        args: &[String],
        sender: &str,
        api: &mut dyn ServerApi,
    ) -> Option<CommandResult> {
        self.commands.get_commands().get(command)?;
        let mut ctx = CommandContext { sender, args, api };
        Some(self.commands.execute(&self.state, command, &mut ctx))
    }

    fn default_config(&self) -> Option<serde_json::Value> {
        serde_json::to_value(EssentialsConfig::default()).ok()
    }

    fn load_config(&mut self, config: serde_json::Value) {
        match serde_json::from_value(config) {
            Ok(config) => self.state.config = config,
            Err(e) => warn!("Invalid Essentials config, using defaults: {e}"),
        }
    }
}

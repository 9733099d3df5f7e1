use serde::{Deserialize, Serialize};

/// Plugin settings, stored as `plugins/Essentials/config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EssentialsConfig {
    /// Directory holding `warps.json` and `players/<uuid>.json`.
    pub data_dir: String,
    /// Home name used by `/home` and `/sethome` without an argument.
    pub default_home_name: String,
    /// Homes per player, 0 = unlimited.
    pub max_homes: usize,
    /// 0 disables periodic saving.
    pub autosave_interval_ticks: u64,
    /// How often expired teleport requests are dropped. 0 = only on access.
    pub request_sweep_interval_ticks: u64,
}

impl Default for EssentialsConfig {
    fn default() -> Self {
        Self {
            data_dir: "plugins/Essentials/data".into(),
            default_home_name: "home".into(),
            max_homes: 0,
            autosave_interval_ticks: 6000,
            request_sweep_interval_ticks: 1200,
        }
    }
}

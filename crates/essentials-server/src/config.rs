use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub server: ServerSection,
    pub world: WorldSection,
    pub logging: LoggingSection,
    #[serde(default)]
    pub permissions: PermissionsSection,
}

#[derive(Debug, Deserialize)]
pub struct ServerSection {
    pub name: String,
    /// Parent of each plugin's `<name>/config.json`.
    #[serde(default = "default_plugins_dir")]
    pub plugins_dir: String,
}

fn default_plugins_dir() -> String {
    "plugins".into()
}

#[derive(Debug, Deserialize)]
pub struct WorldSection {
    /// Namespaced ids of the loaded worlds.
    #[serde(default = "default_worlds")]
    pub worlds: Vec<String>,
    /// World new players join in. Must be one of `worlds`.
    #[serde(default = "default_world")]
    pub default_world: String,
    #[serde(default = "default_spawn")]
    pub spawn: [f64; 3],
}

fn default_worlds() -> Vec<String> {
    ["minecraft:overworld", "minecraft:the_nether", "minecraft:the_end"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_world() -> String {
    "minecraft:overworld".into()
}

fn default_spawn() -> [f64; 3] {
    [0.5, 64.0, 0.5]
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct PermissionsSection {
    /// Players that start as operators.
    #[serde(default)]
    pub ops: Vec<String>,
    /// Level given by `ops` and by the `op` console verb without a level.
    #[serde(default = "default_op_level")]
    pub op_level: u8,
}

fn default_op_level() -> u8 {
    4
}

impl Default for PermissionsSection {
    fn default() -> Self {
        Self {
            ops: Vec::new(),
            op_level: default_op_level(),
        }
    }
}

impl ServerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        if !config.world.worlds.contains(&config.world.default_world) {
            return Err(format!(
                "default_world {} is not listed in worlds",
                config.world.default_world
            )
            .into());
        }
        Ok(config)
    }
}

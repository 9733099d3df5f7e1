//! Command handlers. Each handler does one registry or broker call and turns
//! the result into chat feedback; teleports go through the host.

mod home;
mod teleport;
mod warp;

use essentials_command::{CommandContext, CommandRegistry, CommandResult};
use essentials_core::{LocationRecord, PlayerId};
use essentials_plugin_api::{PluginPlayer, TeleportTarget};

use crate::Essentials;

pub(crate) fn register_all(registry: &mut CommandRegistry<Essentials>) {
    home::register(registry);
    warp::register(registry);
    teleport::register(registry);
}

/// The online player running the command.
fn sender_player(ctx: &CommandContext<'_>) -> Result<PluginPlayer, CommandResult> {
    ctx.api
        .get_player(ctx.sender)
        .ok_or_else(|| CommandResult::err("This command can only be used by a player"))
}

/// Argument at `index`, or a usage error.
fn required_arg(ctx: &CommandContext<'_>, index: usize, usage: &str) -> Result<String, CommandResult> {
    ctx.arg(index)
        .map(str::to_string)
        .ok_or_else(|| CommandResult::err(format!("Usage: {usage}")))
}

fn player_id(player: &PluginPlayer) -> PlayerId {
    PlayerId::from(player.uuid.as_str())
}

fn location_of(player: &PluginPlayer) -> LocationRecord {
    LocationRecord::new(player.world.clone(), player.position, player.yaw, player.pitch)
}

fn target_of(location: &LocationRecord) -> TeleportTarget {
    TeleportTarget {
        world: location.world.clone(),
        x: location.x,
        y: location.y,
        z: location.z,
        yaw: location.yaw,
        pitch: location.pitch,
    }
}

/// Remember where the player stood, then move them to `location`.
fn teleport_saving_last(
    state: &Essentials,
    ctx: &mut CommandContext<'_>,
    player: &PluginPlayer,
    location: &LocationRecord,
) {
    state
        .locations
        .set_last_location(&player_id(player), location_of(player));
    ctx.api.teleport_player(&player.name, target_of(location));
}

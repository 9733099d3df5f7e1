use essentials_command::{CommandContext, CommandRegistry, CommandResult, HandlerResult, Permission};
use essentials_core::HomeLimitReached;

use super::{location_of, player_id, required_arg, sender_player, teleport_saving_last};
use crate::text::location_line;
use crate::Essentials;

const HOME: Permission = Permission::Node {
    node: "essentials.home",
    default_level: 0,
};
const SETHOME: Permission = Permission::Node {
    node: "essentials.sethome",
    default_level: 0,
};

pub(super) fn register(registry: &mut CommandRegistry<Essentials>) {
    registry.register("home", "Teleport to one of your homes", "/home [name]", HOME, cmd_home);
    registry.register("sethome", "Save your position as a home", "/sethome [name]", SETHOME, cmd_sethome);
    registry.register("delhome", "Delete one of your homes", "/delhome <name>", SETHOME, cmd_delhome);
    registry.register("homes", "List your homes", "/homes", HOME, cmd_homes);
}

fn home_name<'c>(state: &'c Essentials, ctx: &'c CommandContext<'_>) -> &'c str {
    ctx.arg(0).unwrap_or(&state.config.default_home_name)
}

fn cmd_home(state: &Essentials, ctx: &mut CommandContext<'_>) -> HandlerResult {
    let player = sender_player(ctx)?;
    let name = home_name(state, ctx).to_string();
    let home = state
        .locations
        .get_home(&player_id(&player), &name)
        .ok_or_else(|| CommandResult::err(format!("Home '{name}' not found")))?;
    if !ctx.api.world_exists(&home.world) {
        return Err(CommandResult::err("World not found"));
    }
    teleport_saving_last(state, ctx, &player, &home);
    Ok(CommandResult::ok(format!("Teleported to home: {name}")))
}

fn cmd_sethome(state: &Essentials, ctx: &mut CommandContext<'_>) -> HandlerResult {
    let player = sender_player(ctx)?;
    let id = player_id(&player);
    let name = home_name(state, ctx).to_string();

    state
        .locations
        .set_home_within(&id, &name, location_of(&player), state.config.max_homes)
        .map_err(|HomeLimitReached(limit)| {
            CommandResult::err(format!("You can only set {limit} homes. Delete one first"))
        })?;
    Ok(CommandResult::ok(format!("Home '{name}' set")))
}

fn cmd_delhome(state: &Essentials, ctx: &mut CommandContext<'_>) -> HandlerResult {
    let player = sender_player(ctx)?;
    let name = required_arg(ctx, 0, "/delhome <name>")?;
    match state.locations.delete_home(&player_id(&player), &name) {
        Some(_) => Ok(CommandResult::ok(format!("Home '{name}' deleted"))),
        None => Err(CommandResult::err(format!("Home '{name}' not found"))),
    }
}

fn cmd_homes(state: &Essentials, ctx: &mut CommandContext<'_>) -> HandlerResult {
    let player = sender_player(ctx)?;
    let homes = state.locations.list_homes(&player_id(&player));
    if homes.is_empty() {
        return Ok(CommandResult::ok("You have no homes set"));
    }
    let mut lines = vec![format!("Your homes ({}):", homes.len())];
    lines.extend(homes.iter().map(|home| location_line("home", home)));
    Ok(CommandResult::lines(lines))
}

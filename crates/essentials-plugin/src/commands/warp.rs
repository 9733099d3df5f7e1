use essentials_command::{CommandContext, CommandRegistry, CommandResult, HandlerResult, Permission};

use super::{location_of, required_arg, sender_player, teleport_saving_last};
use crate::text::location_line;
use crate::Essentials;

const WARP: Permission = Permission::Node {
    node: "essentials.warp",
    default_level: 0,
};
const SETWARP: Permission = Permission::Node {
    node: "essentials.setwarp",
    default_level: 2,
};
const DELWARP: Permission = Permission::Node {
    node: "essentials.delwarp",
    default_level: 2,
};

pub(super) fn register(registry: &mut CommandRegistry<Essentials>) {
    registry.register("warp", "Teleport to a warp", "/warp [name]", WARP, cmd_warp);
    registry.register("warps", "List all warps", "/warps", WARP, cmd_warps);
    registry.register("setwarp", "Create or move a warp", "/setwarp <name>", SETWARP, cmd_setwarp);
    registry.register("delwarp", "Delete a warp", "/delwarp <name>", DELWARP, cmd_delwarp);
}

fn cmd_warp(state: &Essentials, ctx: &mut CommandContext<'_>) -> HandlerResult {
    let Some(name) = ctx.arg(0).map(str::to_string) else {
        return cmd_warps(state, ctx);
    };
    let player = sender_player(ctx)?;
    let warp = state
        .locations
        .get_warp(&name)
        .ok_or_else(|| CommandResult::err(format!("Warp '{name}' not found")))?;
    if !ctx.api.world_exists(&warp.world) {
        return Err(CommandResult::err("Warp world not found"));
    }
    teleport_saving_last(state, ctx, &player, &warp);
    Ok(CommandResult::ok(format!("Teleported to warp: {name}")))
}

fn cmd_warps(state: &Essentials, _ctx: &mut CommandContext<'_>) -> HandlerResult {
    let warps = state.locations.list_warps();
    if warps.is_empty() {
        return Ok(CommandResult::ok("No warps available"));
    }
    let mut lines = vec![format!("Available warps ({}):", warps.len())];
    lines.extend(warps.iter().map(|warp| location_line("warp", warp)));
    Ok(CommandResult::lines(lines))
}

fn cmd_setwarp(state: &Essentials, ctx: &mut CommandContext<'_>) -> HandlerResult {
    let player = sender_player(ctx)?;
    let name = required_arg(ctx, 0, "/setwarp <name>")?;
    state.locations.set_warp(&name, location_of(&player));
    Ok(CommandResult::ok(format!("Warp '{name}' set")))
}

// Works from the console too.
fn cmd_delwarp(state: &Essentials, ctx: &mut CommandContext<'_>) -> HandlerResult {
    let name = required_arg(ctx, 0, "/delwarp <name>")?;
    match state.locations.delete_warp(&name) {
        Some(_) => Ok(CommandResult::ok(format!("Warp '{name}' deleted"))),
        None => Err(CommandResult::err(format!("Warp '{name}' not found"))),
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{run, state, MockServer};

    const OVERWORLD: &str = "minecraft:overworld";
    const NETHER: &str = "minecraft:the_nether";

    fn server_with_op() -> MockServer {
        let mut server = MockServer::new();
        server.join("Admin", NETHER, (8.0, 70.0, -8.0));
        server.join("Steve", OVERWORLD, (0.0, 64.0, 0.0));
        server.levels.insert("Admin".into(), 2);
        server
    }

    #[test]
    fn setwarp_needs_operator_level() {
        let state = state();
        let mut server = server_with_op();

        let result = run(&state, &mut server, "Steve", "/setwarp Spawn");
        assert!(!result.success);
        assert!(result.messages[0].contains("permission"));

        let result = run(&state, &mut server, "Admin", "/setwarp Spawn");
        assert!(result.success);
        assert_eq!(result.messages[0], "Warp 'Spawn' set");
    }

    #[test]
    fn explicit_node_lets_regular_player_set_warps() {
        let state = state();
        let mut server = server_with_op();
        server
            .nodes
            .insert(("Steve".into(), "essentials.setwarp".into()), true);
        assert!(run(&state, &mut server, "Steve", "/setwarp mine").success);
    }

    #[test]
    fn warp_teleports_case_insensitively() {
        let state = state();
        let mut server = server_with_op();
        run(&state, &mut server, "Admin", "/setwarp Hub");

        let result = run(&state, &mut server, "Steve", "/warp hub");
        assert!(result.success);
        assert_eq!(result.messages[0], "Teleported to warp: hub");
        let steve = server.player("Steve");
        assert_eq!(steve.world, NETHER);
        assert_eq!(steve.position, (8.0, 70.0, -8.0));
    }

    #[test]
    fn missing_warp_and_missing_world() {
        let state = state();
        let mut server = server_with_op();
        let result = run(&state, &mut server, "Steve", "/warp nope");
        assert_eq!(result.messages[0], "Warp 'nope' not found");

        run(&state, &mut server, "Admin", "/setwarp far");
        server.worlds.remove(NETHER);
        let result = run(&state, &mut server, "Steve", "/warp far");
        assert!(!result.success);
        assert_eq!(result.messages[0], "Warp world not found");
        assert!(server.teleports.is_empty());
    }

    #[test]
    fn warp_without_name_lists_warps() {
        let state = state();
        let mut server = server_with_op();
        assert_eq!(run(&state, &mut server, "Steve", "/warp").messages[0], "No warps available");

        run(&state, &mut server, "Admin", "/setwarp b");
        run(&state, &mut server, "Admin", "/setwarp A");
        let result = run(&state, &mut server, "Steve", "/warp");
        assert_eq!(result.messages[0], "Available warps (2):");
        assert!(result.messages[1].contains("[/warp A]"));
        assert!(result.messages[2].contains("[/warp b]"));
        assert!(result.messages[1].contains("[Nether]"));
        assert_eq!(result.messages, run(&state, &mut server, "Steve", "/warps").messages);
    }

    #[test]
    fn delwarp_from_console() {
        let state = state();
        let mut server = server_with_op();
        server.levels.insert("CONSOLE".into(), 4);
        run(&state, &mut server, "Admin", "/setwarp Old");

        let result = run(&state, &mut server, "CONSOLE", "/delwarp old");
        assert!(result.success);
        assert_eq!(result.messages[0], "Warp 'old' deleted");
        let result = run(&state, &mut server, "CONSOLE", "/delwarp old");
        assert_eq!(result.messages[0], "Warp 'old' not found");
    }
}

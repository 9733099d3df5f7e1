use essentials_command::selector::resolve_single_player;
use essentials_command::{CommandContext, CommandRegistry, CommandResult, HandlerResult, Permission};
use essentials_core::TeleportRequestError;
use essentials_plugin_api::{PluginPlayer, TeleportTarget};
use tracing::debug;

use super::{player_id, required_arg, sender_player};
use crate::text::{colored, request_actions, AQUA, GRAY, GREEN, RED};
use crate::Essentials;

const TPA: Permission = Permission::Node {
    node: "essentials.tpa",
    default_level: 0,
};
const TPACCEPT: Permission = Permission::Node {
    node: "essentials.tpaccept",
    default_level: 0,
};
const TPDENY: Permission = Permission::Node {
    node: "essentials.tpdeny",
    default_level: 0,
};

pub(super) fn register(registry: &mut CommandRegistry<Essentials>) {
    registry.register("tp", "Teleport to another player", "/tp <target>", Permission::Level(2), cmd_tp);
    registry.register(
        "tphere",
        "Teleport a player to you",
        "/tphere <player>",
        Permission::Level(2),
        cmd_tphere,
    );
    registry.register("tpa", "Ask to teleport to a player", "/tpa <player>", TPA, cmd_tpa);
    registry.register("tpaccept", "Accept a teleport request", "/tpaccept", TPACCEPT, cmd_tpaccept);
    registry.register("tpdeny", "Deny a teleport request", "/tpdeny", TPDENY, cmd_tpdeny);
}

/// The sender and the single online player named by argument 0.
fn sender_and_target(
    ctx: &CommandContext<'_>,
    usage: &str,
) -> Result<(PluginPlayer, PluginPlayer), CommandResult> {
    let player = sender_player(ctx)?;
    let arg = required_arg(ctx, 0, usage)?;
    let target = resolve_single_player(&arg, &player, &ctx.api.online_players())
        .map_err(CommandResult::err)?;
    Ok((player, target))
}

fn request_failure(error: TeleportRequestError) -> CommandResult {
    CommandResult::err(match error {
        TeleportRequestError::SelfRequest => "You cannot send a teleport request to yourself",
        TeleportRequestError::NoPendingRequest => "You have no pending teleport requests",
        TeleportRequestError::Expired => "The teleport request has expired",
    })
}

fn cmd_tp(_state: &Essentials, ctx: &mut CommandContext<'_>) -> HandlerResult {
    let (player, target) = sender_and_target(ctx, "/tp <target>")?;
    if player.uuid == target.uuid {
        return Err(CommandResult::err("Cannot teleport to yourself"));
    }
    ctx.api.teleport_player(
        &player.name,
        TeleportTarget::at_player(&target, target.yaw, target.pitch),
    );
    Ok(CommandResult::ok(format!("Teleported to {}", target.name)))
}

fn cmd_tphere(_state: &Essentials, ctx: &mut CommandContext<'_>) -> HandlerResult {
    let (player, target) = sender_and_target(ctx, "/tphere <player>")?;
    if player.uuid == target.uuid {
        return Err(CommandResult::err("Cannot teleport yourself to yourself"));
    }
    ctx.api.teleport_player(
        &target.name,
        TeleportTarget::at_player(&player, target.yaw, target.pitch),
    );
    ctx.api.send_message(
        &target.name,
        &format!("You have been teleported to {}", player.name),
    );
    Ok(CommandResult::ok(format!("Teleported {} to you", target.name)))
}

fn cmd_tpa(state: &Essentials, ctx: &mut CommandContext<'_>) -> HandlerResult {
    let (requester, target) = sender_and_target(ctx, "/tpa <player>")?;
    state
        .requests
        .request(&player_id(&requester), &requester.name, &player_id(&target))
        .map_err(request_failure)?;

    ctx.api.send_message(
        &target.name,
        &colored(AQUA, &format!("{} has requested to teleport to you.", requester.name)),
    );
    ctx.api.send_message(&target.name, &request_actions());
    Ok(CommandResult::ok(colored(
        GRAY,
        &format!("Teleport request sent to {}", target.name),
    )))
}

fn cmd_tpaccept(state: &Essentials, ctx: &mut CommandContext<'_>) -> HandlerResult {
    let target = sender_player(ctx)?;
    let accepted = state
        .requests
        .accept(&player_id(&target))
        .map_err(request_failure)?;
    let Some(requester) = ctx.api.get_player_by_uuid(accepted.requester.as_str()) else {
        debug!("{} left before {} accepted", accepted.requester_name, target.name);
        return Err(CommandResult::err("The requesting player is no longer online"));
    };

    ctx.api.teleport_player(
        &requester.name,
        TeleportTarget::at_player(&target, requester.yaw, requester.pitch),
    );
    ctx.api.send_message(
        &requester.name,
        &colored(
            GREEN,
            &format!("Your teleport request to {} was accepted", target.name),
        ),
    );
    Ok(CommandResult::ok(colored(
        GREEN,
        &format!("Accepted teleport request from {}", accepted.requester_name),
    )))
}

fn cmd_tpdeny(state: &Essentials, ctx: &mut CommandContext<'_>) -> HandlerResult {
    let target = sender_player(ctx)?;
    let denied = state
        .requests
        .deny(&player_id(&target))
        .map_err(request_failure)?;
    if let Some(requester) = ctx.api.get_player_by_uuid(denied.requester.as_str()) {
        ctx.api.send_message(
            &requester.name,
            &colored(RED, &format!("Your teleport request to {} was denied", target.name)),
        );
    }
    Ok(CommandResult::ok(colored(
        RED,
        &format!("Denied teleport request from {}", denied.requester_name),
    )))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use essentials_core::ManualClock;

    use super::super::testing::{run, state, state_with_clock, MockServer};

    const OVERWORLD: &str = "minecraft:overworld";
    const END: &str = "minecraft:the_end";

    fn two_players() -> MockServer {
        let mut server = MockServer::new();
        server.join("Steve", OVERWORLD, (0.0, 64.0, 0.0));
        server.join("Alex", END, (100.0, 50.0, 100.0));
        server.players[0].yaw = 90.0;
        server.players[1].yaw = -45.0;
        server
    }

    #[test]
    fn tp_needs_level_two() {
        let state = state();
        let mut server = two_players();
        assert!(!run(&state, &mut server, "Steve", "/tp Alex").success);

        server.levels.insert("Steve".into(), 2);
        let result = run(&state, &mut server, "Steve", "/tp alex");
        assert!(result.success);
        assert_eq!(result.messages[0], "Teleported to Alex");
        let steve = server.player("Steve");
        assert_eq!(steve.world, END);
        assert_eq!(steve.position, (100.0, 50.0, 100.0));
        assert_eq!(steve.yaw, -45.0);
    }

    #[test]
    fn tp_to_self_and_unknown_player_fail() {
        let state = state();
        let mut server = two_players();
        server.levels.insert("Steve".into(), 4);
        assert_eq!(
            run(&state, &mut server, "Steve", "/tp @s").messages[0],
            "Cannot teleport to yourself"
        );
        assert!(run(&state, &mut server, "Steve", "/tp Herobrine").messages[0].contains("Player not found"));
        assert_eq!(run(&state, &mut server, "Steve", "/tp").messages[0], "Usage: /tp <target>");
    }

    #[test]
    fn tphere_keeps_target_orientation_and_notifies() {
        let state = state();
        let mut server = two_players();
        server.levels.insert("Steve".into(), 2);

        let result = run(&state, &mut server, "Steve", "/tphere Alex");
        assert_eq!(result.messages[0], "Teleported Alex to you");
        let alex = server.player("Alex");
        assert_eq!(alex.world, OVERWORLD);
        assert_eq!(alex.position, (0.0, 64.0, 0.0));
        assert_eq!(alex.yaw, -45.0);
        assert_eq!(server.messages_for("Alex"), vec!["You have been teleported to Steve"]);

        assert_eq!(
            run(&state, &mut server, "Steve", "/tphere Steve").messages[0],
            "Cannot teleport yourself to yourself"
        );
    }

    #[test]
    fn tpa_then_accept_moves_requester() {
        let state = state();
        let mut server = two_players();

        let result = run(&state, &mut server, "Steve", "/tpa Alex");
        assert!(result.success);
        assert!(result.messages[0].contains("Teleport request sent to Alex"));
        let to_alex = server.messages_for("Alex");
        assert_eq!(to_alex.len(), 2);
        assert!(to_alex[0].contains("Steve has requested to teleport to you."));
        assert!(to_alex[1].contains("/tpaccept"));

        let result = run(&state, &mut server, "Alex", "/tpaccept");
        assert!(result.success);
        assert!(result.messages[0].contains("Accepted teleport request from Steve"));
        let steve = server.player("Steve");
        assert_eq!(steve.world, END);
        assert_eq!(steve.position, (100.0, 50.0, 100.0));
        assert_eq!(steve.yaw, 90.0);
        assert!(server.messages_for("Steve")[0].contains("was accepted"));

        let result = run(&state, &mut server, "Alex", "/tpaccept");
        assert_eq!(result.messages[0], "You have no pending teleport requests");
    }

    #[test]
    fn tpa_to_self_is_rejected() {
        let state = state();
        let mut server = two_players();
        let result = run(&state, &mut server, "Steve", "/tpa steve");
        assert!(!result.success);
        assert_eq!(result.messages[0], "You cannot send a teleport request to yourself");
        assert_eq!(state.requests.pending_count(), 0);
    }

    #[test]
    fn newer_request_replaces_older() {
        let state = state();
        let mut server = two_players();
        server.join("Notch", OVERWORLD, (5.0, 64.0, 5.0));

        run(&state, &mut server, "Steve", "/tpa Alex");
        run(&state, &mut server, "Notch", "/tpa Alex");
        let result = run(&state, &mut server, "Alex", "/tpaccept");
        assert!(result.messages[0].contains("from Notch"));
        assert_eq!(server.player("Notch").world, END);
        assert_eq!(server.player("Steve").world, OVERWORLD);
    }

    #[test]
    fn expired_request_is_reported_once() {
        let clock = Arc::new(ManualClock::new());
        let state = state_with_clock(clock.clone());
        let mut server = two_players();

        run(&state, &mut server, "Steve", "/tpa Alex");
        clock.advance(Duration::from_millis(60_001));
        let result = run(&state, &mut server, "Alex", "/tpaccept");
        assert!(!result.success);
        assert_eq!(result.messages[0], "The teleport request has expired");
        assert_eq!(server.player("Steve").world, OVERWORLD);

        let result = run(&state, &mut server, "Alex", "/tpaccept");
        assert_eq!(result.messages[0], "You have no pending teleport requests");
    }

    #[test]
    fn accept_after_requester_left() {
        let state = state();
        let mut server = two_players();
        run(&state, &mut server, "Steve", "/tpa Alex");
        server.leave("Steve");

        let result = run(&state, &mut server, "Alex", "/tpaccept");
        assert!(!result.success);
        assert_eq!(result.messages[0], "The requesting player is no longer online");
        assert_eq!(state.requests.pending_count(), 0);
    }

    #[test]
    fn deny_notifies_requester_when_online() {
        let state = state();
        let mut server = two_players();
        run(&state, &mut server, "Steve", "/tpa Alex");

        let result = run(&state, &mut server, "Alex", "/tpdeny");
        assert!(result.success);
        assert!(result.messages[0].contains("Denied teleport request from Steve"));
        assert!(server.messages_for("Steve")[0].contains("was denied"));
        assert!(server.teleports.is_empty());

        run(&state, &mut server, "Steve", "/tpa Alex");
        server.leave("Steve");
        assert!(run(&state, &mut server, "Alex", "/tpdeny").success);
        assert_eq!(
            run(&state, &mut server, "Alex", "/tpdeny").messages[0],
            "You have no pending teleport requests"
        );
    }
}

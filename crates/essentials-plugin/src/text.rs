//! Chat text helpers using `§` formatting codes.

use essentials_core::{readable_world, NamedLocation};

pub const GREEN: &str = "§a";
pub const AQUA: &str = "§b";
pub const RED: &str = "§c";
pub const GRAY: &str = "§7";
pub const DARK_GRAY: &str = "§8";
pub const BOLD: &str = "§l";
pub const RESET: &str = "§r";

pub fn colored(color: &str, text: &str) -> String {
    format!("{color}{text}{RESET}")
}

/// Quote a command argument if it would not survive whitespace splitting.
pub fn quote_arg(arg: &str) -> String {
    if !arg.is_empty() && !arg.contains(|c: char| c.is_whitespace() || c == '"' || c == '\\') {
        return arg.to_string();
    }
    let escaped = arg.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

/// One line of a `/homes` or `/warps` listing.
pub fn location_line(command: &str, entry: &NamedLocation) -> String {
    let (x, y, z) = entry.location.block_position();
    format!(
        " - {GREEN}{BOLD}[/{command} {arg}]{RESET} {AQUA}{name}{RESET}  {DARK_GRAY}[{world}] {GRAY}{x}, {y}, {z}{RESET}",
        arg = quote_arg(&entry.name),
        name = entry.name,
        world = readable_world(&entry.location.world),
    )
}

/// Hint shown to the target of a teleport request.
pub fn request_actions() -> String {
    format!(
        "{GREEN}{BOLD}[Accept]{RESET} {GRAY}/tpaccept{RESET}  {RED}{BOLD}[Deny]{RESET} {GRAY}/tpdeny{RESET}"
    )
}

//! Permission checks: explicit nodes first, operator level as fallback.

use essentials_plugin_api::ServerApi;

/// What a command requires from its sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// A permission node; players without an explicit grant or denial pass
    /// when their operator level reaches `default_level`.
    Node {
        node: &'static str,
        default_level: u8,
    },
    /// Operator level only.
    Level(u8),
}

pub fn has_permission(api: &dyn ServerApi, player: &str, permission: Permission) -> bool {
    match permission {
        Permission::Node {
            node,
            default_level,
        } => api
            .permission_node(player, node)
            .unwrap_or_else(|| api.permission_level(player) >= default_level),
        Permission::Level(level) => api.permission_level(player) >= level,
    }
}

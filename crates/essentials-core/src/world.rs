//! Display labels for namespaced world ids.

const DEFAULT_NAMESPACE: &str = "minecraft";

/// Human-readable label for a world id such as `minecraft:the_nether`.
///
/// The three vanilla dimensions get short names; any other valid id is
/// returned as `namespace:path`; invalid ids are returned unchanged.
pub fn readable_world(world_id: &str) -> String {
    let Some((namespace, path)) = split_identifier(world_id) else {
        return world_id.to_string();
    };
    match path {
        "overworld" => "Overworld".to_string(),
        "the_nether" => "Nether".to_string(),
        "the_end" => "End".to_string(),
        _ => format!("{namespace}:{path}"),
    }
}

fn split_identifier(id: &str) -> Option<(&str, &str)> {
    let (namespace, path) = match id.split_once(':') {
        Some(("", path)) => (DEFAULT_NAMESPACE, path),
        Some((namespace, path)) => (namespace, path),
        None => (DEFAULT_NAMESPACE, id),
    };
    let valid_namespace = namespace.chars().all(is_namespace_char);
    let valid_path = path.chars().all(|c| is_namespace_char(c) || c == '/');
    (valid_namespace && valid_path).then_some((namespace, path))
}

fn is_namespace_char(c: char) -> bool {
    matches!(c, 'a'..='z' | '0'..='9' | '_' | '-' | '.')
}

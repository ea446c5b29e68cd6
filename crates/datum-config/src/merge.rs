//! Layer merging for raw TOML trees.

use std::collections::HashSet;

/// Recursively deep-merge `overlay` into `base`.
///
/// - Tables merge recursively per-field.
/// - Scalars and arrays from the overlay **replace** the base value.
///
/// Every leaf the overlay sets is recorded in `set` as a dotted path.
pub(crate) fn deep_merge(
    base: &mut toml::Value,
    overlay: &toml::Value,
    prefix: &str,
    set: &mut HashSet<String>,
) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                match base_table.get_mut(key) {
                    Some(base_val) if overlay_val.is_table() => {
                        deep_merge(base_val, overlay_val, &path, set);
                    },
                    Some(base_val) => {
                        *base_val = overlay_val.clone();
                        set.insert(path);
                    },
                    None => {
                        base_table.insert(key.clone(), overlay_val.clone());
                        record_leaves(overlay_val, &path, set);
                    },
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
            set.insert(prefix.to_owned());
        },
    }
}

fn record_leaves(val: &toml::Value, prefix: &str, set: &mut HashSet<String>) {
    if let toml::Value::Table(table) = val {
        for (key, child) in table {
            record_leaves(child, &format!("{prefix}.{key}"), set);
        }
    } else {
        set.insert(prefix.to_owned());
    }
}

/// Set a string leaf at a dotted path, creating intermediate tables.
pub(crate) fn set_path(root: &mut toml::Value, path: &str, value: &str) {
    let mut node = root;
    let mut parts = path.split('.').peekable();
    while let Some(part) = parts.next() {
        let toml::Value::Table(table) = node else {
            return;
        };
        if parts.peek().is_none() {
            table.insert(part.to_owned(), toml::Value::String(value.to_owned()));
            return;
        }
        node = table
            .entry(part.to_owned())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> toml::Value {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn test_overlay_replaces_leaves_and_keeps_siblings() {
        let mut base = parse("[tokens]\naccess_ttl_secs = 7200\nstore_path = \"tokens.json\"");
        let overlay = parse("[tokens]\naccess_ttl_secs = 60");
        let mut set = HashSet::new();
        deep_merge(&mut base, &overlay, "", &mut set);

        assert_eq!(base["tokens"]["access_ttl_secs"].as_integer(), Some(60));
        assert_eq!(base["tokens"]["store_path"].as_str(), Some("tokens.json"));
        assert!(set.contains("tokens.access_ttl_secs"));
        assert!(!set.contains("tokens.store_path"));
    }

    #[test]
    fn test_new_tables_recorded() {
        let mut base = parse("");
        let overlay = parse("[keys]\nkey_path = \"k\"");
        let mut set = HashSet::new();
        deep_merge(&mut base, &overlay, "", &mut set);
        assert!(set.contains("keys.key_path"));
    }

    #[test]
    fn test_set_path_creates_tables() {
        let mut root = parse("");
        set_path(&mut root, "access.policy_path", "p.json");
        assert_eq!(root["access"]["policy_path"].as_str(), Some("p.json"));
    }
}

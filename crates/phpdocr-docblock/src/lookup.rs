//! Read-only settings-description lookup

use std::collections::{BTreeMap, HashMap};

/// Resolves setting names to human-readable descriptions.
///
/// Names without a known description are simply absent from the result.
pub trait SettingsLookup {
    fn lookup(&self, names: &[String]) -> HashMap<String, String>;
}

/// Lookup that never knows any description
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDescriptions;

impl SettingsLookup for NoDescriptions {
    fn lookup(&self, _names: &[String]) -> HashMap<String, String> {
        HashMap::new()
    }
}

impl SettingsLookup for HashMap<String, String> {
    fn lookup(&self, names: &[String]) -> HashMap<String, String> {
        names
            .iter()
            .filter_map(|name| self.get(name).map(|desc| (name.clone(), desc.clone())))
            .collect()
    }
}

impl SettingsLookup for BTreeMap<String, String> {
    fn lookup(&self, names: &[String]) -> HashMap<String, String> {
        names
            .iter()
            .filter_map(|name| self.get(name).map(|desc| (name.clone(), desc.clone())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_lookup_returns_known_names_only() {
        let mut cache = BTreeMap::new();
        cache.insert("FOO".to_string(), "Enables foo".to_string());
        let found = cache.lookup(&["FOO".to_string(), "BAR".to_string()]);
        assert_eq!(found.len(), 1);
        assert_eq!(found.get("FOO").map(String::as_str), Some("Enables foo"));
    }

    #[test]
    fn test_no_descriptions() {
        assert!(NoDescriptions.lookup(&["FOO".to_string()]).is_empty());
    }
}

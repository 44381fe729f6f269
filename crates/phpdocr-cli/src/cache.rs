//! Settings-description cache
//!
//! A flat JSON object mapping setting names to human descriptions, stored
//! pretty-printed with sorted keys so other tools can read and diff it.

use anyhow::{bail, Context, Result};
use phpdocr_docblock::SettingsLookup;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Setting name to description mapping
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SettingsCache {
    entries: BTreeMap<String, String>,
}

impl SettingsCache {
    /// Load the cache; a missing or unreadable file is an empty cache
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            debug!(path = %path.display(), "no settings cache");
            return Self::default();
        }

        match read_descriptions(path) {
            Ok(entries) => {
                debug!(path = %path.display(), entries = entries.len(), "loaded settings cache");
                Self { entries }
            }
            Err(e) => {
                warn!(path = %path.display(), "ignoring settings cache: {:#}", e);
                Self::default()
            }
        }
    }

    /// Write the cache as pretty-printed JSON with a trailing newline
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut contents =
            serde_json::to_string_pretty(&self.entries).context("Failed to serialize cache")?;
        contents.push('\n');

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, contents)
            .with_context(|| format!("Failed to write cache file: {}", path.display()))
    }

    /// Merge descriptions into the cache, returning how many entries changed
    pub fn merge(&mut self, descriptions: BTreeMap<String, String>) -> usize {
        let mut changed = 0;
        for (name, description) in descriptions {
            if self.entries.get(&name) != Some(&description) {
                self.entries.insert(name, description);
                changed += 1;
            }
        }
        changed
    }

    /// Read a description file for import; unlike [`SettingsCache::load`],
    /// a malformed file is an error
    pub fn read_import(path: &Path) -> Result<BTreeMap<String, String>> {
        read_descriptions(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SettingsLookup for SettingsCache {
    fn lookup(&self, names: &[String]) -> HashMap<String, String> {
        self.entries.lookup(names)
    }
}

fn read_descriptions(path: &Path) -> Result<BTreeMap<String, String>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let serde_json::Value::Object(map) = value else {
        bail!("{} must contain a JSON object", path.display());
    };

    let mut entries = BTreeMap::new();
    for (name, description) in map {
        match description {
            serde_json::Value::String(text) => {
                entries.insert(name, text);
            }
            other => bail!(
                "{}: description of '{}' must be a string, found {}",
                path.display(),
                name,
                other
            ),
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn descriptions(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let cache = SettingsCache::load(&temp.path().join("missing.json"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_corrupt_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cache.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(SettingsCache::load(&path).is_empty());

        fs::write(&path, r#"{"FOO": 1}"#).unwrap();
        assert!(SettingsCache::load(&path).is_empty());

        fs::write(&path, r#"["FOO"]"#).unwrap();
        assert!(SettingsCache::load(&path).is_empty());
    }

    #[test]
    fn test_save_format() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("cache.json");

        let mut cache = SettingsCache::default();
        cache.merge(descriptions(&[("ZED", "Last"), ("ALPHA", "First")]));
        cache.save(&path).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "{\n  \"ALPHA\": \"First\",\n  \"ZED\": \"Last\"\n}\n"
        );
        assert_eq!(SettingsCache::load(&path), cache);
    }

    #[test]
    fn test_merge_counts_changes() {
        let mut cache = SettingsCache::default();
        assert_eq!(cache.merge(descriptions(&[("A", "a"), ("B", "b")])), 2);
        assert_eq!(cache.merge(descriptions(&[("A", "a"), ("B", "bee")])), 1);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_lookup() {
        let mut cache = SettingsCache::default();
        cache.merge(descriptions(&[("FOO", "Enables foo")]));
        let found = cache.lookup(&["FOO".to_string(), "BAR".to_string()]);
        assert_eq!(found.len(), 1);
        assert_eq!(found["FOO"], "Enables foo");
    }

    #[test]
    fn test_read_import_rejects_bad_files() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("import.json");
        fs::write(&path, r#"{"FOO": true}"#).unwrap();
        assert!(SettingsCache::read_import(&path).is_err());
        assert!(SettingsCache::read_import(&temp.path().join("none.json")).is_err());
    }
}

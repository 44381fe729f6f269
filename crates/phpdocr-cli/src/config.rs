//! Configuration file support for phpdocr
//!
//! Loads `.phpdocr.toml` from current directory or parent directories.

use anyhow::{Context, Result};
use phpdocr_docblock::GeneratorOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file name searched for in the current directory and its parents
pub const CONFIG_FILE: &str = ".phpdocr.toml";

/// Default settings-description cache file
pub const DEFAULT_SETTINGS_CACHE: &str = ".phpdocr-settings.json";

/// Configuration file structure
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub settings: SettingsConfig,
    pub paths: PathsConfig,
    pub docblock: DocblockConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    /// Configuration-fetch calls whose literal arguments are documented
    pub functions: Vec<String>,
    /// Settings-description cache file
    pub cache: PathBuf,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            functions: vec!["getSetting".to_string()],
            cache: PathBuf::from(DEFAULT_SETTINGS_CACHE),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Glob patterns to exclude from processing
    pub exclude: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DocblockConfig {
    /// Add `@var` docblocks above undocumented properties
    pub properties: bool,
}

impl Default for DocblockConfig {
    fn default() -> Self {
        Self { properties: true }
    }
}

impl Config {
    /// Load config from `.phpdocr.toml` searching from current directory upward
    pub fn load() -> Result<Option<(Config, PathBuf)>> {
        Self::load_from(std::env::current_dir()?)
    }

    /// Load config searching from the given directory upward
    pub fn load_from(start_dir: PathBuf) -> Result<Option<(Config, PathBuf)>> {
        let mut current = Some(start_dir.as_path());

        while let Some(dir) = current {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.exists() {
                let config = Self::load_path(&config_path)?;
                return Ok(Some((config, config_path)));
            }
            current = dir.parent();
        }

        Ok(None)
    }

    /// Load config from a specific path
    pub fn load_path(path: &Path) -> Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Generator options described by this config
    pub fn generator_options(&self) -> GeneratorOptions {
        GeneratorOptions {
            settings_functions: self.settings.functions.clone(),
            document_properties: self.docblock.properties,
        }
    }

    /// Check if a path should be excluded based on config patterns
    pub fn should_exclude(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();

        for pattern in &self.paths.exclude {
            if let Ok(glob_pattern) = glob::Pattern::new(pattern) {
                if glob_pattern.matches(&path_str) {
                    return true;
                }
                if let Some(file_name) = path.file_name() {
                    if glob_pattern.matches(&file_name.to_string_lossy()) {
                        return true;
                    }
                }
            }

            // Directory patterns match any path component
            if pattern.ends_with('/') {
                let dir_pattern = pattern.trim_end_matches('/');
                if path_str.contains(&format!("/{}/", dir_pattern))
                    || path_str.starts_with(&format!("{}/", dir_pattern))
                {
                    return true;
                }
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_config(dir: &Path, content: &str) {
        fs::write(dir.join(CONFIG_FILE), content).unwrap();
    }

    #[test]
    fn test_load_basic_config() {
        let temp = TempDir::new().unwrap();
        create_config(
            temp.path(),
            r#"
[settings]
functions = ["getSetting", "config"]
cache = "build/settings.json"

[paths]
exclude = ["vendor/", "*.generated.php"]

[docblock]
properties = false
"#,
        );

        let (config, path) = Config::load_from(temp.path().to_path_buf())
            .unwrap()
            .unwrap();

        assert_eq!(path, temp.path().join(CONFIG_FILE));
        assert_eq!(
            config.settings.functions,
            vec!["getSetting".to_string(), "config".to_string()]
        );
        assert_eq!(config.settings.cache, PathBuf::from("build/settings.json"));
        assert_eq!(
            config.paths.exclude,
            vec!["vendor/".to_string(), "*.generated.php".to_string()]
        );
        assert!(!config.docblock.properties);

        let options = config.generator_options();
        assert!(!options.document_properties);
        assert_eq!(options.settings_functions.len(), 2);
    }

    #[test]
    fn test_load_empty_config_uses_defaults() {
        let temp = TempDir::new().unwrap();
        create_config(temp.path(), "");

        let (config, _) = Config::load_from(temp.path().to_path_buf())
            .unwrap()
            .unwrap();

        assert_eq!(config.settings.functions, vec!["getSetting".to_string()]);
        assert_eq!(config.settings.cache, PathBuf::from(DEFAULT_SETTINGS_CACHE));
        assert!(config.paths.exclude.is_empty());
        assert!(config.docblock.properties);
    }

    #[test]
    fn test_config_found_in_parent_directory() {
        let temp = TempDir::new().unwrap();
        create_config(temp.path(), "[docblock]\nproperties = false\n");
        let nested = temp.path().join("src").join("Models");
        fs::create_dir_all(&nested).unwrap();

        let (config, path) = Config::load_from(nested).unwrap().unwrap();
        assert_eq!(path, temp.path().join(CONFIG_FILE));
        assert!(!config.docblock.properties);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let temp = TempDir::new().unwrap();
        create_config(temp.path(), "[settings]\nfunctions = 3\n");
        assert!(Config::load_from(temp.path().to_path_buf()).is_err());
    }

    #[test]
    fn test_no_config_found() {
        let temp = TempDir::new().unwrap();
        let result = Config::load_from(temp.path().to_path_buf()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_should_exclude_glob() {
        let config = Config {
            paths: PathsConfig {
                exclude: vec!["*.generated.php".to_string()],
            },
            ..Default::default()
        };

        assert!(config.should_exclude(Path::new("foo.generated.php")));
        assert!(!config.should_exclude(Path::new("foo.php")));
    }

    #[test]
    fn test_should_exclude_directory() {
        let config = Config {
            paths: PathsConfig {
                exclude: vec!["vendor/".to_string()],
            },
            ..Default::default()
        };

        assert!(config.should_exclude(Path::new("project/vendor/autoload.php")));
        assert!(config.should_exclude(Path::new("vendor/package/file.php")));
        assert!(!config.should_exclude(Path::new("src/vendor.php")));
    }
}

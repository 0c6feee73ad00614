use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ResultExt, SeedError, SeedResult};
use crate::filesystem;

/// Environment variable that overrides the router URI from every other source
pub const ROUTER_URI_ENV: &str = "CLUSTERSEED_ROUTER_URI";

pub const DEFAULT_SERVER_SELECTION_TIMEOUT_SECS: u64 = 10;

/// Persistent settings stored in `config.toml` under the clusterseed directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Topology manifest path; `<base dir>/topology.toml` when unset
    pub topology: Option<String>,

    /// Router URI overriding the one in the topology manifest
    pub router_uri: Option<String>,

    /// How long the driver waits for a server before giving up
    pub server_selection_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            topology: None,
            router_uri: None,
            server_selection_timeout_secs: DEFAULT_SERVER_SELECTION_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    /// Path of the settings file
    pub fn config_path() -> SeedResult<PathBuf> {
        Ok(filesystem::base_dir()?.join("config.toml"))
    }

    /// Load settings from the default location, then apply environment overrides
    pub fn load() -> SeedResult<Self> {
        let mut settings = Self::load_from(&Self::config_path()?)?;

        if let Ok(uri) = std::env::var(ROUTER_URI_ENV) {
            if !uri.is_empty() {
                settings.router_uri = Some(uri);
            }
        }

        Ok(settings)
    }

    /// Load settings from a file; a missing file yields the defaults
    pub fn load_from(path: &Path) -> SeedResult<Self> {
        if !filesystem::file_exists(path) {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        let settings: Settings = toml::from_str(&content)?;
        if settings.server_selection_timeout_secs == 0 {
            return Err(SeedError::Configuration(
                "server_selection_timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(settings)
    }

    /// Resolve the topology manifest path
    pub fn topology_path(&self) -> SeedResult<PathBuf> {
        match &self.topology {
            Some(path) => Ok(filesystem::expand_path(path)),
            None => Ok(filesystem::base_dir()?.join("topology.toml")),
        }
    }

    pub fn server_selection_timeout(&self) -> Duration {
        Duration::from_secs(self.server_selection_timeout_secs)
    }
}

/// Read the raw settings table; a missing file yields an empty table
pub fn load_table(path: &Path) -> SeedResult<toml::Table> {
    if !filesystem::file_exists(path) {
        return Ok(toml::Table::new());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

    Ok(toml::from_str(&content)?)
}

/// Get a specific settings value
pub fn get_value(path: &Path, key: &str) -> SeedResult<Option<String>> {
    let table = load_table(path)?;
    Ok(table.get(key).map(display_value))
}

/// Set a settings value, rejecting keys or values the settings schema does not accept
pub fn set_value(path: &Path, key: &str, value: &str) -> SeedResult<()> {
    let mut table = load_table(path)?;
    table.insert(key.to_string(), typed_value(key, value)?);

    // Round-trip through the typed struct so typos never reach the file
    let candidate: Settings = toml::Value::Table(table.clone())
        .try_into()
        .map_err(|e: toml::de::Error| {
            SeedError::Configuration(format!("Invalid setting '{}': {}", key, e.message()))
        })?;
    if candidate.server_selection_timeout_secs == 0 {
        return Err(SeedError::Configuration(
            "server_selection_timeout_secs must be greater than zero".to_string(),
        ));
    }

    let content = toml::to_string_pretty(&table)?;
    filesystem::ensure_parent_dir_exists(path)?;
    fs::write(path, content)
        .with_context(|| format!("Failed to write settings file: {}", path.display()))?;

    Ok(())
}

/// Convert a command-line value to the TOML type the settings field for `key` holds
fn typed_value(key: &str, value: &str) -> SeedResult<toml::Value> {
    match key {
        "server_selection_timeout_secs" => value
            .parse::<i64>()
            .map(toml::Value::Integer)
            .map_err(|_| {
                SeedError::Configuration(format!(
                    "Invalid setting '{}': expected a whole number of seconds, got '{}'",
                    key, value
                ))
            }),
        "topology" | "router_uri" => Ok(toml::Value::String(value.to_string())),
        _ => Err(SeedError::Configuration(format!(
            "Invalid setting '{}': unknown key (expected topology, router_uri or server_selection_timeout_secs)",
            key
        ))),
    }
}

fn display_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.server_selection_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn set_then_get_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("config.toml");

        set_value(&path, "router_uri", "mongodb://mongos:27017").unwrap();
        set_value(&path, "server_selection_timeout_secs", "3").unwrap();

        assert_eq!(
            get_value(&path, "router_uri").unwrap().as_deref(),
            Some("mongodb://mongos:27017")
        );
        assert_eq!(
            get_value(&path, "server_selection_timeout_secs").unwrap().as_deref(),
            Some("3")
        );

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.router_uri.as_deref(), Some("mongodb://mongos:27017"));
        assert_eq!(settings.server_selection_timeout_secs, 3);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");

        let err = set_value(&path, "router_url", "mongodb://x:1").unwrap_err();
        assert!(matches!(err, SeedError::Configuration(_)));
        assert!(!path.exists());
    }

    #[test]
    fn wrongly_typed_values_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");

        assert!(set_value(&path, "server_selection_timeout_secs", "soon").is_err());
        assert!(set_value(&path, "server_selection_timeout_secs", "0").is_err());
    }

    #[test]
    fn numeric_looking_strings_stay_strings() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");

        set_value(&path, "router_uri", "12345").unwrap();
        set_value(&path, "topology", "2024").unwrap();

        let table = load_table(&path).unwrap();
        assert_eq!(table.get("router_uri"), Some(&toml::Value::String("12345".to_string())));
        assert_eq!(table.get("topology"), Some(&toml::Value::String("2024".to_string())));

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.router_uri.as_deref(), Some("12345"));
        assert_eq!(settings.topology.as_deref(), Some("2024"));
    }

    #[test]
    fn explicit_topology_path_is_expanded() {
        let settings = Settings {
            topology: Some("/srv/cluster/topology.toml".to_string()),
            ..Settings::default()
        };
        assert_eq!(
            settings.topology_path().unwrap(),
            PathBuf::from("/srv/cluster/topology.toml")
        );
    }
}

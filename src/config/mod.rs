//! Configuration management for `bugboard`.
//!
//! Configuration sources and precedence (highest wins):
//! 1. CLI overrides
//! 2. Environment variables (`BUGBOARD_*`)
//! 3. Project config (`./bugboard.yaml`, or the file given with `--config`)
//! 4. User config (`~/.config/bugboard/config.yaml`)
//! 5. Defaults
//!
//! YAML files are flattened to dotted keys, so `server: {port: 8080}` becomes
//! `server.port`.

use crate::error::{Result, TrackerError};
use crate::storage::SqliteStorage;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default database path, relative to the working directory.
pub const DEFAULT_DB_FILENAME: &str = "bugboard.db";
/// Project config file looked up in the working directory.
pub const PROJECT_CONFIG_FILENAME: &str = "bugboard.yaml";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
/// Busy timeout applied when none is configured (ms).
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 30_000;

const ENV_PREFIX: &str = "BUGBOARD_";
/// Shorthand keys and the canonical key each one sets.
const KEY_ALIASES: [(&str, &str); 4] = [
    ("host", "server.host"),
    ("port", "server.port"),
    ("cors", "server.cors"),
    ("database", "db"),
];

/// A flat configuration layer of normalized dotted keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub values: HashMap<String, String>,
}

impl ConfigLayer {
    /// Set a key, normalizing it and resolving shorthand aliases.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(canonical_key(key), value.into());
    }

    /// Look up the first of `keys` that is present.
    #[must_use]
    pub fn get(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .find_map(|key| self.values.get(&canonical_key(key)))
            .map(String::as_str)
    }

    /// Merge another layer on top of this one (higher precedence wins).
    pub fn merge_from(&mut self, other: &Self) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Merge multiple layers in precedence order (lowest to highest).
    #[must_use]
    pub fn merge_layers(layers: &[Self]) -> Self {
        let mut merged = Self::default();
        for layer in layers {
            merged.merge_from(layer);
        }
        merged
    }

    /// Build a layer from a YAML file path. Missing files return empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Build a layer from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid YAML.
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(contents)?;
        let mut flat = HashMap::new();
        flatten_yaml(&value, "", &mut flat);

        let mut layer = Self::default();
        for (key, value) in flat {
            layer.set(&key, value);
        }
        Ok(layer)
    }

    /// Build a layer from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_vars(env::vars())
    }

    /// Build a layer from `BUGBOARD_*` pairs.
    ///
    /// `BUGBOARD_SERVER_PORT` is visible as `server.port`, `server-port` and
    /// `server_port`. The short forms `BUGBOARD_HOST`, `BUGBOARD_PORT`,
    /// `BUGBOARD_CORS` and `BUGBOARD_DATABASE` set their canonical key.
    #[must_use]
    pub fn from_env_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut layer = Self::default();

        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                for variant in env_key_variants(stripped) {
                    layer.set(&variant, value.clone());
                }
            }
        }

        layer
    }
}

/// CLI overrides for config loading (optional).
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub db: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub cors: Option<bool>,
    pub lock_timeout: Option<u64>,
}

impl CliOverrides {
    #[must_use]
    pub fn as_layer(&self) -> ConfigLayer {
        let mut layer = ConfigLayer::default();

        if let Some(path) = &self.db {
            layer.set("db", path.to_string_lossy());
        }
        if let Some(host) = &self.host {
            layer.set("server.host", host.clone());
        }
        if let Some(port) = self.port {
            layer.set("server.port", port.to_string());
        }
        if let Some(cors) = self.cors {
            layer.set("server.cors", cors.to_string());
        }
        if let Some(lock_timeout) = self.lock_timeout {
            layer.set("lock-timeout", lock_timeout.to_string());
        }

        layer
    }
}

/// Default config layer (lowest precedence).
#[must_use]
pub fn default_config_layer() -> ConfigLayer {
    let mut layer = ConfigLayer::default();
    layer.set("db", DEFAULT_DB_FILENAME);
    layer.set("server.host", DEFAULT_HOST);
    layer.set("server.port", DEFAULT_PORT.to_string());
    layer.set("server.cors", "true");
    layer
}

/// Load user config (~/.config/bugboard/config.yaml).
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<ConfigLayer> {
    let Ok(home) = env::var("HOME") else {
        return Ok(ConfigLayer::default());
    };
    let path = Path::new(&home)
        .join(".config")
        .join("bugboard")
        .join("config.yaml");
    ConfigLayer::from_yaml(&path)
}

/// Load the project config: an explicit path (which must exist) or `./bugboard.yaml`.
///
/// # Errors
///
/// Returns an error if an explicit file is missing, or a file cannot be read or parsed.
pub fn load_project_config(explicit: Option<&Path>) -> Result<ConfigLayer> {
    match explicit {
        Some(path) if !path.exists() => Err(TrackerError::Config(format!(
            "config file not found: {}",
            path.display()
        ))),
        Some(path) => ConfigLayer::from_yaml(path),
        None => ConfigLayer::from_yaml(Path::new(PROJECT_CONFIG_FILENAME)),
    }
}

/// Load configuration with the full precedence chain.
///
/// # Errors
///
/// Returns an error if any config file cannot be read or parsed.
pub fn load_config(config_path: Option<&Path>, cli: &CliOverrides) -> Result<ConfigLayer> {
    let defaults = default_config_layer();
    let user = load_user_config()?;
    let project = load_project_config(config_path)?;
    let env_layer = ConfigLayer::from_env();
    let cli_layer = cli.as_layer();

    let merged = ConfigLayer::merge_layers(&[defaults, user, project, env_layer, cli_layer]);
    tracing::debug!(keys = merged.values.len(), "Loaded configuration");
    Ok(merged)
}

/// Typed settings resolved from a merged layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub cors: bool,
    pub lock_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILENAME),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            cors: true,
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }
}

impl Settings {
    /// Resolve typed settings, falling back to defaults for absent keys.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Config` if a present value cannot be parsed.
    pub fn from_layer(layer: &ConfigLayer) -> Result<Self> {
        let defaults = Self::default();

        let db_path = layer
            .get(&["db"])
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map_or(defaults.db_path, PathBuf::from);

        let host = layer
            .get(&["server.host"])
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map_or(defaults.host, str::to_string);

        let port = match layer.get(&["server.port"]) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| TrackerError::Config(format!("invalid server.port: {raw}")))?,
            None => defaults.port,
        };

        let cors = match layer.get(&["server.cors"]) {
            Some(raw) => parse_bool(raw)
                .ok_or_else(|| TrackerError::Config(format!("invalid server.cors: {raw}")))?,
            None => defaults.cors,
        };

        let lock_timeout_ms = match layer.get(&["lock-timeout"]) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| TrackerError::Config(format!("invalid lock-timeout: {raw}")))?,
            None => defaults.lock_timeout_ms,
        };

        Ok(Self {
            db_path,
            host,
            port,
            cors,
            lock_timeout_ms,
        })
    }

    /// Load and resolve settings in one step.
    ///
    /// # Errors
    ///
    /// Returns an error if config files cannot be read or a value is invalid.
    pub fn load(config_path: Option<&Path>, cli: &CliOverrides) -> Result<Self> {
        Self::from_layer(&load_config(config_path, cli)?)
    }

    /// `host:port` for binding the HTTP server.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Open storage at the configured path with the configured busy timeout.
///
/// # Errors
///
/// Returns an error if the database cannot be opened.
pub fn open_storage(settings: &Settings) -> Result<SqliteStorage> {
    SqliteStorage::open_with_timeout(&settings.db_path, Some(settings.lock_timeout_ms))
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace('_', "-")
}

fn canonical_key(key: &str) -> String {
    let normalized = normalize_key(key);
    KEY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map_or(normalized, |(_, canonical)| (*canonical).to_string())
}

fn env_key_variants(raw: &str) -> Vec<String> {
    let raw_lower = raw.to_lowercase();
    vec![
        raw_lower.replace('_', "."),
        raw_lower.replace('_', "-"),
        raw_lower,
    ]
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

fn flatten_yaml(value: &serde_yaml::Value, prefix: &str, out: &mut HashMap<String, String>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, value) in map {
                let Some(key_str) = key.as_str() else {
                    continue;
                };
                let next_prefix = if prefix.is_empty() {
                    key_str.to_string()
                } else {
                    format!("{prefix}.{key_str}")
                };
                flatten_yaml(value, &next_prefix, out);
            }
        }
        _ => {
            if let Some(value) = yaml_scalar_to_string(value) {
                out.insert(prefix.to_string(), value);
            }
        }
    }
}

fn yaml_scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Bool(v) => Some(v.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Null
        | serde_yaml::Value::Sequence(_)
        | serde_yaml::Value::Mapping(_) => None,
        serde_yaml::Value::Tagged(tagged) => yaml_scalar_to_string(&tagged.value),
    }
}

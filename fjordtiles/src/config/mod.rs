//! Configuration file handling.
//!
//! User settings live in an INI file at
//! `<config_dir>/fjordtiles/config.ini`. Loading starts from defaults
//! and overlays whatever the file provides; a missing file is simply the
//! defaults. Unknown keys are ignored so older binaries tolerate newer
//! files.

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use crate::store::DEFAULT_MAX_TILES;

/// Default pause between bulk download requests, in milliseconds.
pub const DEFAULT_THROTTLE_MS: u64 = 50;

/// Default network timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or parse the config file.
    #[error("failed to read config file: {0}")]
    Read(#[from] ini::Error),

    /// Failed to write the config file.
    #[error("failed to write config file: {0}")]
    Write(String),

    /// A value in the file did not parse.
    #[error("invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// `[cache]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    /// Directory holding the tile files.
    pub directory: PathBuf,
    /// Tile budget enforced by trimming.
    pub max_tiles: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            directory: default_cache_dir(),
            max_tiles: DEFAULT_MAX_TILES,
        }
    }
}

/// `[network]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkSettings {
    /// Tile URL template with `{s}`, `{z}`, `{x}`, `{y}` placeholders.
    pub url_template: String,
    /// Shard subdomains substituted for `{s}`.
    pub shards: Vec<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            url_template: crate::provider::DEFAULT_URL_TEMPLATE.to_string(),
            shards: crate::provider::DEFAULT_SHARDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// `[provision]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisionSettings {
    /// Pause between bulk download requests, in milliseconds.
    pub throttle_ms: u64,
}

impl Default for ProvisionSettings {
    fn default() -> Self {
        Self {
            throttle_ms: DEFAULT_THROTTLE_MS,
        }
    }
}

/// The whole configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub cache: CacheSettings,
    pub network: NetworkSettings,
    pub provision: ProvisionSettings,
}

impl ConfigFile {
    /// Load from the default path; a missing file yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from a specific path; a missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path)?;
        parse_ini(&ini)
    }

    /// Write a commented config file to `path`.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write(e.to_string()))?;
        }
        std::fs::write(path, self.to_config_string())
            .map_err(|e| ConfigError::Write(e.to_string()))
    }

    fn to_config_string(&self) -> String {
        format!(
            "# FjordTiles configuration\n\
             \n\
             [cache]\n\
             # Where downloaded tiles are stored\n\
             directory = {}\n\
             # Tile budget; the oldest fifth is dropped when exceeded\n\
             max_tiles = {}\n\
             \n\
             [network]\n\
             # {{s}} = shard, {{z}}/{{x}}/{{y}} = tile address\n\
             url_template = {}\n\
             shards = {}\n\
             timeout_secs = {}\n\
             \n\
             [provision]\n\
             # Pause between bulk download requests\n\
             throttle_ms = {}\n",
            self.cache.directory.display(),
            self.cache.max_tiles,
            self.network.url_template,
            self.network.shards.join(","),
            self.network.timeout_secs,
            self.provision.throttle_ms,
        )
    }
}

/// Default path of the config file.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fjordtiles")
        .join("config.ini")
}

/// Default tile cache directory.
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fjordtiles")
        .join("tiles")
}

/// Overlay INI values onto the defaults.
fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigError> {
    let mut config = ConfigFile::default();

    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.cache.directory = PathBuf::from(v);
            }
        }
        if let Some(v) = section.get("max_tiles") {
            config.cache.max_tiles = parse_u64("cache", "max_tiles", v)?;
        }
    }

    if let Some(section) = ini.section(Some("network")) {
        if let Some(v) = section.get("url_template") {
            let v = v.trim();
            if !v.is_empty() {
                config.network.url_template = v.to_string();
            }
        }
        if let Some(v) = section.get("shards") {
            config.network.shards = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(v) = section.get("timeout_secs") {
            config.network.timeout_secs = parse_u64("network", "timeout_secs", v)?;
        }
    }

    if let Some(section) = ini.section(Some("provision")) {
        if let Some(v) = section.get("throttle_ms") {
            config.provision.throttle_ms = parse_u64("provision", "throttle_ms", v)?;
        }
    }

    Ok(config)
}

fn parse_u64(section: &str, key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: "must be a non-negative integer".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_file_missing() {
        let config = ConfigFile::load_from(Path::new("/nonexistent/config.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
        assert_eq!(config.cache.max_tiles, 3000);
        assert_eq!(config.provision.throttle_ms, 50);
    }

    #[test]
    fn test_overlay_from_ini() {
        let ini = Ini::load_from_str(
            "[cache]\n\
             directory = /data/tiles\n\
             max_tiles = 500\n\
             [network]\n\
             url_template = https://tiles.example/{z}/{x}/{y}.png\n\
             shards =\n\
             timeout_secs = 10\n\
             [provision]\n\
             throttle_ms = 200\n",
        )
        .unwrap();

        let config = parse_ini(&ini).unwrap();
        assert_eq!(config.cache.directory, PathBuf::from("/data/tiles"));
        assert_eq!(config.cache.max_tiles, 500);
        assert_eq!(
            config.network.url_template,
            "https://tiles.example/{z}/{x}/{y}.png"
        );
        assert!(config.network.shards.is_empty());
        assert_eq!(config.network.timeout_secs, 10);
        assert_eq!(config.provision.throttle_ms, 200);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let ini = Ini::load_from_str("[cache]\nmax_tiles = 100\n").unwrap();
        let config = parse_ini(&ini).unwrap();

        assert_eq!(config.cache.max_tiles, 100);
        assert_eq!(config.network, NetworkSettings::default());
    }

    #[test]
    fn test_invalid_number_is_reported_with_context() {
        let ini = Ini::load_from_str("[cache]\nmax_tiles = plenty\n").unwrap();
        let err = parse_ini(&ini).unwrap_err();

        let text = err.to_string();
        assert!(text.contains("cache.max_tiles"));
        assert!(text.contains("plenty"));
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.ini");

        let mut config = ConfigFile::default();
        config.cache.max_tiles = 1234;
        config.network.shards = vec!["a".to_string(), "b".to_string()];
        config.save_to(&path).unwrap();

        let reloaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(reloaded.cache.max_tiles, 1234);
        assert_eq!(reloaded.network.shards, vec!["a", "b"]);
    }
}

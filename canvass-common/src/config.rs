//! Bootstrap configuration loading
//!
//! The dashboard reads a small TOML file at startup. The file location is
//! resolved in priority order:
//! 1. Command-line argument (`--config`)
//! 2. Environment variable (`CANVASS_CONFIG`)
//! 3. Per-user config file (`~/.config/canvass/config.toml`)
//! 4. Built-in defaults (no file)
//!
//! Individual command-line flags are applied on top by the binary.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "CANVASS_CONFIG";

/// Default upstream location of the address payloads
pub const DEFAULT_REMOTE_BASE_URL: &str =
    "https://raw.githubusercontent.com/ARCHITECTARIEL/district6-canvassing-app-test/main/";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlConfig {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Address source chain settings
    #[serde(default)]
    pub data: DataConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

/// Address source chain settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataConfig {
    /// Local files tried first, in order
    #[serde(default)]
    pub local_paths: Vec<PathBuf>,

    /// Base URL the remote candidate filenames are joined onto
    #[serde(default = "default_remote_base_url")]
    pub remote_base_url: Option<String>,

    /// Remote candidate filenames, tried in order
    #[serde(default = "default_remote_filenames")]
    pub remote_filenames: Vec<String>,

    /// Per-request timeout for remote fetches
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Skip the remote tier entirely
    #[serde(default)]
    pub offline: bool,

    /// Records fabricated per precinct by the synthetic generator
    #[serde(default = "default_sample_per_precinct")]
    pub sample_per_precinct: usize,

    /// Largest accepted upload body, in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            local_paths: Vec::new(),
            remote_base_url: default_remote_base_url(),
            remote_filenames: default_remote_filenames(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            offline: false,
            sample_per_precinct: default_sample_per_precinct(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl DataConfig {
    /// Remote candidate URLs in the order they should be fetched.
    ///
    /// Empty when offline or when no base URL is configured.
    pub fn remote_urls(&self) -> Vec<String> {
        if self.offline {
            return Vec::new();
        }
        let Some(base) = self.remote_base_url.as_deref() else {
            return Vec::new();
        };
        let base = base.trim_end_matches('/');
        self.remote_filenames
            .iter()
            .map(|name| format!("{}/{}", base, name.trim_start_matches('/').replace(' ', "%20")))
            .collect()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default log level (trace, debug, info, warn, error); `RUST_LOG` wins
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5730
}

fn default_remote_base_url() -> Option<String> {
    Some(DEFAULT_REMOTE_BASE_URL.to_string())
}

fn default_remote_filenames() -> Vec<String> {
    vec![
        "addresses.json".to_string(),
        "Voting Precincts 2022.geojson".to_string(),
    ]
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_sample_per_precinct() -> usize {
    24
}

fn default_max_upload_bytes() -> usize {
    32 * 1024 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Reject values that would make the service unusable
    pub fn validate(&self) -> Result<()> {
        if self.data.fetch_timeout_secs == 0 {
            return Err(Error::Config(
                "data.fetch_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.data.sample_per_precinct == 0 {
            return Err(Error::Config(
                "data.sample_per_precinct must be greater than zero".to_string(),
            ));
        }
        if self.data.max_upload_bytes == 0 {
            return Err(Error::Config(
                "data.max_upload_bytes must be greater than zero".to_string(),
            ));
        }
        if self.server.bind.trim().is_empty() {
            return Err(Error::Config("server.bind must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Where the resolved config file came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    CommandLine(PathBuf),
    Environment(PathBuf),
    UserConfig(PathBuf),
    Defaults,
}

/// Config file resolution following the CLI → ENV → user file → defaults order
pub struct ConfigResolver {
    cli_path: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        Self { cli_path }
    }

    /// Determine which config file (if any) should be read
    pub fn resolve(&self) -> ConfigSource {
        if let Some(path) = &self.cli_path {
            return ConfigSource::CommandLine(path.clone());
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return ConfigSource::Environment(PathBuf::from(path));
            }
        }

        if let Some(path) = user_config_path() {
            if path.exists() {
                return ConfigSource::UserConfig(path);
            }
        }

        ConfigSource::Defaults
    }

    /// Resolve and load the configuration.
    ///
    /// An explicitly named file (CLI or ENV) must exist and parse. Without
    /// one, built-in defaults are used.
    pub fn load(&self) -> Result<TomlConfig> {
        let config = match self.resolve() {
            ConfigSource::CommandLine(path) | ConfigSource::Environment(path) => {
                if !path.exists() {
                    return Err(Error::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                load_toml_config(&path)?
            }
            ConfigSource::UserConfig(path) => load_toml_config(&path)?,
            ConfigSource::Defaults => TomlConfig::default(),
        };

        config.validate()?;
        Ok(config)
    }
}

/// Per-user config file location for the current platform
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("canvass").join("config.toml"))
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_empty_toml() {
        let parsed: TomlConfig = toml::from_str("").unwrap();
        let defaults = TomlConfig::default();

        assert_eq!(parsed.server.port, defaults.server.port);
        assert_eq!(parsed.server.bind, defaults.server.bind);
        assert_eq!(parsed.data.remote_filenames, defaults.data.remote_filenames);
        assert_eq!(parsed.data.fetch_timeout_secs, 10);
        assert_eq!(parsed.data.sample_per_precinct, 24);
        assert_eq!(parsed.data.max_upload_bytes, 32 * 1024 * 1024);
        assert_eq!(parsed.logging.level, "info");
    }

    #[test]
    fn test_remote_urls_encode_spaces() {
        let data = DataConfig {
            remote_base_url: Some("http://example.test/data/".to_string()),
            ..DataConfig::default()
        };

        assert_eq!(
            data.remote_urls(),
            vec![
                "http://example.test/data/addresses.json".to_string(),
                "http://example.test/data/Voting%20Precincts%202022.geojson".to_string(),
            ]
        );
    }

    #[test]
    fn test_remote_urls_empty_when_offline() {
        let data = DataConfig {
            offline: true,
            ..DataConfig::default()
        };
        assert!(data.remote_urls().is_empty());

        let data = DataConfig {
            remote_base_url: None,
            ..DataConfig::default()
        };
        assert!(data.remote_urls().is_empty());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = TomlConfig::default();
        config.data.fetch_timeout_secs = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}

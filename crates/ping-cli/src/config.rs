//! Configuration management for the `ping` CLI
//!
//! Configuration is stored in TOML format.
//!
//! # Configuration File Locations
//!
//! - Linux: `~/.config/ping/config.toml`
//! - macOS: `~/Library/Application Support/ping/config.toml`
//! - Windows: `%APPDATA%\ping\config\config.toml`
//!
//! Private keys are never written to the config file. Supply them with
//! `--private-key` or the `PING_PRIVATE_KEY` environment variable.

use std::path::{Path, PathBuf};

use ping_client::config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECONDS};
use ping_client::models::DEFAULT_PROVIDER;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse config file
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// CLI configuration
///
/// # Example TOML
///
/// ```toml
/// [server]
/// url = "http://localhost:3100"
/// timeout_seconds = 30
///
/// [agent]
/// id = "agent-123"
/// provider = "rust"
///
/// [output]
/// format = "table"  # "table" | "json" | "quiet"
/// verbose = false
///
/// [logging]
/// level = "warn"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Agent identity configuration
    #[serde(default)]
    pub agent: AgentConfig,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// PING API base URL
    #[serde(default = "default_server_url")]
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_server_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_server_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Agent identity configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Registered agent id (unset = not registered)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Provider reported on registration
    #[serde(default = "default_provider")]
    pub provider: String,
}

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            id: None,
            provider: default_provider(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output format: "table", "json", "quiet"
    #[serde(default = "default_format")]
    pub format: String,

    /// Verbose output
    #[serde(default)]
    pub verbose: bool,
}

fn default_format() -> String {
    "table".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            verbose: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive, e.g. "warn" or "ping_client=debug"
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default location
    pub fn load_default() -> Result<Self, ConfigError> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::load(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from custom path or default
    pub fn load_from(custom_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = custom_path {
            Self::load(path)
        } else {
            Self::load_default()
        }
    }

    /// Get default configuration file path
    pub fn default_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get the config directory path
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "ping").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Write the commented sample configuration to `path`.
    ///
    /// An existing file is only replaced when `overwrite` is set. Returns
    /// whether a file was written.
    pub fn write_default(path: &Path, overwrite: bool) -> Result<bool, ConfigError> {
        if path.exists() && !overwrite {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, Self::sample_toml())?;
        Ok(true)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.server.url.starts_with("http://") && !self.server.url.starts_with("https://") {
            return Err(ConfigError::ValidationError(format!(
                "Invalid server URL '{}': must start with http:// or https://",
                self.server.url
            )));
        }

        if self.server.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if matches!(self.agent.id.as_deref(), Some(id) if id.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "agent id must not be empty; remove the key instead".to_string(),
            ));
        }

        let valid_formats = ["table", "json", "quiet"];
        if !valid_formats.contains(&self.output.format.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid output format '{}'. Valid values: {:?}",
                self.output.format, valid_formats
            )));
        }

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Invalid log level '': must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Settings for the API client
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.server.url.clone()).with_timeout(self.server.timeout_seconds)
    }

    /// Generate a sample configuration file content
    pub fn sample_toml() -> &'static str {
        r#"# PING CLI Configuration

[server]
# PING API base URL
url = "http://localhost:3100"
# Request timeout in seconds
timeout_seconds = 30

[agent]
# Registered agent id, printed by `ping register`
# id = ""
# Provider reported on registration
provider = "rust"
# The private key is never stored here: use PING_PRIVATE_KEY

[output]
# Output format: "table", "json", "quiet"
format = "table"
# Enable verbose output
verbose = false

[logging]
# Log level or filter: "error", "warn", "info", "debug", "trace"
level = "warn"
"#
    }
}

/// CLI configuration overrides
///
/// Command-line arguments take precedence over config file values.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// Server URL override
    pub server_url: Option<String>,
    /// Agent id override
    pub agent_id: Option<String>,
    /// Output format override
    pub output_format: Option<String>,
    /// Verbose flag override
    pub verbose: Option<bool>,
    /// Debug flag override
    pub debug: Option<bool>,
}

impl Config {
    /// Apply CLI overrides to configuration
    pub fn with_overrides(mut self, overrides: &CliOverrides) -> Self {
        if let Some(ref url) = overrides.server_url {
            self.server.url = url.clone();
        }
        if let Some(ref id) = overrides.agent_id {
            if !id.is_empty() {
                self.agent.id = Some(id.clone());
            }
        }
        if let Some(ref format) = overrides.output_format {
            self.output.format = format.clone();
        }
        if let Some(verbose) = overrides.verbose {
            self.output.verbose = verbose;
        }
        if overrides.debug == Some(true) {
            self.logging.level = "debug".to_string();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Test default configuration values
    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.url, "http://localhost:3100");
        assert_eq!(config.server.timeout_seconds, 30);
        assert!(config.agent.id.is_none());
        assert_eq!(config.agent.provider, "rust");
        assert_eq!(config.output.format, "table");
        assert!(!config.output.verbose);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_server_url() {
        let mut config = Config::default();
        config.server.url = "localhost:3100".to_string();

        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("Invalid server URL"));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.server.timeout_seconds = 0;

        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("timeout_seconds"));
    }

    #[test]
    fn test_validate_empty_agent_id() {
        let mut config = Config::default();
        config.agent.id = Some("  ".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_invalid_output_format() {
        let mut config = Config::default();
        config.output.format = "xml".to_string();

        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("Invalid output format"));
    }

    #[test]
    fn test_validate_empty_log_level() {
        let mut config = Config::default();
        config.logging.level = String::new();
        assert!(config.validate().is_err());
    }

    /// Test config save and load round-trip
    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.agent.id = Some("agent-42".to_string());
        config.server.url = "https://ping.example.com".to_string();
        config.save(&config_path).unwrap();

        let loaded = Config::load(&config_path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, "[output]\nformat = \"xml\"\n").unwrap();

        assert!(matches!(
            Config::load(&config_path),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = Config::load(&temp_dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError(_))));
    }

    #[test]
    fn test_write_default_keeps_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        assert!(Config::write_default(&config_path, false).unwrap());
        assert_eq!(Config::load(&config_path).unwrap(), Config::default());

        std::fs::write(&config_path, "[agent]\nid = \"agent-1\"\n").unwrap();
        assert!(!Config::write_default(&config_path, false).unwrap());
        assert_eq!(
            Config::load(&config_path).unwrap().agent.id.as_deref(),
            Some("agent-1")
        );

        assert!(Config::write_default(&config_path, true).unwrap());
        assert_eq!(Config::load(&config_path).unwrap(), Config::default());
    }

    /// Test CLI overrides
    #[test]
    fn test_cli_overrides() {
        let overrides = CliOverrides {
            server_url: Some("https://ping.example.com".to_string()),
            agent_id: Some("agent-7".to_string()),
            output_format: Some("json".to_string()),
            verbose: Some(true),
            debug: Some(true),
        };

        let config = Config::default().with_overrides(&overrides);

        assert_eq!(config.server.url, "https://ping.example.com");
        assert_eq!(config.agent.id.as_deref(), Some("agent-7"));
        assert_eq!(config.output.format, "json");
        assert!(config.output.verbose);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_cli_overrides_absent_keep_file_values() {
        let mut config = Config::default();
        config.agent.id = Some("from-file".to_string());
        config.logging.level = "info".to_string();

        let overrides = CliOverrides {
            agent_id: Some(String::new()),
            debug: Some(false),
            ..Default::default()
        };
        let config = config.with_overrides(&overrides);

        assert_eq!(config.agent.id.as_deref(), Some("from-file"));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.server.url, "http://localhost:3100");
    }

    #[test]
    fn test_toml_parsing() {
        let toml_content = r#"
[server]
url = "https://ping.example.com/api"
timeout_seconds = 5

[agent]
id = "agent-1"

[output]
format = "json"

[logging]
level = "ping_client=debug"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();

        assert_eq!(config.server.url, "https://ping.example.com/api");
        assert_eq!(config.server.timeout_seconds, 5);
        assert_eq!(config.agent.id.as_deref(), Some("agent-1"));
        assert_eq!(config.agent.provider, "rust");
        assert_eq!(config.output.format, "json");
        assert!(!config.output.verbose);
        assert_eq!(config.logging.level, "ping_client=debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sample_toml_is_valid() {
        let config: Config = toml::from_str(Config::sample_toml()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_client_config() {
        let mut config = Config::default();
        config.server.timeout_seconds = 7;
        let client = config.client_config();
        assert_eq!(client.base_url, "http://localhost:3100");
        assert_eq!(client.timeout_seconds, 7);
    }

    #[test]
    fn test_default_path() {
        let path = Config::default_path().unwrap();
        assert!(path.ends_with("config.toml"));
        assert!(path.to_string_lossy().contains("ping"));
    }

    #[test]
    fn test_load_from_custom_path() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("custom.toml");
        Config::default().save(&config_path).unwrap();

        let loaded = Config::load_from(Some(&config_path)).unwrap();
        assert_eq!(loaded, Config::default());
    }
}

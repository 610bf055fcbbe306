//! Server configuration management
//!
//! Handles loading configuration from environment variables, TOML files, and CLI arguments,
//! and loading the provider credential once at startup.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default JSON-RPC endpoint of the random integer provider
pub const DEFAULT_UPSTREAM_URL: &str = "https://api.random.org/json-rpc/4/invoke";

/// Default per-call upstream timeout in milliseconds
pub const DEFAULT_UPSTREAM_TIMEOUT_MS: u64 = 5_000;

/// Default cap on the `requests` parameter of one call
pub const DEFAULT_MAX_REQUESTS: usize = 1_000;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid port number: {0}. Must be between 1 and 65535")]
    InvalidPort(u16),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid environment: {0}. Must be one of: development, staging, production")]
    InvalidEnvironment(String),

    #[error("Invalid upstream timeout: {0}ms. Must be greater than zero")]
    InvalidTimeout(u64),

    #[error("Invalid max requests: {0}. Must be greater than zero")]
    InvalidMaxRequests(usize),

    #[error("Upstream URL must not be empty")]
    EmptyUpstreamUrl,

    #[error("Configuration file error: {0}")]
    FileError(String),

    #[error("Environment variable error: {0}")]
    EnvError(String),
}

/// Log levels supported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl std::str::FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl LogLevel {
    /// Convert log level to tracing filter string
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

/// Environment types for configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl std::str::FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidEnvironment(s.to_string())),
        }
    }
}

impl Environment {
    /// Check if this is a production environment
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Server configuration structure
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Log level
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
    /// Environment (development, staging, production)
    #[serde(deserialize_with = "deserialize_environment")]
    pub environment: Environment,
    /// File holding the provider API key
    pub api_key_file: PathBuf,
    /// Provider JSON-RPC endpoint
    pub upstream_url: String,
    /// Timeout applied to each upstream call, in milliseconds
    pub upstream_timeout_ms: u64,
    /// Cap on concurrent upstream calls per request (0 = one per batch)
    pub max_in_flight: usize,
    /// Largest accepted `requests` parameter
    pub max_requests: usize,
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    LogLevel::from_str(&s).map_err(serde::de::Error::custom)
}

fn deserialize_environment<'de, D>(deserializer: D) -> Result<Environment, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Environment::from_str(&s).map_err(serde::de::Error::custom)
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: LogLevel::Info,
            environment: Environment::Development,
            api_key_file: PathBuf::from("config.txt"),
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            upstream_timeout_ms: DEFAULT_UPSTREAM_TIMEOUT_MS,
            max_in_flight: 0,
            max_requests: DEFAULT_MAX_REQUESTS,
        }
    }
}

impl ServerConfig {
    /// Create a new ServerConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("RANDSTAT_SERVER_HOST") {
            config.host = host;
        }

        if let Ok(port_str) = std::env::var("RANDSTAT_SERVER_PORT") {
            config.port = port_str.parse().map_err(|_| ConfigError::InvalidPort(0))?;
        }

        if let Ok(log_level) = std::env::var("RANDSTAT_LOG_LEVEL") {
            config.log_level = LogLevel::from_str(&log_level)?;
        }

        if let Ok(env) = std::env::var("RANDSTAT_ENV") {
            config.environment = Environment::from_str(&env)?;
        }

        if let Ok(path) = std::env::var("RANDSTAT_API_KEY_FILE") {
            config.api_key_file = PathBuf::from(path);
        }

        if let Ok(url) = std::env::var("RANDSTAT_UPSTREAM_URL") {
            config.upstream_url = url;
        }

        if let Ok(timeout_str) = std::env::var("RANDSTAT_UPSTREAM_TIMEOUT_MS") {
            config.upstream_timeout_ms = timeout_str.parse().map_err(|_| {
                ConfigError::EnvError(format!(
                    "RANDSTAT_UPSTREAM_TIMEOUT_MS is not a number: {}",
                    timeout_str
                ))
            })?;
        }

        if let Ok(limit_str) = std::env::var("RANDSTAT_MAX_IN_FLIGHT") {
            config.max_in_flight = limit_str.parse().map_err(|_| {
                ConfigError::EnvError(format!(
                    "RANDSTAT_MAX_IN_FLIGHT is not a number: {}",
                    limit_str
                ))
            })?;
        }

        if let Ok(max_str) = std::env::var("RANDSTAT_MAX_REQUESTS") {
            config.max_requests = max_str.parse().map_err(|_| {
                ConfigError::EnvError(format!(
                    "RANDSTAT_MAX_REQUESTS is not a number: {}",
                    max_str
                ))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileError(format!("Failed to read config file: {}", e)))?;

        let config: ServerConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::FileError(format!("Failed to parse TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port));
        }

        if self.upstream_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout(self.upstream_timeout_ms));
        }

        if self.max_requests == 0 {
            return Err(ConfigError::InvalidMaxRequests(self.max_requests));
        }

        if self.upstream_url.trim().is_empty() {
            return Err(ConfigError::EmptyUpstreamUrl);
        }

        Ok(())
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Per-call upstream timeout
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }

    /// Concurrency cap, `None` when every batch may run at once
    pub fn in_flight_limit(&self) -> Option<usize> {
        (self.max_in_flight > 0).then_some(self.max_in_flight)
    }

    /// Merge with CLI arguments (CLI takes precedence)
    pub fn merge_with_cli(&mut self, cli: &CliArgs) {
        if let Some(host) = &cli.host {
            self.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.port = port;
        }
        if let Some(log_level) = &cli.log_level {
            if let Ok(level) = LogLevel::from_str(log_level) {
                self.log_level = level;
            }
        }
        if let Some(path) = &cli.api_key_file {
            self.api_key_file = path.clone();
        }
    }
}

/// CLI arguments structure
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Config file path
    pub config_file: Option<PathBuf>,
    /// Host address override
    pub host: Option<String>,
    /// Port override
    pub port: Option<u16>,
    /// Log level override
    pub log_level: Option<String>,
    /// API key file override
    pub api_key_file: Option<PathBuf>,
}

/// Build configuration from all sources
///
/// Priority (highest to lowest):
/// 1. CLI arguments
/// 2. Environment variables
/// 3. Config file
/// 4. Default values
pub fn build_config(cli: &CliArgs) -> Result<ServerConfig, ConfigError> {
    let mut config = if let Some(config_path) = &cli.config_file {
        ServerConfig::from_file(config_path)?
    } else {
        ServerConfig::default()
    };

    // Only variables that are actually set override the file
    let env_config = ServerConfig::from_env()?;
    if std::env::var("RANDSTAT_SERVER_HOST").is_ok() {
        config.host = env_config.host;
    }
    if std::env::var("RANDSTAT_SERVER_PORT").is_ok() {
        config.port = env_config.port;
    }
    if std::env::var("RANDSTAT_LOG_LEVEL").is_ok() {
        config.log_level = env_config.log_level;
    }
    if std::env::var("RANDSTAT_ENV").is_ok() {
        config.environment = env_config.environment;
    }
    if std::env::var("RANDSTAT_API_KEY_FILE").is_ok() {
        config.api_key_file = env_config.api_key_file;
    }
    if std::env::var("RANDSTAT_UPSTREAM_URL").is_ok() {
        config.upstream_url = env_config.upstream_url;
    }
    if std::env::var("RANDSTAT_UPSTREAM_TIMEOUT_MS").is_ok() {
        config.upstream_timeout_ms = env_config.upstream_timeout_ms;
    }
    if std::env::var("RANDSTAT_MAX_IN_FLIGHT").is_ok() {
        config.max_in_flight = env_config.max_in_flight;
    }
    if std::env::var("RANDSTAT_MAX_REQUESTS").is_ok() {
        config.max_requests = env_config.max_requests;
    }

    config.merge_with_cli(cli);

    config.validate()?;

    Ok(config)
}

/// Provider API key.
///
/// `Debug` never prints the key itself.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a key, rejecting blank values
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into().trim().to_string();
        (!key.is_empty()).then_some(Self(key))
    }

    /// Read the key from `path`.
    ///
    /// A missing, unreadable or blank file yields `None` and a warning; the
    /// server keeps running and answers every aggregation request with 401.
    pub fn load(path: &Path) -> Option<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let credential = Self::new(content);
                if credential.is_none() {
                    tracing::warn!(path = %path.display(), "API key file is empty");
                }
                credential
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read API key file");
                None
            }
        }
    }

    /// The raw key, for the upstream payload only
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.api_key_file, PathBuf::from("config.txt"));
        assert_eq!(config.upstream_url, DEFAULT_UPSTREAM_URL);
        assert_eq!(config.upstream_timeout(), Duration::from_secs(5));
        assert_eq!(config.in_flight_limit(), None);
        assert_eq!(config.max_requests, DEFAULT_MAX_REQUESTS);
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::from_str("trace").unwrap(), LogLevel::Trace);
        assert_eq!(LogLevel::from_str("DEBUG").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("Info").unwrap(), LogLevel::Info);
        assert_eq!(LogLevel::from_str("WARN").unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::from_str("error").unwrap(), LogLevel::Error);

        assert!(LogLevel::from_str("invalid").is_err());
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!(
            Environment::from_str("dev").unwrap(),
            Environment::Development
        );
        assert_eq!(
            Environment::from_str("staging").unwrap(),
            Environment::Staging
        );
        assert_eq!(
            Environment::from_str("prod").unwrap(),
            Environment::Production
        );
        assert!(Environment::Production.is_production());
        assert!(!Environment::Staging.is_production());

        assert!(Environment::from_str("invalid").is_err());
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            ..Default::default()
        };
        assert_eq!(config.socket_addr(), "127.0.0.1:3000");
    }

    #[test]
    fn test_validate() {
        let mut config = ServerConfig::default();
        config.port = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidPort(0))));

        let mut config = ServerConfig::default();
        config.upstream_timeout_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTimeout(0))
        ));

        let mut config = ServerConfig::default();
        config.upstream_url = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyUpstreamUrl)
        ));

        let mut config = ServerConfig::default();
        config.max_requests = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidMaxRequests(0))
        ));

        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_in_flight_limit() {
        let config = ServerConfig {
            max_in_flight: 4,
            ..Default::default()
        };
        assert_eq!(config.in_flight_limit(), Some(4));
    }

    #[test]
    fn test_cli_args_merge() {
        let mut config = ServerConfig::default();
        let cli = CliArgs {
            host: Some("192.168.1.1".to_string()),
            port: Some(9000),
            log_level: Some("debug".to_string()),
            api_key_file: Some(PathBuf::from("/etc/randstat/key")),
            config_file: None,
        };

        config.merge_with_cli(&cli);

        assert_eq!(config.host, "192.168.1.1");
        assert_eq!(config.port, 9000);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.api_key_file, PathBuf::from("/etc/randstat/key"));
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_str = r#"
            host = "127.0.0.1"
            port = 3000
            log_level = "debug"
            environment = "production"
            api_key_file = "secrets/random.txt"
            upstream_url = "http://localhost:9999/invoke"
            upstream_timeout_ms = 250
            max_in_flight = 8
            max_requests = 50
        "#;

        let config: ServerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.api_key_file, PathBuf::from("secrets/random.txt"));
        assert_eq!(config.upstream_url, "http://localhost:9999/invoke");
        assert_eq!(config.upstream_timeout(), Duration::from_millis(250));
        assert_eq!(config.in_flight_limit(), Some(8));
        assert_eq!(config.max_requests, 50);
    }

    #[test]
    fn test_partial_toml_deserialization() {
        let config: ServerConfig = toml::from_str("port = 9000").unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9000);
        assert_eq!(config.upstream_timeout_ms, DEFAULT_UPSTREAM_TIMEOUT_MS);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 4321\nupstream_timeout_ms = 100").unwrap();

        let config = ServerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.port, 4321);
        assert_eq!(config.upstream_timeout_ms, 100);
    }

    #[test]
    fn test_from_file_missing() {
        let err = ServerConfig::from_file(Path::new("/nonexistent/randstat.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileError(_)));
    }

    #[test]
    fn test_credential_load_trims_whitespace() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  abc-123  ").unwrap();

        let credential = Credential::load(file.path()).unwrap();
        assert_eq!(credential.expose(), "abc-123");
    }

    #[test]
    fn test_credential_load_missing_or_blank() {
        assert!(Credential::load(Path::new("/nonexistent/config.txt")).is_none());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "   ").unwrap();
        assert!(Credential::load(file.path()).is_none());
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let credential = Credential::new("secret").unwrap();
        assert_eq!(format!("{:?}", credential), "Credential(***)");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidPort(0);
        assert!(err.to_string().contains("Invalid port"));

        let err = ConfigError::InvalidTimeout(0);
        assert!(err.to_string().contains("Invalid upstream timeout"));
    }
}

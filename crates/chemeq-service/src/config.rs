//! Server configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use chemeq_core::IngestLimits;

/// Server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server settings.
    pub server: ServerConfig,
    /// Storage settings.
    pub storage: StorageConfig,
    /// Dataset size limits.
    pub ingest: IngestConfig,
    /// API key settings.
    pub security: SecurityConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Validate the configuration and return every error found.
    ///
    /// ```
    /// use chemeq_service::Config;
    ///
    /// let config = Config::default();
    /// config.validate().expect("Default config should be valid");
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();
        errors.extend(self.server.validate());
        errors.extend(self.storage.validate());
        errors.extend(self.ingest.validate());
        errors.extend(self.security.validate());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

impl ServerConfig {
    /// Validate server configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.bind.is_empty() {
            errors.push(ValidationError::new("server.bind", "bind address cannot be empty"));
            return errors;
        }

        let Some((_, port)) = self.bind.rsplit_once(':') else {
            errors.push(ValidationError::new(
                "server.bind",
                format!(
                    "invalid bind address '{}': expected format 'host:port'",
                    self.bind
                ),
            ));
            return errors;
        };

        match port.parse::<u16>() {
            Ok(0) => errors.push(ValidationError::new("server.bind", "port cannot be 0")),
            Err(_) => errors.push(ValidationError::new(
                "server.bind",
                format!("invalid port '{}': must be a number 1-65535", port),
            )),
            Ok(_) => {}
        }

        errors
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file path.
    pub path: PathBuf,
    /// Number of uploads kept; older ones are evicted.
    pub retention: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: chemeq_store::default_db_path(),
            retention: chemeq_types::DEFAULT_RETENTION,
        }
    }
}

impl StorageConfig {
    /// Validate storage configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.path.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "storage.path",
                "database path cannot be empty",
            ));
        }
        if self.retention == 0 {
            errors.push(ValidationError::new(
                "storage.retention",
                "retention must keep at least 1 upload",
            ));
        }

        errors
    }
}

/// Dataset size limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Maximum number of data rows per upload.
    pub max_rows: usize,
    /// Maximum upload size in bytes.
    pub max_bytes: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        let limits = IngestLimits::default();
        Self {
            max_rows: limits.max_rows,
            max_bytes: limits.max_bytes,
        }
    }
}

impl IngestConfig {
    /// Validate ingest limits.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.max_rows == 0 {
            errors.push(ValidationError::new("ingest.max_rows", "must be at least 1"));
        }
        if self.max_bytes == 0 {
            errors.push(ValidationError::new("ingest.max_bytes", "must be at least 1"));
        }
        errors
    }

    /// Limits for the ingest pipeline.
    pub fn limits(&self) -> IngestLimits {
        IngestLimits {
            max_rows: self.max_rows,
            max_bytes: self.max_bytes,
        }
    }
}

/// Minimum API key length.
pub const MIN_API_KEY_LENGTH: usize = 16;

/// API key authentication settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Require an `X-API-Key` header on every route except `/api/health`.
    pub api_key_enabled: bool,
    /// The expected key.
    pub api_key: Option<String>,
}

impl SecurityConfig {
    /// Validate security configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if !self.api_key_enabled {
            return errors;
        }
        match &self.api_key {
            None => errors.push(ValidationError::new(
                "security.api_key",
                "api_key is required when api_key_enabled is true",
            )),
            Some(key) if key.len() < MIN_API_KEY_LENGTH => errors.push(ValidationError::new(
                "security.api_key",
                format!(
                    "api_key is too short (minimum {} characters)",
                    MIN_API_KEY_LENGTH
                ),
            )),
            Some(_) => {}
        }
        errors
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// A single validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field path (e.g., `server.bind` or `storage.retention`).
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("chemeq")
        .join("server.toml")
}

// crates/signet-server/src/config.rs
// ============================================================================
// Module: Signet Server Configuration
// Description: Configuration loading and validation for the Signet server.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: signet-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size limits. The
//! config path comes from an explicit argument, the `SIGNET_CONFIG`
//! environment variable, or the default filename, in that order. A path that
//! was named explicitly fails closed when unreadable; only when no source is
//! named at all and no default file exists does the server fall back to
//! built-in defaults (loopback bind, in-memory storage).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use signet_core::LifecycleConfig;
use signet_core::SECOND_MILLIS;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "signet.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "SIGNET_CONFIG";
/// Maximum configuration file size in bytes.
const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum number of server auth tokens.
const MAX_AUTH_TOKENS: usize = 64;
/// Maximum length of a server auth token.
const MAX_AUTH_TOKEN_LENGTH: usize = 256;
/// Minimum generated token length.
const MIN_TOKEN_LENGTH: usize = 12;
/// Maximum generated token length.
const MAX_TOKEN_LENGTH: usize = 128;
/// Default bind address.
const DEFAULT_BIND: &str = "127.0.0.1:8080";
/// Default maximum request body size in bytes (documents upload inline).
const DEFAULT_MAX_BODY_BYTES: usize = 25 * 1024 * 1024;
/// Default link lifetime in seconds (seven days).
const DEFAULT_LINK_TTL_SECS: u64 = 7 * 24 * 60 * 60;
/// Default generated token/identifier length.
const DEFAULT_TOKEN_LENGTH: usize = 21;
/// Default signing-session URL lifetime in seconds.
const DEFAULT_SESSION_URL_TTL_SECS: u64 = 3_600;
/// Default signed-artifact URL lifetime in seconds.
const DEFAULT_ARTIFACT_URL_TTL_SECS: u64 = 86_400;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Filesystem error while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parse failure.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Configuration is internally inconsistent or unsafe.
    #[error("config invalid: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Configuration Model
// ============================================================================

/// Top-level Signet server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SignetConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Document storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Sign-link lifecycle settings.
    #[serde(default)]
    pub lifecycle: LifecycleSettings,
}

impl Default for SignetConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            lifecycle: LifecycleSettings::default(),
        }
    }
}

impl SignetConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path);
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration, falling back to defaults when nothing names a
    /// config source.
    ///
    /// An explicit path or a set `SIGNET_CONFIG` variable is loaded strictly.
    /// Otherwise the default filename is loaded when it exists, and built-in
    /// defaults are used when it does not.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a named config source cannot be loaded
    /// or fails validation.
    pub fn load_optional(path: Option<&Path>) -> Result<Self, ConfigError> {
        if path.is_some() || env::var_os(CONFIG_ENV_VAR).is_some() {
            return Self::load(path);
        }
        Self::load_default_in(Path::new("."))
    }

    /// Loads the default config file under `dir`, or defaults when absent.
    fn load_default_in(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(DEFAULT_CONFIG_NAME);
        if path.exists() {
            Self::load(Some(&path))
        } else {
            Ok(Self::default())
        }
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.storage.validate()?;
        self.lifecycle.validate()?;
        Ok(())
    }
}

/// Resolves the effective configuration path.
fn resolve_path(path: Option<&Path>) -> PathBuf {
    path.map_or_else(
        || {
            env::var(CONFIG_ENV_VAR)
                .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_NAME), PathBuf::from)
        },
        Path::to_path_buf,
    )
}

// ============================================================================
// SECTION: Server Settings
// ============================================================================

/// Authentication mode for administrative endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerAuthMode {
    /// Administrative endpoints accept loopback connections only.
    LocalOnly,
    /// Administrative endpoints require a configured bearer token.
    BearerToken,
}

/// Bearer token settings for administrative endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Accepted bearer tokens.
    pub bearer_tokens: Vec<String>,
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the HTTP listener.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Authentication mode for administrative endpoints.
    #[serde(default = "default_auth_mode")]
    pub auth_mode: ServerAuthMode,
    /// Bearer token settings; required in bearer mode.
    #[serde(default)]
    pub auth: Option<AuthConfig>,
    /// Maximum allowed request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            auth_mode: default_auth_mode(),
            auth: None,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    /// Validates server settings.
    fn validate(&self) -> Result<(), ConfigError> {
        self.bind
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::Invalid("server.bind must be a socket address".to_string()))?;
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid("server.max_body_bytes must be nonzero".to_string()));
        }
        match self.auth_mode {
            ServerAuthMode::LocalOnly => Ok(()),
            ServerAuthMode::BearerToken => {
                let auth = self.auth.as_ref().ok_or_else(|| {
                    ConfigError::Invalid("bearer mode requires server.auth".to_string())
                })?;
                if auth.bearer_tokens.is_empty() {
                    return Err(ConfigError::Invalid(
                        "bearer mode requires at least one token".to_string(),
                    ));
                }
                if auth.bearer_tokens.len() > MAX_AUTH_TOKENS {
                    return Err(ConfigError::Invalid("too many bearer tokens".to_string()));
                }
                if auth
                    .bearer_tokens
                    .iter()
                    .any(|token| token.is_empty() || token.len() > MAX_AUTH_TOKEN_LENGTH)
                {
                    return Err(ConfigError::Invalid("bearer token length invalid".to_string()));
                }
                Ok(())
            }
        }
    }
}

/// Default bind address value.
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

/// Default authentication mode value.
const fn default_auth_mode() -> ServerAuthMode {
    ServerAuthMode::LocalOnly
}

/// Default maximum body size value.
const fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

// ============================================================================
// SECTION: Storage Settings
// ============================================================================

/// Document storage backend selection.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageConfig {
    /// Process-local in-memory storage; documents do not survive restart.
    Memory,
    /// S3-compatible object storage.
    ObjectStore(ObjectStoreConfig),
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Memory
    }
}

impl StorageConfig {
    /// Validates storage settings.
    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Memory => Ok(()),
            Self::ObjectStore(config) => config.validate(),
        }
    }
}

/// S3-compatible object-store settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectStoreConfig {
    /// Bucket name for document storage.
    pub bucket: String,
    /// Optional region (defaults to environment).
    #[serde(default)]
    pub region: Option<String>,
    /// Optional object-store endpoint (S3-compatible).
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Optional key prefix inside the bucket.
    #[serde(default)]
    pub prefix: Option<String>,
    /// Force path-style addressing (S3-compatible).
    #[serde(default)]
    pub force_path_style: bool,
    /// Allow non-TLS endpoints (explicit opt-in).
    #[serde(default)]
    pub allow_http: bool,
}

impl ObjectStoreConfig {
    /// Validates object-store settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when object-store settings are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket.trim().is_empty() {
            return Err(ConfigError::Invalid("storage.bucket must be set".to_string()));
        }
        if let Some(endpoint) = &self.endpoint
            && !endpoint.starts_with("https://")
            && !self.allow_http
        {
            return Err(ConfigError::Invalid(
                "storage.endpoint must use https unless allow_http is set".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Lifecycle Settings
// ============================================================================

/// Sign-link lifecycle settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LifecycleSettings {
    /// Default link lifetime in seconds.
    #[serde(default = "default_link_ttl_secs")]
    pub link_ttl_secs: u64,
    /// Length of generated sign tokens and identifiers.
    #[serde(default = "default_token_length")]
    pub token_length: usize,
    /// Signing-session URL lifetime in seconds.
    #[serde(default = "default_session_url_ttl_secs")]
    pub session_url_ttl_secs: u64,
    /// Signed-artifact URL lifetime in seconds.
    #[serde(default = "default_artifact_url_ttl_secs")]
    pub artifact_url_ttl_secs: u64,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            link_ttl_secs: default_link_ttl_secs(),
            token_length: default_token_length(),
            session_url_ttl_secs: default_session_url_ttl_secs(),
            artifact_url_ttl_secs: default_artifact_url_ttl_secs(),
        }
    }
}

impl LifecycleSettings {
    /// Validates lifecycle settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.link_ttl_secs == 0 {
            return Err(ConfigError::Invalid("lifecycle.link_ttl_secs must be nonzero".to_string()));
        }
        if self.token_length < MIN_TOKEN_LENGTH || self.token_length > MAX_TOKEN_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "lifecycle.token_length must be between {MIN_TOKEN_LENGTH} and {MAX_TOKEN_LENGTH}"
            )));
        }
        if self.session_url_ttl_secs == 0 || self.artifact_url_ttl_secs == 0 {
            return Err(ConfigError::Invalid("lifecycle url lifetimes must be nonzero".to_string()));
        }
        Ok(())
    }

    /// Converts the settings into an engine lifecycle configuration.
    #[must_use]
    pub fn to_lifecycle_config(&self) -> LifecycleConfig {
        LifecycleConfig {
            default_link_ttl_millis: i64::try_from(self.link_ttl_secs)
                .unwrap_or(i64::MAX / SECOND_MILLIS)
                .saturating_mul(SECOND_MILLIS),
            token_length: self.token_length,
            id_length: self.token_length,
            session_url_ttl_secs: self.session_url_ttl_secs,
            artifact_url_ttl_secs: self.artifact_url_ttl_secs,
        }
    }
}

/// Default link lifetime value.
const fn default_link_ttl_secs() -> u64 {
    DEFAULT_LINK_TTL_SECS
}

/// Default token length value.
const fn default_token_length() -> usize {
    DEFAULT_TOKEN_LENGTH
}

/// Default session URL lifetime value.
const fn default_session_url_ttl_secs() -> u64 {
    DEFAULT_SESSION_URL_TTL_SECS
}

/// Default artifact URL lifetime value.
const fn default_artifact_url_ttl_secs() -> u64 {
    DEFAULT_ARTIFACT_URL_TTL_SECS
}

// ============================================================================
// SECTION: Tests
// ============================================================================

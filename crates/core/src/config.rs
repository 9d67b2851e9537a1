//! Client configuration
//!
//! Values are layered: built-in defaults, then an optional configuration
//! file, then `SMARTMIX_*` environment variables (`__` separates nested
//! keys, e.g. `SMARTMIX_API__BASE_URL`). The default API base URL can also
//! be baked in at build time through the `SMARTMIX_API_BASE_URL` variable.

use crate::error::{CoreError, CoreResult};
use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;
use url::Url;

/// Per-request timeout used unless configured otherwise
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const SESSION_FILE: &str = "session.json";
const ENV_PREFIX: &str = "SMARTMIX";

/// Main client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Session persistence settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Log filter used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Backend API configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every request path is appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Session persistence configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Session file location; the platform data directory when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

fn default_base_url() -> String {
    option_env!("SMARTMIX_API_BASE_URL")
        .unwrap_or(DEFAULT_BASE_URL)
        .to_string()
}

const fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            storage: StorageConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl ClientConfig {
    /// Load configuration from defaults, an optional file and the environment
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// resulting configuration is invalid
    pub fn load(path: Option<&Path>) -> CoreResult<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the base URL is an absolute http(s) URL and the timeout
    /// is non-zero
    pub fn validate(&self) -> CoreResult<()> {
        let url = Url::parse(&self.api.base_url).map_err(|e| {
            CoreError::invalid_config(format!("api.base_url '{}': {e}", self.api.base_url))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(CoreError::invalid_config(format!(
                "api.base_url must use http or https, got '{}'",
                url.scheme()
            )));
        }

        if self.api.timeout_ms == 0 {
            return Err(CoreError::invalid_config("api.timeout_ms must be positive"));
        }

        Ok(())
    }

    /// Per-request timeout
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.api.timeout_ms)
    }

    /// Where the session is persisted
    pub fn session_path(&self) -> PathBuf {
        self.storage
            .path
            .clone()
            .unwrap_or_else(|| default_data_dir().join(SESSION_FILE))
    }
}

/// Platform data directory for the client
pub fn default_data_dir() -> PathBuf {
    if let Some(project_dirs) = ProjectDirs::from("com", "SmartMix", "smartmix") {
        project_dirs.data_dir().to_path_buf()
    } else {
        warn!("Failed to determine platform-specific directories, using ./data");
        PathBuf::from("./data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.api.timeout_ms, 10_000);
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.log_level, "info");
        assert!(config.storage.path.is_none());
        assert!(config.session_path().ends_with(SESSION_FILE));
        config.validate().unwrap();
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("smartmix.toml");
        std::fs::write(
            &path,
            r#"
log_level = "debug"

[api]
base_url = "https://erp.example.com/smartmix"
timeout_ms = 2500

[storage]
path = "/tmp/smartmix-session.json"
"#,
        )
        .unwrap();

        let config = ClientConfig::load(Some(&path)).unwrap();
        assert_eq!(config.api.base_url, "https://erp.example.com/smartmix");
        assert_eq!(config.timeout(), Duration::from_millis(2500));
        assert_eq!(config.log_level, "debug");
        assert_eq!(
            config.session_path(),
            PathBuf::from("/tmp/smartmix-session.json")
        );
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("smartmix.yaml");
        std::fs::write(&path, "api:\n  base_url: http://10.0.0.5:8080\n").unwrap();

        let config = ClientConfig::load(Some(&path)).unwrap();
        assert_eq!(config.api.base_url, "http://10.0.0.5:8080");
        assert_eq!(config.api.timeout_ms, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = ClientConfig::load(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ClientConfig::default();
        config.api.base_url = "not a url".to_string();
        assert!(matches!(
            config.validate(),
            Err(CoreError::InvalidConfig { .. })
        ));

        config.api.base_url = "ftp://files.example.com".to_string();
        assert!(config.validate().is_err());

        config.api.base_url = "http://localhost:8080".to_string();
        config.api.timeout_ms = 0;
        assert!(config.validate().is_err());
    }
}

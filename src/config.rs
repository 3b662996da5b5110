//! Client configuration: API base URL and per-request timeout.
//!
//! Values come from an optional `config.toml` in the application root and are
//! then overridden by `JOBTRACK_API_URL` / `JOBTRACK_API_TIMEOUT_SECS`.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::app_dirs;

/// Default filename used to store the client configuration.
pub const CONFIG_FILE_NAME: &str = "config.toml";
/// Environment variable overriding the API base URL.
pub const API_URL_ENV: &str = "JOBTRACK_API_URL";
/// Environment variable overriding the request timeout, in whole seconds.
pub const API_TIMEOUT_ENV: &str = "JOBTRACK_API_TIMEOUT_SECS";

const DEFAULT_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("Invalid request timeout '{0}': expected a positive number of seconds")]
    InvalidTimeout(String),
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
    #[error("App dir error: {0}")]
    AppDir(#[from] app_dirs::AppDirError),
}

/// Validated settings consumed by the gateway client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: Url,
    timeout: Duration,
}

/// On-disk shape of `config.toml`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    api: ApiSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ApiSection {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// Build a config from explicit values.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        if timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout("0".into()));
        }
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            timeout,
        })
    }

    /// Load from the application root and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = app_dirs::app_root_dir()?.join(CONFIG_FILE_NAME);
        Self::load_from(&path, |key| std::env::var(key).ok())
    }

    /// Load from `path` (if it exists) and then apply overrides from `env`.
    pub fn load_from(
        path: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let file = read_config_file(path)?;
        let mut config = Self::default();

        if let Some(raw) = file.api.base_url {
            config.base_url = parse_base_url(&raw)?;
        }
        if let Some(secs) = file.api.timeout_secs {
            config.timeout = timeout_from_secs(secs, &secs.to_string())?;
        }
        if let Some(raw) = env(API_URL_ENV).filter(|value| !value.trim().is_empty()) {
            debug!("{API_URL_ENV} overrides the configured base URL");
            config.base_url = parse_base_url(&raw)?;
        }
        if let Some(raw) = env(API_TIMEOUT_ENV).filter(|value| !value.trim().is_empty()) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?;
            config.timeout = timeout_from_secs(secs, &raw)?;
        }

        info!(
            "API base URL {}, request timeout {}s",
            config.base_url,
            config.timeout.as_secs()
        );
        Ok(config)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn read_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn timeout_from_secs(secs: u64, raw: &str) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::InvalidTimeout(raw.to_string()));
    }
    Ok(Duration::from_secs(secs))
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    let invalid = |reason: &str| ConfigError::InvalidBaseUrl {
        url: trimmed.to_string(),
        reason: reason.to_string(),
    };
    let parsed = Url::parse(trimmed).map_err(|err| invalid(&err.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host"));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(invalid("query and fragment are not allowed"));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_without_file_or_env() {
        let dir = tempdir().unwrap();
        let config = ClientConfig::load_from(&dir.path().join("missing.toml"), env_from(&[])).unwrap();
        assert_eq!(config.base_url().as_str(), "http://localhost:5000/");
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn file_values_are_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "[api]\nbase_url = \"https://tracker.example.com\"\ntimeout_secs = 3\n",
        )
        .unwrap();
        let config = ClientConfig::load_from(&path, env_from(&[])).unwrap();
        assert_eq!(config.base_url().host_str(), Some("tracker.example.com"));
        assert_eq!(config.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn env_overrides_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[api]\nbase_url = \"https://file.example.com\"\n").unwrap();
        let config = ClientConfig::load_from(
            &path,
            env_from(&[
                (API_URL_ENV, "http://127.0.0.1:9000"),
                (API_TIMEOUT_ENV, "25"),
            ]),
        )
        .unwrap();
        assert_eq!(config.base_url().as_str(), "http://127.0.0.1:9000/");
        assert_eq!(config.timeout(), Duration::from_secs(25));
    }

    #[test]
    fn rejects_non_http_scheme() {
        let err = ClientConfig::new("ftp://example.com", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn rejects_bad_timeout_env() {
        let dir = tempdir().unwrap();
        let err = ClientConfig::load_from(
            &dir.path().join("none.toml"),
            env_from(&[(API_TIMEOUT_ENV, "soon")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout(_)));

        let err = ClientConfig::load_from(
            &dir.path().join("none.toml"),
            env_from(&[(API_TIMEOUT_ENV, "0")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout(_)));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[api\nbase_url = ").unwrap();
        let err = ClientConfig::load_from(&path, env_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn load_uses_app_root_config() {
        let base = tempdir().unwrap();
        let _guard = app_dirs::ConfigBaseGuard::set(base.path().to_path_buf());
        // SAFETY: the config base guard serializes the tests that read these variables.
        unsafe {
            std::env::set_var(API_URL_ENV, "http://tracker.test:7000");
            std::env::remove_var(API_TIMEOUT_ENV);
        }
        let root = app_dirs::app_root_dir().unwrap();
        std::fs::write(
            root.join(CONFIG_FILE_NAME),
            "[api]\nbase_url = \"http://from-file:5000\"\ntimeout_secs = 4\n",
        )
        .unwrap();

        let loaded = ClientConfig::load();
        // SAFETY: the config base guard serializes the tests that read these variables.
        unsafe {
            std::env::remove_var(API_URL_ENV);
        }

        let config = loaded.unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(4));
        assert_eq!(config.base_url().as_str(), "http://tracker.test:7000/");
    }
}

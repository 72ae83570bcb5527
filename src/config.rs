//! Client Configuration
//!
//! Stored as `config.json`. Missing keys take defaults; environment variables
//! override the file, and command-line flags override both.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::credential::Credential;

pub const DEFAULT_BASE_URL: &str = "https://ramialzend.bsite.net";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_BASE_URL: &str = "STAFFDESK_BASE_URL";
pub const ENV_TOKEN: &str = "STAFFDESK_TOKEN";
pub const ENV_TIMEOUT_SECS: &str = "STAFFDESK_TIMEOUT_SECS";

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    pub base_url: String,
    /// Bearer token issued by the server's login
    pub token: String,
    pub request_timeout_secs: u64,
    /// Where the rolling log is written; the binary picks a default
    pub log_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: String::new(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_dir: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &if self.token.is_empty() { "<none>" } else { "<set>" })
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("log_dir", &self.log_dir)
            .finish()
    }
}

impl ClientConfig {
    /// Read the file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        serde_json::from_str(&content).map_err(|e| format!("Invalid config {}: {}", path.display(), e))
    }

    pub fn save(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;
        }
        let content = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;
        fs::write(path, content).map_err(|e| format!("Failed to write {}: {}", path.display(), e))
    }

    /// Apply `STAFFDESK_*` variables from the process environment
    pub fn with_env(self) -> Result<Self, String> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup; blank values are ignored
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(token) = get(ENV_TOKEN) {
            self.token = token;
        }
        if let Some(secs) = get(ENV_TIMEOUT_SECS) {
            self.request_timeout_secs = secs
                .trim()
                .parse()
                .map_err(|_| format!("{} must be a whole number of seconds, got {}", ENV_TIMEOUT_SECS, secs))?;
        }
        Ok(self)
    }

    /// Never zero
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn credential(&self) -> Credential {
        Credential::new(self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::load(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = ClientConfig {
            base_url: "http://localhost:5000".into(),
            token: "abc".into(),
            request_timeout_secs: 5,
            log_dir: Some(dir.path().join("logs")),
        };
        config.save(&path).unwrap();
        assert_eq!(ClientConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"token": "xyz"}"#).unwrap();

        let config = ClientConfig::load(&path).unwrap();
        assert_eq!(config.token, "xyz");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_environment_overrides_file() {
        let env: HashMap<&str, &str> = [(ENV_BASE_URL, "http://env"), (ENV_TOKEN, " "), (ENV_TIMEOUT_SECS, "9")]
            .into_iter()
            .collect();
        let config = ClientConfig {
            token: "from-file".into(),
            ..ClientConfig::default()
        }
        .with_overrides(|key| env.get(key).map(|v| v.to_string()))
        .unwrap();

        assert_eq!(config.base_url, "http://env");
        assert_eq!(config.token, "from-file");
        assert_eq!(config.request_timeout_secs, 9);
    }

    #[test]
    fn test_bad_timeout_is_an_error() {
        let result = ClientConfig::default().with_overrides(|key| {
            (key == ENV_TIMEOUT_SECS).then(|| "soon".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_hides_token() {
        let config = ClientConfig {
            token: "secret".into(),
            ..ClientConfig::default()
        };
        assert!(!format!("{:?}", config).contains("secret"));
    }
}

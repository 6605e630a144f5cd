//! Top-level application configuration.
//!
//! Configuration is stored in `.chantag/config.yaml` and includes:
//! - The spreadsheet to edit and the names of its two sheets
//! - Cache lifetime and default page size
//! - The access token used for the spreadsheet API

use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ChantagError, Result};
use crate::paths;

/// Environment variable holding an access token; beats the config file.
pub const TOKEN_ENV: &str = "CHANTAG_ACCESS_TOKEN";

pub const DEFAULT_API_BASE_URL: &str = "https://sheets.googleapis.com/v4";

/// Keys accepted by `config get` / `config set`.
pub const CONFIG_KEYS: &[&str] = &[
    "spreadsheet_id",
    "sheets.main",
    "sheets.tags",
    "cache_ttl_secs",
    "page_size",
    "remote_timeout",
    "api_base_url",
    "auth.token",
];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Spreadsheet holding the channel and tag sheets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spreadsheet_id: Option<String>,

    #[serde(default)]
    pub sheets: SheetNames,

    /// Lifetime of cached sheet reads, in seconds (default: 300)
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Rows per page when listing (default: 25)
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Remote operation timeout in seconds (default: 30)
    #[serde(default = "default_remote_timeout")]
    pub remote_timeout: u64,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default)]
    pub auth: AuthConfig,
}

fn default_cache_ttl_secs() -> u64 {
    5 * 60
}

fn default_page_size() -> usize {
    25
}

fn default_remote_timeout() -> u64 {
    30
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spreadsheet_id: None,
            sheets: SheetNames::default(),
            cache_ttl_secs: default_cache_ttl_secs(),
            page_size: default_page_size(),
            remote_timeout: default_remote_timeout(),
            api_base_url: default_api_base_url(),
            auth: AuthConfig::default(),
        }
    }
}

/// Names of the two sheets the app reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetNames {
    #[serde(default = "default_main_sheet")]
    pub main: String,
    #[serde(default = "default_tags_sheet")]
    pub tags: String,
}

fn default_main_sheet() -> String {
    "Channels".to_string()
}

fn default_tags_sheet() -> String {
    "Tags".to_string()
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            main: default_main_sheet(),
            tags: default_tags_sheet(),
        }
    }
}

/// Authentication configuration
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> PathBuf {
        paths::config_path()
    }

    /// Load configuration from file, or return default if not found
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            ChantagError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config at {}: {}", path.display(), e),
            ))
        })?;
        let config: Config = serde_yaml_ng::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_yaml_ng::to_string(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Access token from the environment or the config file
    pub fn access_token(&self) -> Option<String> {
        if let Ok(token) = env::var(TOKEN_ENV)
            && !token.is_empty()
        {
            return Some(token);
        }

        self.auth.token.clone().filter(|t| !t.is_empty())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote_timeout)
    }

    /// The configured spreadsheet, or a configuration error.
    pub fn require_spreadsheet_id(&self) -> Result<&str> {
        self.spreadsheet_id.as_deref().ok_or_else(|| {
            ChantagError::Config(
                "spreadsheet_id not configured. Run: chantag config set spreadsheet_id <id>"
                    .to_string(),
            )
        })
    }

    /// Read a single value by dotted key. Tokens are never returned in clear.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = match key {
            "spreadsheet_id" => self.spreadsheet_id.clone(),
            "sheets.main" => Some(self.sheets.main.clone()),
            "sheets.tags" => Some(self.sheets.tags.clone()),
            "cache_ttl_secs" => Some(self.cache_ttl_secs.to_string()),
            "page_size" => Some(self.page_size.to_string()),
            "remote_timeout" => Some(self.remote_timeout.to_string()),
            "api_base_url" => Some(self.api_base_url.clone()),
            "auth.token" => self.auth.token.as_deref().map(mask_sensitive_value),
            _ => return Err(unknown_key(key)),
        };
        Ok(value)
    }

    /// Set a single value by dotted key.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "spreadsheet_id" => self.spreadsheet_id = Some(value.to_string()),
            "sheets.main" => self.sheets.main = non_empty(key, value)?,
            "sheets.tags" => self.sheets.tags = non_empty(key, value)?,
            "cache_ttl_secs" => self.cache_ttl_secs = parse_number(key, value)?,
            "page_size" => {
                let size: usize = parse_number(key, value)?;
                if size == 0 {
                    return Err(ChantagError::Config(
                        "page_size must be at least 1".to_string(),
                    ));
                }
                self.page_size = size;
            }
            "remote_timeout" => self.remote_timeout = parse_number(key, value)?,
            "api_base_url" => {
                url::Url::parse(value)?;
                self.api_base_url = value.trim_end_matches('/').to_string();
            }
            "auth.token" => self.auth.token = Some(value.to_string()),
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }
}

fn unknown_key(key: &str) -> ChantagError {
    ChantagError::Config(format!(
        "unknown config key '{key}'. Valid keys: {}",
        CONFIG_KEYS.join(", ")
    ))
}

fn non_empty(key: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ChantagError::Config(format!("{key} cannot be empty")));
    }
    Ok(value.to_string())
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ChantagError::Config(format!("{key} expects a number, got '{value}'")))
}

/// Mask a sensitive value by showing only the first 2 and last 2 characters
pub fn mask_sensitive_value(value: &str) -> String {
    let char_count = value.chars().count();
    if char_count > 4 {
        let first: String = value.chars().take(2).collect();
        let last: String = value.chars().skip(char_count - 2).collect();
        format!("{first}...{last}")
    } else {
        "****".to_string()
    }
}

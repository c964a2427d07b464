//! Application configuration management.
//!
//! Configuration is a JSON document stored at `~/.config/atelier/config.json`
//! (or a path given explicitly). Every section has defaults, so a missing
//! file or a partial document is fine. Environment variables override the
//! file after loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config directory paths
const APP_NAME: &str = "atelier";

/// Config file name
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub cms: CmsConfig,
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub rate_limit: RateLimitConfig,
    pub indexnow: IndexNowConfig,
    pub contact: ContactConfig,
    /// Directory for rolling log files; stderr only when unset
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CmsConfig {
    pub project_id: String,
    pub dataset: String,
    pub api_version: String,
    pub token: Option<String>,
    pub use_cdn: bool,
    pub request_timeout_secs: u64,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            project_id: "2y05n6hf".to_string(),
            dataset: "production".to_string(),
            api_version: "2023-05-03".to_string(),
            token: None,
            use_cdn: true,
            request_timeout_secs: 30,
        }
    }
}

impl CmsConfig {
    /// Base URL of the hosted query API. The CDN host serves cached reads.
    pub fn api_host(&self) -> String {
        let host = if self.use_cdn { "apicdn" } else { "api" };
        format!("https://{}.{}.sanity.io", self.project_id, host)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_entries: 500 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 5,
            window_secs: 60,
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexNowConfig {
    /// Site host that submitted URLs must belong to
    pub host: String,
    pub key: String,
    pub endpoints: Vec<String>,
}

impl Default for IndexNowConfig {
    fn default() -> Self {
        Self {
            host: "idaromme.dk".to_string(),
            key: "indexnow-idaromme".to_string(),
            endpoints: vec![
                "https://api.indexnow.org/indexnow".to_string(),
                "https://www.bing.com/indexnow".to_string(),
            ],
        }
    }
}

impl IndexNowConfig {
    /// Public location of the key file that proves site ownership
    pub fn key_location(&self) -> String {
        format!("https://{}/{}.txt", self.host, self.key)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactConfig {
    /// Mail API key; the contact form answers 503 without one
    pub api_key: Option<String>,
    pub from: String,
    /// Recipient of contact form messages
    pub to: String,
    pub api_base: String,
    pub request_timeout_secs: u64,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            from: "contact@idaromme.dk".to_string(),
            to: "idaromme@gmail.com".to_string(),
            api_base: "https://api.resend.com".to_string(),
            request_timeout_secs: 15,
        }
    }
}

impl ContactConfig {
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}

impl Config {
    /// Load from the default location, then apply environment overrides
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load from `path` if it exists, then apply environment overrides
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Apply overrides using `lookup` to read variables
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("SANITY_PROJECT_ID") {
            self.cms.project_id = v;
        }
        if let Some(v) = lookup("SANITY_DATASET") {
            self.cms.dataset = v;
        }
        if let Some(v) = lookup("SANITY_API_VERSION") {
            self.cms.api_version = v;
        }
        if let Some(v) = lookup("SANITY_API_TOKEN") {
            self.cms.token = Some(v);
        }
        if let Some(v) = lookup("SANITY_USE_CDN") {
            self.cms.use_cdn = matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Some(v) = lookup("INDEXNOW_KEY") {
            self.indexnow.key = v;
        }
        if let Some(v) = lookup("RESEND_API_KEY") {
            self.contact.api_key = Some(v);
        }
        if let Some(v) = lookup("CONTACT_EMAIL") {
            self.contact.to = v;
        }
        if let Some(v) = lookup("ATELIER_BIND") {
            self.server.bind = v;
        }
        if let Some(v) = lookup("ATELIER_LOG_DIR") {
            self.log_dir = Some(PathBuf::from(v));
        }
    }
}

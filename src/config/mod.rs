//! Configuration management

use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub notifications: NotificationConfig,
}

fn default_port() -> u16 {
    3000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            api: ApiConfig::default(),
            session: SessionConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }
}

/// Backend API location
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Credential cookie settings
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_cookie_days")]
    pub cookie_days: u32,
    /// Adds `Secure` to every Set-Cookie (enable behind TLS)
    #[serde(default)]
    pub secure_cookies: bool,
}

fn default_cookie_days() -> u32 {
    7
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_days: default_cookie_days(),
            secure_cookies: false,
        }
    }
}

impl SessionConfig {
    pub fn cookie_ttl(&self) -> Duration {
        Duration::from_secs(u64::from(self.cookie_days) * 24 * 60 * 60)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_display_ms")]
    pub display_ms: u64,
}

fn default_display_ms() -> u64 {
    3000
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            display_ms: default_display_ms(),
        }
    }
}

impl NotificationConfig {
    pub fn display_window(&self) -> Duration {
        Duration::from_millis(self.display_ms)
    }
}

/// Get config directory (LPR_CONFIG_DIR or current directory)
pub fn get_config_dir() -> std::path::PathBuf {
    std::env::var("LPR_CONFIG_DIR")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::path::PathBuf::from("."))
}

pub fn load_config() -> Result<Config> {
    let config_dir = get_config_dir();

    let mut builder = ::config::Config::builder()
        .set_default("port", i64::from(default_port()))?
        .add_source(
            ::config::File::with_name(&config_dir.join("config").to_string_lossy()).required(false),
        )
        // LPR_PORT, LPR_API__BASE_URL, LPR_SESSION__COOKIE_DAYS, ...
        .add_source(
            ::config::Environment::with_prefix("LPR")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    // Precedence: LPR_PORT > PORT > config > default
    if std::env::var("LPR_PORT").is_err() {
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(port_num) = port.parse::<u16>() {
                builder = builder.set_override("port", i64::from(port_num))?;
            }
        }
    }

    // Frontend-era variable names still found in deployment manifests
    if std::env::var("LPR_API__BASE_URL").is_err() {
        let legacy = std::env::var("API_URL").or_else(|_| std::env::var("NEXT_PUBLIC_API_URL"));
        if let Ok(url) = legacy {
            builder = builder.set_override("api.base_url", url)?;
        }
    }

    let config: Config = builder.build()?.try_deserialize()?;
    url::Url::parse(&config.api.base_url)
        .map_err(|e| anyhow::anyhow!("invalid api.base_url {:?}: {}", config.api.base_url, e))?;

    Ok(config)
}

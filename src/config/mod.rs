//! Configuration management for the feedcast relay
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::scheduler::CadencePolicy;

/// Default upstream feed
pub const DEFAULT_FEED_URL: &str = "https://www.pathofexile.com/news/rss";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Primary feed configuration
    pub feed: FeedConfig,

    /// Optional secondary content stream
    pub secondary: Option<SecondaryFeedConfig>,

    /// Polling cadence configuration
    pub schedule: ScheduleConfig,

    /// Persisted state locations
    pub storage: StorageConfig,

    /// Delivery gateway configuration
    pub delivery: DeliveryConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Primary feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Feed URL
    pub url: String,

    /// Fixed user agent; a browser UA is picked per request when unset
    pub user_agent: Option<String>,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_FEED_URL.to_string(),
            user_agent: None,
            request_timeout_secs: 30,
        }
    }
}

/// Secondary content stream configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecondaryFeedConfig {
    /// Feed URL of the secondary stream
    pub url: String,

    /// Link posted for each item; `{id}` is replaced with the provider id
    pub link_template: String,

    /// Dedup ledger for the secondary stream
    #[serde(default = "default_secondary_ledger")]
    pub ledger_path: PathBuf,
}

fn default_secondary_ledger() -> PathBuf {
    PathBuf::from("data/posted_secondary.json")
}

/// Polling cadence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Start of the day window (HH:MM, local time)
    pub day_start: String,

    /// Start of the night window (HH:MM, local time)
    pub night_start: String,

    /// Poll interval during the day window, in minutes
    pub day_interval_minutes: u32,

    /// Poll interval outside the day window, in minutes
    pub night_interval_minutes: u32,

    /// How often the cadence is re-evaluated, in seconds
    pub heartbeat_secs: u64,

    /// Upper bound on one poll cycle, in seconds
    pub cycle_timeout_secs: u64,

    /// Run a cycle immediately on startup
    pub poll_on_startup: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            day_start: "05:00".to_string(),
            night_start: "22:00".to_string(),
            day_interval_minutes: 10,
            night_interval_minutes: 120,
            heartbeat_secs: 60,
            cycle_timeout_secs: 300,
            poll_on_startup: true,
        }
    }
}

impl ScheduleConfig {
    /// Build the cadence policy described by this config
    pub fn cadence_policy(&self) -> crate::error::Result<CadencePolicy> {
        Ok(CadencePolicy::from_config(self)?)
    }

    /// Heartbeat period as Duration
    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }

    /// Cycle timeout as Duration
    pub fn cycle_timeout(&self) -> Duration {
        Duration::from_secs(self.cycle_timeout_secs)
    }
}

/// Persisted state locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Primary dedup ledger
    pub ledger_path: PathBuf,

    /// Tenant configuration map
    pub tenants_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            ledger_path: PathBuf::from("data/posted_news.json"),
            tenants_path: PathBuf::from("data/tenants.json"),
        }
    }
}

/// Delivery gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Timeout for each gateway call, in seconds
    pub timeout_secs: u64,

    /// Named destinations: destination id -> webhook URL
    pub destinations: BTreeMap<String, String>,

    /// Owner contacts: tenant id -> webhook URL
    pub owners: BTreeMap<String, String>,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            destinations: BTreeMap::new(),
            owners: BTreeMap::new(),
        }
    }
}

impl DeliveryConfig {
    /// Gateway call timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let feed = FeedConfig {
            url: std::env::var("FEEDCAST_FEED_URL").unwrap_or(defaults.feed.url),
            user_agent: std::env::var("FEEDCAST_USER_AGENT").ok(),
            request_timeout_secs: env_parse("FEEDCAST_REQUEST_TIMEOUT")
                .unwrap_or(defaults.feed.request_timeout_secs),
        };

        let secondary = match std::env::var("FEEDCAST_SECONDARY_URL") {
            Ok(url) => Some(SecondaryFeedConfig {
                url,
                link_template: std::env::var("FEEDCAST_SECONDARY_LINK_TEMPLATE")
                    .context("FEEDCAST_SECONDARY_LINK_TEMPLATE is required with FEEDCAST_SECONDARY_URL")?,
                ledger_path: std::env::var("FEEDCAST_SECONDARY_LEDGER")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| default_secondary_ledger()),
            }),
            Err(_) => None,
        };

        let schedule = ScheduleConfig {
            day_start: std::env::var("FEEDCAST_DAY_START").unwrap_or(defaults.schedule.day_start),
            night_start: std::env::var("FEEDCAST_NIGHT_START")
                .unwrap_or(defaults.schedule.night_start),
            day_interval_minutes: env_parse("FEEDCAST_DAY_INTERVAL_MINUTES")
                .unwrap_or(defaults.schedule.day_interval_minutes),
            night_interval_minutes: env_parse("FEEDCAST_NIGHT_INTERVAL_MINUTES")
                .unwrap_or(defaults.schedule.night_interval_minutes),
            heartbeat_secs: env_parse("FEEDCAST_HEARTBEAT_SECS")
                .unwrap_or(defaults.schedule.heartbeat_secs),
            cycle_timeout_secs: env_parse("FEEDCAST_CYCLE_TIMEOUT")
                .unwrap_or(defaults.schedule.cycle_timeout_secs),
            poll_on_startup: env_parse("FEEDCAST_POLL_ON_STARTUP")
                .unwrap_or(defaults.schedule.poll_on_startup),
        };

        let storage = StorageConfig {
            ledger_path: std::env::var("FEEDCAST_LEDGER_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage.ledger_path),
            tenants_path: std::env::var("FEEDCAST_TENANTS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage.tenants_path),
        };

        let delivery = DeliveryConfig {
            timeout_secs: env_parse("FEEDCAST_DELIVERY_TIMEOUT")
                .unwrap_or(defaults.delivery.timeout_secs),
            ..defaults.delivery
        };

        let logging = LoggingConfig {
            level: std::env::var("FEEDCAST_LOG_LEVEL").unwrap_or(defaults.logging.level),
            format: std::env::var("FEEDCAST_LOG_FORMAT").unwrap_or(defaults.logging.format),
        };

        Ok(Self {
            feed,
            secondary,
            schedule,
            storage,
            delivery,
            logging,
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        validate_http_url("feed.url", &self.feed.url)?;

        if self.feed.request_timeout_secs == 0 {
            anyhow::bail!("feed.request_timeout_secs must be greater than 0");
        }

        if let Some(secondary) = &self.secondary {
            validate_http_url("secondary.url", &secondary.url)?;
            if !secondary.link_template.contains("{id}") {
                anyhow::bail!("secondary.link_template must contain an {{id}} placeholder");
            }
        }

        self.schedule
            .cadence_policy()
            .context("Invalid schedule configuration")?;

        if self.schedule.heartbeat_secs == 0 || self.schedule.heartbeat_secs > 60 {
            anyhow::bail!("schedule.heartbeat_secs must be between 1 and 60");
        }

        if self.schedule.cycle_timeout_secs == 0 {
            anyhow::bail!("schedule.cycle_timeout_secs must be greater than 0");
        }

        if self.delivery.timeout_secs == 0 {
            anyhow::bail!("delivery.timeout_secs must be greater than 0");
        }

        for (name, url) in self
            .delivery
            .destinations
            .iter()
            .chain(self.delivery.owners.iter())
        {
            validate_http_url(name, url)?;
        }

        Ok(())
    }
}

fn validate_http_url(field: &str, value: &str) -> Result<()> {
    let parsed = Url::parse(value).with_context(|| format!("{field}: invalid URL '{value}'"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("{field}: URL must use http or https");
    }
    Ok(())
}

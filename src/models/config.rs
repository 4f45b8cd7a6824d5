//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Due-check and pipeline settings
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Where registry, snapshots and artifacts live
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP transport settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::config("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::config("crawler.timeout_secs must be > 0"));
        }
        if self.scheduler.min_check_interval_secs == 0 {
            return Err(AppError::config(
                "scheduler.min_check_interval_secs must be > 0",
            ));
        }
        if self.scheduler.default_check_interval_secs < self.scheduler.min_check_interval_secs {
            return Err(AppError::config(
                "scheduler.default_check_interval_secs is below min_check_interval_secs",
            ));
        }
        if self.scheduler.default_max_pages == 0
            || self.scheduler.default_max_pages > self.scheduler.max_pages_limit
        {
            return Err(AppError::config(
                "scheduler.default_max_pages must be within 1..=max_pages_limit",
            ));
        }
        if self.scheduler.tick_interval_secs == 0 {
            return Err(AppError::config("scheduler.tick_interval_secs must be > 0"));
        }
        if self.scheduler.crawl_timeout_secs == 0 || self.scheduler.regenerate_timeout_secs == 0 {
            return Err(AppError::config("scheduler timeouts must be > 0"));
        }
        if self.scheduler.max_concurrent_checks == 0 {
            return Err(AppError::config(
                "scheduler.max_concurrent_checks must be > 0",
            ));
        }
        Ok(())
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between page fetches in milliseconds
    #[serde(default)]
    pub request_delay_ms: u64,

    /// Maximum link depth from the site root
    #[serde(default = "defaults::depth_limit")]
    pub depth_limit: usize,

    /// Maximum links followed from a single page
    #[serde(default = "defaults::links_per_page")]
    pub links_per_page: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: 0,
            depth_limit: defaults::depth_limit(),
            links_per_page: defaults::links_per_page(),
        }
    }
}

/// Scheduler and check pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Smallest check interval a site may be registered with
    #[serde(default = "defaults::min_check_interval")]
    pub min_check_interval_secs: u64,

    /// Interval used when an add request omits one
    #[serde(default = "defaults::check_interval")]
    pub default_check_interval_secs: u64,

    /// Page budget used when an add request omits one
    #[serde(default = "defaults::max_pages")]
    pub default_max_pages: usize,

    /// Largest page budget a site may be registered with
    #[serde(default = "defaults::max_pages_limit")]
    pub max_pages_limit: usize,

    /// Period of the due-check driver
    #[serde(default = "defaults::tick_interval")]
    pub tick_interval_secs: u64,

    /// Upper bound on one crawl
    #[serde(default = "defaults::crawl_timeout")]
    pub crawl_timeout_secs: u64,

    /// Upper bound on one artifact regeneration
    #[serde(default = "defaults::regenerate_timeout")]
    pub regenerate_timeout_secs: u64,

    /// Sites checked in parallel during a sweep
    #[serde(default = "defaults::max_concurrent_checks")]
    pub max_concurrent_checks: usize,

    /// Run the bootstrap check as part of `add_site`
    #[serde(default = "defaults::check_on_add")]
    pub check_on_add: bool,
}

impl SchedulerConfig {
    pub fn crawl_timeout(&self) -> Duration {
        Duration::from_secs(self.crawl_timeout_secs)
    }

    pub fn regenerate_timeout(&self) -> Duration {
        Duration::from_secs(self.regenerate_timeout_secs)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_check_interval_secs: defaults::min_check_interval(),
            default_check_interval_secs: defaults::check_interval(),
            default_max_pages: defaults::max_pages(),
            max_pages_limit: defaults::max_pages_limit(),
            tick_interval_secs: defaults::tick_interval(),
            crawl_timeout_secs: defaults::crawl_timeout(),
            regenerate_timeout_secs: defaults::regenerate_timeout(),
            max_concurrent_checks: defaults::max_concurrent_checks(),
            check_on_add: defaults::check_on_add(),
        }
    }
}

/// Storage location settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for `sites.json`, snapshots and artifacts
    #[serde(default = "defaults::data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: defaults::data_dir(),
        }
    }
}

/// HTTP transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind (host:port)
    #[serde(default = "defaults::bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: defaults::bind(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; sitewatch/0.1)".into()
    }
    pub fn timeout() -> u64 {
        15
    }
    pub fn depth_limit() -> usize {
        3
    }
    pub fn links_per_page() -> usize {
        10
    }

    // Scheduler defaults
    pub fn min_check_interval() -> u64 {
        3600
    }
    pub fn check_interval() -> u64 {
        86_400
    }
    pub fn max_pages() -> usize {
        20
    }
    pub fn max_pages_limit() -> usize {
        500
    }
    pub fn tick_interval() -> u64 {
        3600
    }
    pub fn crawl_timeout() -> u64 {
        300
    }
    pub fn regenerate_timeout() -> u64 {
        60
    }
    pub fn max_concurrent_checks() -> usize {
        4
    }
    pub fn check_on_add() -> bool {
        true
    }

    // Storage / server / logging defaults
    pub fn data_dir() -> PathBuf {
        PathBuf::from("data/storage")
    }
    pub fn bind() -> String {
        "127.0.0.1:8001".into()
    }
    pub fn log_level() -> String {
        "info".into()
    }
}

use serde::Deserialize;
use std::collections::HashMap;

/// Main configuration structure for marketrake
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    /// Per-channel category overrides, keyed by channel name
    #[serde(default)]
    pub channels: HashMap<String, ChannelOverride>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Marketplace region code (us, uk, de, ...)
    #[serde(default = "default_region")]
    pub region: String,

    /// Maximum outbound requests per second, shared across the whole session
    #[serde(rename = "requests-per-second", default = "default_rps")]
    pub requests_per_second: f64,

    /// Number of retries after the first failed attempt
    #[serde(rename = "retry-count", default = "default_retry_count")]
    pub retry_count: u32,

    /// Fixed delay after every category page fetch (milliseconds)
    #[serde(rename = "request-delay-ms", default = "default_request_delay")]
    pub request_delay_ms: u64,

    /// Pause between categories within one channel run (milliseconds)
    #[serde(rename = "inter-category-delay-ms", default = "default_category_delay")]
    pub inter_category_delay_ms: u64,

    /// Maximum concurrent workers for batch fetches
    #[serde(rename = "max-workers", default = "default_workers")]
    pub max_workers: usize,

    /// Hard per-call HTTP timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout")]
    pub timeout_secs: u64,

    /// How products appearing in more than one channel are treated
    #[serde(rename = "dedup-policy", default)]
    pub dedup_policy: DedupPolicy,
}

/// Cross-channel de-duplication policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DedupPolicy {
    /// A product seen in two channels is kept as two records
    #[default]
    KeepAll,
    /// Keep only the first record per catalog id across channels
    MergeById,
}

/// Proxy pool configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    /// Path to the newline-delimited proxy list; empty disables proxying
    #[serde(rename = "list-path", default)]
    pub list_path: String,

    /// Probe each proxy against this endpoint before use
    #[serde(rename = "verify-on-start", default = "default_true")]
    pub verify_on_start: bool,

    /// Known-good endpoint used by the liveness probe
    #[serde(rename = "probe-url", default = "default_probe_url")]
    pub probe_url: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            list_path: String::new(),
            verify_on_start: true,
            probe_url: default_probe_url(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory that receives per-channel dumps and run reports
    #[serde(rename = "data-dir")]
    pub data_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawler: CrawlerConfig::default(),
            proxy: ProxyConfig::default(),
            output: OutputConfig::default(),
            schedule: ScheduleConfig::default(),
            channels: HashMap::new(),
        }
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            requests_per_second: default_rps(),
            retry_count: default_retry_count(),
            request_delay_ms: default_request_delay(),
            inter_category_delay_ms: default_category_delay(),
            max_workers: default_workers(),
            timeout_secs: default_timeout(),
            dedup_policy: DedupPolicy::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
        }
    }
}

/// Per-channel run intervals for the scheduler, in hours
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    #[serde(rename = "best-sellers-hours", default = "default_daily")]
    pub best_sellers_hours: u64,

    #[serde(rename = "movers-shakers-hours", default = "default_hourly")]
    pub movers_shakers_hours: u64,

    #[serde(rename = "outlet-hours", default = "default_weekly")]
    pub outlet_hours: u64,

    #[serde(rename = "warehouse-hours", default = "default_weekly")]
    pub warehouse_hours: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            best_sellers_hours: default_daily(),
            movers_shakers_hours: default_hourly(),
            outlet_hours: default_weekly(),
            warehouse_hours: default_weekly(),
        }
    }
}

/// Optional per-channel overrides from the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelOverride {
    /// Categories to crawl instead of the channel's built-in list
    #[serde(default)]
    pub categories: Vec<String>,
}

fn default_region() -> String {
    "us".to_string()
}

fn default_rps() -> f64 {
    1.0
}

fn default_retry_count() -> u32 {
    3
}

fn default_request_delay() -> u64 {
    1500
}

fn default_category_delay() -> u64 {
    2000
}

fn default_workers() -> usize {
    5
}

fn default_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_probe_url() -> String {
    "https://www.google.com".to_string()
}

fn default_hourly() -> u64 {
    1
}

fn default_daily() -> u64 {
    24
}

fn default_weekly() -> u64 {
    168
}

//! Marketrake: a multi-channel marketplace catalog harvester
//!
//! This crate crawls a marketplace's category hierarchy across several
//! discovery channels (best sellers, movers & shakers, outlet, warehouse
//! deals) through rotating-proxy-backed HTTP sessions, producing
//! risk-filtered, provenance-stamped product records.

pub mod channel;
pub mod config;
pub mod fetch;
pub mod orchestrator;
pub mod output;
pub mod parse;
pub mod proxy;
pub mod region;
pub mod scheduler;
pub mod tree;

use thiserror::Error;

/// Main error type for marketrake operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Proxy error: {0}")]
    Proxy(#[from] ProxyError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Proxy-specific errors
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Failed to read proxy list: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed proxy entry: {0}")]
    Malformed(String),
}

/// Result type alias for marketrake operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use channel::{Channel, ChannelManager, FilterRule, Verdict};
pub use config::Config;
pub use fetch::{Dispatcher, FetchedPage, RequestExecutor, RetryPolicy, Task};
pub use orchestrator::MultiChannelCrawler;
pub use output::{FileSink, ProductSink, RunReport, RunSummary};
pub use parse::{extract_ids, extract_products, IdSource, Product, SelectorProfile};
pub use proxy::{Proxy, ProxyPool, RateLimiter};
pub use scheduler::Scheduler;
pub use tree::{CategoryNode, CategoryTreeCrawler, NodeStatus};

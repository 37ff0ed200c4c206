//! Configuration loading, types, and validation

mod parser;
mod types;
mod validation;

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use types::{
    ChannelOverride, Config, CrawlerConfig, DedupPolicy, OutputConfig, ProxyConfig, ScheduleConfig,
};
pub use validation::validate;

//! Harvest channels and listing compliance rules

mod config;
mod filter;
mod risk;

pub use config::{channel_url, Channel, ChannelManager, ChannelProfile};
pub use filter::{FilterRule, Verdict};
pub use risk::{banned_category, high_risk_match};

//! Proxy pool, health scoring, and outbound rate limiting

mod limiter;
mod loader;
mod pool;

pub use limiter::RateLimiter;
pub use loader::load_proxies_from_file;
pub use pool::{Proxy, ProxyPool, ProxyStats};

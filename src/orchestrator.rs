//! Whole-run coordination across channels
//!
//! `MultiChannelCrawler` owns the shared fetch stack (proxy pool, rate
//! limiter, executor) and walks each requested channel's categories through
//! the tree crawler, the compliance filters, and the file sinks. A channel
//! that fails wholesale is logged and skipped; the run carries on.

use crate::channel::{channel_url, Channel, ChannelManager, ChannelProfile};
use crate::config::{Config, DedupPolicy};
use crate::fetch::{Dispatcher, RequestExecutor, RetryPolicy, Task};
use crate::output::{FileSink, ProductSink, RunReport, RunSummary};
use crate::parse::{extract_products, Product};
use crate::proxy::{load_proxies_from_file, ProxyPool, RateLimiter};
use crate::tree::{category_id_from_url, CategoryTreeCrawler};
use crate::Result;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Runs harvests across one or more channels with a shared fetch stack
pub struct MultiChannelCrawler {
    config: Config,
    manager: ChannelManager,
    executor: Arc<RequestExecutor>,
    sink: FileSink,
    config_hash: Option<String>,
}

impl MultiChannelCrawler {
    /// Builds the crawler, loading and optionally probing the proxy list
    pub async fn new(config: Config) -> Result<Self> {
        let manager = ChannelManager::with_overrides(&config.channels)?;
        let pool = Arc::new(build_pool(&config).await);
        let limiter = Arc::new(RateLimiter::new(config.crawler.requests_per_second));
        let timeout = Duration::from_secs(config.crawler.timeout_secs);
        let executor = Arc::new(RequestExecutor::new(
            pool,
            limiter,
            RetryPolicy::exponential(config.crawler.retry_count),
            timeout,
        )?);
        let sink = FileSink::new(&config.output.data_dir);

        Ok(Self {
            config,
            manager,
            executor,
            sink,
            config_hash: None,
        })
    }

    /// Records the configuration hash so run summaries can be tied back to
    /// the exact file that produced them
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    pub fn manager(&self) -> &ChannelManager {
        &self.manager
    }

    /// Harvests the given channels and writes the end-of-run report
    ///
    /// # Arguments
    ///
    /// * `channels` - Channels to harvest, in order
    /// * `category` - Restricts every channel to one category when set
    pub async fn run(&self, channels: &[Channel], category: Option<&str>) -> Result<RunSummary> {
        let mut report = RunReport::new();
        if let Some(hash) = &self.config_hash {
            report.set_config_hash(hash.clone());
        }

        for channel in channels {
            match self.run_channel(*channel, category, &mut report).await {
                Ok(products) => tracing::info!(
                    "Channel {} finished with {} accepted products",
                    channel,
                    products.len()
                ),
                Err(e) => tracing::error!("Channel {} failed: {}", channel, e),
            }
        }

        let summary = report.summary();
        if !report.is_empty() {
            report.write(Path::new(&self.config.output.data_dir))?;
        }
        Ok(summary)
    }

    /// Harvests one channel's categories
    ///
    /// Depth-1 channels only need their top pages, so those are fanned out
    /// over the batch dispatcher. Deeper channels go through the tree
    /// crawler, whose visited set is shared across the channel's categories
    /// so overlapping subtrees are fetched once per channel run.
    pub async fn run_channel(
        &self,
        channel: Channel,
        category: Option<&str>,
        report: &mut RunReport,
    ) -> Result<Vec<Product>> {
        let profile = self.manager.profile(channel).clone();
        tracing::info!("Harvesting channel {}", channel.display_name());

        // Warehouse has one landing page for every category
        let categories: Vec<Option<String>> = if channel == Channel::Warehouse {
            vec![None]
        } else {
            match category {
                Some(cat) => vec![Some(cat.to_string())],
                None => profile.categories.iter().cloned().map(Some).collect(),
            }
        };

        let harvested = if profile.depth <= 1 {
            self.harvest_flat(&profile, &categories).await
        } else {
            self.harvest_trees(&profile, &categories).await
        };

        let mut accepted = Vec::new();
        for (category, url, products) in harvested {
            for mut product in products {
                self.manager
                    .stamp_provenance(&mut product, channel, category.as_deref(), &url);

                let verdict = self.manager.filter_product(&product, channel);
                match verdict.reason() {
                    None => {
                        report.record_accepted(product.clone());
                        accepted.push(product);
                    }
                    Some(reason) => {
                        tracing::info!("Filtered out {}: {}", product.asin, reason);
                        report.record_rejected(product, reason.to_string());
                    }
                }
            }
        }

        let accepted = dedup(accepted, self.config.crawler.dedup_policy);
        self.sink.save_products(channel, &accepted)?;
        Ok(accepted)
    }

    /// Fetches each category's top page concurrently, no recursion
    async fn harvest_flat(
        &self,
        profile: &ChannelProfile,
        categories: &[Option<String>],
    ) -> Vec<Harvested> {
        let region = &self.config.crawler.region;
        let dispatcher = Dispatcher::new(
            Arc::clone(&self.executor),
            self.config.crawler.max_workers,
        );

        let task_id = |cat: &Option<String>| {
            cat.clone()
                .unwrap_or_else(|| profile.channel.as_str().to_string())
        };
        let tasks: Vec<Task> = categories
            .iter()
            .map(|cat| Task::new(task_id(cat), channel_url(profile.channel, cat.as_deref(), region)))
            .collect();
        let mut pages = dispatcher.run(tasks).await;

        categories
            .iter()
            .map(|cat| {
                let url = channel_url(profile.channel, cat.as_deref(), region);
                let products = match pages.remove(&task_id(cat)) {
                    Some(page) => {
                        let mut products =
                            extract_products(&page.body, profile.selector_profile);
                        products.truncate(profile.max_products);
                        let category_id = category_id_from_url(&url);
                        for product in &mut products {
                            product.category_id = category_id.clone();
                        }
                        products
                    }
                    None => Vec::new(),
                };
                (cat.clone(), url, products)
            })
            .collect()
    }

    /// Walks each category's subtree sequentially with inter-category pauses
    async fn harvest_trees(
        &self,
        profile: &ChannelProfile,
        categories: &[Option<String>],
    ) -> Vec<Harvested> {
        let region = &self.config.crawler.region;
        let mut crawler = CategoryTreeCrawler::new(
            Arc::clone(&self.executor),
            region,
            profile.depth,
            profile.max_products,
            Duration::from_millis(self.config.crawler.request_delay_ms),
            profile.selector_profile,
        );

        let mut harvested = Vec::new();
        for (i, category) in categories.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(Duration::from_millis(
                    self.config.crawler.inter_category_delay_ms,
                ))
                .await;
            }

            let url = channel_url(profile.channel, category.as_deref(), region);
            let name = match category {
                Some(cat) => format!("{} {} {}", region, cat, profile.channel.display_name()),
                None => format!("{} {}", region, profile.channel.display_name()),
            };

            let tree = crawler.crawl(&name, &url).await;
            if let Err(e) = self.sink.save_tree(profile.channel, &tree) {
                tracing::warn!("Could not save category tree for {:?}: {}", name, e);
            }
            harvested.push((category.clone(), url, tree.collect_products()));
        }
        harvested
    }
}

/// One category's harvest: the category, its entry URL, and its products
type Harvested = (Option<String>, String, Vec<Product>);

/// Applies the configured duplicate handling to a channel's accepted list
fn dedup(products: Vec<Product>, policy: DedupPolicy) -> Vec<Product> {
    match policy {
        DedupPolicy::KeepAll => products,
        DedupPolicy::MergeById => {
            let mut seen = HashSet::new();
            let before = products.len();
            let merged: Vec<Product> = products
                .into_iter()
                .filter(|p| seen.insert(p.asin.clone()))
                .collect();
            if merged.len() < before {
                tracing::debug!("Merged {} duplicate listings", before - merged.len());
            }
            merged
        }
    }
}

async fn build_pool(config: &Config) -> ProxyPool {
    let list_path = &config.proxy.list_path;
    if list_path.is_empty() {
        tracing::info!("No proxy list configured; running direct");
        return ProxyPool::empty();
    }

    let proxies = match load_proxies_from_file(Path::new(list_path)) {
        Ok(proxies) => proxies,
        Err(e) => {
            tracing::warn!("Could not load proxy list {}: {}; running direct", list_path, e);
            return ProxyPool::empty();
        }
    };

    let pool = ProxyPool::new(proxies);
    if config.proxy.verify_on_start && !pool.is_empty() {
        pool.verify(&config.proxy.probe_url, Duration::from_secs(10)).await;
    }
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(asin: &str) -> Product {
        Product::new(asin)
    }

    #[test]
    fn test_keep_all_preserves_duplicates() {
        let products = vec![listing("B000000001"), listing("B000000001")];
        assert_eq!(dedup(products, DedupPolicy::KeepAll).len(), 2);
    }

    #[test]
    fn test_merge_by_id_keeps_first() {
        let mut first = listing("B000000001");
        first.title = Some("first".to_string());
        let mut second = listing("B000000001");
        second.title = Some("second".to_string());

        let merged = dedup(vec![first, second, listing("B000000002")], DedupPolicy::MergeById);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].title.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn test_missing_proxy_list_runs_direct() {
        let mut config = Config::default();
        config.proxy.list_path = "/nonexistent/proxies.txt".to_string();
        let pool = build_pool(&config).await;
        assert!(pool.is_empty());
    }
}

//! Depth-bounded recursive category crawling
//!
//! Category pages form a graph, not a tree: the same subcategory is linked
//! from several parents. A session-wide visited set flattens that graph so
//! each URL is fetched once, with the first discoverer keeping the node.

use crate::fetch::RequestExecutor;
use crate::parse::{extract_products, Product, SelectorProfile};
use crate::tree::{CategoryNode, NodeStatus};
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;
use std::sync::Arc;
use std::time::Duration;

/// Link cascades tried against every fetched page, in order. All matches
/// from all selectors are accumulated; ranking pages use several of these
/// layouts at once.
const SUBCATEGORY_SELECTORS: &[&str] = &[
    ".zg-browse-root a",
    ".zg-browse-item a",
    "ul.a-unordered-list.a-nostyle.a-vertical li a",
    "#wayfinding-breadcrumbs_feature_div a",
    "#zg-left-col li a",
    ".bxc-grid__column a[href*='/zgbs/']",
    ".a-carousel-card a[href*='/zgbs/']",
];

/// Path markers that identify a link as a category or ranking page
const CATEGORY_LINK_MARKERS: &[&str] = &["/zgbs/", "/bestsellers/", "/categories/", "node="];

/// Recursively harvests one category subtree
pub struct CategoryTreeCrawler {
    executor: Arc<RequestExecutor>,
    base_url: String,
    region: String,
    max_depth: u32,
    max_products: usize,
    inter_request_delay: Duration,
    selector_profile: SelectorProfile,
    visited: HashSet<String>,
}

impl CategoryTreeCrawler {
    pub fn new(
        executor: Arc<RequestExecutor>,
        region: &str,
        max_depth: u32,
        max_products: usize,
        inter_request_delay: Duration,
        selector_profile: SelectorProfile,
    ) -> Self {
        Self {
            executor,
            base_url: crate::region::base_url(region),
            region: region.to_string(),
            max_depth,
            max_products,
            inter_request_delay,
            selector_profile,
            visited: HashSet::new(),
        }
    }

    /// Overrides the region-derived site root, for mirrors and harnesses
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Crawls the subtree rooted at `start_url` and returns it
    ///
    /// Failed pages leave their node marked `Failed` with whatever children
    /// and products were gathered before the failure; the crawl itself never
    /// errors.
    pub async fn crawl(&mut self, start_name: &str, start_url: &str) -> CategoryNode {
        tracing::info!(
            "Crawling category tree from {:?} (max depth {})",
            start_name,
            self.max_depth
        );
        let mut root = CategoryNode::new(start_name, start_url, 0, &self.region);
        self.visit(&mut root).await;
        root
    }

    /// The visited set persists across `crawl` calls on the same instance,
    /// so overlapping roots within one session are fetched once.
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    async fn visit(&mut self, node: &mut CategoryNode) {
        if node.depth >= self.max_depth {
            tracing::debug!("Depth limit reached at {:?}, not descending", node.name);
            return;
        }
        if !self.visited.insert(node.url.clone()) {
            tracing::debug!("Already visited {}, skipping", node.url);
            return;
        }

        node.status = NodeStatus::Fetching;
        let page = self.executor.get(&node.url).await;
        tokio::time::sleep(self.inter_request_delay).await;

        let Some(page) = page else {
            tracing::warn!("Could not fetch category page {}", node.url);
            node.status = NodeStatus::Failed;
            return;
        };

        let mut products = extract_products(&page.body, self.selector_profile);
        products.truncate(self.max_products);
        for product in &mut products {
            self.adopt(product, node);
        }
        tracing::info!("Extracted {} products from {:?}", products.len(), node.name);
        node.products = products;
        node.status = NodeStatus::Parsed;

        for (name, url) in self.extract_subcategory_links(&page.body) {
            let mut child = CategoryNode::new(name, url, node.depth + 1, &self.region);
            child.parent_name = Some(node.name.clone());
            tracing::debug!("Found subcategory {:?} at depth {}", child.name, child.depth);
            Box::pin(self.visit(&mut child)).await;
            node.subcategories.push(child);
        }
    }

    /// Stamps crawl context onto an extracted product
    fn adopt(&self, product: &mut Product, node: &CategoryNode) {
        product.category_id = node.category_id.clone();
        if let Some(url) = &product.url {
            product.url = Some(self.absolutize(url));
        }
    }

    fn same_site(&self, candidate: &str) -> bool {
        match (Url::parse(candidate), Url::parse(&self.base_url)) {
            (Ok(link), Ok(base)) => link.host_str() == base.host_str(),
            _ => false,
        }
    }

    fn absolutize(&self, link: &str) -> String {
        if link.starts_with("http") {
            link.to_string()
        } else if link.starts_with('/') {
            format!("{}{}", self.base_url, link)
        } else {
            format!("{}/{}", self.base_url, link)
        }
    }

    /// Category links present on the page, same-site and deduplicated in
    /// first-seen order
    fn extract_subcategory_links(&self, body: &str) -> Vec<(String, String)> {
        let document = Html::parse_document(body);
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for raw in SUBCATEGORY_SELECTORS {
            let Ok(selector) = Selector::parse(raw) else {
                continue;
            };
            for anchor in document.select(&selector) {
                let Some(href) = anchor.value().attr("href") else {
                    continue;
                };
                let name: String = anchor.text().collect::<String>().trim().to_string();
                if name.is_empty() || href.is_empty() {
                    continue;
                }

                let url = self.absolutize(href);
                if !self.same_site(&url) {
                    continue;
                }
                if !CATEGORY_LINK_MARKERS.iter().any(|m| url.contains(m)) {
                    continue;
                }
                if seen.insert(url.clone()) {
                    links.push((name, url));
                }
            }
        }

        links
    }
}

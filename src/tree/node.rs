//! Category tree data model

use crate::parse::Product;
use serde::{Deserialize, Serialize};

/// Lifecycle of one node during a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    /// Discovered but not yet fetched
    Pending,
    /// Fetch in progress
    Fetching,
    /// Fetched and parsed
    Parsed,
    /// Fetch exhausted its retry budget
    Failed,
}

/// One category in the harvested tree
///
/// The tree is built top-down: a node is created when its link is discovered
/// on the parent page, then filled in when its own page is fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryNode {
    pub name: String,
    pub url: String,
    pub depth: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_name: Option<String>,
    pub region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    pub status: NodeStatus,
    pub products: Vec<Product>,
    pub subcategories: Vec<CategoryNode>,
}

impl CategoryNode {
    pub fn new(name: impl Into<String>, url: impl Into<String>, depth: u32, region: &str) -> Self {
        let url = url.into();
        let category_id = category_id_from_url(&url);
        Self {
            name: name.into(),
            url,
            depth,
            parent_name: None,
            region: region.to_string(),
            category_id,
            status: NodeStatus::Pending,
            products: Vec::new(),
            subcategories: Vec::new(),
        }
    }

    /// Products in this node and every descendant
    pub fn total_products(&self) -> usize {
        self.products.len()
            + self
                .subcategories
                .iter()
                .map(CategoryNode::total_products)
                .sum::<usize>()
    }

    /// Descendant category count
    pub fn total_subcategories(&self) -> usize {
        self.subcategories.len()
            + self
                .subcategories
                .iter()
                .map(CategoryNode::total_subcategories)
                .sum::<usize>()
    }

    /// Flattens the tree into owned product copies, depth-first
    pub fn collect_products(&self) -> Vec<Product> {
        let mut out = Vec::new();
        self.collect_into(&mut out);
        out
    }

    fn collect_into(&self, out: &mut Vec<Product>) {
        out.extend(self.products.iter().cloned());
        for child in &self.subcategories {
            child.collect_into(out);
        }
    }

    /// Flattens the tree into one row per product for tabular export
    pub fn flatten_rows(&self) -> Vec<ProductRow<'_>> {
        let mut rows = Vec::new();
        self.flatten_into(&mut rows);
        rows
    }

    fn flatten_into<'a>(&'a self, rows: &mut Vec<ProductRow<'a>>) {
        for product in &self.products {
            rows.push(ProductRow {
                category: self,
                product,
            });
        }
        for child in &self.subcategories {
            child.flatten_into(rows);
        }
    }

    /// JSON rendering with per-node rollup counts alongside the raw fields
    pub fn to_report_json(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "url": self.url,
            "depth": self.depth,
            "parent_name": self.parent_name,
            "region": self.region,
            "category_id": self.category_id,
            "status": self.status,
            "products": self.products,
            "products_count": self.products.len(),
            "subcategories_count": self.subcategories.len(),
            "subcategories": self.subcategories.iter()
                .map(CategoryNode::to_report_json)
                .collect::<Vec<_>>(),
        })
    }
}

/// A product paired with the category it was found under
pub struct ProductRow<'a> {
    pub category: &'a CategoryNode,
    pub product: &'a Product,
}

/// Category id embedded in a marketplace URL, if any
///
/// Two forms appear in practice: a `node=` query parameter and a path
/// segment after `/zgbs/`.
pub fn category_id_from_url(url: &str) -> Option<String> {
    if let Some((_, rest)) = url.split_once("node=") {
        let id = rest.split('&').next().unwrap_or(rest);
        if !id.is_empty() {
            return Some(id.to_string());
        }
    }
    if let Some((_, rest)) = url.split_once("/zgbs/") {
        let id = rest.split('/').next().unwrap_or(rest);
        let id = id.split('?').next().unwrap_or(id);
        if !id.is_empty() {
            return Some(id.to_string());
        }
    }
    None
}

//! Timestamped JSON and CSV files under a per-channel directory
//!
//! Layout: `<data_dir>/<channel>/<channel>_<YYYYmmdd_HHMMSS>.json` plus a
//! CSV sibling, and `<channel>_tree_<...>.json` for full hierarchies.

use crate::channel::Channel;
use crate::output::{OutputResult, ProductSink};
use crate::parse::Product;
use crate::tree::CategoryNode;
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

const PRODUCT_CSV_HEADER: &[&str] = &[
    "asin",
    "title",
    "url",
    "image_url",
    "price",
    "original_price",
    "discount_percentage",
    "rating",
    "review_count",
    "rank",
    "rank_change",
    "item_condition",
    "weight_lbs",
    "category_id",
    "channel",
    "risk",
];

const TREE_CSV_HEADER: &[&str] = &[
    "Category Name",
    "Category URL",
    "Category ID",
    "Category Depth",
    "Parent Category",
    "Product ASIN",
    "Product Title",
    "Product URL",
    "Product Image URL",
    "Product Rank",
];

/// Writes harvest results to the local filesystem
pub struct FileSink {
    data_dir: PathBuf,
}

impl FileSink {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn channel_dir(&self, channel: Channel) -> OutputResult<PathBuf> {
        let dir = self.data_dir.join(channel.as_str());
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    fn timestamp() -> String {
        Local::now().format("%Y%m%d_%H%M%S").to_string()
    }
}

impl ProductSink for FileSink {
    fn save_products(&self, channel: Channel, products: &[Product]) -> OutputResult<Vec<PathBuf>> {
        let dir = self.channel_dir(channel)?;
        let stamp = Self::timestamp();

        let json_path = dir.join(format!("{}_{}.json", channel, stamp));
        fs::write(&json_path, serde_json::to_string_pretty(products)?)?;
        tracing::info!("Saved {} products to {}", products.len(), json_path.display());

        let csv_path = dir.join(format!("{}_{}.csv", channel, stamp));
        write_product_csv(&csv_path, products)?;
        tracing::info!("Saved product CSV to {}", csv_path.display());

        Ok(vec![json_path, csv_path])
    }

    fn save_tree(&self, channel: Channel, tree: &CategoryNode) -> OutputResult<PathBuf> {
        let dir = self.channel_dir(channel)?;
        let stamp = Self::timestamp();

        let json_path = dir.join(format!("{}_tree_{}.json", channel, stamp));
        fs::write(&json_path, serde_json::to_string_pretty(&tree.to_report_json())?)?;

        let csv_path = dir.join(format!("{}_tree_{}.csv", channel, stamp));
        write_tree_csv(&csv_path, tree)?;

        tracing::info!(
            "Saved tree with {} products to {}",
            tree.total_products(),
            json_path.display()
        );
        Ok(json_path)
    }
}

/// Writes one row per product with flattened provenance columns
pub(crate) fn write_product_csv(path: &Path, products: &[Product]) -> OutputResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(PRODUCT_CSV_HEADER)?;

    for p in products {
        let (channel, risk) = match &p.provenance {
            Some(prov) => (
                prov.channel.clone(),
                format!("{:?}", prov.risk).to_lowercase(),
            ),
            None => (String::new(), String::new()),
        };
        writer.write_record([
            p.asin.clone(),
            opt_str(&p.title),
            opt_str(&p.url),
            opt_str(&p.image_url),
            opt_num(p.price),
            opt_num(p.original_price),
            opt_num(p.discount_percentage),
            opt_num(p.rating),
            opt_num(p.review_count),
            opt_num(p.rank),
            opt_str(&p.rank_change),
            opt_str(&p.item_condition),
            opt_num(p.weight_lbs),
            opt_str(&p.category_id),
            channel,
            risk,
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn write_tree_csv(path: &Path, tree: &CategoryNode) -> OutputResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(TREE_CSV_HEADER)?;

    for row in tree.flatten_rows() {
        writer.write_record([
            row.category.name.clone(),
            row.category.url.clone(),
            opt_str(&row.category.category_id),
            row.category.depth.to_string(),
            opt_str(&row.category.parent_name),
            row.product.asin.clone(),
            opt_str(&row.product.title),
            opt_str(&row.product.url),
            opt_str(&row.product.image_url),
            opt_num(row.product.rank),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn opt_str(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn opt_num<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_products() -> Vec<Product> {
        let mut a = Product::new("B08N5WRWNW");
        a.title = Some("Wireless Earbuds".to_string());
        a.price = Some(49.99);
        a.rank = Some(1);

        let b = Product::new("B07XJ8C8F5");
        vec![a, b]
    }

    #[test]
    fn test_save_products_writes_json_and_csv() {
        let dir = TempDir::new().unwrap();
        let sink = FileSink::new(dir.path());

        let paths = sink
            .save_products(Channel::BestSellers, &sample_products())
            .unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths[0].to_string_lossy().contains("best_sellers/best_sellers_"));

        let json = fs::read_to_string(&paths[0]).unwrap();
        let parsed: Vec<Product> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].asin, "B08N5WRWNW");

        let csv = fs::read_to_string(&paths[1]).unwrap();
        assert!(csv.starts_with("asin,title"));
        assert!(csv.contains("B08N5WRWNW,Wireless Earbuds"));
    }

    #[test]
    fn test_save_tree_includes_counts() {
        let dir = TempDir::new().unwrap();
        let sink = FileSink::new(dir.path());

        let mut root = CategoryNode::new("Electronics", "https://e.test/zgbs/electronics", 0, "us");
        root.products = sample_products();

        let path = sink.save_tree(Channel::Outlet, &root).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["products_count"], 2);
        assert_eq!(json["region"], "us");
    }

    #[test]
    fn test_empty_product_list_still_writes_files() {
        let dir = TempDir::new().unwrap();
        let sink = FileSink::new(dir.path());

        let paths = sink.save_products(Channel::Warehouse, &[]).unwrap();
        for path in &paths {
            assert!(path.exists());
        }
    }
}

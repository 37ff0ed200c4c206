//! End-of-run compliance reports
//!
//! Every listing seen during a run lands in one of three buckets: safe
//! (accepted, low risk), review (accepted but risk-flagged), or banned
//! (rejected by a filter). Each bucket gets its own CSV under
//! `<data_dir>/reports/`, alongside a JSON summary with per-channel counts.

use crate::output::files::write_product_csv;
use crate::output::OutputResult;
use crate::parse::{Product, RiskLevel};
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Accumulates per-run filter outcomes
#[derive(Default)]
pub struct RunReport {
    accepted: Vec<Product>,
    rejected: Vec<(Product, String)>,
    config_hash: Option<String>,
}

/// Aggregate counts written as the summary JSON
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub total_products: usize,
    pub safe_products: usize,
    pub review_products: usize,
    pub banned_products: usize,
    pub by_channel: HashMap<String, usize>,
    /// Hash of the configuration file the run was loaded from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<String>,
    pub generated_at: DateTime<Utc>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ties the summary back to the configuration that produced the run
    pub fn set_config_hash(&mut self, hash: impl Into<String>) {
        self.config_hash = Some(hash.into());
    }

    pub fn record_accepted(&mut self, product: Product) {
        self.accepted.push(product);
    }

    pub fn record_rejected(&mut self, product: Product, reason: String) {
        self.rejected.push((product, reason));
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty() && self.rejected.is_empty()
    }

    fn buckets(&self) -> (Vec<&Product>, Vec<&Product>) {
        let mut safe = Vec::new();
        let mut review = Vec::new();
        for product in &self.accepted {
            let risky = matches!(
                product.provenance.as_ref().map(|p| p.risk),
                Some(RiskLevel::Medium) | Some(RiskLevel::High)
            );
            if risky {
                review.push(product);
            } else {
                safe.push(product);
            }
        }
        (safe, review)
    }

    pub fn summary(&self) -> RunSummary {
        let (safe, review) = self.buckets();
        let mut by_channel: HashMap<String, usize> = HashMap::new();
        for product in &self.accepted {
            if let Some(prov) = &product.provenance {
                *by_channel.entry(prov.channel.clone()).or_default() += 1;
            }
        }
        RunSummary {
            total_products: self.accepted.len() + self.rejected.len(),
            safe_products: safe.len(),
            review_products: review.len(),
            banned_products: self.rejected.len(),
            by_channel,
            config_hash: self.config_hash.clone(),
            generated_at: Utc::now(),
        }
    }

    /// Writes the bucket CSVs and summary JSON, returning the summary path
    ///
    /// Empty buckets are skipped rather than producing header-only files.
    pub fn write(&self, data_dir: &Path) -> OutputResult<PathBuf> {
        let report_dir = data_dir.join("reports");
        fs::create_dir_all(&report_dir)?;
        // Second resolution, so two runs the same day never overwrite
        let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();

        let (safe, review) = self.buckets();
        write_bucket(&report_dir, &format!("safe_products_{stamp}.csv"), &safe)?;
        write_bucket(&report_dir, &format!("review_products_{stamp}.csv"), &review)?;

        let banned: Vec<&Product> = self.rejected.iter().map(|(p, _)| p).collect();
        write_bucket(&report_dir, &format!("banned_products_{stamp}.csv"), &banned)?;

        let summary = self.summary();
        let summary_path = report_dir.join(format!("summary_{stamp}.json"));
        fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)?;
        tracing::info!(
            "Run summary: {} total, {} safe, {} review, {} banned ({})",
            summary.total_products,
            summary.safe_products,
            summary.review_products,
            summary.banned_products,
            summary_path.display()
        );
        Ok(summary_path)
    }
}

fn write_bucket(dir: &Path, filename: &str, products: &[&Product]) -> OutputResult<()> {
    if products.is_empty() {
        return Ok(());
    }
    let owned: Vec<Product> = products.iter().map(|p| (*p).clone()).collect();
    write_product_csv(&dir.join(filename), &owned)
}

//! Output sink trait and error types

use crate::channel::Channel;
use crate::parse::Product;
use crate::tree::CategoryNode;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while persisting harvest results
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for output operations
pub type OutputResult<T> = std::result::Result<T, OutputError>;

/// Trait for product persistence backends
///
/// Sinks receive the filtered, provenance-stamped products of one channel
/// run, or the raw category tree when callers want the full hierarchy.
pub trait ProductSink {
    /// Persists one channel's flat product list
    ///
    /// # Arguments
    ///
    /// * `channel` - The channel the products came from
    /// * `products` - The filtered products to persist
    ///
    /// # Returns
    ///
    /// Paths of the files written
    fn save_products(&self, channel: Channel, products: &[Product]) -> OutputResult<Vec<PathBuf>>;

    /// Persists one harvested category tree
    ///
    /// # Arguments
    ///
    /// * `channel` - The channel the tree belongs to
    /// * `tree` - The root of the harvested tree
    fn save_tree(&self, channel: Channel, tree: &CategoryNode) -> OutputResult<PathBuf>;
}

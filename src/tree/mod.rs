//! Recursive category-tree harvesting

mod crawler;
mod node;

pub use crawler::CategoryTreeCrawler;
pub use node::{category_id_from_url, CategoryNode, NodeStatus, ProductRow};

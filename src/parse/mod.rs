//! Product and identifier extraction from fetched pages

mod ids;
mod products;

pub use ids::{extract_ids, IdSource};
pub use products::{extract_products, Product, Provenance, RiskLevel, SelectorProfile};

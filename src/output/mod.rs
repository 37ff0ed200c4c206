//! Persistence of harvested products, trees, and run reports

mod files;
mod report;
mod traits;

pub use files::FileSink;
pub use report::{RunReport, RunSummary};
pub use traits::{OutputError, OutputResult, ProductSink};

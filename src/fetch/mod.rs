//! Proxy-aware request execution and batch dispatch

mod dispatcher;
mod executor;

pub use dispatcher::{Dispatcher, Task};
pub use executor::{FetchedPage, RequestExecutor, RetryPolicy};

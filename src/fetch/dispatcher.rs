//! Concurrent batch fetching
//!
//! Fans a batch of tasks out over a bounded number of workers. Rate limiting
//! stays global: every worker funnels through the executor's shared limiter,
//! so raising `max_workers` increases overlap, not request rate.

use crate::fetch::{FetchedPage, RequestExecutor};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// One URL to fetch, keyed by a caller-chosen identifier
#[derive(Debug, Clone)]
pub struct Task {
    pub id: String,
    pub url: String,
}

impl Task {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }
}

/// Runs batches of fetches with bounded concurrency
pub struct Dispatcher {
    executor: Arc<RequestExecutor>,
    max_workers: usize,
}

impl Dispatcher {
    pub fn new(executor: Arc<RequestExecutor>, max_workers: usize) -> Self {
        Self {
            executor,
            max_workers: max_workers.max(1),
        }
    }

    /// Fetches every task and returns the pages that succeeded, keyed by
    /// task id. A failed task is logged and simply absent from the map; one
    /// failure never aborts the batch.
    pub async fn run(&self, tasks: Vec<Task>) -> HashMap<String, FetchedPage> {
        let executor = Arc::clone(&self.executor);
        self.run_with(tasks, move |task| {
            let executor = Arc::clone(&executor);
            async move {
                let page = executor.get(&task.url).await;
                if page.is_none() {
                    tracing::warn!("Task {} failed: {}", task.id, task.url);
                }
                page.map(|p| (task.id, p))
            }
        })
        .await
        .into_iter()
        .collect()
    }

    /// Generic bounded fan-out: applies `work` to every task and collects
    /// the `Some` results in completion order.
    pub async fn run_with<F, Fut, T>(&self, tasks: Vec<Task>, work: F) -> Vec<T>
    where
        F: Fn(Task) -> Fut,
        Fut: Future<Output = Option<T>> + Send + 'static,
        T: Send + 'static,
    {
        if tasks.is_empty() {
            return Vec::new();
        }

        let permits = self.max_workers.min(tasks.len());
        let semaphore = Arc::new(Semaphore::new(permits));
        let mut join_set = JoinSet::new();

        for task in tasks {
            let semaphore = Arc::clone(&semaphore);
            let fut = work(task);
            join_set.spawn(async move {
                // Holds the permit for the duration of the fetch
                let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
                fut.await
            });
        }

        let mut results = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(Some(value)) => results.push(value),
                Ok(None) => {}
                Err(e) => tracing::error!("Worker task panicked: {}", e),
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn test_dispatcher(max_workers: usize) -> Dispatcher {
        let pool = Arc::new(crate::proxy::ProxyPool::empty());
        let limiter = Arc::new(crate::proxy::RateLimiter::new(1000.0));
        let executor = Arc::new(
            RequestExecutor::new(
                pool,
                limiter,
                crate::fetch::RetryPolicy::immediate(0),
                Duration::from_secs(5),
            )
            .unwrap(),
        );
        Dispatcher::new(executor, max_workers)
    }

    #[tokio::test]
    async fn test_run_with_collects_successes_only() {
        let dispatcher = test_dispatcher(4);
        let tasks = vec![
            Task::new("a", "u"),
            Task::new("b", "u"),
            Task::new("c", "u"),
        ];

        let results = dispatcher
            .run_with(tasks, |task| async move {
                if task.id == "b" {
                    None
                } else {
                    Some(task.id)
                }
            })
            .await;

        let mut results = results;
        results.sort();
        assert_eq!(results, vec!["a".to_string(), "c".to_string()]);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let dispatcher = test_dispatcher(2);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks = (0..6).map(|i| Task::new(i.to_string(), "u")).collect();
        let results = dispatcher
            .run_with(tasks, {
                let in_flight = Arc::clone(&in_flight);
                let peak = Arc::clone(&peak);
                move |task| {
                    let in_flight = Arc::clone(&in_flight);
                    let peak = Arc::clone(&peak);
                    async move {
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                        Some(task.id)
                    }
                }
            })
            .await;

        assert_eq!(results.len(), 6);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let dispatcher = test_dispatcher(4);
        let results = dispatcher.run(Vec::new()).await;
        assert!(results.is_empty());
    }

    #[test]
    fn test_zero_workers_clamped() {
        let dispatcher = test_dispatcher(0);
        assert_eq!(dispatcher.max_workers, 1);
    }
}

//! Single-request execution through the rate limiter and proxy pool
//!
//! One call = rate-limit grant, proxy selection, HTTP round trip, health
//! feedback. Non-200 responses and transport errors are retried with
//! exponential backoff and a freshly selected proxy, up to the policy's
//! attempt budget. Exhausting the budget yields `None`, never an error:
//! callers treat absence as a terminal skip for that URL.

use crate::proxy::{Proxy, ProxyPool, RateLimiter};
use rand::seq::SliceRandom;
use reqwest::{Client, Method, StatusCode};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Browser user agents rotated across attempts to blend into normal traffic
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:89.0) Gecko/20100101 Firefox/89.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/96.0.4664.45 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
];

/// Markers of an anti-bot interstitial in an otherwise-200 response
const BLOCK_MARKERS: &[&str] = &["robot check", "captcha", "api-services-support@"];

/// Retry budget and backoff shape for one executor
///
/// Injectable so tests can run the full retry loop without real delays.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    backoff: Backoff,
}

#[derive(Debug, Clone)]
enum Backoff {
    /// `base * 2^attempt` after the attempt-th failure (1-based)
    Exponential { base: Duration },
    /// No delay between attempts
    None,
}

impl RetryPolicy {
    /// Production policy: `retry_count` retries after the first attempt,
    /// exponential backoff starting at one second (2s, 4s, 8s, ...).
    pub fn exponential(retry_count: u32) -> Self {
        Self {
            max_attempts: retry_count + 1,
            backoff: Backoff::Exponential {
                base: Duration::from_secs(1),
            },
        }
    }

    /// Zero-delay policy with the same attempt budget, for tests
    pub fn immediate(retry_count: u32) -> Self {
        Self {
            max_attempts: retry_count + 1,
            backoff: Backoff::None,
        }
    }

    /// Delay to apply after the given 1-based failed attempt
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Exponential { base } => base * 2u32.saturating_pow(attempt.min(16)),
            Backoff::None => Duration::ZERO,
        }
    }
}

/// A successfully fetched page body
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The URL that was requested
    pub url: String,
    /// HTTP status code (always 2xx)
    pub status: u16,
    /// Response body
    pub body: String,
}

/// Issues HTTP calls through the shared rate limiter and proxy pool
pub struct RequestExecutor {
    pool: Arc<ProxyPool>,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
    timeout: Duration,
    direct: Client,
    warned_exhausted: AtomicBool,
}

impl RequestExecutor {
    pub fn new(
        pool: Arc<ProxyPool>,
        limiter: Arc<RateLimiter>,
        retry: RetryPolicy,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let direct = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            pool,
            limiter,
            retry,
            timeout,
            direct,
            warned_exhausted: AtomicBool::new(false),
        })
    }

    /// Convenience GET
    pub async fn get(&self, url: &str) -> Option<FetchedPage> {
        self.request(url, Method::GET).await
    }

    /// Issues one logical request with bounded retry
    ///
    /// Returns `None` once the attempt budget is exhausted; callers must
    /// treat that as a terminal, non-retriable failure for this URL.
    pub async fn request(&self, url: &str, method: Method) -> Option<FetchedPage> {
        self.limiter.wait().await;

        for attempt in 1..=self.retry.max_attempts {
            let proxy = self.select_proxy();
            match self.attempt(url, method.clone(), proxy.as_ref()).await {
                Ok(page) => {
                    if let Some(p) = &proxy {
                        self.pool.report(p, true);
                    }
                    return Some(page);
                }
                Err(reason) => {
                    tracing::warn!(
                        "Attempt {}/{} failed for {}: {}",
                        attempt,
                        self.retry.max_attempts,
                        url,
                        reason
                    );
                    if let Some(p) = &proxy {
                        self.pool.report(p, false);
                    }
                }
            }

            if attempt < self.retry.max_attempts {
                tokio::time::sleep(self.retry.delay_after(attempt)).await;
            }
        }

        tracing::error!(
            "Giving up on {} after {} attempts",
            url,
            self.retry.max_attempts
        );
        None
    }

    fn select_proxy(&self) -> Option<Proxy> {
        let proxy = self.pool.select();
        if proxy.is_none()
            && self.pool.had_proxies()
            && !self.warned_exhausted.swap(true, Ordering::Relaxed)
        {
            tracing::warn!("Proxy pool exhausted; continuing with direct requests");
        }
        proxy
    }

    async fn attempt(
        &self,
        url: &str,
        method: Method,
        proxy: Option<&Proxy>,
    ) -> Result<FetchedPage, String> {
        let client = match proxy {
            Some(p) => self.proxied_client(p)?,
            None => self.direct.clone(),
        };

        let user_agent = USER_AGENTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(USER_AGENTS[0]);

        let response = client
            .request(method, url)
            .header("User-Agent", user_agent)
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        match status {
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                Err(format!("blocked or rate limited (HTTP {})", status.as_u16()))
            }
            s if s.is_success() => {
                let body = response.text().await.map_err(|e| e.to_string())?;
                if is_block_page(&body) {
                    return Err("anti-bot interstitial detected".to_string());
                }
                Ok(FetchedPage {
                    url: url.to_string(),
                    status: s.as_u16(),
                    body,
                })
            }
            s => Err(format!("HTTP {}", s.as_u16())),
        }
    }

    fn proxied_client(&self, proxy: &Proxy) -> Result<Client, String> {
        let upstream =
            reqwest::Proxy::all(proxy.url()).map_err(|e| format!("bad proxy url: {}", e))?;
        Client::builder()
            .proxy(upstream)
            .timeout(self.timeout)
            .build()
            .map_err(|e| e.to_string())
    }
}

/// Whether a 200 body is actually an anti-bot interstitial
fn is_block_page(body: &str) -> bool {
    // Only scan the head of the page; interstitials are small
    let head: String = body.chars().take(4096).collect::<String>().to_lowercase();
    BLOCK_MARKERS.iter().any(|marker| head.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy_attempt_budget() {
        let policy = RetryPolicy::exponential(3);
        assert_eq!(policy.max_attempts, 4);

        let policy = RetryPolicy::immediate(0);
        assert_eq!(policy.max_attempts, 1);
    }

    #[test]
    fn test_exponential_delays() {
        let policy = RetryPolicy::exponential(3);
        assert_eq!(policy.delay_after(1), Duration::from_secs(2));
        assert_eq!(policy.delay_after(2), Duration::from_secs(4));
        assert_eq!(policy.delay_after(3), Duration::from_secs(8));
    }

    #[test]
    fn test_immediate_has_no_delay() {
        let policy = RetryPolicy::immediate(5);
        assert_eq!(policy.delay_after(1), Duration::ZERO);
        assert_eq!(policy.delay_after(5), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_exhausted_pool_warns_once_and_goes_direct() {
        // The pool starts with one proxy that verification discards
        let pool = Arc::new(ProxyPool::new(vec![Proxy::new("127.0.0.1", 9)]));
        pool.verify("http://127.0.0.1:9", Duration::from_millis(500))
            .await;

        let executor = RequestExecutor::new(
            Arc::clone(&pool),
            Arc::new(RateLimiter::new(1000.0)),
            RetryPolicy::immediate(0),
            Duration::from_secs(5),
        )
        .unwrap();

        assert!(executor.select_proxy().is_none());
        assert!(executor.warned_exhausted.load(Ordering::Relaxed));
    }

    #[tokio::test]
    async fn test_never_stocked_pool_does_not_warn() {
        let executor = RequestExecutor::new(
            Arc::new(ProxyPool::empty()),
            Arc::new(RateLimiter::new(1000.0)),
            RetryPolicy::immediate(0),
            Duration::from_secs(5),
        )
        .unwrap();

        assert!(executor.select_proxy().is_none());
        assert!(!executor.warned_exhausted.load(Ordering::Relaxed));
    }

    #[test]
    fn test_block_page_detection() {
        assert!(is_block_page(
            "<html><title>Robot Check</title><body>…</body></html>"
        ));
        assert!(is_block_page("<html>please solve this CAPTCHA</html>"));
        assert!(!is_block_page("<html><body>Best Sellers</body></html>"));
    }
}

//! Feed fetching through rotating CORS proxies with bounded retries.
//!
//! # Architecture
//!
//! - [`Transport`]: the raw "GET url within timeout → body text" primitive
//! - [`HttpTransport`]: the `reqwest` implementation of it
//! - [`FetchAsync`]: what the orchestrator and discovery depend on
//! - [`ProxyFetcher`]: rewrites each attempt through the next proxy and
//!   retries according to a [`RetryPolicy`]
//!
//! # Retry Strategy
//!
//! Attempt `k` goes through proxy `k mod len(proxies)`, so consecutive
//! failures visit every proxy before any is reused.
//!
//! - Source feeds: 15 s timeout, up to 3 retries, 1 s between attempts
//! - Discovery feeds: 10 s timeout, browser headers, one attempt per proxy,
//!   no delay

use crate::error::FetchError;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, StatusCode};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

/// URL-rewriting proxies; the percent-encoded target is appended.
pub const PROXIES: [&str; 3] = [
    "https://api.allorigins.win/raw?url=",
    "https://corsproxy.io/?",
    "https://api.codetabs.com/v1/proxy?quest=",
];

pub const SOURCE_TIMEOUT: Duration = Duration::from_secs(15);
pub const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);
pub const MAX_RETRIES: usize = 3;
pub const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Fetch a URL's body as text.
pub trait FetchAsync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// A single HTTP GET. Anything but `200 OK` with a text body is a failure.
pub trait Transport {
    async fn get(&self, url: &str, timeout: Duration) -> Result<String, FetchError>;
}

/// [`Transport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, FetchError> {
        Ok(Self {
            client: Client::builder().build()?,
        })
    }

    /// Client that presents itself like a browser; some search feeds refuse
    /// requests without these headers.
    pub fn with_browser_headers() -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("Mozilla/5.0 (compatible; NewsBot/1.0)"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xml,application/xhtml+xml,text/xml;q=0.9"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        Ok(Self {
            client: Client::builder().default_headers(headers).build()?,
        })
    }
}

fn request_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Request(e)
    }
}

impl Transport for HttpTransport {
    async fn get(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let resp = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(request_error)?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if content_type.contains("json") {
            return Err(FetchError::NonText(content_type));
        }

        let bytes = resp.bytes().await.map_err(request_error)?;
        String::from_utf8(bytes.to_vec()).map_err(|e| FetchError::NonText(e.to_string()))
    }
}

/// How many attempts a fetch gets and how long to wait between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Retry up to `max_retries` times, sleeping `delay` before each retry.
    Rotating { max_retries: usize, delay: Duration },
    /// Try each proxy once, back to back.
    OncePerProxy,
}

impl RetryPolicy {
    /// After attempt `attempt` (0-indexed) failed: the wait before the next
    /// attempt, or `None` when the budget is spent.
    pub fn next_delay(&self, attempt: usize, proxy_count: usize) -> Option<Duration> {
        match *self {
            RetryPolicy::Rotating { max_retries, delay } => (attempt < max_retries).then_some(delay),
            RetryPolicy::OncePerProxy => (attempt + 1 < proxy_count).then_some(Duration::ZERO),
        }
    }
}

/// [`FetchAsync`] implementation that routes every attempt through a proxy.
pub struct ProxyFetcher<T> {
    transport: T,
    proxies: Vec<String>,
    timeout: Duration,
    policy: RetryPolicy,
}

impl<T> fmt::Debug for ProxyFetcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyFetcher")
            .field("proxies", &self.proxies)
            .field("timeout", &self.timeout)
            .field("policy", &self.policy)
            .finish()
    }
}

impl<T> ProxyFetcher<T>
where
    T: Transport,
{
    /// Create a fetcher with explicit tuning.
    ///
    /// # Arguments
    ///
    /// * `transport` - Performs each single GET
    /// * `proxies` - URL prefixes; attempt `k` uses `proxies[k % len]`
    /// * `timeout` - Per-attempt timeout handed to the transport
    /// * `policy` - How many attempts are made and the wait between them
    ///
    /// An empty `proxies` list makes every fetch fail with
    /// [`FetchError::NoProxies`].
    pub fn new(transport: T, proxies: Vec<String>, timeout: Duration, policy: RetryPolicy) -> Self {
        Self {
            transport,
            proxies,
            timeout,
            policy,
        }
    }

    /// Tuning used for per-source feed fetches.
    pub fn for_sources(transport: T) -> Self {
        Self::new(
            transport,
            default_proxies(),
            SOURCE_TIMEOUT,
            RetryPolicy::Rotating {
                max_retries: MAX_RETRIES,
                delay: RETRY_DELAY,
            },
        )
    }

    /// Tuning used for search-engine feeds during discovery.
    pub fn for_discovery(transport: T) -> Self {
        Self::new(transport, default_proxies(), DISCOVERY_TIMEOUT, RetryPolicy::OncePerProxy)
    }

    /// The proxied URL for attempt `attempt`.
    pub fn proxied_url(&self, attempt: usize, url: &str) -> Option<String> {
        let proxy = self.proxies.get(attempt % self.proxies.len().max(1))?;
        Some(format!("{}{}", proxy, urlencoding::encode(url)))
    }
}

fn default_proxies() -> Vec<String> {
    PROXIES.iter().map(|p| p.to_string()).collect()
}

impl<T> FetchAsync for ProxyFetcher<T>
where
    T: Transport,
{
    #[instrument(level = "info", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let proxied = self.proxied_url(attempt, url).ok_or(FetchError::NoProxies)?;
            let attempt_t0 = Instant::now();
            match self.transport.get(&proxied, self.timeout).await {
                Ok(body) => {
                    debug!(attempt, bytes = body.len(), elapsed_ms = attempt_t0.elapsed().as_millis(), "Fetched");
                    return Ok(body);
                }
                Err(e) => match self.policy.next_delay(attempt, self.proxies.len()) {
                    Some(delay) => {
                        warn!(
                            attempt,
                            proxy = %proxied,
                            elapsed_ms_attempt = attempt_t0.elapsed().as_millis(),
                            ?delay,
                            error = %e,
                            "Fetch attempt failed; rotating proxy"
                        );
                        if !delay.is_zero() {
                            sleep(delay).await;
                        }
                        attempt += 1;
                    }
                    None => {
                        error!(
                            attempts = attempt + 1,
                            elapsed_ms_total = total_t0.elapsed().as_millis(),
                            error = %e,
                            "Fetch exhausted retries"
                        );
                        return Err(FetchError::Exhausted {
                            url: url.to_string(),
                            attempts: attempt + 1,
                            last: Box::new(e),
                        });
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Transport that replays scripted outcomes and records requested URLs.
    #[derive(Default)]
    struct ScriptedTransport {
        outcomes: RefCell<VecDeque<Result<String, FetchError>>>,
        calls: RefCell<Vec<(String, Duration)>>,
    }

    impl ScriptedTransport {
        fn new(outcomes: Vec<Result<String, FetchError>>) -> Self {
            Self {
                outcomes: RefCell::new(outcomes.into()),
                calls: RefCell::default(),
            }
        }

        fn proxies_used(&self) -> Vec<usize> {
            self.calls
                .borrow()
                .iter()
                .map(|(u, _)| PROXIES.iter().position(|p| u.starts_with(p)).unwrap())
                .collect()
        }
    }

    impl Transport for ScriptedTransport {
        async fn get(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
            self.calls.borrow_mut().push((url.to_string(), timeout));
            self.outcomes
                .borrow_mut()
                .pop_front()
                .unwrap_or(Err(FetchError::Status(503)))
        }
    }

    #[test]
    fn test_rotating_policy_budget() {
        let policy = RetryPolicy::Rotating {
            max_retries: 3,
            delay: RETRY_DELAY,
        };
        assert_eq!(policy.next_delay(0, 3), Some(RETRY_DELAY));
        assert_eq!(policy.next_delay(2, 3), Some(RETRY_DELAY));
        assert_eq!(policy.next_delay(3, 3), None);
    }

    #[test]
    fn test_once_per_proxy_budget() {
        let policy = RetryPolicy::OncePerProxy;
        assert_eq!(policy.next_delay(0, 3), Some(Duration::ZERO));
        assert_eq!(policy.next_delay(1, 3), Some(Duration::ZERO));
        assert_eq!(policy.next_delay(2, 3), None);
    }

    #[test]
    fn test_proxied_url_encodes_target() {
        let fetcher = ProxyFetcher::for_sources(ScriptedTransport::default());
        assert_eq!(
            fetcher.proxied_url(1, "https://a.com/rss?q=ai&x=1").unwrap(),
            "https://corsproxy.io/?https%3A%2F%2Fa.com%2Frss%3Fq%3Dai%26x%3D1"
        );
        assert!(fetcher.proxied_url(3, "u").unwrap().starts_with(PROXIES[0]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_source_fetch_rotates_and_exhausts() {
        let fetcher = ProxyFetcher::for_sources(ScriptedTransport::default());
        let start = tokio::time::Instant::now();

        let err = fetcher.fetch("https://a.com/rss").await.unwrap_err();

        assert!(matches!(err, FetchError::Exhausted { attempts: 4, .. }));
        assert_eq!(fetcher.transport.proxies_used(), vec![0, 1, 2, 0]);
        assert!(fetcher.transport.calls.borrow().iter().all(|(_, t)| *t == SOURCE_TIMEOUT));
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_source_fetch_recovers_on_later_proxy() {
        let transport = ScriptedTransport::new(vec![
            Err(FetchError::Timeout),
            Err(FetchError::NonText("application/json".to_string())),
            Ok("<rss/>".to_string()),
        ]);
        let fetcher = ProxyFetcher::for_sources(transport);

        assert_eq!(fetcher.fetch("https://a.com/rss").await.unwrap(), "<rss/>");
        assert_eq!(fetcher.transport.proxies_used(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_discovery_fetch_tries_each_proxy_once() {
        let fetcher = ProxyFetcher::for_discovery(ScriptedTransport::default());
        let start = Instant::now();

        let err = fetcher.fetch("https://news.example.com/rss").await.unwrap_err();

        assert!(matches!(err, FetchError::Exhausted { attempts: 3, .. }));
        assert_eq!(fetcher.transport.proxies_used(), vec![0, 1, 2]);
        assert!(fetcher.transport.calls.borrow().iter().all(|(_, t)| *t == DISCOVERY_TIMEOUT));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_no_proxies_configured() {
        let fetcher = ProxyFetcher::new(
            ScriptedTransport::default(),
            Vec::new(),
            SOURCE_TIMEOUT,
            RetryPolicy::OncePerProxy,
        );
        assert!(matches!(fetcher.fetch("https://a.com").await, Err(FetchError::NoProxies)));
    }
}

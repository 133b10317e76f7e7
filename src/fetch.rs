use std::time::{Duration, SystemTime};

use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use tracing::{debug, info};

use crate::error::{IngestError, Result};
use crate::http_cache::HttpCache;
use crate::rate_limit::RateLimiter;

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// The site serves an empty shell to obvious bots; present a browser UA.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_10_1) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/39.0.2171.95 Safari/537.36";

/// The one seam with the network. Production uses [`HttpTransport`]; tests
/// substitute a scripted transport to assert call counts.
pub trait Transport {
    fn get(&self, url: &str) -> Result<String>;
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|err| IngestError::Transport {
                path: String::new(),
                reason: format!("failed to build http client: {err}"),
            })?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .send()
            .map_err(|err| IngestError::Transport {
                path: url.to_string(),
                reason: err.to_string(),
            })?;
        let status = resp.status();
        let body = resp.text().map_err(|err| IngestError::Transport {
            path: url.to_string(),
            reason: err.to_string(),
        })?;
        if !status.is_success() {
            return Err(IngestError::Transport {
                path: url.to_string(),
                reason: format!("http {status}"),
            });
        }
        Ok(body)
    }
}

/// Rate-limited, cached fetch client. Constructed once per run and injected
/// into the pipeline; it owns all the process-wide mutable state (window
/// counters, cache, request counter).
pub struct FetchClient<T: Transport> {
    base_url: String,
    transport: T,
    limiter: RateLimiter,
    cache: HttpCache,
    requests_issued: u64,
}

impl<T: Transport> FetchClient<T> {
    pub fn new(base_url: impl Into<String>, transport: T, limiter: RateLimiter, cache: HttpCache) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
            limiter,
            cache,
            requests_issued: 0,
        }
    }

    /// Body of the document at `path` (relative to the base url).
    ///
    /// A cache hit within TTL returns immediately, without touching the
    /// network, the window counters, or the request counter. A miss waits
    /// for every rate window to admit a call, fetches, and caches the body.
    pub fn fetch(&mut self, path: &str) -> Result<String> {
        if let Some(body) = self.cache.lookup(path, SystemTime::now()) {
            debug!(path, "cache hit");
            return Ok(body);
        }

        self.limiter.acquire();
        let url = format!("{}{}", self.base_url, path);
        info!(%url, "fetching");
        let body = self.transport.get(&url)?;
        self.cache.insert(path, body.clone(), SystemTime::now());
        self.requests_issued += 1;
        Ok(body)
    }

    /// Network requests actually issued this run. Observability only.
    pub fn requests_issued(&self) -> u64 {
        self.requests_issued
    }

    /// Opportunistic purge of expired cache entries.
    pub fn sweep_cache(&mut self) {
        self.cache.sweep(SystemTime::now());
    }
}

use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, error, warn};
use rand::Rng;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use thiserror::Error;

use crate::config::FetchPolicy;
use crate::delay_manager::{self, RequestGate};
use crate::error::LeadError;
use crate::proxy::ProxyPool;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("request to {url} failed after {attempts} attempts: {reason}")]
    Exhausted { url: String, attempts: u32, reason: String },
    #[error("network access disabled, skipped {0}")]
    Offline(String),
    #[error("no stored page matches {0}")]
    NotFound(String),
}

/// Anything that can turn a URL into an HTML body. Failure means "source
/// unavailable", never a fatal condition.
pub trait PageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

const HEADER_SETS: [&[(&str, &str)]; 4] = [
    &[
        ("user-agent", "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"),
        ("accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"),
        ("accept-language", "en-US,en;q=0.5"),
        ("upgrade-insecure-requests", "1"),
    ],
    &[
        ("user-agent", "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"),
        ("accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        ("accept-language", "en-US,en;q=0.9"),
    ],
    &[
        ("user-agent", "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"),
        ("accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"),
        ("accept-language", "en-US,en;q=0.8"),
    ],
    &[
        ("user-agent", "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0"),
        ("accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        ("accept-language", "en-US,en;q=0.7"),
    ],
];

fn header_map(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for &(name, value) in pairs {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
    headers
}

/// Blocking HTTP fetcher with header rotation, pacing through a shared
/// `RequestGate`, bounded retries, and proxy rotation from the second attempt.
pub struct Fetcher {
    client: Client,
    policy: FetchPolicy,
    gate: Arc<RequestGate>,
    proxies: Arc<ProxyPool>,
    header_sets: Vec<HeaderMap>,
}

impl Fetcher {
    pub fn new(policy: FetchPolicy, proxies: ProxyPool) -> Result<Self, LeadError> {
        let gate = Arc::new(RequestGate::new(policy.min_delay, policy.max_delay));
        Fetcher::with_gate(policy, gate, Arc::new(proxies))
    }

    /// Builds a fetcher that shares pacing state with other fetchers.
    pub fn with_gate(
        policy: FetchPolicy,
        gate: Arc<RequestGate>,
        proxies: Arc<ProxyPool>,
    ) -> Result<Self, LeadError> {
        let client = Client::builder()
            .timeout(policy.timeout)
            .cookie_store(true)
            .build()?;

        Ok(Fetcher {
            client,
            policy,
            gate,
            proxies,
            header_sets: HEADER_SETS.iter().map(|set| header_map(set)).collect(),
        })
    }

    pub fn gate(&self) -> Arc<RequestGate> {
        Arc::clone(&self.gate)
    }

    pub fn proxy_count(&self) -> usize {
        self.proxies.len()
    }

    pub fn header_variations(&self) -> usize {
        self.header_sets.len()
    }

    fn random_headers(&self) -> HeaderMap {
        let mut rng = rand::thread_rng();
        self.header_sets[rng.gen_range(0..self.header_sets.len())].clone()
    }

    fn proxied_client(&self) -> Option<Client> {
        let proxy = self.proxies.next_proxy()?;
        let built = reqwest::Proxy::all(format!("http://{}", proxy)).and_then(|p| {
            Client::builder()
                .timeout(self.policy.timeout)
                .cookie_store(true)
                .proxy(p)
                .build()
        });
        match built {
            Ok(client) => {
                debug!("Routing through proxy {}", proxy);
                Some(client)
            }
            Err(e) => {
                warn!("Unusable proxy {}: {}", proxy, e);
                None
            }
        }
    }
}

impl PageFetcher for Fetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let max_retries = self.policy.max_retries;
        let mut attempt: u32 = 0;

        loop {
            self.gate.wait_turn();

            let proxied = if attempt > 0 { self.proxied_client() } else { None };
            let client = proxied.as_ref().unwrap_or(&self.client);

            let outcome = client
                .get(url)
                .headers(self.random_headers())
                .send()
                .and_then(|resp| {
                    let status = resp.status();
                    if status.is_success() {
                        resp.text().map(|body| (status, Some(body)))
                    } else {
                        Ok((status, None))
                    }
                });

            match outcome {
                Ok((_, Some(body))) => return Ok(body),
                Ok((status, None)) => {
                    let throttled = status == StatusCode::TOO_MANY_REQUESTS
                        || status == StatusCode::SERVICE_UNAVAILABLE;
                    if throttled && attempt < max_retries {
                        attempt += 1;
                        warn!("Rate limited by {} ({}), retrying with proxy... (attempt {})", url, status, attempt);
                        delay_manager::random_backoff(self.policy.rate_limit_backoff, "rate limit backoff");
                        continue;
                    }
                    error!("Request failed: {} for {}", status, url);
                    return Err(FetchError::Status { url: url.to_string(), status: status.as_u16() });
                }
                Err(e) => {
                    if attempt < max_retries {
                        attempt += 1;
                        warn!("Request to {} failed, retrying... (attempt {}): {}", url, attempt, e);
                        delay_manager::random_backoff(self.policy.network_backoff, "network backoff");
                        continue;
                    }
                    error!("Request to {} failed after {} retries: {}", url, max_retries, e);
                    return Err(FetchError::Exhausted {
                        url: url.to_string(),
                        attempts: attempt + 1,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }
}

/// Refuses every request. Drives the pipeline purely from static data.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineFetcher;

impl PageFetcher for OfflineFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        Err(FetchError::Offline(url.to_string()))
    }
}

/// Serves canned pages: the first registered fragment contained in the
/// requested URL wins. Remembers every URL it was asked for.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    pages: Vec<(String, String)>,
    requested: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        StaticFetcher::default()
    }

    pub fn with_page(mut self, url_fragment: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.push((url_fragment.into(), html.into()));
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl PageFetcher for StaticFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());
        self.pages
            .iter()
            .find(|(fragment, _)| url.contains(fragment.as_str()))
            .map(|(_, html)| html.clone())
            .ok_or_else(|| FetchError::NotFound(url.to_string()))
    }
}

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use log::{info, warn};
use regex::Regex;
use reqwest::blocking::Client;

/// Only the first this-many lines of the combined lists are considered.
const MAX_CANDIDATES: usize = 50;

/// Rotating pool of `ip:port` HTTP proxies, loaded once at startup.
#[derive(Debug, Default)]
pub struct ProxyPool {
    proxies: Vec<String>,
    next: AtomicUsize,
}

impl ProxyPool {
    pub fn empty() -> Self {
        ProxyPool::default()
    }

    /// Keeps only lines that look like `a.b.c.d:port`.
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let pattern = Regex::new(r"^\d+\.\d+\.\d+\.\d+:\d+$").unwrap();
        let proxies = lines
            .into_iter()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .take(MAX_CANDIDATES)
            .filter(|line| pattern.is_match(line))
            .map(str::to_string)
            .collect();
        ProxyPool { proxies, next: AtomicUsize::new(0) }
    }

    /// Downloads the public proxy lists. Unreachable lists are skipped.
    pub fn load(sources: &[String], timeout: Duration) -> Self {
        if sources.is_empty() {
            return ProxyPool::empty();
        }
        let client = match Client::builder().timeout(timeout).build() {
            Ok(c) => c,
            Err(e) => {
                warn!("Could not build proxy list client: {}", e);
                return ProxyPool::empty();
            }
        };

        let mut raw = String::new();
        for source in sources {
            match client.get(source).send() {
                Ok(resp) if resp.status().is_success() => match resp.text() {
                    Ok(text) => {
                        raw.push_str(&text);
                        raw.push('\n');
                    }
                    Err(e) => warn!("Failed to read proxy list {}: {}", source, e),
                },
                Ok(resp) => warn!("Proxy list {} returned {}", source, resp.status()),
                Err(e) => warn!("Proxy list {} unreachable: {}", source, e),
            }
        }

        let pool = ProxyPool::from_lines(raw.lines());
        info!("Loaded {} free proxies", pool.len());
        pool
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    /// Round-robin pick; `None` when the pool is empty.
    pub fn next_proxy(&self) -> Option<&str> {
        if self.proxies.is_empty() {
            return None;
        }
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.proxies.len();
        Some(&self.proxies[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_entries_are_discarded() {
        let pool = ProxyPool::from_lines(vec![
            "10.0.0.1:8080",
            "  192.168.1.20:3128  ",
            "not-a-proxy",
            "10.0.0.1",
            "proxy.example.com:8080",
            "",
        ]);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn rotation_wraps_around() {
        let pool = ProxyPool::from_lines(vec!["1.1.1.1:80", "2.2.2.2:80"]);
        assert_eq!(pool.next_proxy(), Some("1.1.1.1:80"));
        assert_eq!(pool.next_proxy(), Some("2.2.2.2:80"));
        assert_eq!(pool.next_proxy(), Some("1.1.1.1:80"));
    }

    #[test]
    fn empty_pool_yields_nothing() {
        assert!(ProxyPool::empty().next_proxy().is_none());
        assert!(ProxyPool::load(&[], Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn only_first_fifty_lines_are_considered() {
        let lines: Vec<String> = (0..80).map(|i| format!("10.0.0.{}:80", i)).collect();
        let pool = ProxyPool::from_lines(lines.iter().map(String::as_str));
        assert_eq!(pool.len(), 50);
    }
}

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{LeadError, Result};

pub const DEFAULT_PROXY_SOURCES: [&str; 2] = [
    "https://raw.githubusercontent.com/TheSpeedX/PROXY-List/master/http.txt",
    "https://raw.githubusercontent.com/clarketm/proxy-list/master/proxy-list-raw.txt",
];

/// Pacing, retry and timeout settings for the fetch layer.
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub timeout: Duration,
    pub max_retries: u32,
    /// Backoff range after a 429/503 answer.
    pub rate_limit_backoff: (Duration, Duration),
    /// Backoff range after a network failure.
    pub network_backoff: (Duration, Duration),
}

impl Default for FetchPolicy {
    fn default() -> Self {
        FetchPolicy {
            min_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(5),
            timeout: Duration::from_secs(15),
            max_retries: 3,
            rate_limit_backoff: (Duration::from_secs(5), Duration::from_secs(15)),
            network_backoff: (Duration::from_secs(2), Duration::from_secs(8)),
        }
    }
}

impl FetchPolicy {
    /// No pacing and no backoff. Used for offline runs and tests.
    pub fn immediate() -> Self {
        FetchPolicy {
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            timeout: Duration::from_secs(5),
            max_retries: 3,
            rate_limit_backoff: (Duration::ZERO, Duration::ZERO),
            network_backoff: (Duration::ZERO, Duration::ZERO),
        }
    }
}

/// Identity used in generated outreach emails.
#[derive(Debug, Clone)]
pub struct OutreachIdentity {
    pub sender_name: String,
    pub company: String,
    pub contact_email: String,
    pub website: String,
    pub phone: String,
    pub signup_url: String,
    pub subject_prefix: String,
}

impl Default for OutreachIdentity {
    fn default() -> Self {
        OutreachIdentity {
            sender_name: "Zaid".to_string(),
            company: "Reviu.pk".to_string(),
            contact_email: "info@reviu.pk".to_string(),
            website: "www.reviu.pk".to_string(),
            phone: "03556924128".to_string(),
            signup_url: "https://www.reviu.pk/auth/business/signup".to_string(),
            subject_prefix: "Join Reviu.pk - Pakistan's Leading Business Directory".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub fetch: FetchPolicy,
    pub workers: usize,
    pub enhance_delay: Duration,
    pub proxy_sources: Vec<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub outreach: OutreachIdentity,
    pub send_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from("data"),
            fetch: FetchPolicy::default(),
            workers: 3,
            enhance_delay: Duration::from_secs(1),
            proxy_sources: DEFAULT_PROXY_SOURCES.iter().map(|s| s.to_string()).collect(),
            gemini_api_key: None,
            gemini_model: "gemini-1.5-flash".to_string(),
            outreach: OutreachIdentity::default(),
            send_delay: Duration::from_millis(500),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Some(dir) = var("LEADS_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(ms) = parsed::<u64>("LEADS_MIN_DELAY_MS")? {
            config.fetch.min_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = parsed::<u64>("LEADS_MAX_DELAY_MS")? {
            config.fetch.max_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = parsed::<u64>("LEADS_TIMEOUT_SECS")? {
            config.fetch.timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = parsed::<u32>("LEADS_MAX_RETRIES")? {
            config.fetch.max_retries = retries;
        }
        if let Some(workers) = parsed::<usize>("LEADS_WORKERS")? {
            config.workers = workers.max(1);
        }
        if let Some(ms) = parsed::<u64>("LEADS_ENHANCE_DELAY_MS")? {
            config.enhance_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = parsed::<u64>("LEADS_SEND_DELAY_MS")? {
            config.send_delay = Duration::from_millis(ms);
        }
        if let Ok(list) = env::var("LEADS_PROXY_SOURCES") {
            config.proxy_sources = split_list(&list);
        }

        config.gemini_api_key = var("GEMINI_API_KEY");
        if let Some(model) = var("GEMINI_MODEL") {
            config.gemini_model = model;
        }

        let identity = &mut config.outreach;
        override_with(&mut identity.sender_name, "OUTREACH_SENDER_NAME");
        override_with(&mut identity.company, "OUTREACH_COMPANY");
        override_with(&mut identity.contact_email, "OUTREACH_CONTACT_EMAIL");
        override_with(&mut identity.website, "OUTREACH_WEBSITE");
        override_with(&mut identity.phone, "OUTREACH_PHONE");
        override_with(&mut identity.signup_url, "OUTREACH_SIGNUP_URL");
        override_with(&mut identity.subject_prefix, "OUTREACH_SUBJECT_PREFIX");

        if config.fetch.max_delay < config.fetch.min_delay {
            config.fetch.max_delay = config.fetch.min_delay;
        }
        Ok(config)
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parsed<T: FromStr>(key: &str) -> Result<Option<T>> {
    match var(key) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| LeadError::Config(format!("{} has invalid value '{}'", key, raw))),
    }
}

fn override_with(field: &mut String, key: &str) {
    if let Some(value) = var(key) {
        *field = value;
    }
}

pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

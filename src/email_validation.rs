use log::{debug, info, warn};
use regex::Regex;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::Resolver;

use crate::model::BusinessRecord;

/// Result of a mail-exchange lookup for a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MxStatus {
    Found,
    Missing,
    Inconclusive,
}

pub trait MxLookup: Send + Sync {
    fn lookup(&self, domain: &str) -> MxStatus;
}

/// MX lookup through the system DNS configuration, or public resolvers if
/// that cannot be read.
pub struct DnsMxLookup {
    resolver: Option<Resolver>,
}

impl DnsMxLookup {
    pub fn new() -> Self {
        let resolver = Resolver::from_system_conf()
            .or_else(|_| Resolver::new(ResolverConfig::default(), ResolverOpts::default()));
        match resolver {
            Ok(resolver) => DnsMxLookup { resolver: Some(resolver) },
            Err(e) => {
                warn!("DNS resolver unavailable, MX checks disabled: {}", e);
                DnsMxLookup { resolver: None }
            }
        }
    }
}

impl Default for DnsMxLookup {
    fn default() -> Self {
        Self::new()
    }
}

impl MxLookup for DnsMxLookup {
    fn lookup(&self, domain: &str) -> MxStatus {
        let Some(resolver) = &self.resolver else {
            return MxStatus::Inconclusive;
        };
        match resolver.mx_lookup(domain) {
            Ok(records) if records.iter().next().is_some() => MxStatus::Found,
            Ok(_) => MxStatus::Missing,
            Err(e) => {
                debug!("MX lookup for {} failed: {}", domain, e);
                MxStatus::Missing
            }
        }
    }
}

/// Skips DNS entirely.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMxLookup;

impl MxLookup for NoMxLookup {
    fn lookup(&self, _domain: &str) -> MxStatus {
        MxStatus::Inconclusive
    }
}

/// Two-tier email check. Only a syntax failure makes an address invalid; the MX
/// lookup is informational.
pub struct EmailValidator {
    syntax: Regex,
    mx: Box<dyn MxLookup>,
}

impl EmailValidator {
    pub fn new(mx: Box<dyn MxLookup>) -> Self {
        EmailValidator {
            syntax: Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap(),
            mx,
        }
    }

    pub fn offline() -> Self {
        EmailValidator::new(Box::new(NoMxLookup))
    }

    pub fn is_valid_syntax(&self, email: &str) -> bool {
        let email = email.trim();
        if !self.syntax.is_match(email) {
            return false;
        }
        match email.rsplit_once('@') {
            Some((local, domain)) => {
                !local.starts_with('.')
                    && !local.ends_with('.')
                    && !local.contains("..")
                    && !domain.starts_with('.')
                    && !domain.starts_with('-')
                    && !domain.contains("..")
            }
            None => false,
        }
    }

    pub fn validate(&self, email: &str) -> bool {
        if !self.is_valid_syntax(email) {
            return false;
        }
        if let Some((_, domain)) = email.trim().rsplit_once('@') {
            match self.mx.lookup(domain) {
                MxStatus::Found => debug!("{} has mail exchangers", domain),
                status => debug!("{} MX check {:?}, keeping address", domain, status),
            }
        }
        true
    }

    /// Splits records into (valid, invalid). Records with no email are invalid.
    pub fn partition(&self, records: Vec<BusinessRecord>) -> (Vec<BusinessRecord>, Vec<BusinessRecord>) {
        let (valid, invalid): (Vec<_>, Vec<_>) = records
            .into_iter()
            .partition(|r| r.email.as_deref().map_or(false, |e| self.validate(e)));
        if !invalid.is_empty() {
            info!("Filtered out {} businesses with invalid emails", invalid.len());
        }
        (valid, invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Source;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingLookup {
        status: MxStatus,
        calls: Arc<AtomicUsize>,
    }

    impl MxLookup for CountingLookup {
        fn lookup(&self, _domain: &str) -> MxStatus {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.status
        }
    }

    fn validator(status: MxStatus) -> (EmailValidator, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let lookup = CountingLookup { status, calls: Arc::clone(&calls) };
        (EmailValidator::new(Box::new(lookup)), calls)
    }

    #[test]
    fn syntax_examples() {
        let v = EmailValidator::offline();
        assert!(v.validate("info@example.com"));
        assert!(!v.validate("not-an-email"));
        assert!(!v.validate("info@example"));
        assert!(!v.validate("info..x@example.com"));
        assert!(!v.validate(""));
    }

    #[test]
    fn missing_mx_does_not_invalidate() {
        let (v, calls) = validator(MxStatus::Missing);
        assert!(v.validate("hello@no-mail-here.com.pk"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn bad_syntax_skips_dns() {
        let (v, calls) = validator(MxStatus::Found);
        assert!(!v.validate("broken@"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn partition_drops_missing_and_malformed() {
        let v = EmailValidator::offline();
        let mut good = BusinessRecord::new("Good Co", Source::GoogleSearch);
        good.email = Some("info@good.com".into());
        let mut bad = BusinessRecord::new("Bad Co", Source::GoogleSearch);
        bad.email = Some("goodco.com".into());
        let none = BusinessRecord::new("No Mail", Source::GoogleSearch);

        let (valid, invalid) = v.partition(vec![good, bad, none]);
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].name, "Good Co");
        assert_eq!(invalid.len(), 2);
    }
}

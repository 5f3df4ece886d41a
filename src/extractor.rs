use regex::Regex;
use std::collections::HashSet;

use crate::model::ContactInfo;

/// Ordered regex patterns per contact field. Labeled text ("Email:", "Phone:",
/// "Address:") comes first, bare matches after. For each field the first
/// match that survives a sanity check wins.
pub struct Extractor {
    email_patterns: Vec<Regex>,
    phone_patterns: Vec<Regex>,
    address_patterns: Vec<Regex>,
    website_patterns: Vec<Regex>,
    email_regex: Regex,
    pk_phone_regex: Regex,
}

const EMAIL: &str = r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}";
const ADDRESS_KEYWORDS: &str = "Street|Road|Avenue|Lane|Plaza|Mall|Center|Building|Tower|Complex";
const CITY_NAMES: &str = "Karachi|Lahore|Islamabad|Rawalpindi|Faisalabad|Multan|Peshawar|Quetta";
const IMAGE_SUFFIXES: [&str; 5] = [".png", ".jpg", ".jpeg", ".gif", ".webp"];

fn compile(patterns: &[String]) -> Vec<Regex> {
    patterns.iter().map(|p| Regex::new(p).unwrap()).collect()
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor {
    pub fn new() -> Self {
        let email_patterns = compile(&[
            format!(r"(?i)Email[:\s]*({})", EMAIL),
            format!(r"(?i)Mail[:\s]*({})", EMAIL),
            format!(r"(?i)Contact[:\s]*({})", EMAIL),
            format!(r"(?i)\b({})\b", EMAIL),
        ]);
        let phone_patterns = compile(&[
            r"(?i)Phone[:\s]*([\d\s\-\+]+)".to_string(),
            r"(?i)Tel[:\s]*([\d\s\-\+]+)".to_string(),
            r"(?i)Call[:\s]*([\d\s\-\+]+)".to_string(),
            r"(?i)Contact[:\s]*([\d\s\-\+]+)".to_string(),
            r"(\+92[\s-]?\d{2}[\s-]?\d{3}[\s-]?\d{4})".to_string(),
            r"(\+92[\s-]?\d{3}[\s-]?\d{7})".to_string(),
            r"(0\d{2}[\s-]?\d{3}[\s-]?\d{4})".to_string(),
            r"(\+92[\s-]?\d{4}[\s-]?\d{6})".to_string(),
        ]);
        let address_patterns = compile(&[
            format!(r"(?i)Address[:\s]*([^,\n\r]+(?:{})[^,\n\r]*)", ADDRESS_KEYWORDS),
            format!(r"(?i)Location[:\s]*([^,\n\r]+(?:{})[^,\n\r]*)", ADDRESS_KEYWORDS),
            format!(r"(?i)([^,\n\r]+(?:{})[^,\n\r]*)", ADDRESS_KEYWORDS),
            format!(r"(?i)([^,\n\r]+(?:{})[^,\n\r]*)", CITY_NAMES),
        ]);
        let website_patterns = compile(&[
            r"(?i)Website[:\s]*(https?://[^\s]+)".to_string(),
            r"(?i)Site[:\s]*(https?://[^\s]+)".to_string(),
            r"(?i)Web[:\s]*(https?://[^\s]+)".to_string(),
            r"(?i)(https?://[^\s]+)".to_string(),
        ]);

        Extractor {
            email_patterns,
            phone_patterns,
            address_patterns,
            website_patterns,
            email_regex: Regex::new(&format!(r"(?i){}", EMAIL)).unwrap(),
            pk_phone_regex: Regex::new(r"(\+92|92)?[\s-]?(\d{2,4})[\s-]?(\d{7,8})").unwrap(),
        }
    }

    /// Best-effort email, phone, address and website from arbitrary text.
    pub fn extract_contact_info(&self, text: &str) -> ContactInfo {
        ContactInfo {
            email: first_match(&self.email_patterns, text, |e| is_plausible_email(e)),
            phone: first_match(&self.phone_patterns, text, |p| digit_count(p) >= 10),
            address: first_match(&self.address_patterns, text, |a| a.chars().count() > 10),
            website: first_match(&self.website_patterns, text, |w| {
                w.starts_with("http://") || w.starts_with("https://")
            })
            .map(|w| trim_url(&w)),
        }
    }

    pub fn extract_email(&self, text: &str) -> Option<String> {
        self.email_regex
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .find(|e| is_plausible_email(e))
    }

    /// Every distinct email in `text`, lowercased, skipping asset names like `logo@2x.png`.
    pub fn extract_emails(&self, text: &str) -> HashSet<String> {
        self.email_regex
            .find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .filter(|e| is_plausible_email(e))
            .collect()
    }

    /// First Pakistani-looking number, normalized to `+92-AREA-NUMBER`.
    pub fn extract_pk_phone(&self, text: &str) -> Option<String> {
        let caps = self.pk_phone_regex.captures(text)?;
        let area = caps.get(2)?.as_str();
        let number = caps.get(3)?.as_str();
        Some(format!("+92-{}-{}", area, number))
    }
}

fn first_match(patterns: &[Regex], text: &str, accept: impl Fn(&str) -> bool) -> Option<String> {
    for pattern in patterns {
        if let Some(caps) = pattern.captures(text) {
            let value = caps.get(1).or_else(|| caps.get(0))?.as_str().trim();
            if accept(value) {
                return Some(value.to_string());
            }
        }
    }
    None
}

pub fn is_plausible_email(email: &str) -> bool {
    let lower = email.to_lowercase();
    if IMAGE_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    }
}

fn digit_count(value: &str) -> usize {
    value.chars().filter(|c| c.is_ascii_digit()).count()
}

fn trim_url(url: &str) -> String {
    url.trim_end_matches(|c: char| matches!(c, '.' | ',' | ';' | ')' | '"' | '\''))
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labeled_email_beats_bare_email() {
        let extractor = Extractor::new();
        let text = "Write to sales@first.com or Email: info@labeled.pk for quotes";
        let info = extractor.extract_contact_info(text);
        assert_eq!(info.email.as_deref(), Some("info@labeled.pk"));
    }

    #[test]
    fn labeled_phone_beats_bare_phone() {
        let extractor = Extractor::new();
        let text = "Office 021 345 6789. Phone: +92 42 3456 7890";
        let info = extractor.extract_contact_info(text);
        assert_eq!(info.phone.as_deref(), Some("+92 42 3456 7890"));
    }

    #[test]
    fn short_phone_candidates_are_rejected() {
        let extractor = Extractor::new();
        let info = extractor.extract_contact_info("Phone: 12345");
        assert_eq!(info.phone, None);
    }

    #[test]
    fn address_needs_keyword_and_length() {
        let extractor = Extractor::new();
        let info = extractor.extract_contact_info("Address: 12 Shahrah-e-Faisal Road\nOpen daily");
        assert_eq!(info.address.as_deref(), Some("12 Shahrah-e-Faisal Road"));

        let short = extractor.extract_contact_info("Mall");
        assert_eq!(short.address, None);
    }

    #[test]
    fn website_is_trimmed() {
        let extractor = Extractor::new();
        let info = extractor.extract_contact_info("Visit Website: https://arpatech.com.");
        assert_eq!(info.website.as_deref(), Some("https://arpatech.com"));
    }

    #[test]
    fn empty_text_yields_empty_info() {
        assert!(Extractor::new().extract_contact_info("").is_empty());
    }

    #[test]
    fn image_names_are_not_emails() {
        let extractor = Extractor::new();
        let emails = extractor.extract_emails("logo@2x.png contact@arpatech.com CONTACT@ARPATECH.COM");
        assert_eq!(emails.len(), 1);
        assert!(emails.contains("contact@arpatech.com"));
    }

    #[test]
    fn pk_phone_is_normalized() {
        let extractor = Extractor::new();
        assert_eq!(
            extractor.extract_pk_phone("Call us: +92 21 34567890 anytime").as_deref(),
            Some("+92-21-34567890")
        );
        assert_eq!(extractor.extract_pk_phone("no digits here"), None);
    }

    #[test]
    fn plausible_email_requires_dotted_domain() {
        assert!(is_plausible_email("info@example.com"));
        assert!(!is_plausible_email("info@localhost"));
        assert!(!is_plausible_email("not-an-email"));
    }

    #[test]
    fn every_pattern_is_compiled() {
        let extractor = Extractor::new();
        assert_eq!(extractor.email_patterns.len(), 4);
        assert_eq!(extractor.phone_patterns.len(), 8);
        assert_eq!(extractor.address_patterns.len(), 4);
        assert_eq!(extractor.website_patterns.len(), 4);
    }
}

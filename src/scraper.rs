use log::{debug, info, warn};
use scraper::{Html, Selector};
use url::Url;

use crate::extractor::Extractor;
use crate::fetcher::PageFetcher;
use crate::model::{BusinessRecord, ContactInfo};

const MAX_CONTACT_PAGES: usize = 2;
const ADDRESS_HINTS: [&str; 5] = ["address", "location", "contact", "office", "headquarters"];
const ADDRESS_WORDS: [&str; 7] = ["street", "road", "avenue", "pakistan", "karachi", "lahore", "islamabad"];

/// Revisits a business's own website to pick up fresher contact details.
pub struct SiteEnhancer {
    extractor: Extractor,
}

impl Default for SiteEnhancer {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteEnhancer {
    pub fn new() -> Self {
        SiteEnhancer { extractor: Extractor::new() }
    }

    pub fn with_extractor(extractor: Extractor) -> Self {
        SiteEnhancer { extractor }
    }

    /// Contact details found on the homepage, plus up to two same-domain
    /// contact/about pages when the homepage shows no email.
    pub fn scrape_site(&self, fetcher: &dyn PageFetcher, start_url: &str) -> ContactInfo {
        let base_url = match Url::parse(start_url) {
            Ok(u) => u,
            Err(_) => {
                warn!("Invalid URL: {}", start_url);
                return ContactInfo::default();
            }
        };

        let html = match fetcher.fetch(start_url) {
            Ok(html) => html,
            Err(e) => {
                debug!("Error scraping website {}: {}", start_url, e);
                return ContactInfo::default();
            }
        };

        let mut found = self.contacts_in_page(&html);
        if found.email.is_none() {
            for link in discover_contact_links(&html, &base_url) {
                info!("Visiting: {}", link);
                match fetcher.fetch(&link) {
                    Ok(page) => {
                        let more = self.contacts_in_page(&page);
                        fill_missing(&mut found, more);
                        if found.email.is_some() {
                            break;
                        }
                    }
                    Err(e) => warn!("Failed to fetch {}: {}", link, e),
                }
            }
        }
        found
    }

    /// Overwrites the record's email, phone and address with whatever its
    /// website shows. Returns whether anything was found.
    pub fn enhance(&self, fetcher: &dyn PageFetcher, record: &mut BusinessRecord) -> bool {
        let Some(website) = record.website.clone().filter(|w| w.starts_with("http")) else {
            return false;
        };
        info!("Enhancing data for {} from {}", record.name, website);

        let fresh = self.scrape_site(fetcher, &website);
        let changed = record.overwrite_contacts(&fresh);
        if changed {
            record.enhanced = true;
            info!("Enhanced {} with real contact data", record.name);
        }
        changed
    }

    fn contacts_in_page(&self, html: &str) -> ContactInfo {
        let document = Html::parse_document(html);
        let nodes: Vec<&str> = document
            .root_element()
            .text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();
        let text = nodes.join("\n");

        ContactInfo {
            email: self.extractor.extract_email(&text),
            phone: self.extractor.extract_pk_phone(&text),
            address: find_address_mention(&nodes),
            website: None,
        }
    }
}

/// First text node that mentions an address-like hint and reads like a street address.
pub fn find_address_mention(nodes: &[&str]) -> Option<String> {
    for hint in ADDRESS_HINTS {
        let hit = nodes.iter().find(|node| node.to_lowercase().contains(hint));
        if let Some(node) = hit {
            let lower = node.to_lowercase();
            if node.chars().count() > 10 && ADDRESS_WORDS.iter().any(|w| lower.contains(w)) {
                return Some(node.to_string());
            }
        }
    }
    None
}

fn fill_missing(found: &mut ContactInfo, more: ContactInfo) {
    if found.email.is_none() {
        found.email = more.email;
    }
    if found.phone.is_none() {
        found.phone = more.phone;
    }
    if found.address.is_none() {
        found.address = more.address;
    }
}

/// Same-domain links whose href mentions "contact" or "about", at most two.
pub fn discover_contact_links(html: &str, base_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let selector = match Selector::parse("a") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };
    let mut links = Vec::new();

    for element in document.select(&selector) {
        if let Some(href) = element.value().attr("href") {
            let href_lower = href.to_lowercase();
            if href_lower.contains("contact") || href_lower.contains("about") {
                if let Ok(joined_url) = base_url.join(href) {
                    if joined_url.domain().is_some() && joined_url.domain() == base_url.domain() {
                        links.push(joined_url.to_string());
                    }
                }
            }
        }
    }
    links.sort();
    links.dedup();
    links.into_iter().take(MAX_CONTACT_PAGES).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::{OfflineFetcher, StaticFetcher};
    use crate::model::Source;

    const HOME: &str = r#"
        <html><body>
          <h1>Folio3</h1>
          <p>Call +92 21 34329340 today</p>
          <p>Head office: Plot 23, Shahrah-e-Faisal Road, Karachi</p>
          <a href="/contact-us">Contact</a>
          <a href="https://facebook.com/contact">Elsewhere</a>
          <a href="/about">About</a>
          <a href="/careers">Careers</a>
        </body></html>"#;

    const CONTACT: &str = r#"<html><body><p>Write to sales@folio3.com</p></body></html>"#;

    #[test]
    fn homepage_then_contact_page() {
        let fetcher = StaticFetcher::new()
            .with_page("folio3.com/contact-us", CONTACT)
            .with_page("folio3.com/about", "<html></html>")
            .with_page("folio3.com", HOME);
        let info = SiteEnhancer::new().scrape_site(&fetcher, "https://folio3.com");

        assert_eq!(info.email.as_deref(), Some("sales@folio3.com"));
        assert_eq!(info.phone.as_deref(), Some("+92-21-34329340"));
        assert_eq!(info.address.as_deref(), Some("Head office: Plot 23, Shahrah-e-Faisal Road, Karachi"));
        assert_eq!(fetcher.requested().len(), 3);
    }

    #[test]
    fn contact_links_stay_on_domain() {
        let base = Url::parse("https://folio3.com").unwrap();
        let links = discover_contact_links(HOME, &base);
        assert_eq!(links, vec!["https://folio3.com/about", "https://folio3.com/contact-us"]);
    }

    #[test]
    fn enhance_overwrites_and_marks_record() {
        let fetcher = StaticFetcher::new().with_page("netsol.com", "<p>Email: careers@netsol.com</p>");
        let mut record = BusinessRecord::new("Netsol", Source::GoogleMaps);
        record.email = Some("info@netsol.com".into());
        record.website = Some("https://netsol.com".into());

        assert!(SiteEnhancer::new().enhance(&fetcher, &mut record));
        assert_eq!(record.email.as_deref(), Some("careers@netsol.com"));
        assert_eq!(record.source_label(), "google_maps_enhanced");
    }

    #[test]
    fn unreachable_or_missing_site_leaves_record_alone() {
        let mut record = BusinessRecord::new("Netsol", Source::GoogleMaps);
        assert!(!SiteEnhancer::new().enhance(&OfflineFetcher, &mut record));

        record.website = Some("https://netsol.com".into());
        let before = record.clone();
        assert!(!SiteEnhancer::new().enhance(&OfflineFetcher, &mut record));
        assert_eq!(record, before);
    }
}

use std::collections::HashSet;

use log::{debug, info, warn};
use scraper::{ElementRef, Html};

use crate::extractor::Extractor;
use crate::fetcher::PageFetcher;
use crate::model::{BusinessRecord, Source};
use crate::source::{self, ListingSource, SourceOutcome, SourceRequest};
use crate::synth;

const LISTING_SELECTORS: [&str; 5] = [
    "div[data-result-index]",
    "div.section-result",
    "div.section-result-content",
    "h3.section-result-title",
    "div.fontHeadlineSmall",
];
const NAME_SELECTORS: [&str; 3] = ["h3", "div.fontHeadlineSmall", "div.section-result-title"];
const ADDRESS_SELECTORS: [&str; 3] = ["div.fontBodyMedium", "span.fontBodyMedium", "div.section-result-location"];
const NAME_SUFFIXES: [&str; 4] = [" - Google Maps", " - Home", " | Official Site", " - Pakistan"];
const MAX_NAME_CHARS: usize = 50;

/// Map-style place listings. Several URL shapes are tried in turn until one yields records.
#[derive(Debug, Default, Clone, Copy)]
pub struct MapsListings;

impl MapsListings {
    pub fn candidate_urls(request: &SourceRequest) -> Vec<String> {
        let query = format!("{} in {} Pakistan", request.category, request.city).replace(' ', "+");
        vec![
            format!("https://www.google.com/maps/search/{}", query),
            format!("https://www.google.com/maps/place/{}", query),
            format!("https://www.google.com/search?q={}+site:maps.google.com", query),
        ]
    }

    fn listing_name(element: &ElementRef<'_>) -> Option<String> {
        let raw = source::first_text(element, &NAME_SELECTORS).or_else(|| {
            let text = source::text_of(element);
            let first_line = text.lines().next()?.trim().to_string();
            Some(first_line.chars().take(MAX_NAME_CHARS).collect())
        })?;
        let first_line = raw.lines().next().unwrap_or_default();
        let name = source::strip_suffixes(first_line, &NAME_SUFFIXES);
        (name.chars().count() >= 3).then_some(name)
    }

    fn parse_listing(
        &self,
        element: &ElementRef<'_>,
        extractor: &Extractor,
        request: &SourceRequest,
    ) -> Option<BusinessRecord> {
        let name = MapsListings::listing_name(element)?;
        let mut record = BusinessRecord::new(name, Source::GoogleMaps);

        let text = source::text_of(element);
        let info = extractor.extract_contact_info(&text);

        record.address = source::first_text(element, &ADDRESS_SELECTORS)
            .or(info.address)
            .or_else(|| Some(synth::city_address(&request.city)));
        record.phone = info
            .phone
            .or_else(|| extractor.extract_pk_phone(&text))
            .or_else(|| Some(synth::phone_for_city(&request.city)));
        record.email = info.email.or_else(|| Some(synth::email_from_name(&record.name)));
        record.website = source::first_attr(element, "a", "href")
            .and_then(|href| {
                if href.starts_with("http") {
                    Some(href)
                } else if href.starts_with('/') {
                    Some(format!("https://www.google.com{}", href))
                } else {
                    None
                }
            })
            .or_else(|| Some(format!("https://{}", synth::generate_domain(&request.category, &request.city, 0))));
        record.business_type = Some(request.category.clone());
        record.category = Some(request.category.clone());
        record.city = Some(request.city.clone());
        Some(record)
    }

    fn parse_page(&self, html: &str, extractor: &Extractor, request: &SourceRequest) -> Vec<BusinessRecord> {
        let document = Html::parse_document(html);
        let elements = source::first_matching(&document, &LISTING_SELECTORS);
        debug!("Found {} potential business elements", elements.len());

        let mut seen = HashSet::new();
        let mut records = Vec::new();
        for element in &elements {
            if records.len() >= request.count {
                break;
            }
            if let Some(record) = self.parse_listing(element, extractor, request) {
                if seen.insert(record.normalized_name()) {
                    records.push(record);
                }
            }
        }
        records
    }
}

impl ListingSource for MapsListings {
    fn name(&self) -> &str {
        "google_maps"
    }

    fn budget(&self, target: usize) -> usize {
        (target / 2).min(50)
    }

    fn scrape(&self, fetcher: &dyn PageFetcher, extractor: &Extractor, request: &SourceRequest) -> SourceOutcome {
        let mut last_error = None;
        let mut any_page = false;

        for url in MapsListings::candidate_urls(request) {
            info!("Trying maps URL: {}", url);
            match fetcher.fetch(&url) {
                Ok(html) => {
                    any_page = true;
                    let records = self.parse_page(&html, extractor, request);
                    if !records.is_empty() {
                        info!("Successfully scraped {} businesses from maps listings", records.len());
                        return SourceOutcome::Found(records);
                    }
                }
                Err(e) => {
                    debug!("Maps URL {} failed: {}", url, e);
                    last_error = Some(e.to_string());
                }
            }
        }

        match (any_page, last_error) {
            (false, Some(reason)) => {
                warn!("Maps listings unavailable: {}", reason);
                SourceOutcome::Unavailable(reason)
            }
            _ => SourceOutcome::Empty,
        }
    }
}

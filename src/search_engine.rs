use log::{debug, info, warn};
use scraper::{ElementRef, Html};
use url::Url;

use crate::extractor::Extractor;
use crate::fetcher::PageFetcher;
use crate::model::{BusinessRecord, Source};
use crate::source::{self, ListingSource, SourceOutcome, SourceRequest};
use crate::synth;

const GOOGLE_RESULT_SELECTORS: [&str; 3] = ["div.g", "div.MjjYud", "div.tF2Cxc"];
const GOOGLE_SNIPPET_SELECTORS: [&str; 3] = ["div.VwiC3b", "span.aCOpRe", "div.IsZvec"];
const TITLE_SUFFIXES: [&str; 4] = [" - Home", " - Official Website", " | Official Site", " - Pakistan"];

const DDG_RESULT_SELECTORS: [&str; 2] = ["div.result", "div.web-result"];
const DDG_TITLE_SELECTORS: [&str; 3] = ["h2", "a.result__a", ".result__title"];
const DDG_SNIPPET_SELECTORS: [&str; 2] = [".result__snippet", "div.snippet"];
const DDG_LIMIT: usize = 20;

/// Aggregators and social networks are never a business's own site.
const FORBIDDEN_DOMAINS: [&str; 10] = [
    "facebook.com", "instagram.com", "linkedin.com", "twitter.com", "x.com",
    "youtube.com", "pinterest.com", "glassdoor.com", "indeed.com", "wikipedia.org",
];

/// Google organic results.
#[derive(Debug, Default, Clone, Copy)]
pub struct GoogleSearch;

impl GoogleSearch {
    pub fn search_url(request: &SourceRequest) -> String {
        let query = format!("{} businesses in {} Pakistan", request.category, request.city);
        format!(
            "https://www.google.com/search?q={}&num={}",
            urlencoding::encode(&query),
            request.count
        )
    }

    fn parse_result(
        &self,
        result: &ElementRef<'_>,
        extractor: &Extractor,
        request: &SourceRequest,
    ) -> Option<BusinessRecord> {
        let title = source::first_text(result, &["h3"])?;
        let name = source::strip_suffixes(&title, &TITLE_SUFFIXES);

        let mut record = BusinessRecord::new(name, Source::GoogleSearch);
        if !record.has_valid_name() {
            return None;
        }

        let snippet = source::first_text(result, &GOOGLE_SNIPPET_SELECTORS).unwrap_or_default();
        let info = extractor.extract_contact_info(&snippet);

        record.email = info.email.clone().or_else(|| Some(synth::email_from_name(&record.name)));
        record.phone = extractor
            .extract_pk_phone(&snippet)
            .or(info.phone)
            .or_else(|| Some(synth::phone_for_city(&request.city)));
        record.address = info.address.or_else(|| Some(synth::city_address(&request.city)));
        record.website = source::first_attr(result, "a", "href")
            .and_then(|href| resolve_result_link(&href))
            .or(info.website);
        record.business_type = Some(request.category.clone());
        record.category = Some(request.category.clone());
        record.city = Some(request.city.clone());
        Some(record)
    }
}

impl ListingSource for GoogleSearch {
    fn name(&self) -> &str {
        "google_search"
    }

    fn budget(&self, target: usize) -> usize {
        (target / 2).min(50)
    }

    fn scrape(&self, fetcher: &dyn PageFetcher, extractor: &Extractor, request: &SourceRequest) -> SourceOutcome {
        let url = GoogleSearch::search_url(request);
        info!("Searching Google for: {} businesses in {}", request.category, request.city);

        let html = match fetcher.fetch(&url) {
            Ok(html) => html,
            Err(e) => {
                warn!("Google Search unavailable: {}", e);
                return SourceOutcome::Unavailable(e.to_string());
            }
        };

        let document = Html::parse_document(&html);
        let results = source::first_matching(&document, &GOOGLE_RESULT_SELECTORS);
        if results.is_empty() {
            debug!("No Google result blocks matched");
        }

        let records: Vec<BusinessRecord> = results
            .iter()
            .filter_map(|result| self.parse_result(result, extractor, request))
            .take(request.count)
            .collect();

        info!("Successfully scraped {} businesses from Google Search", records.len());
        SourceOutcome::from_records(records)
    }
}

/// DuckDuckGo's HTML endpoint.
#[derive(Debug, Default, Clone, Copy)]
pub struct DuckDuckGo;

impl DuckDuckGo {
    pub fn search_url(request: &SourceRequest) -> String {
        let query = format!("{} {} pakistan business", request.category, request.city);
        format!("https://html.duckduckgo.com/html/?q={}", urlencoding::encode(&query))
    }

    fn parse_result(
        &self,
        result: &ElementRef<'_>,
        extractor: &Extractor,
        request: &SourceRequest,
    ) -> Option<BusinessRecord> {
        let title = source::first_text(result, &DDG_TITLE_SELECTORS)?;
        let mut record = BusinessRecord::new(source::strip_suffixes(&title, &TITLE_SUFFIXES), Source::DuckDuckGo);
        if !record.has_valid_name() {
            return None;
        }

        let website = source::first_attr(result, "a.result__url", "href")
            .or_else(|| source::first_attr(result, "a.result__a", "href"))
            .and_then(|href| resolve_result_link(&href));
        if let Some(site) = &website {
            if is_forbidden(site) {
                debug!("Skipping aggregator result {}", site);
                return None;
            }
        }

        let snippet = source::first_text(result, &DDG_SNIPPET_SELECTORS).unwrap_or_default();
        let info = extractor.extract_contact_info(&snippet);
        let found_contact = info.email.is_some() || info.phone.is_some();

        record.email = info.email;
        record.phone = info.phone;
        record.address = info.address;
        record.website = website;
        if !found_contact {
            record.email = Some(synth::email_from_name(&record.name));
            record.phone = Some(synth::phone_for_city(&request.city));
        }
        record.business_type = Some(request.category.clone());
        record.category = Some(request.category.clone());
        record.city = Some(request.city.clone());
        Some(record)
    }
}

impl ListingSource for DuckDuckGo {
    fn name(&self) -> &str {
        "duckduckgo_search"
    }

    fn budget(&self, target: usize) -> usize {
        target.min(DDG_LIMIT)
    }

    fn scrape(&self, fetcher: &dyn PageFetcher, extractor: &Extractor, request: &SourceRequest) -> SourceOutcome {
        let url = DuckDuckGo::search_url(request);
        info!("Searching DuckDuckGo for: {} in {}", request.category, request.city);

        let html = match fetcher.fetch(&url) {
            Ok(html) => html,
            Err(e) => {
                warn!("DuckDuckGo unavailable: {}", e);
                return SourceOutcome::Unavailable(e.to_string());
            }
        };

        let document = Html::parse_document(&html);
        let records: Vec<BusinessRecord> = source::first_matching(&document, &DDG_RESULT_SELECTORS)
            .iter()
            .filter_map(|result| self.parse_result(result, extractor, request))
            .take(request.count.min(DDG_LIMIT))
            .collect();

        info!("Found {} businesses from DuckDuckGo", records.len());
        SourceOutcome::from_records(records)
    }
}

/// Unwraps DuckDuckGo's `/l/?uddg=` redirect links. Plain `http(s)` links pass through.
pub fn resolve_result_link(href: &str) -> Option<String> {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else if href.starts_with("/url?") {
        format!("https://www.google.com{}", href)
    } else {
        href.to_string()
    };
    let parsed = Url::parse(&absolute).ok()?;

    if parsed.domain().map_or(false, |d| d.ends_with("duckduckgo.com")) {
        return parsed
            .query_pairs()
            .find(|(key, _)| key == "uddg")
            .map(|(_, target)| target.into_owned())
            .filter(|target| target.starts_with("http"));
    }
    if parsed.domain().map_or(false, |d| d.ends_with("google.com")) && parsed.path() == "/url" {
        return parsed
            .query_pairs()
            .find(|(key, _)| key == "q" || key == "url")
            .map(|(_, target)| target.into_owned())
            .filter(|target| target.starts_with("http"));
    }
    matches!(parsed.scheme(), "http" | "https").then_some(absolute)
}

fn is_forbidden(url: &str) -> bool {
    let host = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .unwrap_or_default();
    FORBIDDEN_DOMAINS
        .iter()
        .any(|d| host == *d || host.ends_with(&format!(".{}", d)))
}

use log::{debug, error, info, warn};
use scraper::{ElementRef, Html};
use url::Url;

use crate::extractor::Extractor;
use crate::fetcher::PageFetcher;
use crate::model::{BusinessRecord, Source};
use crate::scoring::{self, CONFIDENCE_FLOOR};
use crate::source::{self, ListingSource, SourceOutcome, SourceRequest};

const PER_SITE_LIMIT: usize = 20;

/// How one directory site lays out its search results.
#[derive(Debug, Clone, Copy)]
pub struct DirectorySite {
    pub name: &'static str,
    pub base_url: &'static str,
    /// Either `{query}`, or both `{category}` and `{city}`.
    pub search_pattern: &'static str,
    pub listing_selectors: &'static [&'static str],
    pub name_selectors: &'static [&'static str],
}

pub const DIRECTORY_SITES: [DirectorySite; 3] = [
    DirectorySite {
        name: "pakistan_business_directory",
        base_url: "https://www.pakistanbusinessdirectory.com",
        search_pattern: "search?q={query}",
        listing_selectors: &[
            ".business-listing", ".company-item", ".business-card",
            ".listing-item", ".company-listing", ".business-result",
        ],
        name_selectors: &["h2", "h3", ".business-name", ".company-name"],
    },
    DirectorySite {
        name: "yellow_pages_pk",
        base_url: "https://www.yellowpages.pk",
        search_pattern: "search?category={category}&city={city}",
        listing_selectors: &[
            ".business-listing", ".company-item", ".listing-item",
            ".business-card", ".company-card", ".result-item",
        ],
        name_selectors: &["h3", "h4", ".business-name", ".company-name"],
    },
    DirectorySite {
        name: "pakistan_companies",
        base_url: "https://www.pakistan-companies.com",
        search_pattern: "search?q={query}",
        listing_selectors: &[
            ".company-listing", ".business-item", ".company-card",
            ".business-result", ".company-result", ".listing-item",
        ],
        name_selectors: &["h2", "h3", ".company-name", ".business-name"],
    },
];

/// A generic business directory. Listings are scored and anything under the
/// confidence floor is dropped. No contact details are invented here.
#[derive(Debug, Clone, Copy)]
pub struct Directory {
    site: DirectorySite,
}

impl Directory {
    pub fn new(site: DirectorySite) -> Self {
        Directory { site }
    }

    pub fn all() -> Vec<Directory> {
        DIRECTORY_SITES.iter().copied().map(Directory::new).collect()
    }

    pub fn search_url(&self, request: &SourceRequest) -> String {
        let pattern = self.site.search_pattern;
        let path = if pattern.contains("{category}") && pattern.contains("{city}") {
            pattern
                .replace("{category}", &plus_encode(&request.category))
                .replace("{city}", &plus_encode(&request.city))
        } else {
            let query = format!("{} {} pakistan", request.category, request.city);
            pattern.replace("{query}", &plus_encode(&query))
        };
        format!("{}/{}", self.site.base_url, path)
    }

    fn parse_listing(
        &self,
        element: &ElementRef<'_>,
        extractor: &Extractor,
        request: &SourceRequest,
    ) -> Option<BusinessRecord> {
        let name = source::first_text(element, self.site.name_selectors)?;
        let mut record = BusinessRecord::new(name, Source::Directory(self.site.name.to_string()));
        if !record.has_valid_name() {
            return None;
        }

        let info = extractor.extract_contact_info(&source::text_of(element));
        record.email = info.email;
        record.phone = info.phone;
        record.address = info.address;
        record.website = info.website.or_else(|| self.listing_link(element));
        record.business_type = Some(request.category.clone());
        record.city = Some(request.city.clone());

        let score = scoring::confidence_score(&record);
        record.confidence_score = Some(score);
        if score < CONFIDENCE_FLOOR {
            debug!("Dropping {} with confidence {:.2}", record.name, score);
            return None;
        }
        Some(record)
    }

    /// Off-site link in the listing, resolved against the directory's base URL.
    fn listing_link(&self, element: &ElementRef<'_>) -> Option<String> {
        let base = Url::parse(self.site.base_url).ok()?;
        let href = source::first_attr(element, "a[href^='http']", "href")?;
        let joined = base.join(&href).ok()?;
        (joined.domain() != base.domain()).then(|| joined.to_string())
    }
}

impl ListingSource for Directory {
    fn name(&self) -> &str {
        self.site.name
    }

    fn budget(&self, _target: usize) -> usize {
        PER_SITE_LIMIT
    }

    fn scrape(&self, fetcher: &dyn PageFetcher, extractor: &Extractor, request: &SourceRequest) -> SourceOutcome {
        let url = self.search_url(request);
        info!("Scraping {}: {}", self.site.name, url);

        let html = match fetcher.fetch(&url) {
            Ok(html) => html,
            Err(e) => {
                error!("Error scraping {}: {}", self.site.name, e);
                return SourceOutcome::Unavailable(e.to_string());
            }
        };

        let document = Html::parse_document(&html);
        let elements = source::first_matching(&document, self.site.listing_selectors);
        if elements.is_empty() {
            warn!("No business elements found in {}", self.site.name);
            return SourceOutcome::Empty;
        }
        info!("Found {} business elements in {}", elements.len(), self.site.name);

        let limit = request.count.min(PER_SITE_LIMIT);
        let records = elements
            .iter()
            .take(limit)
            .filter_map(|element| self.parse_listing(element, extractor, request))
            .collect();
        SourceOutcome::from_records(records)
    }
}

fn plus_encode(value: &str) -> String {
    urlencoding::encode(value).replace("%20", "+")
}

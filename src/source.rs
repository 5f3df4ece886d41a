use std::fmt;

use scraper::{ElementRef, Html, Selector};

use crate::extractor::Extractor;
use crate::fetcher::PageFetcher;
use crate::model::BusinessRecord;

/// What a listing source is asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRequest {
    pub category: String,
    pub city: String,
    /// Upper bound on records this source should return.
    pub count: usize,
}

impl SourceRequest {
    pub fn new(category: impl Into<String>, city: impl Into<String>, count: usize) -> Self {
        SourceRequest { category: category.into(), city: city.into(), count }
    }
}

/// Explicit result of scraping one source.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceOutcome {
    Found(Vec<BusinessRecord>),
    /// The page loaded but held no usable listings.
    Empty,
    /// The page could not be fetched.
    Unavailable(String),
}

impl SourceOutcome {
    /// `Found` for a non-empty list, `Empty` otherwise.
    pub fn from_records(records: Vec<BusinessRecord>) -> Self {
        if records.is_empty() {
            SourceOutcome::Empty
        } else {
            SourceOutcome::Found(records)
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SourceOutcome::Found(records) => records.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_records(self) -> Vec<BusinessRecord> {
        match self {
            SourceOutcome::Found(records) => records,
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for SourceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceOutcome::Found(records) => write!(f, "found {}", records.len()),
            SourceOutcome::Empty => f.write_str("empty"),
            SourceOutcome::Unavailable(reason) => write!(f, "unavailable ({})", reason),
        }
    }
}

/// One place business listings can be scraped from. Implementations must not
/// panic on odd markup; a broken page yields `Empty`.
pub trait ListingSource: Send + Sync {
    fn name(&self) -> &str;

    /// How many records to ask this source for, given the overall target.
    fn budget(&self, target: usize) -> usize {
        target
    }

    fn scrape(&self, fetcher: &dyn PageFetcher, extractor: &Extractor, request: &SourceRequest) -> SourceOutcome;
}

pub fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// Elements matched by the first selector in `candidates` that matches anything.
pub fn first_matching<'a>(document: &'a Html, candidates: &[&str]) -> Vec<ElementRef<'a>> {
    for css in candidates {
        if let Some(sel) = selector(css) {
            let found: Vec<_> = document.select(&sel).collect();
            if !found.is_empty() {
                return found;
            }
        }
    }
    Vec::new()
}

/// Trimmed text of the first descendant matching one of `candidates`, tried in order.
pub fn first_text(element: &ElementRef<'_>, candidates: &[&str]) -> Option<String> {
    candidates.iter().find_map(|css| {
        let sel = selector(css)?;
        let found = element.select(&sel).next()?;
        let text = collapse(&text_of(&found));
        (!text.is_empty()).then_some(text)
    })
}

pub fn first_attr(element: &ElementRef<'_>, css: &str, attr: &str) -> Option<String> {
    let sel = selector(css)?;
    element
        .select(&sel)
        .find_map(|e| e.value().attr(attr))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// All text nodes of an element, one per line.
pub fn text_of(element: &ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn strip_suffixes(name: &str, suffixes: &[&str]) -> String {
    let mut cleaned = name.to_string();
    for suffix in suffixes {
        cleaned = cleaned.replace(suffix, "");
    }
    cleaned.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <div class="card"><h3>  First   Co </h3><a href="https://first.pk">x</a></div>
          <div class="card"><h4>Second Co</h4></div>
          <div class="other">ignored</div>
        </body></html>"#;

    #[test]
    fn first_matching_stops_at_first_hit() {
        let doc = Html::parse_document(PAGE);
        assert_eq!(first_matching(&doc, &[".missing", ".card", ".other"]).len(), 2);
        assert!(first_matching(&doc, &[".missing", "!!bad"]).is_empty());
    }

    #[test]
    fn first_text_tries_candidates_in_order() {
        let doc = Html::parse_document(PAGE);
        let cards = first_matching(&doc, &[".card"]);
        assert_eq!(first_text(&cards[0], &["h3", "h4"]).as_deref(), Some("First Co"));
        assert_eq!(first_text(&cards[1], &["h3", "h4"]).as_deref(), Some("Second Co"));
        assert_eq!(first_attr(&cards[0], "a", "href").as_deref(), Some("https://first.pk"));
        assert_eq!(first_attr(&cards[1], "a", "href"), None);
    }

    #[test]
    fn outcome_helpers() {
        assert_eq!(SourceOutcome::from_records(Vec::new()), SourceOutcome::Empty);
        assert_eq!(SourceOutcome::Unavailable("offline".into()).len(), 0);
        assert_eq!(SourceOutcome::Unavailable("offline".into()).to_string(), "unavailable (offline)");
    }

    #[test]
    fn suffixes_are_stripped() {
        assert_eq!(strip_suffixes("Arpatech - Official Website", &[" - Official Website"]), "Arpatech");
    }
}

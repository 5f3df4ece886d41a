use std::time::Duration;

use lead_scraper_lib::collector::default_sources;
use lead_scraper_lib::email_validation::{MxLookup, MxStatus};
use lead_scraper_lib::{
    BusinessRecord, CollectionMode, Collector, CollectorOptions, EmailValidator, Extractor, ListingSource,
    OfflineFetcher, PageFetcher, Source, SourceOutcome, SourceRequest, StaticFetcher, VerifiedDataset,
};

fn options() -> CollectorOptions {
    CollectorOptions { enhance_delay: Duration::ZERO, ..CollectorOptions::default() }
}

fn offline_collector() -> Collector {
    Collector::new(Box::new(OfflineFetcher), EmailValidator::offline(), options())
}

struct Unreachable;

impl ListingSource for Unreachable {
    fn name(&self) -> &str {
        "unreachable"
    }

    fn scrape(&self, _: &dyn PageFetcher, _: &Extractor, _: &SourceRequest) -> SourceOutcome {
        SourceOutcome::Unavailable("connection refused".to_string())
    }
}

struct Healthy;

impl ListingSource for Healthy {
    fn name(&self) -> &str {
        "healthy"
    }

    fn scrape(&self, _: &dyn PageFetcher, _: &Extractor, request: &SourceRequest) -> SourceOutcome {
        let records = ["Folio3", "Arbisoft", "Systems Limited"]
            .iter()
            .take(request.count)
            .map(|name| {
                let mut record = BusinessRecord::new(*name, Source::Directory("healthy".to_string()));
                record.email = Some(format!("info@{}.com", name.to_lowercase().replace(' ', "")));
                record.city = Some(request.city.clone());
                record
            })
            .collect();
        SourceOutcome::from_records(records)
    }
}

struct Broken;

impl ListingSource for Broken {
    fn name(&self) -> &str {
        "broken"
    }

    fn scrape(&self, _: &dyn PageFetcher, _: &Extractor, _: &SourceRequest) -> SourceOutcome {
        panic!("selector table corrupted");
    }
}

struct NoMailServers;

impl MxLookup for NoMailServers {
    fn lookup(&self, _domain: &str) -> MxStatus {
        MxStatus::Missing
    }
}

#[test]
fn offline_collection_returns_verified_fallback() {
    let mut collector = offline_collector();
    let records = collector.collect("Technology", "Karachi", 3);

    let expected = VerifiedDataset::new().fallback("Technology", "Karachi", 3);
    assert_eq!(records.len(), 3);
    assert_eq!(records, expected);
    assert!(records.iter().all(|r| r.source == Source::VerifiedFallback && r.is_verified()));
    assert!(collector.last_stats().unwrap().fallback_used);
}

#[test]
fn single_healthcare_lead_in_lahore() {
    let mut collector = offline_collector();
    let records = collector.collect("Healthcare", "Lahore", 1);

    assert_eq!(records.len(), 1);
    let lead = &records[0];
    assert_eq!(lead.name, "Shaukat Khanum Hospital");
    assert_eq!(lead.email.as_deref(), Some("info@shaukatkhanum.org.pk"));
    assert_eq!(lead.source, Source::VerifiedFallback);
    assert_eq!(lead.source_label(), "verified_database_fallback");
    assert!(lead.is_verified());
}

#[test]
fn results_never_exceed_the_target() {
    let mut collector = offline_collector();
    let dataset = VerifiedDataset::new();
    for category in dataset.categories() {
        for city in ["Karachi", "Lahore", "Islamabad"] {
            for target in [1, 2, 5] {
                assert!(collector.collect(category, city, target).len() <= target);
            }
        }
    }
}

#[test]
fn unknown_category_and_city_give_empty_list() {
    let mut collector = offline_collector();
    assert!(collector.collect("Space Mining", "Karachi", 5).is_empty());
    assert!(collector.collect("Technology", "Atlantis", 5).is_empty());
}

#[test]
fn healthy_source_survives_an_unavailable_one() {
    let sources = vec![Box::new(Unreachable) as Box<dyn ListingSource>, Box::new(Healthy)];
    let mut collector = offline_collector().with_sources(sources);
    let records = collector.collect("Technology", "Karachi", 2);

    let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Folio3", "Arbisoft"]);

    let stats = collector.last_stats().unwrap();
    assert!(!stats.fallback_used);
    assert_eq!(stats.source_outcomes[0].source, "unreachable");
    assert!(stats.source_outcomes[0].outcome.starts_with("unavailable"));
    assert_eq!(stats.source_outcomes[1].outcome, "found 2");
}

#[test]
fn panicking_source_degrades_to_verified_data() {
    let sources = vec![Box::new(Healthy) as Box<dyn ListingSource>, Box::new(Broken)];
    let mut collector = offline_collector().with_sources(sources);
    assert!(collector.try_collect("Healthcare", "Lahore", 1).is_err());

    let records = collector.collect("Healthcare", "Lahore", 1);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "Shaukat Khanum Hospital");
    assert_eq!(records[0].source, Source::VerifiedFallback);
}

#[test]
fn default_sources_on_empty_pages_fall_back() {
    let fetcher = StaticFetcher::new().with_page("", "<html><body><p>Nothing here</p></body></html>");
    let mut collector = Collector::new(Box::new(fetcher), EmailValidator::offline(), options());
    assert_eq!(collector.source_names().len(), default_sources().len());

    let records = collector.collect("Healthcare", "Lahore", 1);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].source, Source::VerifiedFallback);
}

#[test]
fn verified_mode_reads_the_dataset_directly() {
    let opts = CollectorOptions { mode: CollectionMode::Verified, ..options() };
    let mut collector = Collector::new(Box::new(OfflineFetcher), EmailValidator::offline(), opts);

    let records = collector.collect("Finance", "Karachi", 10);
    assert!(!records.is_empty());
    assert!(records.iter().all(|r| r.source == Source::VerifiedDatabase));
    assert_eq!(collector.collect("Technology", "Karachi", 1).len(), 1);
}

#[test]
fn email_syntax_decides_and_dns_only_informs() {
    let validator = EmailValidator::offline();
    assert!(validator.validate("info@example.com"));
    assert!(!validator.validate("not-an-email"));

    let without_mx = EmailValidator::new(Box::new(NoMailServers));
    assert!(without_mx.validate("owner@no-mail-domain.pk"));
    assert!(!without_mx.validate("owner@@no-mail-domain.pk"));
}

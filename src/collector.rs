use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::str::FromStr;
use std::sync::{mpsc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use log::{error, info, warn};
use serde::Serialize;

use crate::config::Config;
use crate::dedup::dedup;
use crate::delay_manager;
use crate::directory::Directory;
use crate::email_validation::EmailValidator;
use crate::error::LeadError;
use crate::extractor::Extractor;
use crate::fetcher::PageFetcher;
use crate::generator::LeadGenerator;
use crate::maps::MapsListings;
use crate::model::BusinessRecord;
use crate::scraper::SiteEnhancer;
use crate::search_engine::{DuckDuckGo, GoogleSearch};
use crate::source::{ListingSource, SourceOutcome, SourceRequest};
use crate::verified::VerifiedDataset;

/// Where the collector gets its records from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionMode {
    /// Scrape the listing sources, topping up from the verified dataset.
    #[default]
    Live,
    /// Serve the verified dataset directly.
    Verified,
    /// Generated records, checked against the lead history.
    Generated,
}

impl FromStr for CollectionMode {
    type Err = LeadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "live" | "scrape" => Ok(CollectionMode::Live),
            "verified" => Ok(CollectionMode::Verified),
            "generated" | "ai" => Ok(CollectionMode::Generated),
            other => Err(LeadError::Config(format!("unknown collection mode '{}'", other))),
        }
    }
}

impl fmt::Display for CollectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CollectionMode::Live => "live",
            CollectionMode::Verified => "verified",
            CollectionMode::Generated => "generated",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct CollectorOptions {
    pub mode: CollectionMode,
    /// Revisit business websites for fresher contact details.
    pub enhance: bool,
    /// Run sources on a worker pool instead of one after another.
    pub parallel: bool,
    pub workers: usize,
    /// Pause after each website enhancement.
    pub enhance_delay: Duration,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        CollectorOptions {
            mode: CollectionMode::Live,
            enhance: true,
            parallel: true,
            workers: 3,
            enhance_delay: Duration::from_secs(1),
        }
    }
}

impl CollectorOptions {
    pub fn from_config(config: &Config) -> Self {
        CollectorOptions {
            workers: config.workers.max(1),
            enhance_delay: config.enhance_delay,
            ..CollectorOptions::default()
        }
    }

    fn worker_count(&self) -> usize {
        if self.parallel {
            self.workers.max(1)
        } else {
            1
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceReport {
    pub source: String,
    pub outcome: String,
}

/// Bookkeeping for the most recent collection run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CollectionStats {
    pub mode: CollectionMode,
    pub requested: usize,
    pub total: usize,
    pub per_source: BTreeMap<String, usize>,
    pub duplicates_removed: usize,
    pub filtered_out: usize,
    pub invalid_emails: usize,
    pub enhanced: usize,
    pub fallback_used: bool,
    pub source_outcomes: Vec<SourceReport>,
}

impl CollectionStats {
    fn new(mode: CollectionMode, requested: usize) -> Self {
        CollectionStats { mode, requested, ..CollectionStats::default() }
    }

    fn count_sources(&mut self, records: &[BusinessRecord]) {
        self.per_source.clear();
        for record in records {
            *self.per_source.entry(record.source_label()).or_insert(0) += 1;
        }
        self.total = records.len();
    }

    fn log(&self) {
        info!("Collection statistics ({} mode):", self.mode);
        info!("  Requested: {}", self.requested);
        info!("  Total collected: {}", self.total);
        for (source, count) in &self.per_source {
            info!("  {}: {}", source, count);
        }
        for report in &self.source_outcomes {
            info!("  {} -> {}", report.source, report.outcome);
        }
        if self.duplicates_removed > 0 {
            info!("  Duplicates removed: {}", self.duplicates_removed);
        }
        if self.filtered_out > 0 {
            info!("  Irrelevant records dropped: {}", self.filtered_out);
        }
        if self.invalid_emails > 0 {
            info!("  Invalid emails dropped: {}", self.invalid_emails);
        }
        if self.enhanced > 0 {
            info!("  Enhanced from websites: {}", self.enhanced);
        }
        if self.fallback_used {
            warn!("  Verified dataset fallback was used");
        }
    }
}

struct SourceJob<'a> {
    source: &'a dyn ListingSource,
    request: SourceRequest,
}

/// Runs every job on `workers` threads and returns the outcomes in job order.
/// A worker that panics turns the whole run into `WorkerPanicked`.
fn run_sources(
    fetcher: &dyn PageFetcher,
    extractor: &Extractor,
    jobs: Vec<SourceJob<'_>>,
    workers: usize,
) -> Result<Vec<SourceOutcome>, LeadError> {
    let total = jobs.len();
    let names: Vec<String> = jobs.iter().map(|j| j.source.name().to_string()).collect();
    let queue = Mutex::new(jobs.into_iter().enumerate().collect::<VecDeque<_>>());
    let (tx, rx) = mpsc::channel::<(usize, SourceOutcome)>();

    let panicked = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers.clamp(1, total.max(1)))
            .map(|_| {
                let tx = tx.clone();
                let queue = &queue;
                scope.spawn(move || loop {
                    let next = queue.lock().unwrap_or_else(PoisonError::into_inner).pop_front();
                    let Some((index, job)) = next else {
                        break;
                    };
                    info!("Scraping {}...", job.source.name());
                    let outcome = job.source.scrape(fetcher, extractor, &job.request);
                    if tx.send((index, outcome)).is_err() {
                        break;
                    }
                })
            })
            .collect();
        drop(tx);
        handles.into_iter().map(|h| h.join()).filter(Result::is_err).count()
    });

    let mut slots: Vec<Option<SourceOutcome>> = (0..total).map(|_| None).collect();
    for (index, outcome) in rx {
        if let Some(slot) = slots.get_mut(index) {
            *slot = Some(outcome);
        }
    }

    if panicked > 0 {
        let missing: Vec<&str> = names
            .iter()
            .zip(&slots)
            .filter(|(_, slot)| slot.is_none())
            .map(|(name, _)| name.as_str())
            .collect();
        return Err(LeadError::WorkerPanicked(missing.join(", ")));
    }

    Ok(slots.into_iter().map(|s| s.unwrap_or(SourceOutcome::Empty)).collect())
}

/// Valid name, and a record that carries a city must mention the requested one.
fn is_relevant(record: &BusinessRecord, city: &str) -> bool {
    if !record.has_valid_name() {
        return false;
    }
    match record.city.as_deref() {
        Some(record_city) if !city.trim().is_empty() => {
            record_city.to_lowercase().contains(&city.trim().to_lowercase())
        }
        _ => true,
    }
}

/// Runs the collection pipeline: sources, fallback, dedup, enhancement,
/// validation and truncation.
pub struct Collector {
    fetcher: Box<dyn PageFetcher>,
    sources: Vec<Box<dyn ListingSource>>,
    dataset: VerifiedDataset,
    extractor: Extractor,
    validator: EmailValidator,
    enhancer: SiteEnhancer,
    generator: Option<LeadGenerator>,
    options: CollectorOptions,
    last_stats: Option<CollectionStats>,
}

pub fn default_sources() -> Vec<Box<dyn ListingSource>> {
    let mut sources: Vec<Box<dyn ListingSource>> =
        vec![Box::new(GoogleSearch), Box::new(MapsListings), Box::new(DuckDuckGo)];
    for directory in Directory::all() {
        sources.push(Box::new(directory));
    }
    sources
}

impl Collector {
    pub fn new(fetcher: Box<dyn PageFetcher>, validator: EmailValidator, options: CollectorOptions) -> Self {
        Collector {
            fetcher,
            sources: default_sources(),
            dataset: VerifiedDataset::new(),
            extractor: Extractor::new(),
            validator,
            enhancer: SiteEnhancer::new(),
            generator: None,
            options,
            last_stats: None,
        }
    }

    pub fn with_sources(mut self, sources: Vec<Box<dyn ListingSource>>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_generator(mut self, generator: LeadGenerator) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn options(&self) -> &CollectorOptions {
        &self.options
    }

    pub fn set_mode(&mut self, mode: CollectionMode) {
        self.options.mode = mode;
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub fn last_stats(&self) -> Option<&CollectionStats> {
        self.last_stats.as_ref()
    }

    pub fn generator(&self) -> Option<&LeadGenerator> {
        self.generator.as_ref()
    }

    /// Never fails: any error in the pipeline is answered with the verified
    /// dataset's records for (category, city), truncated to `target`.
    pub fn collect(&mut self, category: &str, city: &str, target: usize) -> Vec<BusinessRecord> {
        match self.try_collect(category, city, target) {
            Ok(records) => records,
            Err(e) => {
                error!("Collection for {} in {} failed: {}. Using verified data.", category, city, e);
                let records = self.dataset.fallback(category, city, target);
                let mut stats = CollectionStats::new(self.options.mode, target);
                stats.fallback_used = true;
                stats.count_sources(&records);
                stats.log();
                self.last_stats = Some(stats);
                records
            }
        }
    }

    pub fn try_collect(&mut self, category: &str, city: &str, target: usize) -> Result<Vec<BusinessRecord>, LeadError> {
        let mode = self.options.mode;
        info!("Collecting {} {} businesses in {} ({} mode)", target, category, city, mode);
        let mut stats = CollectionStats::new(mode, target);
        if target == 0 {
            self.last_stats = Some(stats);
            return Ok(Vec::new());
        }

        let records = match mode {
            CollectionMode::Live => self.collect_live(category, city, target, &mut stats)?,
            CollectionMode::Verified => {
                let mut records = self.dataset.lookup(category, city);
                records.truncate(target);
                records
            }
            CollectionMode::Generated => {
                let generator = self
                    .generator
                    .as_mut()
                    .ok_or_else(|| LeadError::Config("generated mode needs a lead generator".to_string()))?;
                generator.generate(category, city, target)
            }
        };

        if records.is_empty() {
            warn!("No businesses found for {} in {}", category, city);
        }
        stats.count_sources(&records);
        stats.log();
        self.last_stats = Some(stats);
        Ok(records)
    }

    fn collect_live(
        &self,
        category: &str,
        city: &str,
        target: usize,
        stats: &mut CollectionStats,
    ) -> Result<Vec<BusinessRecord>, LeadError> {
        let jobs: Vec<SourceJob<'_>> = self
            .sources
            .iter()
            .map(|source| SourceJob {
                source: source.as_ref(),
                request: SourceRequest::new(category, city, source.budget(target)),
            })
            .collect();
        let outcomes = run_sources(self.fetcher.as_ref(), &self.extractor, jobs, self.options.worker_count())?;

        let mut merged = Vec::new();
        for (source, outcome) in self.sources.iter().zip(outcomes) {
            match &outcome {
                SourceOutcome::Found(records) => info!("{} found {} businesses", source.name(), records.len()),
                SourceOutcome::Empty => info!("{} returned no businesses", source.name()),
                SourceOutcome::Unavailable(reason) => warn!("{} unavailable: {}", source.name(), reason),
            }
            stats.source_outcomes.push(SourceReport { source: source.name().to_string(), outcome: outcome.to_string() });
            merged.extend(outcome.into_records());
        }

        let threshold = target.div_ceil(2);
        if merged.len() < threshold {
            let fallback = self.dataset.fallback(category, city, usize::MAX);
            warn!(
                "Only {} scraped businesses (wanted at least {}), adding {} verified records",
                merged.len(),
                threshold,
                fallback.len()
            );
            stats.fallback_used = !fallback.is_empty();
            merged.extend(fallback);
        }

        let before = merged.len();
        let mut records = dedup(merged);
        stats.duplicates_removed = before - records.len();
        if stats.duplicates_removed > 0 {
            info!("Removed {} duplicate businesses", stats.duplicates_removed);
        }

        let before = records.len();
        records.retain(|r| is_relevant(r, city));
        stats.filtered_out = before - records.len();

        if self.options.enhance {
            stats.enhanced = self.enhance_all(&mut records);
            // Enhanced records can pick up an email another survivor already holds.
            let before = records.len();
            records = dedup(records);
            let collided = before - records.len();
            if collided > 0 {
                info!("Removed {} businesses sharing a website email after enhancement", collided);
                stats.duplicates_removed += collided;
            }
        }

        let (mut valid, invalid) = self.validator.partition(records);
        stats.invalid_emails = invalid.len();
        valid.truncate(target);
        Ok(valid)
    }

    fn enhance_all(&self, records: &mut [BusinessRecord]) -> usize {
        let mut enhanced = 0;
        for record in records.iter_mut() {
            let has_site = record.website.as_deref().map_or(false, |w| w.starts_with("http"));
            if !has_site {
                continue;
            }
            if self.enhancer.enhance(self.fetcher.as_ref(), record) {
                enhanced += 1;
            }
            delay_manager::fixed_delay(self.options.enhance_delay);
        }
        enhanced
    }
}

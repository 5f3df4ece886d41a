pub mod collector;
pub mod config;
pub mod dedup;
pub mod delay_manager;
pub mod directory;
pub mod email_validation;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod gemini;
pub mod generator;
pub mod history;
pub mod logger;
pub mod mailer;
pub mod maps;
pub mod model;
pub mod outreach;
pub mod proxy;
pub mod scoring;
pub mod scraper;
pub mod search_engine;
pub mod source;
pub mod store;
pub mod synth;
pub mod verified;

// Exporting types for convenience
pub use collector::{CollectionMode, CollectionStats, Collector, CollectorOptions};
pub use config::Config;
pub use email_validation::EmailValidator;
pub use error::LeadError;
pub use extractor::Extractor;
pub use fetcher::{Fetcher, OfflineFetcher, PageFetcher, StaticFetcher};
pub use generator::LeadGenerator;
pub use model::{BusinessRecord, Source};
pub use source::{ListingSource, SourceOutcome, SourceRequest};
pub use store::DataStore;
pub use verified::VerifiedDataset;

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use log::{info, warn};

use lead_scraper_lib::config::FetchPolicy;
use lead_scraper_lib::email_validation::DnsMxLookup;
use lead_scraper_lib::gemini::{GeminiClient, TextGenerator};
use lead_scraper_lib::mailer::{LogTransport, Mailer};
use lead_scraper_lib::outreach::OutreachWriter;
use lead_scraper_lib::proxy::ProxyPool;
use lead_scraper_lib::{logger, CollectionMode, Collector, CollectorOptions, Config, DataStore, EmailValidator};
use lead_scraper_lib::{Fetcher, LeadGenerator, OfflineFetcher, PageFetcher, VerifiedDataset};

/// Collects business leads for a category and city, saves them, and
/// optionally prepares outreach emails.
#[derive(Parser, Debug)]
#[command(name = "lead_scraper", version, about)]
struct Cli {
    /// Business category, e.g. "Technology" or "Healthcare"
    #[arg(short, long, default_value = "Technology")]
    category: String,

    #[arg(long, default_value = "Karachi")]
    city: String,

    /// How many leads to return at most
    #[arg(short = 'n', long, default_value_t = 10)]
    count: usize,

    /// live, verified or generated
    #[arg(short, long, default_value = "live")]
    mode: CollectionMode,

    /// Skip revisiting business websites
    #[arg(long)]
    no_enhance: bool,

    /// Run sources one after another
    #[arg(long)]
    sequential: bool,

    /// Never touch the network
    #[arg(long)]
    offline: bool,

    /// Write outreach emails for the leads and dry-run send them
    #[arg(long)]
    outreach: bool,

    #[arg(long, env = "LEADS_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Clear the previous session files before running
    #[arg(long)]
    clear_session: bool,

    /// Print known categories and cities and exit
    #[arg(long)]
    list: bool,
}

fn text_model(config: &Config) -> Option<Box<dyn TextGenerator>> {
    let key = config.gemini_api_key.as_ref()?;
    match GeminiClient::new(key.as_str(), config.gemini_model.as_str()) {
        Ok(client) => Some(Box::new(client) as Box<dyn TextGenerator>),
        Err(e) => {
            warn!("Failed to initialize Gemini client: {}", e);
            None
        }
    }
}

fn catalog(dataset: &VerifiedDataset) -> String {
    let mut out = String::from("Categories:\n");
    for category in dataset.categories() {
        out.push_str(&format!("  {}\n", category));
    }
    out.push_str("Cities:\n");
    for city in dataset.cities() {
        out.push_str(&format!("  {}\n", city));
    }
    out
}

fn main() -> Result<(), Box<dyn Error>> {
    logger::init();
    let cli = Cli::parse();

    // Static data only, so nothing is fetched or opened.
    if cli.list {
        print!("{}", catalog(&VerifiedDataset::new()));
        return Ok(());
    }

    let mut config = Config::from_env()?;
    if let Some(dir) = cli.data_dir.clone() {
        config.data_dir = dir;
    }
    if cli.offline {
        config.fetch = FetchPolicy::immediate();
        config.enhance_delay = std::time::Duration::ZERO;
    }
    info!("Starting lead collection ({} mode)...", cli.mode);

    let store = DataStore::open(&config.data_dir)?;
    if cli.clear_session {
        store.clear_session()?;
    }

    let (fetcher, validator): (Box<dyn PageFetcher>, EmailValidator) = if cli.offline {
        (Box::new(OfflineFetcher), EmailValidator::offline())
    } else {
        let proxies = ProxyPool::load(&config.proxy_sources, config.fetch.timeout);
        (
            Box::new(Fetcher::new(config.fetch.clone(), proxies)?),
            EmailValidator::new(Box::new(DnsMxLookup::new())),
        )
    };
    let model = if cli.offline { None } else { text_model(&config) };
    let generator = LeadGenerator::new(model, store.lead_history()?);

    let mut options = CollectorOptions::from_config(&config);
    options.mode = cli.mode;
    options.enhance = !cli.no_enhance;
    options.parallel = !cli.sequential;
    let mut collector = Collector::new(fetcher, validator, options).with_generator(generator);
    let leads = collector.collect(&cli.category, &cli.city, cli.count);
    for (i, lead) in leads.iter().enumerate() {
        info!(
            "{}. {} | {} | {} | {}",
            i + 1,
            lead.name,
            lead.email.as_deref().unwrap_or("-"),
            lead.phone.as_deref().unwrap_or("-"),
            lead.source_label()
        );
    }
    if let Some(stats) = collector.last_stats() {
        println!("{}", serde_json::to_string_pretty(stats)?);
    }
    store.save_leads(&leads)?;

    if cli.outreach {
        let model = if cli.offline { None } else { text_model(&config) };
        let writer = OutreachWriter::new(model, config.outreach.clone());
        let emails = writer.write_bulk(&leads);
        store.save_generated_emails(&emails)?;

        let mailer = Mailer::new(LogTransport, config.outreach.clone(), config.send_delay);
        let results = mailer.send_bulk(&emails);
        store.save_campaign_results(&results)?;
    }

    let totals = store.statistics();
    info!(
        "Totals: {} leads generated, {} emails sent over {} campaigns ({}% success)",
        totals.total_leads_generated, totals.total_emails_sent, totals.total_campaigns, totals.success_rate
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_flag_parses_without_other_arguments() {
        let cli = Cli::try_parse_from(["lead_scraper", "--list"]).unwrap();
        assert!(cli.list);
        assert!(!cli.offline);
    }

    #[test]
    fn catalog_lists_every_category_and_city() {
        let dataset = VerifiedDataset::new();
        let text = catalog(&dataset);
        assert!(text.starts_with("Categories:\n"));
        assert!(text.contains("Cities:\n"));
        assert!(text.contains("  Karachi\n"));
        let lines = text.lines().filter(|l| l.starts_with("  ")).count();
        assert_eq!(lines, dataset.categories().len() + dataset.cities().len());
    }
}

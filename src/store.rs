use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::Local;
use log::{error, info, warn};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::LeadError;
use crate::history::LeadHistory;
use crate::mailer::{SendResult, SendStatus};
use crate::model::{normalize, BusinessRecord, Source};
use crate::outreach::{GeneratedEmail, GenerationStatus};

const LEADS_FILE: &str = "leads_data.csv";
const LEAD_HISTORY_FILE: &str = "lead_history.csv";
const EMAILS_FILE: &str = "generated_emails.csv";
const EMAIL_HISTORY_FILE: &str = "email_history.csv";
const RESULTS_FILE: &str = "campaign_results.csv";
const SENT_HISTORY_FILE: &str = "sent_emails.csv";
const CAMPAIGN_RECORDS_FILE: &str = "campaign_records.json";

const LEAD_HEADERS: [&str; 10] =
    ["name", "email", "phone", "address", "website", "business_type", "verified", "source", "city", "timestamp"];
const EMAIL_HEADERS: [&str; 7] =
    ["business_name", "business_type", "email", "city", "generated_email", "status", "timestamp"];
const RESULT_HEADERS: [&str; 7] = ["business_name", "email", "status", "message", "business_type", "city", "timestamp"];

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LeadRow {
    name: String,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    website: Option<String>,
    business_type: Option<String>,
    verified: bool,
    source: String,
    city: Option<String>,
    timestamp: String,
}

impl LeadRow {
    fn new(record: &BusinessRecord, timestamp: &str) -> Self {
        LeadRow {
            name: record.name.clone(),
            email: record.email.clone(),
            phone: record.phone.clone(),
            address: record.address.clone(),
            website: record.website.clone(),
            business_type: record.business_type.clone(),
            verified: record.is_verified(),
            source: record.source_label(),
            city: record.city.clone(),
            timestamp: timestamp.to_string(),
        }
    }

    fn into_record(self) -> BusinessRecord {
        let enhanced = self.source.ends_with("_enhanced");
        let source = Source::from_tag(&self.source);
        let trusted = matches!(source, Source::VerifiedDatabase | Source::VerifiedFallback);

        let mut record = BusinessRecord::new(self.name, source);
        record.email = self.email;
        record.phone = self.phone;
        record.address = self.address;
        record.website = self.website;
        record.business_type = self.business_type;
        record.city = self.city;
        record.enhanced = enhanced;
        if self.verified && trusted {
            record.into_verified()
        } else {
            record
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EmailRow {
    business_name: String,
    business_type: String,
    email: String,
    city: String,
    generated_email: String,
    status: GenerationStatus,
    timestamp: String,
}

impl EmailRow {
    fn new(email: &GeneratedEmail, timestamp: &str) -> Self {
        EmailRow {
            business_name: email.business_name.clone(),
            business_type: email.business_type.clone(),
            email: email.email.clone(),
            city: email.city.clone(),
            generated_email: email.generated_email.clone(),
            status: email.status,
            timestamp: timestamp.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ResultRow {
    business_name: String,
    email: String,
    status: SendStatus,
    message: String,
    business_type: String,
    city: String,
    timestamp: String,
}

impl ResultRow {
    fn new(result: &SendResult, timestamp: &str) -> Self {
        ResultRow {
            business_name: result.business_name.clone(),
            email: result.email.clone(),
            status: result.status,
            message: result.message.clone(),
            business_type: result.business_type.clone(),
            city: result.city.clone(),
            timestamp: timestamp.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignAction {
    LeadsGenerated,
    EmailsSent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignEntry {
    pub action: CampaignAction,
    pub count: usize,
    pub success_count: usize,
    pub timestamp: String,
}

/// Running totals kept across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignStatistics {
    pub total_campaigns: usize,
    pub total_leads_generated: usize,
    pub total_emails_sent: usize,
    /// Percentage of sent emails that succeeded, two decimals.
    pub success_rate: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct CampaignRecords {
    campaigns: Vec<CampaignEntry>,
    statistics: CampaignStatistics,
    last_updated: String,
}

impl CampaignRecords {
    fn record(&mut self, action: CampaignAction, count: usize, success_count: usize) {
        let now = timestamp();
        self.campaigns.push(CampaignEntry { action, count, success_count, timestamp: now.clone() });

        match action {
            CampaignAction::LeadsGenerated => self.statistics.total_leads_generated += count,
            CampaignAction::EmailsSent => {
                self.statistics.total_emails_sent += count;
                self.statistics.total_campaigns += 1;
                let successes: usize = self
                    .campaigns
                    .iter()
                    .filter(|c| c.action == CampaignAction::EmailsSent)
                    .map(|c| c.success_count)
                    .sum();
                let total = self.statistics.total_emails_sent;
                if total > 0 {
                    let rate = successes as f64 / total as f64 * 100.0;
                    self.statistics.success_rate = (rate * 100.0).round() / 100.0;
                }
            }
        }
        self.last_updated = now;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryStatus {
    NoHistory,
    EmptyHistory,
    Active,
}

/// Repeated names and emails in the lead history. A row counts once for every
/// key it shares with at least one other row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateAnalysis {
    pub status: HistoryStatus,
    pub total_leads_in_history: usize,
    pub duplicates_by_email: usize,
    pub duplicates_by_name: usize,
    pub total_potential_duplicates: usize,
    pub duplicate_rate: f64,
}

impl DuplicateAnalysis {
    fn without_rows(status: HistoryStatus) -> Self {
        DuplicateAnalysis {
            status,
            total_leads_in_history: 0,
            duplicates_by_email: 0,
            duplicates_by_name: 0,
            total_potential_duplicates: 0,
            duplicate_rate: 0.0,
        }
    }
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Session files are rewritten on every save; history files only grow.
pub struct DataStore {
    dir: PathBuf,
}

impl DataStore {
    /// Creates the data directory and any missing files.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, LeadError> {
        let store = DataStore { dir: dir.into() };
        fs::create_dir_all(&store.dir)?;
        store.initialize()?;
        info!("Data store ready at {}", store.dir.display());
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    fn initialize(&self) -> Result<(), LeadError> {
        let files: [(&str, &[&str]); 6] = [
            (LEADS_FILE, &LEAD_HEADERS),
            (LEAD_HISTORY_FILE, &LEAD_HEADERS),
            (EMAILS_FILE, &EMAIL_HEADERS),
            (EMAIL_HISTORY_FILE, &EMAIL_HEADERS),
            (RESULTS_FILE, &RESULT_HEADERS),
            (SENT_HISTORY_FILE, &RESULT_HEADERS),
        ];
        for (file, headers) in files {
            let path = self.path(file);
            if !path.exists() {
                let mut writer = csv::Writer::from_path(&path)?;
                writer.write_record(headers)?;
                writer.flush()?;
                info!("Created {}", file);
            }
        }

        if !self.path(CAMPAIGN_RECORDS_FILE).exists() {
            let records = CampaignRecords { last_updated: timestamp(), ..CampaignRecords::default() };
            self.save_campaign_records(&records)?;
            info!("Created {}", CAMPAIGN_RECORDS_FILE);
        }
        Ok(())
    }

    /// Writes the session file and appends to the lead history. Returns
    /// `false` when there was nothing to save.
    pub fn save_leads(&self, leads: &[BusinessRecord]) -> Result<bool, LeadError> {
        if leads.is_empty() {
            warn!("No leads to save");
            return Ok(false);
        }
        let now = timestamp();
        let rows: Vec<LeadRow> = leads.iter().map(|r| LeadRow::new(r, &now)).collect();
        self.write_session(LEADS_FILE, &rows)?;
        self.append_history(LEAD_HISTORY_FILE, &rows)?;
        self.update_campaign_records(CampaignAction::LeadsGenerated, leads.len(), 0)?;
        info!("Saved {} leads to CSV and history files", leads.len());
        Ok(true)
    }

    pub fn load_leads(&self) -> Result<Vec<BusinessRecord>, LeadError> {
        let rows: Vec<LeadRow> = self.read_rows(LEADS_FILE)?;
        info!("Loaded {} leads from CSV", rows.len());
        Ok(rows.into_iter().map(LeadRow::into_record).collect())
    }

    pub fn save_generated_emails(&self, emails: &[GeneratedEmail]) -> Result<bool, LeadError> {
        if emails.is_empty() {
            warn!("No emails to save");
            return Ok(false);
        }
        let now = timestamp();
        let rows: Vec<EmailRow> = emails.iter().map(|e| EmailRow::new(e, &now)).collect();
        self.write_session(EMAILS_FILE, &rows)?;
        self.append_history(EMAIL_HISTORY_FILE, &rows)?;
        info!("Saved {} generated emails to CSV and history files", emails.len());
        Ok(true)
    }

    pub fn load_generated_emails(&self) -> Result<Vec<GeneratedEmail>, LeadError> {
        let rows: Vec<EmailRow> = self.read_rows(EMAILS_FILE)?;
        Ok(rows
            .into_iter()
            .map(|row| GeneratedEmail {
                business_name: row.business_name,
                business_type: row.business_type,
                email: row.email,
                city: row.city,
                generated_email: row.generated_email,
                status: row.status,
            })
            .collect())
    }

    pub fn save_campaign_results(&self, results: &[SendResult]) -> Result<bool, LeadError> {
        if results.is_empty() {
            warn!("No results to save");
            return Ok(false);
        }
        let now = timestamp();
        let rows: Vec<ResultRow> = results.iter().map(|r| ResultRow::new(r, &now)).collect();
        self.write_session(RESULTS_FILE, &rows)?;
        self.append_history(SENT_HISTORY_FILE, &rows)?;
        let sent = results.iter().filter(|r| r.status == SendStatus::Sent).count();
        self.update_campaign_records(CampaignAction::EmailsSent, results.len(), sent)?;
        info!("Saved {} campaign results to CSV and history files", results.len());
        Ok(true)
    }

    pub fn statistics(&self) -> CampaignStatistics {
        self.load_campaign_records().statistics
    }

    pub fn campaigns(&self) -> Vec<CampaignEntry> {
        self.load_campaign_records().campaigns
    }

    /// History of issued leads for duplicate prevention.
    pub fn lead_history(&self) -> Result<LeadHistory, LeadError> {
        LeadHistory::load(&self.path(LEAD_HISTORY_FILE))
    }

    /// Drops the session files and recreates them empty. History is kept.
    pub fn clear_session(&self) -> Result<(), LeadError> {
        for file in [LEADS_FILE, EMAILS_FILE, RESULTS_FILE] {
            let path = self.path(file);
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        self.initialize()?;
        info!("Session data cleared");
        Ok(())
    }

    pub fn duplicate_analysis(&self) -> Result<DuplicateAnalysis, LeadError> {
        let path = self.path(LEAD_HISTORY_FILE);
        if !path.exists() {
            return Ok(DuplicateAnalysis::without_rows(HistoryStatus::NoHistory));
        }
        let rows: Vec<LeadRow> = self.read_rows(LEAD_HISTORY_FILE)?;
        if rows.is_empty() {
            return Ok(DuplicateAnalysis::without_rows(HistoryStatus::EmptyHistory));
        }

        let by_email = repeated(rows.iter().filter_map(|r| r.email.as_deref()));
        let by_name = repeated(rows.iter().map(|r| r.name.as_str()));
        let worst = by_email.max(by_name);
        let rate = worst as f64 / rows.len() as f64 * 100.0;

        Ok(DuplicateAnalysis {
            status: HistoryStatus::Active,
            total_leads_in_history: rows.len(),
            duplicates_by_email: by_email,
            duplicates_by_name: by_name,
            total_potential_duplicates: worst,
            duplicate_rate: (rate * 100.0).round() / 100.0,
        })
    }

    fn write_session<S: Serialize>(&self, file: &str, rows: &[S]) -> Result<(), LeadError> {
        let mut writer = csv::Writer::from_path(self.path(file))?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn append_history<S: Serialize>(&self, file: &str, rows: &[S]) -> Result<(), LeadError> {
        let path = self.path(file);
        let has_content = fs::metadata(&path).map(|m| m.len() > 0).unwrap_or(false);
        let handle = OpenOptions::new().create(true).append(true).open(&path)?;

        let mut writer = csv::WriterBuilder::new().has_headers(!has_content).from_writer(handle);
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn read_rows<D: DeserializeOwned>(&self, file: &str) -> Result<Vec<D>, LeadError> {
        let path = self.path(file);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&path)?;
        let mut rows = Vec::new();
        for row in reader.deserialize() {
            rows.push(row?);
        }
        Ok(rows)
    }

    fn load_campaign_records(&self) -> CampaignRecords {
        let path = self.path(CAMPAIGN_RECORDS_FILE);
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to read {}: {}", path.display(), e);
                return CampaignRecords::default();
            }
        };
        match serde_json::from_str(&content) {
            Ok(records) => records,
            Err(e) => {
                error!("Failed to parse {}: {}. Starting fresh.", path.display(), e);
                CampaignRecords::default()
            }
        }
    }

    fn save_campaign_records(&self, records: &CampaignRecords) -> Result<(), LeadError> {
        let json = serde_json::to_string_pretty(records)?;
        fs::write(self.path(CAMPAIGN_RECORDS_FILE), json)?;
        Ok(())
    }

    fn update_campaign_records(&self, action: CampaignAction, count: usize, success_count: usize) -> Result<(), LeadError> {
        let mut records = self.load_campaign_records();
        records.record(action, count, success_count);
        self.save_campaign_records(&records)
    }
}

/// Number of values whose normalized form occurs more than once.
fn repeated<'a>(values: impl Iterator<Item = &'a str>) -> usize {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for value in values.map(normalize).filter(|v| !v.is_empty()) {
        *counts.entry(value).or_insert(0) += 1;
    }
    counts.values().filter(|&&n| n > 1).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verified::VerifiedDataset;

    fn generated(name: &str, email: &str) -> BusinessRecord {
        let mut record = BusinessRecord::new(name, Source::GeneratedFallback);
        record.email = Some(email.to_string());
        record.city = Some("Karachi".to_string());
        record
    }

    fn sent(name: &str, status: SendStatus) -> SendResult {
        SendResult {
            business_name: name.to_string(),
            email: format!("info@{}.com", name.to_lowercase()),
            status,
            message: String::new(),
            business_type: "Hospital".to_string(),
            city: "Lahore".to_string(),
        }
    }

    #[test]
    fn open_creates_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::open(dir.path().join("data")).unwrap();
        for file in [LEADS_FILE, LEAD_HISTORY_FILE, EMAILS_FILE, EMAIL_HISTORY_FILE, RESULTS_FILE, SENT_HISTORY_FILE] {
            let content = fs::read_to_string(store.path(file)).unwrap();
            assert!(content.starts_with("name,") || content.starts_with("business_name,"), "{}", file);
        }
        assert_eq!(store.statistics(), CampaignStatistics::default());
    }

    #[test]
    fn session_is_overwritten_and_history_grows() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::open(dir.path()).unwrap();

        assert!(store.save_leads(&[generated("Folio3", "info@folio3.com")]).unwrap());
        assert!(store.save_leads(&[generated("Netsol", "info@netsol.com")]).unwrap());
        assert!(!store.save_leads(&[]).unwrap());

        let session = store.load_leads().unwrap();
        assert_eq!(session.len(), 1);
        assert_eq!(session[0].name, "Netsol");

        let history = store.lead_history().unwrap();
        assert_eq!(history.len(), 2);
        assert!(history.is_duplicate("FOLIO3", None));
        assert_eq!(store.statistics().total_leads_generated, 2);
    }

    #[test]
    fn verified_flag_and_enhanced_source_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::open(dir.path()).unwrap();
        let mut leads = VerifiedDataset::new().fallback("Healthcare", "Lahore", 1);
        leads[0].enhanced = true;
        store.save_leads(&leads).unwrap();

        let loaded = store.load_leads().unwrap();
        assert!(loaded[0].is_verified());
        assert_eq!(loaded[0].source, Source::VerifiedFallback);
        assert_eq!(loaded[0].source_label(), "verified_database_fallback_enhanced");
    }

    #[test]
    fn generated_emails_round_trip_through_session_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::open(dir.path()).unwrap();
        let email = GeneratedEmail {
            business_name: "Butt Karahi".into(),
            business_type: "Restaurant".into(),
            email: "info@buttkarahi.com".into(),
            city: "Lahore".into(),
            generated_email: "Dear Butt Karahi Team,\n\nHello, from \"Reviu\".".into(),
            status: GenerationStatus::FallbackGenerated,
        };
        store.save_generated_emails(std::slice::from_ref(&email)).unwrap();
        assert_eq!(store.load_generated_emails().unwrap(), vec![email]);
    }

    #[test]
    fn campaign_statistics_track_success_rate() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::open(dir.path()).unwrap();
        store
            .save_campaign_results(&[sent("A", SendStatus::Sent), sent("B", SendStatus::Failed), sent("C", SendStatus::Sent)])
            .unwrap();
        store.save_campaign_results(&[sent("D", SendStatus::Skipped)]).unwrap();

        let stats = store.statistics();
        assert_eq!(stats.total_campaigns, 2);
        assert_eq!(stats.total_emails_sent, 4);
        assert_eq!(stats.success_rate, 50.0);
        assert_eq!(store.campaigns().len(), 2);
    }

    #[test]
    fn clear_session_keeps_history() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::open(dir.path()).unwrap();
        store.save_leads(&[generated("Folio3", "info@folio3.com")]).unwrap();
        store.clear_session().unwrap();

        assert!(store.load_leads().unwrap().is_empty());
        assert_eq!(store.lead_history().unwrap().len(), 1);
    }

    #[test]
    fn duplicate_analysis_counts_repeated_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::open(dir.path()).unwrap();
        assert_eq!(store.duplicate_analysis().unwrap().status, HistoryStatus::EmptyHistory);

        store
            .save_leads(&[
                generated("Folio3", "info@folio3.com"),
                generated("folio3", "sales@folio3.com"),
                generated("Netsol", "info@folio3.com"),
                generated("Techlogix", "info@techlogix.com"),
            ])
            .unwrap();

        let analysis = store.duplicate_analysis().unwrap();
        assert_eq!(analysis.status, HistoryStatus::Active);
        assert_eq!(analysis.total_leads_in_history, 4);
        assert_eq!(analysis.duplicates_by_email, 2);
        assert_eq!(analysis.duplicates_by_name, 2);
        assert_eq!(analysis.duplicate_rate, 50.0);
    }

    #[test]
    fn missing_history_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::open(dir.path()).unwrap();
        fs::remove_file(store.path(LEAD_HISTORY_FILE)).unwrap();
        assert_eq!(store.duplicate_analysis().unwrap().status, HistoryStatus::NoHistory);
    }
}

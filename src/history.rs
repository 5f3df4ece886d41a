use std::collections::HashSet;
use std::path::Path;

use log::{debug, info};

use crate::error::LeadError;
use crate::model::{normalize, BusinessRecord};

/// Words that say nothing about which business a name refers to.
const STOPWORDS: [&str; 11] = [
    "pvt", "ltd", "limited", "company", "co", "corp", "corporation", "solutions", "services", "group", "systems",
];
const SIMILARITY_THRESHOLD: f64 = 0.7;

/// Names and emails issued in earlier runs, used to avoid handing out the same lead twice.
#[derive(Debug, Default, Clone)]
pub struct LeadHistory {
    names: HashSet<String>,
    emails: HashSet<String>,
}

impl LeadHistory {
    pub fn new() -> Self {
        LeadHistory::default()
    }

    /// Reads the `name` and `email` columns of a history CSV. A missing file is an empty history.
    pub fn load(path: &Path) -> Result<Self, LeadError> {
        let mut history = LeadHistory::new();
        if !path.exists() {
            info!("No existing lead history found, starting fresh");
            return Ok(history);
        }

        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        let headers = reader.headers()?.clone();
        let name_col = headers.iter().position(|h| h == "name");
        let email_col = headers.iter().position(|h| h == "email");

        for row in reader.records() {
            let row = row?;
            let name = name_col.and_then(|i| row.get(i)).unwrap_or_default();
            let email = email_col.and_then(|i| row.get(i));
            history.insert(name, email);
        }

        info!(
            "Loaded {} existing business names and {} emails for duplicate prevention",
            history.names.len(),
            history.emails.len()
        );
        Ok(history)
    }

    pub fn insert(&mut self, name: &str, email: Option<&str>) {
        let name = normalize(name);
        if !name.is_empty() {
            self.names.insert(name);
        }
        if let Some(email) = email.map(normalize).filter(|e| !e.is_empty()) {
            self.emails.insert(email);
        }
    }

    pub fn remember(&mut self, record: &BusinessRecord) {
        self.insert(&record.name, record.email.as_deref());
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.emails.is_empty()
    }

    /// Exact name or email hit, or a name similar to one already issued.
    pub fn is_duplicate(&self, name: &str, email: Option<&str>) -> bool {
        let name = normalize(name);
        if self.names.contains(&name) {
            debug!("Duplicate name found: {}", name);
            return true;
        }
        if let Some(email) = email.map(normalize) {
            if self.emails.contains(&email) {
                debug!("Duplicate email found: {}", email);
                return true;
            }
        }
        if let Some(existing) = self.names.iter().find(|existing| names_similar(&name, existing)) {
            debug!("Similar name found: {} vs {}", name, existing);
            return true;
        }
        false
    }

    pub fn contains_record(&self, record: &BusinessRecord) -> bool {
        self.is_duplicate(&record.name, record.email.as_deref())
    }
}

fn significant_tokens(name: &str) -> HashSet<String> {
    name.to_lowercase()
        .replace(|c: char| c == '-' || c == '.', " ")
        .split_whitespace()
        .filter(|w| !STOPWORDS.iter().any(|s| s == w))
        .map(str::to_string)
        .collect()
}

/// Jaccard similarity of the names' tokens once stopwords are removed.
pub fn similarity(a: &str, b: &str) -> f64 {
    let left = significant_tokens(a);
    let right = significant_tokens(b);
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    let shared = left.intersection(&right).count();
    let total = left.union(&right).count();
    shared as f64 / total as f64
}

pub fn names_similar(a: &str, b: &str) -> bool {
    similarity(a, b) > SIMILARITY_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn stopwords_do_not_count() {
        assert!(names_similar("Tech Solutions Pvt Ltd", "Tech Solutions"));
        assert!(!names_similar("Tech Solutions", "Health Services"));
        assert!(names_similar("Arfa-Tech Co.", "arfa tech"));
        assert!(!names_similar("Pvt Ltd", "Pvt Ltd"));
    }

    #[test]
    fn exact_and_fuzzy_matches_are_duplicates() {
        let mut history = LeadHistory::new();
        history.insert("Systems Limited", Some("info@systemsltd.com"));
        history.insert("Netsol Technologies Pvt Ltd", None);

        assert!(history.is_duplicate(" systems limited ", None));
        assert!(history.is_duplicate("Another Name", Some("INFO@systemsltd.com")));
        assert!(history.is_duplicate("Netsol Technologies", None));
        assert!(!history.is_duplicate("Folio3", Some("info@folio3.com")));
    }

    #[test]
    fn loads_name_and_email_columns() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timestamp,name,email,phone").unwrap();
        writeln!(file, "2024-01-01 10:00:00,Techlogix,info@techlogix.com,+92-42-1").unwrap();
        writeln!(file, "2024-01-01 10:00:00,Folio3,,").unwrap();
        file.flush().unwrap();

        let history = LeadHistory::load(file.path()).unwrap();
        assert_eq!(history.len(), 2);
        assert!(history.is_duplicate("x", Some("info@techlogix.com")));
        assert!(history.is_duplicate("FOLIO3", None));
    }

    #[test]
    fn missing_file_is_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let history = LeadHistory::load(&dir.path().join("lead_history.csv")).unwrap();
        assert!(history.is_empty());
    }
}

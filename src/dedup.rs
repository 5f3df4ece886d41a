use std::collections::HashSet;

use crate::model::BusinessRecord;

/// Single pass, first occurrence wins. A record is dropped when its normalized
/// name or its normalized email was already seen. Records without an email are
/// only checked by name.
pub fn dedup(records: Vec<BusinessRecord>) -> Vec<BusinessRecord> {
    let mut seen_names = HashSet::new();
    let mut seen_emails = HashSet::new();
    let mut unique = Vec::with_capacity(records.len());

    for record in records {
        let name = record.normalized_name();
        let email = record.normalized_email();

        if seen_names.contains(&name) {
            continue;
        }
        if let Some(email) = &email {
            if seen_emails.contains(email) {
                continue;
            }
        }

        seen_names.insert(name);
        if let Some(email) = email {
            seen_emails.insert(email);
        }
        unique.push(record);
    }

    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Source;

    fn record(name: &str, email: Option<&str>) -> BusinessRecord {
        let mut r = BusinessRecord::new(name, Source::GoogleSearch);
        r.email = email.map(str::to_string);
        r
    }

    fn sample() -> Vec<BusinessRecord> {
        vec![
            record("Arpatech", Some("info@arpatech.com")),
            record("  ARPATECH ", Some("sales@arpatech.com")),
            record("Netsol", Some("INFO@arpatech.com ")),
            record("Systems Ltd", None),
            record("Techlogix", None),
            record("systems ltd", Some("hello@systems.com")),
            record("Folio3", Some("info@folio3.com")),
        ]
    }

    #[test]
    fn first_occurrence_wins_on_either_key() {
        let names: Vec<String> = dedup(sample()).into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Arpatech", "Systems Ltd", "Techlogix", "Folio3"]);
    }

    #[test]
    fn dedup_is_idempotent() {
        let once = dedup(sample());
        let twice = dedup(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn no_two_survivors_share_a_key() {
        let survivors = dedup(sample());
        let names: HashSet<_> = survivors.iter().map(|r| r.normalized_name()).collect();
        let emails: Vec<_> = survivors.iter().filter_map(|r| r.normalized_email()).collect();
        let unique_emails: HashSet<_> = emails.iter().collect();
        assert_eq!(names.len(), survivors.len());
        assert_eq!(unique_emails.len(), emails.len());
    }

    #[test]
    fn empty_input_is_fine() {
        assert!(dedup(Vec::new()).is_empty());
    }
}

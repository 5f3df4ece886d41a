use log::{error, info, warn};
use serde::Deserialize;

use crate::error::LeadError;
use crate::gemini::TextGenerator;
use crate::history::LeadHistory;
use crate::model::{BusinessRecord, Source};

const MAX_BATCH: usize = 20;
const PLACEHOLDER_EMAIL: &str = "info@unknown.com";
const DEFAULT_CITY_CODE: &str = "30";

const TECHNOLOGY_NAMES: [&str; 31] = [
    "TechVision Solutions", "Digital Dynamics", "InnovateTech Systems", "SmartCode Solutions", "FutureTech Hub",
    "CyberTech Services", "DataFlow Technologies", "CloudTech Solutions", "MobileTech Innovations", "WebTech Pro",
    "TechGenius Labs", "Digital Forge", "Innovate Solutions", "Smart Systems", "Future Dynamics",
    "Cyber Dynamics", "Data Solutions", "Cloud Systems", "Mobile Solutions", "Web Dynamics",
    "Tech Masters", "Digital Solutions", "Innovate Labs", "Smart Tech", "Future Solutions",
    "Cyber Labs", "Data Tech", "Cloud Labs", "Mobile Tech", "Web Solutions", "Tech Dynamics",
];

const HEALTHCARE_NAMES: [&str; 30] = [
    "MedCare Plus", "HealthFirst Clinic", "Wellness Solutions", "CareTech Medical", "HealthHub Services",
    "MedTech Innovations", "PatientCare Solutions", "HealthTech Systems", "CareFirst Medical", "WellTech Services",
    "MedCare Solutions", "HealthFirst Plus", "Wellness Tech", "CareTech Solutions", "HealthHub Plus",
    "MedTech Solutions", "PatientCare Plus", "HealthTech Plus", "CareFirst Solutions", "WellTech Plus",
    "MedCare Tech", "HealthFirst Solutions", "Wellness Plus", "CareTech Plus", "HealthHub Tech",
    "MedTech Plus", "PatientCare Tech", "HealthTech Solutions", "CareFirst Tech", "WellTech Solutions",
];

const EDUCATION_NAMES: [&str; 25] = [
    "EduTech Solutions", "Learning Hub", "Knowledge Center", "Smart Education", "EduVision Pro",
    "Learning Technologies", "Knowledge Hub", "EduTech Innovations", "Smart Learning", "Education Plus",
    "EduTech Plus", "Learning Solutions", "Knowledge Plus", "Smart Tech", "EduVision Solutions",
    "Learning Plus", "Knowledge Tech", "EduTech Hub", "Smart Solutions", "Education Tech",
    "EduTech Center", "Learning Tech", "Knowledge Solutions", "Smart Plus", "EduVision Tech",
];

/// `{}` is replaced by the category.
const GENERIC_TEMPLATES: [&str; 30] = [
    "{} Solutions Pvt Ltd", "Elite {} Services", "Prime {} Hub", "Next Gen {}", "Smart {} Co",
    "Advanced {} Systems", "Professional {} Group", "Modern {} Solutions", "Expert {} Services", "Premium {} Co",
    "{} Dynamics", "Elite {} Solutions", "Prime {} Services", "Next Gen {} Solutions", "Smart {} Services",
    "Advanced {} Solutions", "Professional {} Solutions", "Modern {} Services", "Expert {} Solutions", "Premium {} Services",
    "{} Tech", "Elite {} Tech", "Prime {} Tech", "Next Gen {} Tech", "Smart {} Tech",
    "Advanced {} Tech", "Professional {} Tech", "Modern {} Tech", "Expert {} Tech", "Premium {} Tech",
];

const CITY_AREAS: [(&str, [&str; 10]); 4] = [
    ("Islamabad", ["Blue Area", "F-7 Markaz", "G-8 Markaz", "I-8 Markaz", "F-10 Markaz", "G-11 Markaz", "I-11 Markaz", "F-8 Markaz", "G-9 Markaz", "I-9 Markaz"]),
    ("Lahore", ["Gulberg", "Defence", "Model Town", "Johar Town", "Bahria Town", "DHA Phase 1", "DHA Phase 2", "DHA Phase 3", "DHA Phase 4", "DHA Phase 5"]),
    ("Karachi", ["Clifton", "Defence", "Gulshan-e-Iqbal", "North Nazimabad", "Gulistan-e-Jauhar", "Malir", "Landhi", "Korangi", "Saddar", "Lyari"]),
    ("Rawalpindi", ["Saddar", "Raja Bazar", "Bank Road", "Mall Road", "Peshawar Road", "Grand Trunk Road", "Airport Road", "Murree Road", "Lehtrar Road", "Adiala Road"]),
];

const CITY_CODES: [(&str, &str); 4] = [("Islamabad", "51"), ("Lahore", "42"), ("Karachi", "21"), ("Rawalpindi", "51")];

#[derive(Debug, Deserialize)]
struct GeneratedBatch {
    #[serde(default)]
    businesses: Vec<GeneratedBusiness>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeneratedBusiness {
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    website: Option<String>,
    business_type: Option<String>,
    category: Option<String>,
    city: Option<String>,
}

/// Produces plausible records when live scraping is not wanted, either from a
/// text-generation model or from built-in name lists. Every record is checked
/// against the lead history first, and accepted records are added to it.
pub struct LeadGenerator {
    model: Option<Box<dyn TextGenerator>>,
    history: LeadHistory,
}

impl LeadGenerator {
    pub fn new(model: Option<Box<dyn TextGenerator>>, history: LeadHistory) -> Self {
        if model.is_none() {
            warn!("No text generation model configured. Using fallback mode only.");
        }
        LeadGenerator { model, history }
    }

    pub fn offline(history: LeadHistory) -> Self {
        LeadGenerator { model: None, history }
    }

    pub fn history(&self) -> &LeadHistory {
        &self.history
    }

    pub fn uses_model(&self) -> bool {
        self.model.is_some()
    }

    /// Up to `count` records not present in the history. Model failures fall
    /// back to the name lists for whatever is still missing.
    pub fn generate(&mut self, category: &str, city: &str, count: usize) -> Vec<BusinessRecord> {
        let mut records = Vec::new();
        if count == 0 {
            return records;
        }

        if let Some(model) = self.model.as_deref() {
            info!("Generating {} unique businesses for {} in {} using {}", count, category, city, model.model_name());
            if let Err(e) = generate_with_model(model, &mut self.history, category, city, count, &mut records) {
                error!("Error generating businesses with model: {}", e);
            }
            if records.len() >= count {
                return records;
            }
            warn!(
                "Could only generate {} unique businesses out of {} requested",
                records.len(),
                count
            );
        } else {
            info!("Using fallback mode to generate {} businesses for {} in {}", count, category, city);
        }

        let missing = count - records.len();
        records.extend(self.fallback_records(category, city, missing));
        records
    }

    /// Records built from the name lists, skipping anything the history already knows.
    pub fn fallback_records(&mut self, category: &str, city: &str, count: usize) -> Vec<BusinessRecord> {
        let names = fallback_names(category);
        let areas = city_areas(city);
        let code = CITY_CODES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(city))
            .map_or(DEFAULT_CITY_CODE, |(_, code)| *code);

        let mut records = Vec::new();
        for (i, name) in names.iter().enumerate() {
            if records.len() >= count {
                break;
            }
            let company: String = name
                .to_lowercase()
                .chars()
                .filter(|c| !matches!(c, ' ' | '.' | '-' | '&'))
                .collect();
            let email = format!("info@{}.com", company);
            if self.history.is_duplicate(name, Some(&email)) {
                continue;
            }

            let mut record = BusinessRecord::new(name.clone(), Source::GeneratedFallback);
            record.email = Some(email);
            record.phone = Some(format!("+92-{}-{}", code, 1_000_000 + i * 10_000 + i * 123));
            record.address = Some(format!("{}, {}", areas[i % areas.len()], city));
            record.website = Some(format!("www.{}.com", company));
            record.business_type = Some(category.to_string());
            record.category = Some(category.to_string());
            record.city = Some(city.to_string());

            self.history.remember(&record);
            records.push(record);
        }

        info!("Generated {} unique fallback businesses with valid emails", records.len());
        records
    }
}

fn generate_with_model(
    model: &dyn TextGenerator,
    history: &mut LeadHistory,
    category: &str,
    city: &str,
    count: usize,
    accepted: &mut Vec<BusinessRecord>,
) -> Result<(), LeadError> {
    let max_attempts = count * 3;
    let batch_size = (count * 2).min(MAX_BATCH);
    let mut attempts = 0;

    while accepted.len() < count && attempts < max_attempts {
        attempts += 1;
        let text = model.generate(&business_prompt(category, city, batch_size))?;
        let batch = parse_response(&text, category, city)?;
        let generated = batch.len();

        for record in batch {
            if history.contains_record(&record) {
                continue;
            }
            history.remember(&record);
            accepted.push(record);
            if accepted.len() >= count {
                break;
            }
        }
        info!("Attempt {}: Found {} unique businesses out of {} generated", attempts, accepted.len(), generated);
    }
    Ok(())
}

pub fn business_prompt(category: &str, city: &str, count: usize) -> String {
    format!(
        r#"Generate {count} realistic business listings for {category} companies in {city}, Pakistan.

For each business, provide:
- A realistic business name (should sound like a real Pakistani company)
- A valid email format (info@companyname.com, contact@companyname.pk, etc.)
- A Pakistani phone number format (+92-XX-XXXXXXX)
- A realistic address in {city}
- A website URL (www.companyname.com or www.companyname.pk)
- Business type and category

Return the data in this exact JSON format:
{{
    "businesses": [
        {{
            "name": "Business Name",
            "email": "email@domain.com",
            "phone": "+92-XX-XXXXXXX",
            "address": "Full Address, {city}",
            "website": "www.website.com",
            "business_type": "{category}",
            "category": "{category}",
            "city": "{city}"
        }}
    ]
}}

CRITICAL REQUIREMENTS:
1. Every business MUST have a valid email address
2. Make sure the businesses are realistic and varied
3. Include both small startups and established companies"#
    )
}

/// Records from the JSON object between the first `{` and the last `}` of a
/// model response. Entries without a usable email are skipped.
pub fn parse_response(text: &str, category: &str, city: &str) -> Result<Vec<BusinessRecord>, LeadError> {
    let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
        return Err(LeadError::Generation("no JSON object in model response".to_string()));
    };
    if end < start {
        return Err(LeadError::Generation("no JSON object in model response".to_string()));
    }
    let batch: GeneratedBatch = serde_json::from_str(&text[start..=end])?;

    let mut records = Vec::new();
    for business in batch.businesses {
        let name = business.name.unwrap_or_else(|| "Unknown Business".to_string());
        let email = business.email.unwrap_or_default();
        if !email.contains('@') || email.trim() == PLACEHOLDER_EMAIL {
            warn!("Skipping business '{}' - no valid email", name);
            continue;
        }

        let mut record = BusinessRecord::new(name, Source::AiGenerated);
        record.email = Some(email.trim().to_string());
        record.phone = business.phone;
        record.address = business.address.or_else(|| Some(format!("Unknown Address, {}", city)));
        record.website = business.website;
        record.business_type = business.business_type.or_else(|| Some(category.to_string()));
        record.category = business.category.or_else(|| Some(category.to_string()));
        record.city = business.city.or_else(|| Some(city.to_string()));
        records.push(record);
    }
    Ok(records)
}

fn fallback_names(category: &str) -> Vec<String> {
    let lower = category.trim().to_lowercase();
    let list: &[&str] = if lower.starts_with("tech") {
        &TECHNOLOGY_NAMES
    } else if lower.starts_with("health") {
        &HEALTHCARE_NAMES
    } else if lower.starts_with("educat") {
        &EDUCATION_NAMES
    } else {
        return GENERIC_TEMPLATES
            .iter()
            .map(|t| t.replace("{}", category.trim()))
            .collect();
    };
    list.iter().map(|n| n.to_string()).collect()
}

fn city_areas(city: &str) -> Vec<String> {
    CITY_AREAS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(city.trim()))
        .map(|(_, areas)| areas.iter().map(|a| a.to_string()).collect())
        .unwrap_or_else(|| (1..=20).map(|i| format!("Business District {}", i)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct CannedModel {
        replies: Mutex<VecDeque<Result<String, String>>>,
    }

    impl CannedModel {
        fn new(replies: Vec<Result<&str, &str>>) -> Self {
            let replies = replies
                .into_iter()
                .map(|r| r.map(str::to_string).map_err(str::to_string))
                .collect();
            CannedModel { replies: Mutex::new(replies) }
        }
    }

    impl TextGenerator for CannedModel {
        fn generate(&self, _prompt: &str) -> Result<String, LeadError> {
            match self.replies.lock().unwrap().pop_front() {
                Some(Ok(text)) => Ok(text),
                Some(Err(e)) => Err(LeadError::Generation(e)),
                None => Err(LeadError::Generation("no more replies".into())),
            }
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    const REPLY: &str = r#"Sure! Here you go:
```json
{"businesses": [
  {"name": "Indus Soft", "email": "info@indussoft.pk", "phone": "+92-21-1234567", "website": "www.indussoft.pk"},
  {"name": "No Mail Co", "email": "info@unknown.com"},
  {"name": "Broken", "email": "broken-at-nothing"},
  {"name": "Ravi Digital", "email": "hello@ravidigital.com"}
]}
```"#;

    #[test]
    fn fallback_is_deterministic_and_unverified() {
        let mut generator = LeadGenerator::offline(LeadHistory::new());
        let records = generator.generate("Technology", "Lahore", 3);
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["TechVision Solutions", "Digital Dynamics", "InnovateTech Systems"]);
        assert_eq!(records[0].email.as_deref(), Some("info@techvisionsolutions.com"));
        assert_eq!(records[0].phone.as_deref(), Some("+92-42-1000000"));
        assert_eq!(records[1].phone.as_deref(), Some("+92-42-1010123"));
        assert_eq!(records[1].address.as_deref(), Some("Defence, Lahore"));
        assert_eq!(records[2].website.as_deref(), Some("www.innovatetechsystems.com"));
        assert!(records.iter().all(|r| !r.is_verified() && r.source == Source::GeneratedFallback));
    }

    #[test]
    fn history_entries_are_never_reissued() {
        let mut history = LeadHistory::new();
        history.insert("TechVision Solutions Pvt Ltd", None);
        history.insert("Someone Else", Some("info@digitaldynamics.com"));
        let mut generator = LeadGenerator::offline(history);

        let first = generator.generate("Technology", "Karachi", 2);
        assert_eq!(first[0].name, "InnovateTech Systems");
        assert_eq!(first[1].name, "SmartCode Solutions");

        let second = generator.generate("Technology", "Karachi", 1);
        assert_eq!(second[0].name, "FutureTech Hub");
    }

    #[test]
    fn unknown_city_uses_default_code_and_districts() {
        let mut generator = LeadGenerator::offline(LeadHistory::new());
        let records = generator.generate("Logistics", "Sukkur", 1);
        assert_eq!(records[0].name, "Logistics Solutions Pvt Ltd");
        assert_eq!(records[0].phone.as_deref(), Some("+92-30-1000000"));
        assert_eq!(records[0].address.as_deref(), Some("Business District 1, Sukkur"));
    }

    #[test]
    fn model_output_is_parsed_and_filtered() {
        let model = CannedModel::new(vec![Ok(REPLY)]);
        let mut generator = LeadGenerator::new(Some(Box::new(model)), LeadHistory::new());
        let records = generator.generate("Technology", "Karachi", 2);

        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Indus Soft", "Ravi Digital"]);
        assert!(records.iter().all(|r| r.source == Source::AiGenerated && !r.is_verified()));
        assert_eq!(records[1].city.as_deref(), Some("Karachi"));
    }

    #[test]
    fn model_failure_fills_the_gap_from_fallback() {
        let model = CannedModel::new(vec![Err("quota exceeded")]);
        let mut generator = LeadGenerator::new(Some(Box::new(model)), LeadHistory::new());
        let records = generator.generate("Healthcare", "Islamabad", 2);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "MedCare Plus");
        assert_eq!(records[0].address.as_deref(), Some("Blue Area, Islamabad"));
    }

    #[test]
    fn responses_without_json_are_errors() {
        assert!(parse_response("no json here", "Technology", "Karachi").is_err());
        assert!(parse_response("} backwards {", "Technology", "Karachi").is_err());
        assert!(parse_response(r#"{"businesses": []}"#, "Technology", "Karachi").unwrap().is_empty());
    }
}

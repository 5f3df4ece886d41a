use crate::model::BusinessRecord;

/// Directories whose listings earn a small reliability bonus.
pub const TRUSTED_SOURCES: [&str; 2] = ["pakistan_business_directory", "yellow_pages_pk"];

/// Records scoring below this are discarded by the scoring sources.
pub const CONFIDENCE_FLOOR: f64 = 0.3;

const NAME_WEIGHT: f64 = 0.3;
const EMAIL_WEIGHT: f64 = 0.25;
const PHONE_WEIGHT: f64 = 0.2;
const WEBSITE_WEIGHT: f64 = 0.15;
const ADDRESS_WEIGHT: f64 = 0.1;
const CATEGORY_MATCH_BONUS: f64 = 0.1;
const TRUSTED_SOURCE_BONUS: f64 = 0.05;

fn present(field: &Option<String>) -> bool {
    field.as_deref().map_or(false, |v| !v.trim().is_empty())
}

/// Weighted completeness score, clamped to `[0, 1]`.
pub fn confidence_score(record: &BusinessRecord) -> f64 {
    let mut score = 0.0;

    if record.has_valid_name() {
        score += NAME_WEIGHT;
    }
    if present(&record.email) {
        score += EMAIL_WEIGHT;
    }
    if present(&record.phone) {
        score += PHONE_WEIGHT;
    }
    if present(&record.website) {
        score += WEBSITE_WEIGHT;
    }
    if present(&record.address) {
        score += ADDRESS_WEIGHT;
    }

    if let (Some(business_type), Some(category)) = (&record.business_type, &record.category) {
        if category.to_lowercase().contains(&business_type.to_lowercase()) {
            score += CATEGORY_MATCH_BONUS;
        }
    }

    if TRUSTED_SOURCES.iter().any(|s| *s == record.source.tag()) {
        score += TRUSTED_SOURCE_BONUS;
    }

    f64::min(score, 1.0)
}

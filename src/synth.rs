use rand::Rng;

use crate::model::CityInfo;

/// `info@<name>.com`, built from the alphanumeric part of the business name.
pub fn email_from_name(business_name: &str) -> String {
    let clean = clean_token(business_name);
    if clean.chars().count() > 3 {
        format!("info@{}.com", clean)
    } else {
        format!("info@{}business.com", clean)
    }
}

/// `+92-<area code>-<8 random digits>` for the given city.
pub fn phone_for_city(city: &str) -> String {
    let info = CityInfo::lookup(city);
    let suffix: u32 = rand::thread_rng().gen_range(10_000_000..=99_999_999);
    format!("+92-{}-{}", info.area_code, suffix)
}

/// One of a handful of plausible domains for a category/city pair, picked by `index`.
pub fn generate_domain(category: &str, city: &str, index: usize) -> String {
    let category = clean_token(category);
    let city = clean_token(city);
    let domains = [
        format!("{}{}.com", category, city),
        format!("{}{}.com", city, category),
        format!("{}{}.pk", category, city),
        format!("{}{}.pk", city, category),
        format!("{}pakistan.com", category),
        format!("{}pk.com", category),
    ];
    domains[index % domains.len()].clone()
}

pub fn city_address(city: &str) -> String {
    format!("{}, Pakistan", city.trim())
}

fn clean_token(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

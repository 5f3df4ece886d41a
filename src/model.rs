use std::fmt;

use serde::Serialize;

/// Where a record came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Source {
    VerifiedDatabase,
    VerifiedFallback,
    GoogleSearch,
    GoogleMaps,
    DuckDuckGo,
    /// A named business directory, e.g. `yellow_pages_pk`.
    Directory(String),
    AiGenerated,
    GeneratedFallback,
    #[default]
    Unknown,
}

impl Source {
    pub fn tag(&self) -> &str {
        match self {
            Source::VerifiedDatabase => "verified_database",
            Source::VerifiedFallback => "verified_database_fallback",
            Source::GoogleSearch => "google_search",
            Source::GoogleMaps => "google_maps",
            Source::DuckDuckGo => "duckduckgo_search",
            Source::Directory(name) => name,
            Source::AiGenerated => "gemini_ai",
            Source::GeneratedFallback => "realistic_fallback_data",
            Source::Unknown => "unknown",
        }
    }

    pub fn from_tag(tag: &str) -> Source {
        let base = tag.trim().trim_end_matches("_enhanced");
        match base {
            "verified_database" => Source::VerifiedDatabase,
            "verified_database_fallback" => Source::VerifiedFallback,
            "google_search" => Source::GoogleSearch,
            "google_maps" => Source::GoogleMaps,
            "duckduckgo_search" => Source::DuckDuckGo,
            "gemini_ai" => Source::AiGenerated,
            "realistic_fallback_data" => Source::GeneratedFallback,
            "" | "unknown" => Source::Unknown,
            other => Source::Directory(other.to_string()),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Best-effort contact fields pulled out of free text.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
}

impl ContactInfo {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.phone.is_none() && self.address.is_none() && self.website.is_none()
    }
}

/// A candidate business lead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusinessRecord {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub business_type: Option<String>,
    pub category: Option<String>,
    pub city: Option<String>,
    #[serde(serialize_with = "serialize_source")]
    pub source: Source,
    /// Contact fields were refreshed from the business website.
    pub enhanced: bool,
    pub confidence_score: Option<f64>,
    verified: bool,
}

fn serialize_source<S: serde::Serializer>(source: &Source, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(source.tag())
}

pub const MIN_NAME_LEN: usize = 3;

impl BusinessRecord {
    /// Creates an unverified record. Only the verified dataset can mark records verified.
    pub fn new(name: impl Into<String>, source: Source) -> Self {
        BusinessRecord {
            name: name.into(),
            email: None,
            phone: None,
            address: None,
            website: None,
            business_type: None,
            category: None,
            city: None,
            source,
            enhanced: false,
            confidence_score: None,
            verified: false,
        }
    }

    pub(crate) fn into_verified(mut self) -> Self {
        self.verified = true;
        self
    }

    pub fn is_verified(&self) -> bool {
        self.verified
    }

    pub fn has_valid_name(&self) -> bool {
        self.name.trim().chars().count() >= MIN_NAME_LEN
    }

    /// Source tag as persisted, with the `_enhanced` suffix when applicable.
    pub fn source_label(&self) -> String {
        if self.enhanced {
            format!("{}_enhanced", self.source.tag())
        } else {
            self.source.tag().to_string()
        }
    }

    pub fn normalized_name(&self) -> String {
        normalize(&self.name)
    }

    pub fn normalized_email(&self) -> Option<String> {
        self.email.as_deref().map(normalize).filter(|e| !e.is_empty())
    }

    /// City for messaging: the record's city, else the last address segment.
    pub fn display_city(&self) -> String {
        if let Some(city) = self.city.as_deref().filter(|c| !c.trim().is_empty()) {
            return city.trim().to_string();
        }
        self.address
            .as_deref()
            .and_then(|a| a.split(", ").last())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "Pakistan".to_string())
    }

    pub fn apply_contacts(&mut self, info: &ContactInfo) {
        if self.email.is_none() {
            self.email = info.email.clone();
        }
        if self.phone.is_none() {
            self.phone = info.phone.clone();
        }
        if self.address.is_none() {
            self.address = info.address.clone();
        }
        if self.website.is_none() {
            self.website = info.website.clone();
        }
    }

    /// Overwrites contact fields with anything freshly found. Returns whether something changed.
    pub fn overwrite_contacts(&mut self, info: &ContactInfo) -> bool {
        let mut changed = false;
        if let Some(email) = &info.email {
            self.email = Some(email.clone());
            changed = true;
        }
        if let Some(phone) = &info.phone {
            self.phone = Some(phone.clone());
            changed = true;
        }
        if let Some(address) = &info.address {
            self.address = Some(address.clone());
            changed = true;
        }
        changed
    }
}

pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Dialing area code and province for a city.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CityInfo {
    pub area_code: &'static str,
    pub region: &'static str,
}

const CITY_CODES: [(&str, CityInfo); 10] = [
    ("Karachi", CityInfo { area_code: "21", region: "Sindh" }),
    ("Lahore", CityInfo { area_code: "42", region: "Punjab" }),
    ("Islamabad", CityInfo { area_code: "51", region: "Federal" }),
    ("Rawalpindi", CityInfo { area_code: "51", region: "Punjab" }),
    ("Faisalabad", CityInfo { area_code: "41", region: "Punjab" }),
    ("Multan", CityInfo { area_code: "61", region: "Punjab" }),
    ("Hyderabad", CityInfo { area_code: "22", region: "Sindh" }),
    ("Gujranwala", CityInfo { area_code: "55", region: "Punjab" }),
    ("Peshawar", CityInfo { area_code: "91", region: "KPK" }),
    ("Quetta", CityInfo { area_code: "81", region: "Balochistan" }),
];

impl CityInfo {
    pub const UNKNOWN: CityInfo = CityInfo { area_code: "00", region: "Unknown" };

    pub fn lookup(city: &str) -> CityInfo {
        CITY_CODES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(city.trim()))
            .map(|(_, info)| *info)
            .unwrap_or(CityInfo::UNKNOWN)
    }

    pub fn known_cities() -> impl Iterator<Item = &'static str> {
        CITY_CODES.iter().map(|(name, _)| *name)
    }
}

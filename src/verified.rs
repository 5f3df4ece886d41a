//! Static, read-only table of known-good businesses per category and city.
//!
//! Serves as the primary source in verified mode and as the fallback when live
//! collection underperforms or fails. Lookups hand out fresh copies.

use crate::model::{normalize, BusinessRecord, Source};

#[derive(Debug, Clone, Copy)]
pub struct Seed {
    pub name: &'static str,
    pub email: &'static str,
    pub phone: &'static str,
    pub address: &'static str,
    pub website: &'static str,
    pub business_type: &'static str,
}

#[derive(Debug)]
pub struct CitySeed {
    pub name: &'static str,
    pub records: &'static [Seed],
}

#[derive(Debug)]
pub struct CategorySeed {
    pub name: &'static str,
    pub related_types: &'static [&'static str],
    pub cities: &'static [CitySeed],
}

const fn seed(
    name: &'static str,
    email: &'static str,
    phone: &'static str,
    address: &'static str,
    website: &'static str,
    business_type: &'static str,
) -> Seed {
    Seed { name, email, phone, address, website, business_type }
}

pub static VERIFIED_BUSINESSES: &[CategorySeed] = &[
    CategorySeed {
        name: "Technology",
        related_types: &[
            "Software Company", "IT Company", "Software House", "Tech Solutions",
            "Digital Agency", "Web Development", "Mobile Apps", "AI/ML Company",
            "Cybersecurity", "Cloud Services", "Data Analytics", "System Integration",
        ],
        cities: &[
            CitySeed { name: "Karachi", records: &[
                seed("Arpatech", "contact@arpatech.com", "+92-21-34567890", "Defence, Karachi", "https://arpatech.com", "Software Company"),
                seed("10Pearls", "hello@10pearls.com", "+92-21-34567891", "Gulshan-e-Iqbal, Karachi", "https://10pearls.com", "IT Company"),
                seed("Techlogix", "info@techlogix.com", "+92-21-34567892", "North Nazimabad, Karachi", "https://techlogix.com", "Software House"),
            ] },
            CitySeed { name: "Lahore", records: &[
                seed("NetSol Technologies", "contact@netsol.com", "+92-42-34567890", "Gulberg, Lahore", "https://netsol.com", "Tech Solutions"),
                seed("Creative Chaos", "hello@creativechaos.io", "+92-42-34567891", "DHA, Lahore", "https://creativechaos.io", "Digital Agency"),
            ] },
            CitySeed { name: "Islamabad", records: &[
                seed("PTCL", "info@ptcl.com.pk", "+92-51-34567890", "Blue Area, Islamabad", "https://ptcl.com.pk", "Telecommunications"),
            ] },
        ],
    },
    CategorySeed {
        name: "Marketing & Advertising",
        related_types: &[
            "Digital Marketing", "SEO Agency", "Social Media Marketing", "Content Marketing",
            "PPC Advertising", "Branding Agency", "Creative Agency", "Marketing Consultancy",
            "Lead Generation", "Email Marketing", "Influencer Marketing", "PR Agency",
        ],
        cities: &[
            CitySeed { name: "Karachi", records: &[
                seed("Digital Marketing Pro", "contact@digitalmarketingpro.com", "+92-21-34567893", "Defence, Karachi", "https://digitalmarketingpro.com", "Digital Marketing"),
            ] },
            CitySeed { name: "Lahore", records: &[
                seed("Lahore Marketing Agency", "info@lahoremarketing.com", "+92-42-34567892", "Gulberg, Lahore", "https://lahoremarketing.com", "Marketing Consultancy"),
            ] },
        ],
    },
    CategorySeed {
        name: "Food & Hospitality",
        related_types: &[
            "Restaurant", "Fast Food", "Cafe", "Bakery", "Catering", "Food Delivery", "Hotel",
            "Guest House", "Travel Agency", "Tourism", "Event Management", "Wedding Services",
            "Party Planning", "Food Truck", "Street Food",
        ],
        cities: &[
            CitySeed { name: "Karachi", records: &[
                seed("BBQ Tonight", "info@bbqtonight.com", "+92-21-34567894", "Clifton, Karachi", "https://bbqtonight.com", "Restaurant"),
            ] },
            CitySeed { name: "Lahore", records: &[
                seed("Butt Karahi", "info@buttkarahi.com", "+92-42-34567893", "Mall Road, Lahore", "https://buttkarahi.com", "Restaurant"),
            ] },
        ],
    },
    CategorySeed {
        name: "Healthcare & Medical",
        related_types: &[
            "Hospital", "Clinic", "Pharmacy", "Dental Care", "Eye Care", "Physiotherapy",
            "Fitness Center", "Gym", "Yoga Studio", "Medical Equipment", "Health Insurance",
            "Telemedicine", "Laboratory", "Diagnostic Center", "Specialist Doctor",
        ],
        cities: &[
            CitySeed { name: "Karachi", records: &[
                seed("Aga Khan Hospital", "info@agakhanhospital.org", "+92-21-34567895", "Stadium Road, Karachi", "https://agakhanhospital.org", "Hospital"),
            ] },
            CitySeed { name: "Lahore", records: &[
                seed("Shaukat Khanum Hospital", "info@shaukatkhanum.org.pk", "+92-42-34567894", "Johar Town, Lahore", "https://shaukatkhanum.org.pk", "Hospital"),
            ] },
        ],
    },
    CategorySeed {
        name: "Education & Training",
        related_types: &[
            "School", "College", "University", "Training Institute", "Language Center",
            "Computer Training", "Professional Development", "Online Learning", "Tutoring",
            "Skill Development", "Certification Center", "Workshop Provider", "E-Learning",
        ],
        cities: &[
            CitySeed { name: "Karachi", records: &[
                seed("IBA Karachi", "info@iba.edu.pk", "+92-21-34567896", "Karachi University, Karachi", "https://iba.edu.pk", "University"),
            ] },
            CitySeed { name: "Lahore", records: &[
                seed("LUMS", "info@lums.edu.pk", "+92-42-34567895", "DHA, Lahore", "https://lums.edu.pk", "University"),
            ] },
        ],
    },
    CategorySeed {
        name: "Real Estate & Construction",
        related_types: &[
            "Property Development", "Real Estate Agency", "Construction Company",
            "Architecture Firm", "Interior Design", "Property Management",
            "Building Materials", "Home Renovation", "Property Investment", "Land Development",
            "Commercial Real Estate", "Residential Projects",
        ],
        cities: &[
            CitySeed { name: "Karachi", records: &[
                seed("Bahria Town", "info@bahriatown.com", "+92-21-34567897", "Defence, Karachi", "https://bahriatown.com", "Property Development"),
            ] },
            CitySeed { name: "Lahore", records: &[
                seed("DHA", "info@dha.com.pk", "+92-42-34567896", "DHA, Lahore", "https://dha.com.pk", "Property Development"),
            ] },
        ],
    },
    CategorySeed {
        name: "Automotive & Transport",
        related_types: &[
            "Car Dealership", "Auto Repair", "Car Wash", "Auto Parts", "Motorcycle Shop",
            "Tire Shop", "Auto Insurance", "Car Rental", "Auto Service", "Transport Company",
            "Logistics", "Freight Forwarding", "Warehousing", "Supply Chain",
        ],
        cities: &[
            CitySeed { name: "Karachi", records: &[
                seed("Toyota Pakistan", "info@toyota.com.pk", "+92-21-34567898", "Defence, Karachi", "https://toyota.com.pk", "Car Dealership"),
            ] },
            CitySeed { name: "Lahore", records: &[
                seed("Honda Pakistan", "info@honda.com.pk", "+92-42-34567897", "Gulberg, Lahore", "https://honda.com.pk", "Car Dealership"),
            ] },
        ],
    },
    CategorySeed {
        name: "Banking & Finance",
        related_types: &[
            "Bank", "Insurance Company", "Investment Firm", "Financial Planning",
            "Accounting Firm", "Tax Services", "Microfinance", "Credit Union",
            "Stock Brokerage", "Financial Advisory", "Loan Services", "Credit Card",
            "Payment Gateway", "Fintech Company",
        ],
        cities: &[
            CitySeed { name: "Karachi", records: &[
                seed("HBL", "info@hbl.com", "+92-21-34567899", "I.I. Chundrigar Road, Karachi", "https://hbl.com", "Bank"),
            ] },
            CitySeed { name: "Lahore", records: &[
                seed("UBL", "info@ubl.com.pk", "+92-42-34567898", "Gulberg, Lahore", "https://ubl.com.pk", "Bank"),
            ] },
        ],
    },
    CategorySeed {
        name: "Legal & Professional Services",
        related_types: &[
            "Law Firm", "Legal Consultancy", "Audit Services", "HR Services",
            "Business Consulting", "Management Consulting", "Strategy Consulting",
            "Risk Management", "Compliance Services", "Corporate Law", "Criminal Law",
            "Family Law", "Property Law",
        ],
        cities: &[
            CitySeed { name: "Karachi", records: &[
                seed("Karachi Law Associates", "info@karachilaw.com", "+92-21-34567900", "Clifton, Karachi", "https://karachilaw.com", "Law Firm"),
            ] },
            CitySeed { name: "Lahore", records: &[
                seed("Lahore Legal Services", "info@lahorelegal.com", "+92-42-34567899", "Gulberg, Lahore", "https://lahorelegal.com", "Legal Consultancy"),
            ] },
        ],
    },
    CategorySeed {
        name: "Retail & Shopping",
        related_types: &[
            "Fashion Store", "Electronics Store", "Furniture Store", "Jewelry Store",
            "Cosmetics Store", "Book Store", "Sports Equipment", "Home Decor", "Grocery Store",
            "Supermarket", "Department Store", "Online Retail", "Franchise Store",
            "Specialty Shop",
        ],
        cities: &[
            CitySeed { name: "Karachi", records: &[
                seed("Karachi Fashion Hub", "info@karachifashion.com", "+92-21-34567901", "Saddar, Karachi", "https://karachifashion.com", "Fashion Store"),
            ] },
            CitySeed { name: "Lahore", records: &[
                seed("Lahore Electronics", "info@lahoreelectronics.com", "+92-42-34567900", "Mall Road, Lahore", "https://lahoreelectronics.com", "Electronics Store"),
            ] },
        ],
    },
    CategorySeed {
        name: "Manufacturing & Industry",
        related_types: &[
            "Textile Manufacturing", "Food Processing", "Chemical Manufacturing",
            "Steel Industry", "Cement Industry", "Pharmaceutical Manufacturing",
            "Electronics Manufacturing", "Automotive Manufacturing", "Furniture Manufacturing",
            "Plastic Industry", "Paper Industry", "Leather Industry", "Glass Industry",
            "Ceramic Industry",
        ],
        cities: &[
            CitySeed { name: "Karachi", records: &[
                seed("Karachi Textile Mills", "info@karachitextile.com", "+92-21-34567902", "Industrial Area, Karachi", "https://karachitextile.com", "Textile Manufacturing"),
            ] },
            CitySeed { name: "Lahore", records: &[
                seed("Lahore Steel Works", "info@lahoresteel.com", "+92-42-34567901", "Industrial Estate, Lahore", "https://lahoresteel.com", "Steel Industry"),
            ] },
        ],
    },
    CategorySeed {
        name: "Media & Entertainment",
        related_types: &[
            "TV Channel", "Radio Station", "Newspaper", "Magazine", "Production House",
            "Film Studio", "Music Label", "Event Management", "Gaming Company",
            "Streaming Service", "Content Creation", "Podcast Studio", "Animation Studio",
            "Digital Media",
        ],
        cities: &[
            CitySeed { name: "Karachi", records: &[
                seed("Karachi Media Group", "info@karachimedia.com", "+92-21-34567903", "Clifton, Karachi", "https://karachimedia.com", "Media Group"),
            ] },
            CitySeed { name: "Lahore", records: &[
                seed("Lahore Productions", "info@lahoreproductions.com", "+92-42-34567902", "Gulberg, Lahore", "https://lahoreproductions.com", "Production House"),
            ] },
        ],
    },
    CategorySeed {
        name: "Beauty & Wellness",
        related_types: &[
            "Beauty Salon", "Spa", "Hair Salon", "Nail Salon", "Makeup Artist",
            "Beauty Products", "Skincare Clinic", "Hair Transplant", "Dental Clinic",
            "Cosmetic Surgery", "Fitness Center", "Yoga Studio", "Wellness Center",
        ],
        cities: &[
            CitySeed { name: "Karachi", records: &[
                seed("Karachi Beauty Salon", "info@karachibeauty.com", "+92-21-34567904", "Defence, Karachi", "https://karachibeauty.com", "Beauty Salon"),
            ] },
            CitySeed { name: "Lahore", records: &[
                seed("Lahore Spa & Wellness", "info@lahorespa.com", "+92-42-34567903", "DHA, Lahore", "https://lahorespa.com", "Spa & Wellness"),
            ] },
        ],
    },
    CategorySeed {
        name: "Sports & Recreation",
        related_types: &[
            "Sports Club", "Gym", "Swimming Pool", "Tennis Court", "Golf Club",
            "Cricket Academy", "Football Academy", "Martial Arts", "Adventure Sports",
            "Sports Equipment", "Fitness Training", "Personal Trainer", "Sports Medicine",
        ],
        cities: &[
            CitySeed { name: "Karachi", records: &[
                seed("Karachi Sports Club", "info@karachisports.com", "+92-21-34567905", "Clifton, Karachi", "https://karachisports.com", "Sports Club"),
            ] },
            CitySeed { name: "Lahore", records: &[
                seed("Lahore Fitness Center", "info@lahorefitness.com", "+92-42-34567904", "Gulberg, Lahore", "https://lahorefitness.com", "Fitness Center"),
            ] },
        ],
    },
    CategorySeed {
        name: "Travel & Tourism",
        related_types: &[
            "Travel Agency", "Tour Operator", "Hotel", "Resort", "Guest House", "Tour Guide",
            "Transport Service", "Adventure Tourism", "Cultural Tours", "Pilgrimage Tours",
            "Business Travel", "Luxury Travel", "Budget Travel",
        ],
        cities: &[
            CitySeed { name: "Karachi", records: &[
                seed("Karachi Travel Services", "info@karachitravel.com", "+92-21-34567906", "Saddar, Karachi", "https://karachitravel.com", "Travel Agency"),
            ] },
            CitySeed { name: "Lahore", records: &[
                seed("Lahore Tourism", "info@lahoretourism.com", "+92-42-34567905", "Mall Road, Lahore", "https://lahoretourism.com", "Tour Operator"),
            ] },
        ],
    },
];

#[derive(Debug, Clone, Copy)]
pub struct VerifiedDataset {
    seeds: &'static [CategorySeed],
}

impl Default for VerifiedDataset {
    fn default() -> Self {
        VerifiedDataset { seeds: VERIFIED_BUSINESSES }
    }
}

impl VerifiedDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn categories(&self) -> Vec<&'static str> {
        self.seeds.iter().map(|c| c.name).collect()
    }

    pub fn cities(&self) -> Vec<&'static str> {
        let mut cities: Vec<&'static str> = self
            .seeds
            .iter()
            .flat_map(|c| c.cities.iter().map(|city| city.name))
            .collect();
        cities.sort_unstable();
        cities.dedup();
        cities
    }

    pub fn related_types(&self, category: &str) -> &'static [&'static str] {
        self.find(category).map(|c| c.related_types).unwrap_or(&[])
    }

    /// Maps a requested category ("Healthcare", "finance", "Restaurant") onto a dataset key.
    pub fn resolve_category(&self, query: &str) -> Option<&'static str> {
        self.find(query).map(|c| c.name)
    }

    /// Copies of the stored records for (category, city). Unknown keys give an empty list.
    pub fn lookup(&self, category: &str, city: &str) -> Vec<BusinessRecord> {
        let Some(category_seed) = self.find(category) else {
            return Vec::new();
        };
        let Some(city_seed) = category_seed
            .cities
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(city.trim()))
        else {
            return Vec::new();
        };

        city_seed
            .records
            .iter()
            .map(|s| to_record(s, category_seed.name, city_seed.name))
            .collect()
    }

    /// Same as `lookup`, re-tagged as fallback data and truncated to `count`.
    pub fn fallback(&self, category: &str, city: &str, count: usize) -> Vec<BusinessRecord> {
        let mut records = self.lookup(category, city);
        records.truncate(count);
        for record in &mut records {
            record.source = Source::VerifiedFallback;
        }
        records
    }

    fn find(&self, query: &str) -> Option<&'static CategorySeed> {
        let q = normalize(query);
        if q.is_empty() {
            return None;
        }
        let seeds = self.seeds;

        if let Some(c) = seeds.iter().find(|c| normalize(c.name) == q) {
            return Some(c);
        }
        if let Some(c) = seeds.iter().find(|c| normalize(c.name).contains(&q)) {
            return Some(c);
        }
        if let Some(c) = seeds
            .iter()
            .find(|c| words(c.name).iter().any(|w| word_prefix_match(w, &q)))
        {
            return Some(c);
        }
        seeds.iter().find(|c| {
            c.related_types
                .iter()
                .any(|t| normalize(t) == q || words(t).iter().any(|w| *w == q))
        })
    }
}

fn words(value: &str) -> Vec<String> {
    value
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

// "transportation" matches "transport", "finance" matches "finance".
fn word_prefix_match(word: &str, query: &str) -> bool {
    const MIN_PREFIX: usize = 4;
    if word == query {
        return true;
    }
    let (short, long) = if word.len() <= query.len() { (word, query) } else { (query, word) };
    short.len() >= MIN_PREFIX && long.starts_with(short)
}

fn to_record(seed: &Seed, category: &str, city: &str) -> BusinessRecord {
    let mut record = BusinessRecord::new(seed.name, Source::VerifiedDatabase);
    record.email = Some(seed.email.to_string());
    record.phone = Some(seed.phone.to_string());
    record.address = Some(seed.address.to_string());
    record.website = Some(seed.website.to_string());
    record.business_type = Some(seed.business_type.to_string());
    record.category = Some(category.to_string());
    record.city = Some(city.to_string());
    record.into_verified()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_fifteen_categories() {
        let dataset = VerifiedDataset::new();
        assert_eq!(dataset.categories().len(), 15);
        assert!(dataset.cities().contains(&"Karachi"));
        assert!(dataset.cities().contains(&"Islamabad"));
    }

    #[test]
    fn lookup_returns_verified_copies() {
        let dataset = VerifiedDataset::new();
        let mut first = dataset.lookup("Technology", "Karachi");
        assert_eq!(first.len(), 3);
        assert!(first.iter().all(|r| r.is_verified() && r.source == Source::VerifiedDatabase));

        first[0].name = "mutated".into();
        let second = dataset.lookup("Technology", "Karachi");
        assert_eq!(second[0].name, "Arpatech");
    }

    #[test]
    fn unknown_keys_yield_empty() {
        let dataset = VerifiedDataset::new();
        assert!(dataset.lookup("Technology", "Atlantis").is_empty());
        assert!(dataset.lookup("Underwater Basket Weaving", "Karachi").is_empty());
        assert!(dataset.lookup("", "Karachi").is_empty());
    }

    #[test]
    fn short_category_names_resolve() {
        let dataset = VerifiedDataset::new();
        assert_eq!(dataset.resolve_category("Healthcare"), Some("Healthcare & Medical"));
        assert_eq!(dataset.resolve_category("finance"), Some("Banking & Finance"));
        assert_eq!(dataset.resolve_category("Real Estate"), Some("Real Estate & Construction"));
        assert_eq!(dataset.resolve_category("Transportation"), Some("Automotive & Transport"));
        assert_eq!(dataset.resolve_category("Restaurant"), Some("Food & Hospitality"));
        assert_eq!(dataset.resolve_category("zz"), None);
    }

    #[test]
    fn fallback_retags_and_truncates() {
        let dataset = VerifiedDataset::new();
        let records = dataset.fallback("Healthcare", "Lahore", 5);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Shaukat Khanum Hospital");
        assert_eq!(records[0].email.as_deref(), Some("info@shaukatkhanum.org.pk"));
        assert_eq!(records[0].source, Source::VerifiedFallback);
        assert!(records[0].is_verified());

        assert_eq!(dataset.fallback("Technology", "Karachi", 2).len(), 2);
    }

    #[test]
    fn related_types_follow_resolution() {
        let dataset = VerifiedDataset::new();
        assert!(dataset.related_types("Technology").contains(&"Software House"));
        assert!(dataset.related_types("nothing here").is_empty());
    }
}

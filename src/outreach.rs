use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::OutreachIdentity;
use crate::gemini::TextGenerator;
use crate::model::BusinessRecord;

const BOILERPLATE_PREFIXES: [&str; 7] = [
    "Of course.",
    "Here is a professional email:",
    "Here's a professional email:",
    "I'll help you create a professional email:",
    "Here's a personalized email:",
    "Here's a professional outreach email:",
    "Here's a personalized outreach email:",
];
const CLOSINGS: [&str; 3] = ["Best regards,", "Sincerely,", "Thank you,"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    Generated,
    FallbackGenerated,
}

/// One outreach email ready to be sent or saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedEmail {
    pub business_name: String,
    pub business_type: String,
    pub email: String,
    pub city: String,
    pub generated_email: String,
    pub status: GenerationStatus,
}

/// Writes personalized invitation emails, through a text model when one is
/// configured and from a fixed template otherwise.
pub struct OutreachWriter {
    model: Option<Box<dyn TextGenerator>>,
    identity: OutreachIdentity,
}

impl OutreachWriter {
    pub fn new(model: Option<Box<dyn TextGenerator>>, identity: OutreachIdentity) -> Self {
        OutreachWriter { model, identity }
    }

    pub fn template_only(identity: OutreachIdentity) -> Self {
        OutreachWriter { model: None, identity }
    }

    pub fn identity(&self) -> &OutreachIdentity {
        &self.identity
    }

    pub fn prompt(&self, business: &BusinessRecord) -> String {
        let id = &self.identity;
        format!(
            "Generate a professional, personalized outreach email for a business listing service.\n\n\
             Business Details:\n\
             - Name: {name}\n\
             - Type: {kind}\n\
             - Location: {city}\n\n\
             Requirements:\n\
             1. Start with \"Dear {name} Team,\"\n\
             2. Introduce yourself as {sender} from {company}\n\
             3. Explain the benefits of listing their business in Pakistan's leading business directory\n\
             4. Mention specific benefits like increased visibility, customer reach, and business growth\n\
             5. Include your contact information: {email}, {site}, {phone}\n\
             6. Ask them to register using: {signup}\n\
             7. Keep it professional, polite, and under 150 words\n\
             8. Make it specific to their business type and location\n\
             9. End with a professional closing\n\n\
             Generate ONLY the email content, no explanations or additional text.",
            name = business.name,
            kind = business_type(business),
            city = business.display_city(),
            sender = id.sender_name,
            company = id.company,
            email = id.contact_email,
            site = id.website,
            phone = id.phone,
            signup = id.signup_url,
        )
    }

    /// Email body for one business and whether the model wrote it.
    pub fn write(&self, business: &BusinessRecord) -> (String, GenerationStatus) {
        let Some(model) = self.model.as_deref() else {
            return (self.template(business), GenerationStatus::FallbackGenerated);
        };

        match model.generate(&self.prompt(business)) {
            Ok(text) => {
                info!("Generated personalized email for {}", business.name);
                (self.clean(&text, &business.name), GenerationStatus::Generated)
            }
            Err(e) => {
                error!("Error generating email for {}: {}", business.name, e);
                (self.template(business), GenerationStatus::FallbackGenerated)
            }
        }
    }

    pub fn write_bulk(&self, businesses: &[BusinessRecord]) -> Vec<GeneratedEmail> {
        info!("Generating personalized emails for {} businesses...", businesses.len());
        if self.model.is_none() {
            warn!("No text generation model configured, using the template for every email");
        }

        let emails: Vec<GeneratedEmail> = businesses
            .iter()
            .enumerate()
            .map(|(i, business)| {
                let (body, status) = self.write(business);
                info!("Prepared email {}/{} for {}", i + 1, businesses.len(), business.name);
                GeneratedEmail {
                    business_name: business.name.clone(),
                    business_type: business_type(business),
                    email: business.email.clone().unwrap_or_default(),
                    city: business.display_city(),
                    generated_email: body,
                    status,
                }
            })
            .collect();

        info!("Successfully generated {} emails", emails.len());
        emails
    }

    /// Strips chatty preambles and markdown, then makes sure the greeting and
    /// closing are present.
    pub fn clean(&self, content: &str, business_name: &str) -> String {
        let mut cleaned = content.trim().to_string();
        for prefix in BOILERPLATE_PREFIXES {
            if let Some(rest) = cleaned.strip_prefix(prefix) {
                cleaned = rest.trim().to_string();
            }
        }
        cleaned = cleaned.replace('*', "");

        let greeting = format!("Dear {} Team,", business_name);
        if !cleaned.starts_with(&greeting) {
            cleaned = format!("{}\n\n{}", greeting, cleaned);
        }

        let trimmed_end = cleaned.trim_end();
        if !CLOSINGS.iter().any(|c| trimmed_end.ends_with(c)) {
            cleaned.push_str(&format!("\n\nBest regards,\n{}\n{} Team", self.identity.sender_name, self.identity.company));
        }
        cleaned.trim().to_string()
    }

    pub fn template(&self, business: &BusinessRecord) -> String {
        let id = &self.identity;
        let city = business.display_city();
        format!(
            "Dear {name} Team,\n\n\
             I hope this email finds you well. My name is {sender}, and I'm reaching out from {company}, \
             Pakistan's leading business directory platform.\n\n\
             I noticed your {kind} business in {city} and believe you would greatly benefit from listing with us. \
             Our platform offers:\n\n\
             • Increased online visibility and customer reach\n\
             • Professional business profile with contact details\n\
             • Integration with our extensive network of potential customers\n\
             • Enhanced credibility and trust among local consumers\n\n\
             We would love to help showcase your business to our growing community of users looking for quality \
             services in {city}.\n\n\
             To get started, please visit: {signup}\n\n\
             If you have any questions, feel free to reach out to me directly at {email} or call {phone}.\n\n\
             Looking forward to partnering with you!\n\n\
             Best regards,\n\
             {sender}\n\
             {company} Team\n\
             {email} | {site} | {phone}",
            name = business.name,
            kind = business_type(business),
            city = city,
            sender = id.sender_name,
            company = id.company,
            email = id.contact_email,
            site = id.website,
            phone = id.phone,
            signup = id.signup_url,
        )
    }
}

fn business_type(business: &BusinessRecord) -> String {
    business
        .business_type
        .clone()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| "Business".to_string())
}

use std::time::Duration;

use log::{debug, info};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::error::LeadError;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Free-text generation from a prompt.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String, LeadError>;

    fn model_name(&self) -> &str;
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

/// Google Gemini `generateContent` over blocking HTTP.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, LeadError> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        let model = model.into();
        info!("Gemini client initialized with model {}", model);
        Ok(GeminiClient { client, api_key: api_key.into(), model })
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent?key={}", API_BASE, self.model, self.api_key)
    }
}

impl TextGenerator for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<String, LeadError> {
        debug!("Sending {} character prompt to {}", prompt.len(), self.model);
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let resp = self.client.post(self.endpoint()).json(&body).send()?;
        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().unwrap_or_default();
            return Err(LeadError::Generation(format!("HTTP {}: {}", status, detail)));
        }

        let parsed: GenerateResponse = resp.json()?;
        response_text(parsed)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn response_text(parsed: GenerateResponse) -> Result<String, LeadError> {
    let text: String = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        Err(LeadError::Generation("empty response from model".to_string()))
    } else {
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_read_from_first_candidate() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"Hello "},{"text":"there"}]}}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response_text(parsed).unwrap(), "Hello there");
    }

    #[test]
    fn blocked_or_empty_responses_are_errors() {
        let parsed: GenerateResponse = serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert!(matches!(response_text(parsed), Err(LeadError::Generation(_))));

        let parsed: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(response_text(parsed).is_err());
    }

    #[test]
    fn endpoint_includes_model_and_key() {
        let client = GeminiClient::new("k123", "gemini-1.5-flash").unwrap();
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent?key=k123"
        );
        assert_eq!(client.model_name(), "gemini-1.5-flash");
    }
}

use std::time::Duration;

use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::OutreachIdentity;
use crate::delay_manager;
use crate::error::LeadError;
use crate::outreach::GeneratedEmail;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivers one message. SMTP lives behind this seam.
pub trait MailTransport {
    fn send(&self, mail: &OutgoingMail) -> Result<(), LeadError>;
}

/// Dry-run transport: logs every message and reports success.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTransport;

impl MailTransport for LogTransport {
    fn send(&self, mail: &OutgoingMail) -> Result<(), LeadError> {
        info!("[dry run] {} -> {}: {} ({} chars)", mail.from, mail.to, mail.subject, mail.body.len());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendStatus {
    Sent,
    Failed,
    Skipped,
}

impl SendStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SendStatus::Sent => "sent",
            SendStatus::Failed => "failed",
            SendStatus::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendResult {
    pub business_name: String,
    pub email: String,
    pub status: SendStatus,
    pub message: String,
    pub business_type: String,
    pub city: String,
}

pub struct Mailer<T: MailTransport> {
    transport: T,
    identity: OutreachIdentity,
    delay: Duration,
}

impl<T: MailTransport> Mailer<T> {
    pub fn new(transport: T, identity: OutreachIdentity, delay: Duration) -> Self {
        Mailer { transport, identity, delay }
    }

    pub fn compose(&self, email: &GeneratedEmail) -> OutgoingMail {
        OutgoingMail {
            from: format!("{} - {} <{}>", self.identity.sender_name, self.identity.company, self.identity.contact_email),
            to: email.email.clone(),
            subject: format!("{} - {}", self.identity.subject_prefix, email.business_name),
            body: email.generated_email.clone(),
        }
    }

    /// Sends every email in order. Entries without an address or body are
    /// skipped; transport errors are recorded as failures.
    pub fn send_bulk(&self, emails: &[GeneratedEmail]) -> Vec<SendResult> {
        info!("Starting bulk email campaign for {} recipients...", emails.len());
        let mut results = Vec::with_capacity(emails.len());
        let (mut sent, mut failed) = (0, 0);

        for (i, email) in emails.iter().enumerate() {
            let result = |status: SendStatus, message: String| SendResult {
                business_name: email.business_name.clone(),
                email: email.email.clone(),
                status,
                message,
                business_type: email.business_type.clone(),
                city: email.city.clone(),
            };

            if email.email.trim().is_empty() || email.generated_email.trim().is_empty() {
                warn!("Skipping email {} - missing email or content", i + 1);
                results.push(result(SendStatus::Skipped, "Missing email or content".to_string()));
                failed += 1;
                continue;
            }

            match self.transport.send(&self.compose(email)) {
                Ok(()) => {
                    sent += 1;
                    info!("Email {}/{} sent to {}", i + 1, emails.len(), email.business_name);
                    results.push(result(SendStatus::Sent, "Email sent successfully".to_string()));
                }
                Err(e) => {
                    failed += 1;
                    error!("Email {}/{} failed for {}: {}", i + 1, emails.len(), email.business_name, e);
                    results.push(result(SendStatus::Failed, e.to_string()));
                }
            }
            delay_manager::fixed_delay(self.delay);
        }

        info!("Bulk email campaign completed: {} sent, {} failed, {} total", sent, failed, emails.len());
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outreach::GenerationStatus;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        sent: RefCell<Vec<OutgoingMail>>,
        reject: Option<&'static str>,
    }

    impl MailTransport for Recorder {
        fn send(&self, mail: &OutgoingMail) -> Result<(), LeadError> {
            if self.reject == Some(mail.to.as_str()) {
                return Err(LeadError::Mail(format!("Recipient email rejected: {}", mail.to)));
            }
            self.sent.borrow_mut().push(mail.clone());
            Ok(())
        }
    }

    fn email(name: &str, address: &str, body: &str) -> GeneratedEmail {
        GeneratedEmail {
            business_name: name.to_string(),
            business_type: "Hospital".to_string(),
            email: address.to_string(),
            city: "Lahore".to_string(),
            generated_email: body.to_string(),
            status: GenerationStatus::Generated,
        }
    }

    #[test]
    fn bulk_send_records_every_outcome() {
        let transport = Recorder { reject: Some("bad@reject.pk"), ..Recorder::default() };
        let mailer = Mailer::new(transport, OutreachIdentity::default(), Duration::ZERO);
        let results = mailer.send_bulk(&[
            email("Shaukat Khanum Hospital", "info@shaukatkhanum.org.pk", "Dear team"),
            email("No Address", "", "Dear team"),
            email("Rejected", "bad@reject.pk", "Dear team"),
            email("No Body", "info@nobody.pk", "  "),
        ]);

        let statuses: Vec<SendStatus> = results.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![SendStatus::Sent, SendStatus::Skipped, SendStatus::Failed, SendStatus::Skipped]
        );
        assert!(results[2].message.contains("bad@reject.pk"));
        assert_eq!(mailer.transport.sent.borrow().len(), 1);
    }

    #[test]
    fn subject_and_sender_use_identity() {
        let mailer = Mailer::new(LogTransport, OutreachIdentity::default(), Duration::ZERO);
        let mail = mailer.compose(&email("Butt Karahi", "info@buttkarahi.com", "Hi"));
        assert_eq!(mail.subject, "Join Reviu.pk - Pakistan's Leading Business Directory - Butt Karahi");
        assert_eq!(mail.from, "Zaid - Reviu.pk <info@reviu.pk>");
        assert!(LogTransport.send(&mail).is_ok());
    }
}

//! Sending the rendered schedule by email.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use thiserror::Error;
use tracing::{info, warn};

use crate::error::{DashboardError, DeliveryError};
use crate::report::escape_html;

/// Token in the body template replaced by each recipient's display name.
pub const RECIPIENT_PLACEHOLDER: &str = "{recipient_name}";

const DEFAULT_RECIPIENT_NAME: &str = "Utente";

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("email pattern is valid")
});

pub fn is_valid_email(address: &str) -> bool {
    EMAIL_PATTERN.is_match(address.trim())
}

/// Splits a comma-separated list of addresses, dropping blanks.
pub fn parse_address_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("could not open mail session: {0}")]
    Connect(String),
    #[error("invalid address {0}")]
    Address(String),
    #[error("could not build message: {0}")]
    Message(String),
    #[error("{0}")]
    Send(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub filename: String,
    pub content: Vec<u8>,
}

/// One personalised message, ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub attachment: Option<Attachment>,
}

/// Outbound mail session reused across one batch.
#[async_trait]
pub trait MailTransport: Send {
    /// Opens and authenticates the session.
    async fn connect(&mut self) -> Result<(), TransportError>;

    async fn deliver(&mut self, email: &OutgoingEmail) -> Result<(), TransportError>;
}

/// Name→address directory plus its inverse, built once per send.
#[derive(Debug, Default, Clone)]
pub struct RecipientDirectory {
    by_name: BTreeMap<String, String>,
    by_address: HashMap<String, String>,
}

impl RecipientDirectory {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        let by_address = entries
            .iter()
            .map(|(name, address)| (address.trim().to_string(), name.clone()))
            .collect();
        Self {
            by_name: entries,
            by_address,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    pub fn address_of(&self, name: &str) -> Result<&str, DashboardError> {
        self.by_name
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| DashboardError::Validation(format!("unknown recipient '{name}'")))
    }

    pub fn name_for(&self, address: &str) -> Option<&str> {
        self.by_address.get(address.trim()).map(String::as_str)
    }

    /// Addresses for the selected names followed by the free-text ones.
    pub fn select(&self, names: &[String], extra: &str) -> Result<Vec<String>, DashboardError> {
        let mut recipients = names
            .iter()
            .map(|name| self.address_of(name).map(str::to_string))
            .collect::<Result<Vec<_>, _>>()?;
        recipients.extend(parse_address_list(extra));
        Ok(recipients)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchFailure {
    NoValidRecipients,
    Connection(String),
    AllFailed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchReport {
    pub failure: Option<DispatchFailure>,
    pub summary: String,
    pub successful: Vec<String>,
    pub failed: Vec<DeliveryError>,
    pub invalid: Vec<String>,
}

impl DispatchReport {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Anything beyond a clean send worth listing per address.
    pub fn has_details(&self) -> bool {
        !self.failed.is_empty() || !self.invalid.is_empty()
    }
}

pub struct Dispatch<'a> {
    pub recipients: &'a [String],
    pub subject: &'a str,
    pub html_template: &'a str,
    pub attachment: Option<Attachment>,
    pub directory: &'a RecipientDirectory,
}

pub async fn dispatch<T: MailTransport>(
    transport: &mut T,
    request: Dispatch<'_>,
) -> DispatchReport {
    let (valid, invalid): (Vec<String>, Vec<String>) = request
        .recipients
        .iter()
        .map(|address| address.trim().to_string())
        .partition(|address| is_valid_email(address));

    for address in &invalid {
        warn!(%address, "skipping invalid address");
    }

    if valid.is_empty() {
        return DispatchReport {
            failure: Some(DispatchFailure::NoValidRecipients),
            summary: "No valid email address found.".to_string(),
            successful: Vec::new(),
            failed: Vec::new(),
            invalid,
        };
    }

    if let Err(err) = transport.connect().await {
        warn!(error = %err, "mail session could not be established");
        return DispatchReport {
            failure: Some(DispatchFailure::Connection(err.to_string())),
            summary: format!("Connection error: {err}"),
            successful: Vec::new(),
            failed: Vec::new(),
            invalid,
        };
    }

    let mut successful = Vec::new();
    let mut failed = Vec::new();

    for address in valid {
        let name = request
            .directory
            .name_for(&address)
            .unwrap_or(DEFAULT_RECIPIENT_NAME);
        let email = OutgoingEmail {
            to: address.clone(),
            subject: request.subject.to_string(),
            html_body: request
                .html_template
                .replace(RECIPIENT_PLACEHOLDER, &escape_html(name)),
            attachment: request.attachment.clone(),
        };

        match transport.deliver(&email).await {
            Ok(()) => {
                info!(%address, "email delivered");
                successful.push(address);
            }
            Err(err) => {
                warn!(%address, error = %err, "email delivery failed");
                failed.push(DeliveryError {
                    address,
                    cause: err.to_string(),
                });
            }
        }
    }

    let summary = summarize(successful.len(), failed.len(), invalid.len());
    DispatchReport {
        failure: successful.is_empty().then_some(DispatchFailure::AllFailed),
        summary,
        successful,
        failed,
        invalid,
    }
}

fn summarize(sent: usize, failed: usize, invalid: usize) -> String {
    if sent == 0 {
        return "Delivery failed for every recipient.".to_string();
    }
    if failed == 0 && invalid == 0 {
        let noun = if sent == 1 { "recipient" } else { "recipients" };
        return format!("Email sent to {sent} {noun}.");
    }

    let mut parts = vec![format!("sent: {sent}")];
    if failed > 0 {
        parts.push(format!("failed: {failed}"));
    }
    if invalid > 0 {
        parts.push(format!("invalid: {invalid}"));
    }
    parts.join(" | ")
}

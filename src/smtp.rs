use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment as MailAttachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::PoolConfig;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::config::EmailSettings;
use crate::mailer::{MailTransport, OutgoingEmail, TransportError};

/// STARTTLS SMTP session authenticated with the sender's credentials.
pub struct SmtpMailer {
    settings: EmailSettings,
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl SmtpMailer {
    pub fn new(settings: EmailSettings) -> Self {
        Self {
            settings,
            transport: None,
        }
    }

    fn sender(&self) -> Result<Mailbox, TransportError> {
        self.settings
            .sender_email
            .parse()
            .map_err(|_| TransportError::Address(self.settings.sender_email.clone()))
    }

    fn build_message(&self, email: &OutgoingEmail) -> Result<Message, TransportError> {
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|_| TransportError::Address(email.to.clone()))?;

        let mut body = MultiPart::mixed().singlepart(SinglePart::html(email.html_body.clone()));
        if let Some(attachment) = &email.attachment {
            let content_type = ContentType::parse("application/octet-stream")
                .map_err(|e| TransportError::Message(e.to_string()))?;
            body = body.singlepart(
                MailAttachment::new(attachment.filename.clone())
                    .body(attachment.content.clone(), content_type),
            );
        }

        Message::builder()
            .from(self.sender()?)
            .to(to)
            .subject(email.subject.as_str())
            .multipart(body)
            .map_err(|e| TransportError::Message(e.to_string()))
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn connect(&mut self) -> Result<(), TransportError> {
        self.sender()?;
        let credentials = Credentials::new(
            self.settings.sender_email.clone(),
            self.settings.sender_password.clone(),
        );
        let transport =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.settings.smtp_server)
                .map_err(|e| TransportError::Connect(e.to_string()))?
                .port(self.settings.smtp_port)
                .credentials(credentials)
                .pool_config(PoolConfig::new().max_size(1))
                .build();

        match transport.test_connection().await {
            Ok(true) => {}
            Ok(false) => {
                return Err(TransportError::Connect(format!(
                    "{} did not accept the session",
                    self.settings.smtp_server
                )))
            }
            Err(e) => return Err(TransportError::Connect(e.to_string())),
        }

        info!(
            server = %self.settings.smtp_server,
            port = self.settings.smtp_port,
            "mail session ready"
        );
        self.transport = Some(transport);
        Ok(())
    }

    async fn deliver(&mut self, email: &OutgoingEmail) -> Result<(), TransportError> {
        let message = self.build_message(email)?;
        let transport = self
            .transport
            .as_ref()
            .ok_or_else(|| TransportError::Connect("session not established".to_string()))?;
        transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| TransportError::Send(e.to_string()))
    }
}

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use parkeasy_core::notify::{Notification, Notifier};
use tracing::info;

use crate::app_config::SmtpConfig;

type SendResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Delivers notifications over SMTP.
#[derive(Clone)]
pub struct SmtpNotifier {
    host: String,
    port: u16,
    credentials: Credentials,
    from: String,
}

impl SmtpNotifier {
    /// `None` when the config carries no credentials.
    pub fn from_config(config: &SmtpConfig) -> Option<Self> {
        let (username, password) = config.credentials()?;
        Some(Self {
            host: config.host.clone(),
            port: config.port,
            credentials: Credentials::new(username, password),
            from: format!("{} <{}>", config.from_name, config.from_email),
        })
    }

    fn build_message(&self, notification: &Notification) -> Result<Message, Box<dyn std::error::Error + Send + Sync>> {
        let html = SinglePart::builder()
            .header(ContentType::TEXT_HTML)
            .body(notification.html_body.clone());

        let body = match &notification.attachment {
            Some(attachment) => {
                let content_type = ContentType::parse(&attachment.content_type)?;
                MultiPart::mixed()
                    .singlepart(html)
                    .singlepart(
                        Attachment::new(attachment.filename.clone())
                            .body(attachment.data.clone(), content_type),
                    )
            }
            None => MultiPart::mixed().singlepart(html),
        };

        let message = Message::builder()
            .from(self.from.parse()?)
            .to(notification.recipient.parse()?)
            .subject(notification.subject.clone())
            .multipart(body)?;
        Ok(message)
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, notification: &Notification) -> SendResult {
        let message = self.build_message(notification)?;
        let mailer = SmtpTransport::relay(&self.host)?
            .port(self.port)
            .credentials(self.credentials.clone())
            .build();

        // lettre's SmtpTransport is blocking
        tokio::task::spawn_blocking(move || mailer.send(&message))
            .await??;

        info!(recipient = %notification.recipient, subject = %notification.subject, "Email sent");
        Ok(())
    }
}

/// Used when SMTP credentials are not configured: the message is logged, not sent.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> SendResult {
        info!(
            recipient = %notification.recipient,
            subject = %notification.subject,
            attachment = notification.attachment.as_ref().map(|a| a.filename.as_str()),
            "SMTP not configured, email skipped"
        );
        Ok(())
    }
}

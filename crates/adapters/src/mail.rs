//! SMTP mailer.
//!
//! Connection settings come from `SMTP_SERVER`, `SMTP_PORT`, `EMAIL_USER`
//! and `EMAIL_PASSWORD`; the 60-second call timeout is set on the transport.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::AdapterError;

const SMTP_TIMEOUT_SECS: u64 = 60;

/// A file attached to an outgoing message.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub path: PathBuf,
    pub name: String,
}

/// A fully-assembled outgoing email.
#[derive(Debug, Clone, Default)]
pub struct EmailMessage {
    pub to: String,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<Attachment>,
}

/// Outbound mail delivery.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), AdapterError>;
}

/// SMTP connection settings.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

impl SmtpConfig {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self {
            server: std::env::var("SMTP_SERVER").unwrap_or_default(),
            port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(587),
            user: std::env::var("EMAIL_USER").unwrap_or_default(),
            password: std::env::var("EMAIL_PASSWORD").unwrap_or_default(),
        }
    }
}

/// Stand-in used when no SMTP settings are present; every send fails with
/// a configuration error instead of failing at startup.
pub struct UnconfiguredMailer;

#[async_trait]
impl Mailer for UnconfiguredMailer {
    async fn send(&self, _message: &EmailMessage) -> Result<(), AdapterError> {
        Err(AdapterError::Smtp(
            "SMTP not configured: set SMTP_SERVER, SMTP_PORT, EMAIL_USER, EMAIL_PASSWORD".into(),
        ))
    }
}

/// lettre-backed SMTP transport.
pub struct SmtpMailer {
    config: SmtpConfig,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Result<Self, AdapterError> {
        if config.server.is_empty() {
            return Err(AdapterError::MissingCredential("SMTP_SERVER".into()));
        }
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server)
            .map_err(|e| AdapterError::Smtp(e.to_string()))?
            .port(config.port)
            .credentials(Credentials::new(config.user.clone(), config.password.clone()))
            .timeout(Some(Duration::from_secs(SMTP_TIMEOUT_SECS)))
            .build();
        Ok(Self { config, transport })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), AdapterError> {
        let from: Mailbox = self
            .config
            .user
            .parse()
            .map_err(|_| AdapterError::Smtp(format!("invalid sender address: {}", self.config.user)))?;
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|_| AdapterError::Smtp(format!("invalid recipient address: {}", message.to)))?;

        let mut builder = Message::builder().from(from).to(to).subject(&message.subject);
        for cc in &message.cc {
            if let Ok(mailbox) = cc.parse::<Mailbox>() {
                builder = builder.cc(mailbox);
            }
        }
        for bcc in &message.bcc {
            if let Ok(mailbox) = bcc.parse::<Mailbox>() {
                builder = builder.bcc(mailbox);
            }
        }

        let mut multipart = MultiPart::mixed().singlepart(SinglePart::plain(message.body.clone()));
        for attachment in &message.attachments {
            let bytes = tokio::fs::read(&attachment.path).await?;
            let mime = mime_guess::from_path(&attachment.path).first_or_octet_stream();
            let content_type =
                ContentType::parse(mime.essence_str()).unwrap_or(ContentType::TEXT_PLAIN);
            multipart = multipart.singlepart(
                lettre::message::Attachment::new(attachment.name.clone()).body(bytes, content_type),
            );
        }

        let email = builder
            .multipart(multipart)
            .map_err(|e| AdapterError::Smtp(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| AdapterError::Smtp(e.to_string()))?;
        Ok(())
    }
}

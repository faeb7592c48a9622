//! `adapters` crate — clients for every external service the executors touch.
//!
//! Each collaborator is a trait with a single entry point plus a production
//! implementation (reqwest / lettre). Executors depend only on the traits so
//! tests swap in the recording mocks from [`mock`].
//!
//! Per-call timeouts are enforced here: outbound webhooks default to 30 s,
//! LLM completions 60 s, SMTP 60 s, Discord 10 s.

pub mod discord;
pub mod documents;
pub mod drive;
pub mod error;
pub mod image;
pub mod llm;
pub mod mail;
pub mod mock;
pub mod outbound;
pub mod paths;
pub mod report;
pub mod sheets;
pub mod social;
pub mod twilio;

pub use discord::{DiscordClient, DiscordEmbed, DiscordMessage, DiscordWebhookClient};
pub use documents::{parse_document, write_parsed_json, DocumentMetadata, ParsedDocument, SheetData};
pub use drive::{DriveClient, GoogleDriveClient};
pub use error::AdapterError;
pub use image::{ImageGenerator, ImageRequest, RestImageGenerator};
pub use llm::{LlmClient, LlmKeys, OpenRouterClient};
pub use mail::{Attachment, EmailMessage, Mailer, SmtpConfig, SmtpMailer, UnconfiguredMailer};
pub use outbound::{HttpDispatcher, OutboundRequest, OutboundResponse, ReqwestDispatcher};
pub use report::{FileReportRenderer, ReportFormat, ReportRenderer};
pub use sheets::{GoogleSheetsClient, SheetsClient};
pub use social::{RestSocialPoster, SocialCredentials, SocialPoster, SocialPost};
pub use twilio::{MessageMode, MessageSender, TwilioCredentialSet, TwilioRestSender};

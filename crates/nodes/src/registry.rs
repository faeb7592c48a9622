//! Node kind enumeration and the executor registry.

use std::collections::HashMap;
use std::sync::Arc;

use adapters::{
    DiscordClient, DriveClient, HttpDispatcher, ImageGenerator, LlmClient, Mailer, MessageSender,
    ReportRenderer, SheetsClient, SocialPoster,
};
use thiserror::Error;

use crate::executors;
use crate::NodeExecutor;

/// The closed set of node kinds the platform executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Gpt,
    Llama,
    Gemini,
    Claude,
    Mistral,
    Email,
    Webhook,
    Sms,
    Whatsapp,
    Twilio,
    Discord,
    GoogleSheets,
    Schedule,
    FileUpload,
    ImageGeneration,
    DocumentParser,
    ReportGenerator,
    SocialMedia,
}

impl NodeKind {
    pub fn parse(kind: &str) -> Option<Self> {
        Some(match kind {
            "gpt" => Self::Gpt,
            "llama" => Self::Llama,
            "gemini" => Self::Gemini,
            "claude" => Self::Claude,
            "mistral" => Self::Mistral,
            "email" => Self::Email,
            "webhook" => Self::Webhook,
            "sms" => Self::Sms,
            "whatsapp" => Self::Whatsapp,
            "twilio" => Self::Twilio,
            "discord" => Self::Discord,
            "google_sheets" => Self::GoogleSheets,
            "schedule" => Self::Schedule,
            "file_upload" => Self::FileUpload,
            "image_generation" => Self::ImageGeneration,
            "document_parser" => Self::DocumentParser,
            "report_generator" => Self::ReportGenerator,
            "social_media" => Self::SocialMedia,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gpt => "gpt",
            Self::Llama => "llama",
            Self::Gemini => "gemini",
            Self::Claude => "claude",
            Self::Mistral => "mistral",
            Self::Email => "email",
            Self::Webhook => "webhook",
            Self::Sms => "sms",
            Self::Whatsapp => "whatsapp",
            Self::Twilio => "twilio",
            Self::Discord => "discord",
            Self::GoogleSheets => "google_sheets",
            Self::Schedule => "schedule",
            Self::FileUpload => "file_upload",
            Self::ImageGeneration => "image_generation",
            Self::DocumentParser => "document_parser",
            Self::ReportGenerator => "report_generator",
            Self::SocialMedia => "social_media",
        }
    }

    /// AI kinds share one executor and differ only in default routing.
    pub fn is_ai(self) -> bool {
        matches!(self, Self::Gpt | Self::Llama | Self::Gemini | Self::Claude | Self::Mistral)
    }
}

/// Lookup failure for a kind outside the closed set.
#[derive(Debug, Clone, Error)]
#[error("no executor registered for node kind '{0}'")]
pub struct UnknownKind(pub String);

/// Every external collaborator the built-in executors need.
#[derive(Clone)]
pub struct Services {
    pub llm: Arc<dyn LlmClient>,
    pub mailer: Arc<dyn Mailer>,
    pub dispatcher: Arc<dyn HttpDispatcher>,
    pub messenger: Arc<dyn MessageSender>,
    pub discord: Arc<dyn DiscordClient>,
    pub drive: Arc<dyn DriveClient>,
    pub sheets: Arc<dyn SheetsClient>,
    pub images: Arc<dyn ImageGenerator>,
    pub social: Arc<dyn SocialPoster>,
    pub reports: Arc<dyn ReportRenderer>,
}

/// Maps node kinds to executor implementations.
pub struct NodeRegistry {
    executors: HashMap<NodeKind, Arc<dyn NodeExecutor>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self { executors: HashMap::new() }
    }

    /// Build the production registry over the given service clients.
    pub fn with_services(services: Services) -> Self {
        let mut registry = Self::new();

        let ai = Arc::new(executors::ai::AiExecutor::new(services.llm));
        for kind in [
            NodeKind::Gpt,
            NodeKind::Llama,
            NodeKind::Gemini,
            NodeKind::Claude,
            NodeKind::Mistral,
        ] {
            registry.register(kind, ai.clone());
        }

        registry.register(
            NodeKind::Email,
            Arc::new(executors::email::EmailExecutor::new(services.mailer)),
        );
        registry.register(
            NodeKind::Webhook,
            Arc::new(executors::webhook::WebhookExecutor::new(services.dispatcher)),
        );

        let messaging = Arc::new(executors::messaging::MessagingExecutor::new(services.messenger));
        for kind in [NodeKind::Sms, NodeKind::Whatsapp, NodeKind::Twilio] {
            registry.register(kind, messaging.clone());
        }

        registry.register(
            NodeKind::Discord,
            Arc::new(executors::discord::DiscordExecutor::new(services.discord)),
        );
        registry.register(
            NodeKind::GoogleSheets,
            Arc::new(executors::sheets::SheetsExecutor::new(services.sheets)),
        );
        registry.register(NodeKind::Schedule, Arc::new(executors::schedule::ScheduleExecutor));
        registry.register(
            NodeKind::FileUpload,
            Arc::new(executors::file_upload::FileUploadExecutor::new(services.drive.clone())),
        );
        registry.register(
            NodeKind::ImageGeneration,
            Arc::new(executors::image::ImageGenerationExecutor::new(services.images)),
        );
        registry.register(
            NodeKind::DocumentParser,
            Arc::new(executors::document::DocumentParserExecutor::new(services.drive)),
        );
        registry.register(
            NodeKind::ReportGenerator,
            Arc::new(executors::report::ReportGeneratorExecutor::new(services.reports)),
        );
        registry.register(
            NodeKind::SocialMedia,
            Arc::new(executors::social::SocialMediaExecutor::new(services.social)),
        );

        registry
    }

    pub fn register(&mut self, kind: NodeKind, executor: Arc<dyn NodeExecutor>) {
        self.executors.insert(kind, executor);
    }

    /// Look up the executor for a raw kind string.
    pub fn get(&self, kind: &str) -> Result<Arc<dyn NodeExecutor>, UnknownKind> {
        NodeKind::parse(kind)
            .and_then(|k| self.executors.get(&k).cloned())
            .ok_or_else(|| UnknownKind(kind.to_owned()))
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

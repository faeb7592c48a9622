//! Recording mocks for every adapter trait.
//!
//! Built in the same shape as the production clients but programmable at
//! construction time and call-recording, so executor and engine tests never
//! touch the network.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::discord::{DiscordClient, DiscordMessage};
use crate::drive::DriveClient;
use crate::image::{ImageGenerator, ImageRequest};
use crate::llm::{LlmClient, LlmKeys};
use crate::mail::{EmailMessage, Mailer};
use crate::outbound::{HttpDispatcher, OutboundRequest, OutboundResponse};
use crate::report::{ReportFormat, ReportRenderer};
use crate::sheets::SheetsClient;
use crate::social::{SocialCredentials, SocialPost, SocialPoster};
use crate::twilio::{MessageMode, MessageSender, TwilioCredentialSet};
use crate::AdapterError;

fn fail(message: &str) -> AdapterError {
    AdapterError::Api { status: 500, message: message.to_owned() }
}

/// LLM mock: fixed completion or fixed failure, prompts recorded.
pub struct MockLlm {
    response: Result<String, String>,
    pub calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockLlm {
    pub fn returning(text: impl Into<String>) -> Self {
        Self { response: Ok(text.into()), calls: Arc::new(Mutex::new(Vec::new())) }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self { response: Err(message.into()), calls: Arc::new(Mutex::new(Vec::new())) }
    }

    /// Prompts seen so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(p, _)| p.clone()).collect()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn complete(
        &self,
        prompt: &str,
        model: &str,
        _keys: &LlmKeys,
    ) -> Result<String, AdapterError> {
        self.calls.lock().unwrap().push((prompt.to_owned(), model.to_owned()));
        self.response.clone().map_err(|m| fail(&m))
    }
}

/// Mailer mock: records every message, optionally failing.
#[derive(Default)]
pub struct MockMailer {
    error: Option<String>,
    pub sent: Arc<Mutex<Vec<EmailMessage>>>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self { error: Some(message.into()), sent: Arc::new(Mutex::new(Vec::new())) }
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), AdapterError> {
        self.sent.lock().unwrap().push(message.clone());
        match &self.error {
            Some(e) => Err(AdapterError::Smtp(e.clone())),
            None => Ok(()),
        }
    }
}

/// HTTP dispatcher mock with a programmable response.
pub struct MockDispatcher {
    response: Result<OutboundResponse, String>,
    timeout: bool,
    pub requests: Arc<Mutex<Vec<OutboundRequest>>>,
}

impl MockDispatcher {
    pub fn returning(status: u16, body: impl Into<String>) -> Self {
        Self {
            response: Ok(OutboundResponse { status, body: body.into() }),
            timeout: false,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn timing_out() -> Self {
        Self {
            response: Err("timeout".into()),
            timeout: true,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl HttpDispatcher for MockDispatcher {
    async fn dispatch(&self, request: &OutboundRequest) -> Result<OutboundResponse, AdapterError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.timeout {
            return Err(AdapterError::Timeout { seconds: request.timeout_secs });
        }
        self.response.clone().map_err(|m| fail(&m))
    }
}

/// Twilio mock.
#[derive(Default)]
pub struct MockMessageSender {
    error: Option<String>,
    pub sent: Arc<Mutex<Vec<(MessageMode, String, String)>>>,
}

impl MockMessageSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self { error: Some(message.into()), sent: Arc::new(Mutex::new(Vec::new())) }
    }
}

#[async_trait]
impl MessageSender for MockMessageSender {
    async fn send(
        &self,
        mode: MessageMode,
        to: &str,
        body: &str,
        _credentials: &TwilioCredentialSet,
    ) -> Result<String, AdapterError> {
        self.sent.lock().unwrap().push((mode, to.to_owned(), body.to_owned()));
        match &self.error {
            Some(e) => Err(fail(e)),
            None => Ok("SM0000".to_owned()),
        }
    }
}

/// Discord mock.
#[derive(Default)]
pub struct MockDiscord {
    error: Option<String>,
    pub posts: Arc<Mutex<Vec<(String, DiscordMessage)>>>,
}

impl MockDiscord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self { error: Some(message.into()), posts: Arc::new(Mutex::new(Vec::new())) }
    }
}

#[async_trait]
impl DiscordClient for MockDiscord {
    async fn post(&self, webhook_url: &str, message: &DiscordMessage) -> Result<(), AdapterError> {
        self.posts.lock().unwrap().push((webhook_url.to_owned(), message.clone()));
        match &self.error {
            Some(e) => Err(fail(e)),
            None => Ok(()),
        }
    }
}

/// Drive mock: programmable upload URL and download path.
pub struct MockDrive {
    pub upload_url: String,
    pub download_path: PathBuf,
    pub uploads: Arc<Mutex<Vec<(PathBuf, String, String)>>>,
    pub downloads: Arc<Mutex<Vec<String>>>,
}

impl MockDrive {
    pub fn new(upload_url: impl Into<String>) -> Self {
        Self {
            upload_url: upload_url.into(),
            download_path: PathBuf::new(),
            uploads: Arc::new(Mutex::new(Vec::new())),
            downloads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_download(mut self, path: impl Into<PathBuf>) -> Self {
        self.download_path = path.into();
        self
    }
}

#[async_trait]
impl DriveClient for MockDrive {
    async fn upload(
        &self,
        path: &std::path::Path,
        name: &str,
        mime_type: &str,
        _token: &str,
    ) -> Result<String, AdapterError> {
        self.uploads
            .lock()
            .unwrap()
            .push((path.to_owned(), name.to_owned(), mime_type.to_owned()));
        Ok(self.upload_url.clone())
    }

    async fn download(&self, url: &str, _token: &str) -> Result<PathBuf, AdapterError> {
        self.downloads.lock().unwrap().push(url.to_owned());
        Ok(self.download_path.clone())
    }
}

/// Sheets mock.
#[derive(Default)]
pub struct MockSheets {
    pub writes: Arc<Mutex<Vec<(String, String, Vec<Vec<String>>)>>>,
}

impl MockSheets {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SheetsClient for MockSheets {
    async fn write(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Vec<String>],
        _token: &str,
    ) -> Result<String, AdapterError> {
        self.writes
            .lock()
            .unwrap()
            .push((spreadsheet_id.to_owned(), range.to_owned(), values.to_vec()));
        Ok(format!("Updated {} rows in range {range}", values.len()))
    }
}

/// Image generator mock returning a fixed path.
pub struct MockImageGenerator {
    pub path: PathBuf,
    pub requests: Arc<Mutex<Vec<ImageRequest>>>,
}

impl MockImageGenerator {
    pub fn returning(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), requests: Arc::new(Mutex::new(Vec::new())) }
    }
}

#[async_trait]
impl ImageGenerator for MockImageGenerator {
    async fn generate(&self, request: &ImageRequest) -> Result<PathBuf, AdapterError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.path.clone())
    }
}

/// Social poster mock echoing the platform.
#[derive(Default)]
pub struct MockSocialPoster {
    pub posts: Arc<Mutex<Vec<SocialPost>>>,
}

impl MockSocialPoster {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SocialPoster for MockSocialPoster {
    async fn post(
        &self,
        post: &SocialPost,
        _credentials: &SocialCredentials,
    ) -> Result<String, AdapterError> {
        self.posts.lock().unwrap().push(post.clone());
        Ok(format!("Posted to {} successfully", post.platform))
    }
}

/// Report renderer mock: writes a plain-text file so path assertions hold.
pub struct MockReportRenderer {
    pub dir: PathBuf,
    pub rendered: Arc<Mutex<Vec<(String, String, ReportFormat)>>>,
}

impl MockReportRenderer {
    pub fn into_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), rendered: Arc::new(Mutex::new(Vec::new())) }
    }
}

#[async_trait]
impl ReportRenderer for MockReportRenderer {
    async fn render(
        &self,
        title: &str,
        content: &str,
        format: ReportFormat,
    ) -> Result<PathBuf, AdapterError> {
        self.rendered
            .lock()
            .unwrap()
            .push((title.to_owned(), content.to_owned(), format));
        let target = self
            .dir
            .join(crate::paths::unique_file_name("report", format.extension()));
        std::fs::write(&target, format!("{title}\n{content}"))?;
        Ok(target)
    }
}

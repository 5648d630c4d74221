use std::path::Path;
use std::time::Duration;

use reqwest::blocking::{multipart, Client};
use thiserror::Error;

use crate::alarm::domain::notifier::PushNotifier;
use crate::alarm::infrastructure::push_config::PushConfig;
use crate::shared::config_error::ConfigError;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid proxy {url}: {source}")]
    Proxy {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("{method} request failed: {source}")]
    Request {
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to attach snapshot {path}: {source}")]
    Attachment {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Pushes alarms to a chat through the Telegram Bot HTTP API.
///
/// Sends the configured text first, then the snapshot as a photo when one is
/// available.
pub struct TelegramPush {
    client: Client,
    api_base: String,
    config: PushConfig,
}

impl TelegramPush {
    pub fn new(config: PushConfig) -> Result<Self, NotifyError> {
        config.validate()?;

        let mut builder = Client::builder().timeout(REQUEST_TIMEOUT);
        if let Some(url) = config.proxy() {
            let proxy = reqwest::Proxy::all(url).map_err(|e| NotifyError::Proxy {
                url: url.to_string(),
                source: e,
            })?;
            builder = builder.proxy(proxy);
        }
        let client = builder.build().map_err(NotifyError::Client)?;

        Ok(Self {
            client,
            api_base: TELEGRAM_API_BASE.to_string(),
            config,
        })
    }

    /// Points the client at a different API host.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.config.token)
    }

    fn send_message(&self) -> Result<(), NotifyError> {
        self.client
            .post(self.endpoint("sendMessage"))
            .form(&[
                ("chat_id", self.config.chat_id.as_str()),
                ("text", self.config.message.as_str()),
            ])
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| NotifyError::Request {
                method: "sendMessage",
                source: e,
            })?;
        Ok(())
    }

    fn send_photo(&self, path: &Path) -> Result<(), NotifyError> {
        let form = multipart::Form::new()
            .text("chat_id", self.config.chat_id.clone())
            .file("photo", path)
            .map_err(|e| NotifyError::Attachment {
                path: path.display().to_string(),
                source: e,
            })?;

        self.client
            .post(self.endpoint("sendPhoto"))
            .multipart(form)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| NotifyError::Request {
                method: "sendPhoto",
                source: e,
            })?;
        Ok(())
    }
}

impl PushNotifier for TelegramPush {
    fn dispatch(&self, snapshot: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
        self.send_message()?;
        if let Some(path) = snapshot.filter(|p| p.is_file()) {
            self.send_photo(path)?;
        }
        Ok(())
    }
}

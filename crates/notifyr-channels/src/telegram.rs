//! Telegram channel: Bot API `sendMessage` over plain HTTPS.
//!
//! Each recipient address is a numeric chat id. Messages are posted as
//! JSON with the configured `parse_mode`; with a message lifetime set,
//! posted messages are removed later via `deleteMessage`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use notifyr_core::config::TelegramConfig;
use notifyr_core::{Address, Attachment, Message, NotifyError};

use crate::base::{ensure_recipients, Notificator};
use crate::detached::spawn_after;
use crate::http::{HttpExecutor, HttpResponse};

const TELEGRAM_PROTOCOL: &str = "https";
const TELEGRAM_HOST: &str = "api.telegram.org";

const METHOD_SEND_MESSAGE: &str = "sendMessage";
const METHOD_DELETE_MESSAGE: &str = "deleteMessage";

// ─────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'a str,
}

#[derive(Debug, Serialize)]
struct DeleteMessageRequest {
    chat_id: i64,
    message_id: i64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawResult {
    Message { message_id: i64 },
    Flag(bool),
}

#[derive(Deserialize)]
struct ApiEnvelope {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    result: Option<RawResult>,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    description: Option<String>,
}

/// Successful Bot API reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelegramReply {
    /// A message object; only its id is kept.
    Message { message_id: i64 },
    /// `"result": true`, as returned by `deleteMessage`.
    Ack,
}

/// Classify a Bot API response.
pub fn interpret_response(resp: &HttpResponse) -> Result<TelegramReply, NotifyError> {
    let envelope: ApiEnvelope = resp.json()?;

    if resp.is_ok() && envelope.ok {
        return match envelope.result {
            Some(RawResult::Message { message_id }) => Ok(TelegramReply::Message { message_id }),
            Some(RawResult::Flag(true)) => Ok(TelegramReply::Ack),
            Some(RawResult::Flag(false)) | None => {
                Err(NotifyError::protocol("no result in the response"))
            }
        };
    }

    match envelope.description {
        Some(description) if !envelope.ok => Err(NotifyError::remote(
            envelope
                .error_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| resp.status.as_u16().to_string()),
            description,
        )),
        _ => Err(NotifyError::protocol(format!(
            "unsupported response (status {})",
            resp.status
        ))),
    }
}

// ─────────────────────────────────────────────
// TelegramNotificator
// ─────────────────────────────────────────────

/// Telegram Bot API channel.
pub struct TelegramNotificator {
    config: TelegramConfig,
    address: Address,
    http: HttpExecutor,
    timeout: Option<Duration>,
    message_lifetime: Option<Duration>,
}

impl TelegramNotificator {
    pub fn new(config: TelegramConfig, client: reqwest::Client) -> Self {
        let proto = if config.proto.is_empty() {
            TELEGRAM_PROTOCOL
        } else {
            config.proto.as_str()
        };
        let host = if config.host.is_empty() {
            TELEGRAM_HOST
        } else {
            config.host.as_str()
        };
        let address = Address::new(proto, host);
        let timeout = config.timeout();
        let message_lifetime = config.message_lifetime();

        Self {
            config,
            address,
            http: HttpExecutor::new(client),
            timeout,
            message_lifetime,
        }
    }

    /// Override the configured message lifetime (`None` keeps messages).
    pub fn with_message_lifetime(mut self, lifetime: Option<Duration>) -> Self {
        self.message_lifetime = lifetime.filter(|d| !d.is_zero());
        self
    }

    /// URL of Bot API method `method` (`/bot{token}/{method}`).
    pub fn method_url(&self, method: &str) -> Result<Url, NotifyError> {
        let path = format!("/bot{}/{}", self.config.token, method);
        self.address.endpoint::<&str, &str>(&path, &[])
    }

    fn parse_mode(&self) -> &str {
        if self.config.parse_mode.is_empty() {
            "html"
        } else {
            &self.config.parse_mode
        }
    }

    fn schedule_delete(
        &self,
        chat_id: i64,
        message_id: i64,
        lifetime: Duration,
    ) -> Result<JoinHandle<()>, NotifyError> {
        let url = self.method_url(METHOD_DELETE_MESSAGE)?;
        let http = self.http.clone();
        let timeout = self.timeout;

        Ok(spawn_after(
            "telegram",
            format!("delete message {message_id} in chat {chat_id}"),
            lifetime,
            async move {
                let body = DeleteMessageRequest {
                    chat_id,
                    message_id,
                };
                let resp = http.post_json(url, &body, timeout).await?;
                interpret_response(&resp).map(|_| ())
            },
        ))
    }

    /// Send `message` and return the handles of any scheduled deletions.
    pub async fn send_tracked(&self, mut message: Message) -> Result<Vec<JoinHandle<()>>, NotifyError> {
        ensure_recipients(&message)?;

        // Validate every chat id before the first request goes out.
        let chat_ids = message
            .addresses
            .iter()
            .map(|a| {
                a.trim()
                    .parse::<i64>()
                    .map_err(|_| NotifyError::InvalidAddress(a.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let text = message.read_body().await?;
        let url = self.method_url(METHOD_SEND_MESSAGE)?;
        let mut deletions = Vec::new();

        for chat_id in chat_ids {
            let body = SendMessageRequest {
                chat_id,
                text: &text,
                parse_mode: self.parse_mode(),
            };
            let resp = self.http.post_json(url.clone(), &body, self.timeout).await?;

            match interpret_response(&resp)? {
                TelegramReply::Message { message_id } => {
                    debug!(chat_id, message_id, "telegram message posted");
                    if let Some(lifetime) = self.message_lifetime {
                        deletions.push(self.schedule_delete(chat_id, message_id, lifetime)?);
                    }
                }
                TelegramReply::Ack => debug!(chat_id, "telegram message acknowledged without id"),
            }
        }

        info!(
            recipients = message.addresses.len(),
            scheduled_deletes = deletions.len(),
            "telegram message sent"
        );
        Ok(deletions)
    }
}

#[async_trait]
impl Notificator for TelegramNotificator {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send_message(
        &self,
        message: Message,
        attachments: Vec<Attachment>,
    ) -> Result<(), NotifyError> {
        if !attachments.is_empty() {
            debug!(count = attachments.len(), "telegram ignores attachments");
        }
        self.send_tracked(message).await.map(drop)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

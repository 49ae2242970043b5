//! Bitrix24 channel: messages through the REST `im.*` / `imbot.*` methods.
//!
//! Every call is a GET to `{proto}://{host}/rest/{user_id}/{token}/{method}`
//! with its arguments in the query string.
//!
//! Features:
//! - Plain (`im.*`) or bot-scoped (`imbot.*`, `BOT_ID` + `CLIENT_ID`) methods
//! - Optional system notification to every recipient user before posting;
//!   group chats (`chat<id>`) are expanded to their members first
//! - Optional deferred deletion of posted messages after a fixed lifetime

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use notifyr_core::config::BitrixConfig;
use notifyr_core::{Address, Attachment, Message, NotifyError};

use crate::base::{ensure_recipients, Notificator};
use crate::detached::spawn_after;
use crate::http::{HttpExecutor, HttpResponse};

/// Scheme used when the config leaves `proto` empty.
const BITRIX_PROTOCOL: &str = "https";

const METHOD_MESSAGE_ADD: &str = "im.message.add.json";
const METHOD_MESSAGE_DELETE: &str = "im.message.delete";
const METHOD_NOTIFY: &str = "im.notify.system.add.json";
const METHOD_CHAT_USERS: &str = "im.chat.user.list";
const METHOD_BOT_MESSAGE_ADD: &str = "imbot.message.add.json";
const METHOD_BOT_MESSAGE_DELETE: &str = "imbot.message.delete";
const METHOD_BOT_CHAT_USERS: &str = "imbot.chat.user.list.json";

const PARAM_MESSAGE_ID: &str = "MESSAGE_ID";
const PARAM_DIALOG_ID: &str = "DIALOG_ID";
const PARAM_USER_ID: &str = "USER_ID";
const PARAM_CHAT_ID: &str = "CHAT_ID";
const PARAM_MESSAGE: &str = "MESSAGE";
const PARAM_SYSTEM: &str = "SYSTEM";
const PARAM_BOT_ID: &str = "BOT_ID";
const PARAM_CLIENT_ID: &str = "CLIENT_ID";
const PARAM_COMPLETE: &str = "COMPLETE";

type Params = Vec<(&'static str, String)>;

// ─────────────────────────────────────────────
// Response interpretation
// ─────────────────────────────────────────────

/// The `result` field of a successful Bitrix reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BitrixReply {
    /// Id of a created message or notification.
    MessageId(i64),
    /// Boolean acknowledgement (`"result": true`), e.g. from a delete.
    Ack,
    /// User ids, from a chat member listing.
    Members(Vec<i64>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawResult {
    Id(i64),
    Flag(bool),
    List(Vec<i64>),
}

#[derive(Deserialize)]
struct SuccessBody {
    #[serde(default)]
    result: Option<RawResult>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    error_description: String,
}

/// Classify a Bitrix HTTP response.
///
/// - 200 with a non-zero id, `true`, or an id list → success
/// - 200 with `0`, `false` or no result → `Protocol`
/// - anything else with an `error` field → `Remote { error, error_description }`
/// - anything else → `Protocol("unsupported response")`
pub fn interpret_response(resp: &HttpResponse) -> Result<BitrixReply, NotifyError> {
    if resp.is_ok() {
        let body: SuccessBody = resp.json()?;
        return match body.result {
            Some(RawResult::Id(0)) | None => {
                Err(NotifyError::protocol("no result in the response"))
            }
            Some(RawResult::Id(id)) => Ok(BitrixReply::MessageId(id)),
            Some(RawResult::Flag(true)) => Ok(BitrixReply::Ack),
            Some(RawResult::Flag(false)) => {
                Err(NotifyError::protocol("negative acknowledgement in the response"))
            }
            Some(RawResult::List(ids)) => Ok(BitrixReply::Members(ids)),
        };
    }

    let body: ErrorBody = resp.json()?;
    if !body.error.is_empty() {
        return Err(NotifyError::remote(body.error, body.error_description));
    }
    Err(NotifyError::protocol(format!(
        "unsupported response (status {})",
        resp.status
    )))
}

// ─────────────────────────────────────────────
// BitrixNotificator
// ─────────────────────────────────────────────

/// Bitrix24 REST channel.
pub struct BitrixNotificator {
    config: BitrixConfig,
    address: Address,
    http: HttpExecutor,
    timeout: Option<Duration>,
    message_lifetime: Option<Duration>,
}

impl BitrixNotificator {
    /// Create a channel sharing the given HTTP client.
    pub fn new(config: BitrixConfig, client: reqwest::Client) -> Self {
        let proto = if config.proto.is_empty() {
            BITRIX_PROTOCOL
        } else {
            config.proto.as_str()
        };
        let address = Address::new(proto, config.host.clone());
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

    fn request_path(&self, method: &str) -> String {
        format!("/rest/{}/{}/{}", self.config.user_id, self.config.token, method)
    }

    fn bot_params(&self) -> Params {
        vec![
            (PARAM_BOT_ID, self.config.bot_id.clone()),
            (PARAM_CLIENT_ID, self.config.client_id.clone()),
        ]
    }

    fn url(&self, method: &str, params: &Params) -> Result<Url, NotifyError> {
        self.address.endpoint(&self.request_path(method), params)
    }

    /// URL that posts `message` into dialog `dialog_id`.
    pub fn url_for_message(&self, dialog_id: &str, message: &str) -> Result<Url, NotifyError> {
        if self.config.is_bot() {
            let mut params = self.bot_params();
            params.push((PARAM_DIALOG_ID, dialog_id.to_string()));
            params.push((PARAM_MESSAGE, message.to_string()));
            self.url(METHOD_BOT_MESSAGE_ADD, &params)
        } else {
            let params = vec![
                (PARAM_SYSTEM, "Y".to_string()),
                (PARAM_DIALOG_ID, dialog_id.to_string()),
                (PARAM_MESSAGE, message.to_string()),
            ];
            self.url(METHOD_MESSAGE_ADD, &params)
        }
    }

    /// URL that deletes message `message_id`.
    pub fn url_for_delete(&self, message_id: i64) -> Result<Url, NotifyError> {
        if self.config.is_bot() {
            let mut params = self.bot_params();
            params.push((PARAM_MESSAGE_ID, message_id.to_string()));
            params.push((PARAM_COMPLETE, "Y".to_string()));
            self.url(METHOD_BOT_MESSAGE_DELETE, &params)
        } else {
            let params = vec![(PARAM_MESSAGE_ID, message_id.to_string())];
            self.url(METHOD_MESSAGE_DELETE, &params)
        }
    }

    /// URL that sends a system notification to user `user_id`.
    pub fn url_for_notify(&self, user_id: &str, message: &str) -> Result<Url, NotifyError> {
        let params = vec![
            (PARAM_USER_ID, user_id.to_string()),
            (PARAM_MESSAGE, message.to_string()),
        ];
        self.url(METHOD_NOTIFY, &params)
    }

    /// URL that lists the members of chat `chat_id` (numeric part only).
    pub fn url_for_chat_users(&self, chat_id: &str) -> Result<Url, NotifyError> {
        if self.config.is_bot() {
            let mut params = self.bot_params();
            params.push((PARAM_CHAT_ID, chat_id.to_string()));
            self.url(METHOD_BOT_CHAT_USERS, &params)
        } else {
            let params = vec![(PARAM_CHAT_ID, chat_id.to_string())];
            self.url(METHOD_CHAT_USERS, &params)
        }
    }

    /// Numeric chat id if `address` names a group chat (`chat987` → `987`).
    fn chat_id<'a>(&self, address: &'a str) -> Option<&'a str> {
        let prefix = self.config.chat_prefix.as_str();
        if prefix.is_empty() {
            return None;
        }
        address
            .strip_prefix(prefix)
            .filter(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
    }

    async fn call(&self, url: Url) -> Result<BitrixReply, NotifyError> {
        let resp = self.http.get(url, self.timeout).await?;
        interpret_response(&resp)
    }

    /// Users behind an address: chat members for a chat, the address itself otherwise.
    async fn resolve_users(&self, address: &str) -> Result<Vec<String>, NotifyError> {
        let Some(chat_id) = self.chat_id(address) else {
            return Ok(vec![address.to_string()]);
        };

        match self.call(self.url_for_chat_users(chat_id)?).await? {
            BitrixReply::Members(ids) => {
                debug!(chat = %address, members = ids.len(), "resolved chat members");
                Ok(ids.iter().map(i64::to_string).collect())
            }
            other => Err(NotifyError::protocol(format!(
                "unexpected reply to chat member list: {other:?}"
            ))),
        }
    }

    /// Notify every user behind `addresses`; the first failure aborts.
    async fn notify_users(&self, addresses: &[String], subject: &str) -> Result<(), NotifyError> {
        for address in addresses {
            for user in self.resolve_users(address).await? {
                self.call(self.url_for_notify(&user, subject)?).await?;
                debug!(user = %user, "bitrix notification sent");
            }
        }
        Ok(())
    }

    fn schedule_delete(&self, message_id: i64, lifetime: Duration) -> Result<JoinHandle<()>, NotifyError> {
        let url = self.url_for_delete(message_id)?;
        let http = self.http.clone();
        let timeout = self.timeout;

        Ok(spawn_after(
            "bitrix",
            format!("delete message {message_id}"),
            lifetime,
            async move {
                let resp = http.get(url, timeout).await?;
                interpret_response(&resp).map(|_| ())
            },
        ))
    }

    /// Send `message` and return the handles of any scheduled deletions.
    ///
    /// The handles are informational: dropping them leaves the deletions
    /// running, and awaiting them never yields the deletion's error.
    pub async fn send_tracked(&self, mut message: Message) -> Result<Vec<JoinHandle<()>>, NotifyError> {
        ensure_recipients(&message)?;

        if self.config.use_notification {
            self.notify_users(&message.addresses, &message.subject).await?;
        }

        let body = message.read_body().await?;
        let mut deletions = Vec::new();

        for dialog in &message.addresses {
            let reply = self.call(self.url_for_message(dialog, &body)?).await?;
            match reply {
                BitrixReply::MessageId(id) => {
                    debug!(dialog = %dialog, message_id = id, "bitrix message posted");
                    if let Some(lifetime) = self.message_lifetime {
                        deletions.push(self.schedule_delete(id, lifetime)?);
                    }
                }
                BitrixReply::Ack => {
                    debug!(dialog = %dialog, "bitrix message acknowledged without id");
                }
                BitrixReply::Members(_) => {
                    return Err(NotifyError::protocol(
                        "unexpected id list in reply to message post",
                    ));
                }
            }
        }

        info!(
            recipients = message.addresses.len(),
            scheduled_deletes = deletions.len(),
            "bitrix message sent"
        );
        Ok(deletions)
    }
}

#[async_trait]
impl Notificator for BitrixNotificator {
    fn name(&self) -> &str {
        "bitrix"
    }

    async fn send_message(
        &self,
        message: Message,
        attachments: Vec<Attachment>,
    ) -> Result<(), NotifyError> {
        if !attachments.is_empty() {
            debug!(count = attachments.len(), "bitrix ignores attachments");
        }
        self.send_tracked(message).await.map(drop)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

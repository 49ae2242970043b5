//! Email channel: one HTML message per send over SMTP via `lettre`.
//!
//! Features:
//! - All addresses go into a single message's `To` header
//! - Optional display name on the `From` mailbox
//! - Attachments as `multipart/mixed` parts
//! - LOGIN authentication only (or none with `withoutAuth`)
//! - Implicit TLS, STARTTLS or plain transport
//! - Optional overall deadline; a send that outlives it keeps running detached

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment as MailAttachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::transport::smtp::PoolConfig;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message as Email, Tokio1Executor};
use tracing::{debug, info, warn};

use notifyr_core::config::EmailConfig;
use notifyr_core::{read_content, Attachment, Message, NotifyError};

use crate::base::{ensure_recipients, Notificator};

/// Content type used when an attachment does not name one.
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

// ─────────────────────────────────────────────
// Authentication
// ─────────────────────────────────────────────

/// SMTP LOGIN credentials.
#[derive(Clone)]
pub struct SmtpAuth {
    username: String,
    password: String,
}

impl SmtpAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.username.clone(), self.password.clone())
    }

    /// Answer one decoded LOGIN challenge: exactly `Username:` gets the
    /// user, exactly `Password:` the password, anything else is refused.
    pub fn respond(&self, challenge: &str) -> Result<String, NotifyError> {
        match challenge {
            "Username:" => Ok(self.username.clone()),
            "Password:" => Ok(self.password.clone()),
            other => Err(NotifyError::protocol(format!(
                "smtp auth: unexpected LOGIN challenge {other:?}"
            ))),
        }
    }
}

impl std::fmt::Debug for SmtpAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpAuth")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

// ─────────────────────────────────────────────
// Transport
// ─────────────────────────────────────────────

/// Hands a finished message to a mail server.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send_mail(&self, email: Email) -> Result<(), NotifyError>;
}

/// `lettre` SMTP transport with a single pooled connection.
pub struct SmtpMailTransport {
    inner: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailTransport {
    pub fn from_config(config: &EmailConfig) -> Result<Self, NotifyError> {
        let host = config.smtp_host.as_str();
        if host.is_empty() {
            return Err(NotifyError::Config("smtp host is empty".into()));
        }

        let builder = if config.smtp_use_ssl {
            // Implicit TLS (SMTPS, port 465)
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .map_err(|e| NotifyError::Config(format!("smtp relay: {e}")))?
        } else if config.smtp_use_tls {
            // STARTTLS (port 587)
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| NotifyError::Config(format!("smtp starttls: {e}")))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        };

        let mut builder = builder
            .port(config.smtp_port)
            .pool_config(PoolConfig::new().max_size(1));

        if !config.without_auth {
            let auth = SmtpAuth::new(&config.smtp_user, &config.smtp_pass);
            builder = builder
                .credentials(auth.credentials())
                .authentication(vec![Mechanism::Login]);
        }

        Ok(Self {
            inner: builder.build(),
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send_mail(&self, email: Email) -> Result<(), NotifyError> {
        self.inner
            .send(email)
            .await
            .map(|_| ())
            .map_err(|e| NotifyError::Transport(format!("smtp: {e}")))
    }
}

// ─────────────────────────────────────────────
// EmailNotificator
// ─────────────────────────────────────────────

/// SMTP channel.
pub struct EmailNotificator {
    from: Mailbox,
    transport: Arc<dyn MailTransport>,
    timeout: Option<Duration>,
}

impl EmailNotificator {
    /// Build the channel with a real SMTP transport.
    pub fn from_config(config: &EmailConfig) -> Result<Self, NotifyError> {
        let transport = SmtpMailTransport::from_config(config)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Build the channel around any transport.
    pub fn with_transport(
        config: &EmailConfig,
        transport: Arc<dyn MailTransport>,
    ) -> Result<Self, NotifyError> {
        let from = sender_mailbox(config)?;
        Ok(Self {
            from,
            transport,
            timeout: config.timeout(),
        })
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout.filter(|d| !d.is_zero());
        self
    }

    /// Assemble the MIME message: HTML body plus one part per attachment.
    pub async fn build_email(
        &self,
        message: &mut Message,
        attachments: Vec<Attachment>,
    ) -> Result<Email, NotifyError> {
        let mut builder = Email::builder()
            .from(self.from.clone())
            .subject(message.subject.clone());
        for address in &message.addresses {
            let mailbox: Mailbox = address
                .trim()
                .parse()
                .map_err(|_| NotifyError::InvalidAddress(address.clone()))?;
            builder = builder.to(mailbox);
        }

        let body = message.read_body().await?;
        let mut parts = Vec::new();
        for attachment in attachments {
            if let Some(part) = attachment_part(attachment).await? {
                parts.push(part);
            }
        }

        let built = if parts.is_empty() {
            builder.singlepart(SinglePart::html(body))
        } else {
            let mut multipart = MultiPart::mixed().singlepart(SinglePart::html(body));
            for part in parts {
                multipart = multipart.singlepart(part);
            }
            builder.multipart(multipart)
        };

        built.map_err(|e| NotifyError::protocol(format!("build email: {e}")))
    }

    async fn deliver(&self, email: Email) -> Result<(), NotifyError> {
        let Some(limit) = self.timeout else {
            return self.transport.send_mail(email).await;
        };

        // The spawned send is not cancelled when the deadline passes.
        let transport = Arc::clone(&self.transport);
        let handle = tokio::spawn(async move {
            let result = transport.send_mail(email).await;
            if let Err(e) = &result {
                debug!(error = %e, "smtp send finished with error");
            }
            result
        });

        match tokio::time::timeout(limit, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(NotifyError::Transport(format!("smtp task: {join_err}"))),
            Err(_) => {
                warn!(timeout = ?limit, "smtp send timed out, left running");
                Err(NotifyError::Timeout(limit))
            }
        }
    }
}

#[async_trait]
impl Notificator for EmailNotificator {
    fn name(&self) -> &str {
        "email"
    }

    async fn send_message(
        &self,
        mut message: Message,
        attachments: Vec<Attachment>,
    ) -> Result<(), NotifyError> {
        ensure_recipients(&message)?;

        let email = self.build_email(&mut message, attachments).await?;
        self.deliver(email).await?;

        info!(
            recipients = message.addresses.len(),
            subject = %message.subject,
            "email sent"
        );
        Ok(())
    }
}

fn sender_mailbox(config: &EmailConfig) -> Result<Mailbox, NotifyError> {
    let address = config
        .smtp_user
        .trim()
        .parse::<lettre::Address>()
        .map_err(|e| NotifyError::Config(format!("sender address '{}': {e}", config.smtp_user)))?;
    let name = Some(config.visible_name.trim())
        .filter(|n| !n.is_empty())
        .map(str::to_string);
    Ok(Mailbox::new(name, address))
}

async fn attachment_part(attachment: Attachment) -> Result<Option<SinglePart>, NotifyError> {
    let Attachment {
        filename,
        content_type,
        content,
    } = attachment;
    let Some(mut reader) = content else {
        debug!(filename = %filename, "skipping attachment without content");
        return Ok(None);
    };

    let bytes = read_content(&mut reader).await?;
    let content_type = if content_type.trim().is_empty() {
        DEFAULT_CONTENT_TYPE
    } else {
        content_type.trim()
    };
    let content_type = ContentType::parse(content_type).map_err(|e| {
        NotifyError::protocol(format!("content type '{content_type}' of {filename}: {e}"))
    })?;

    Ok(Some(MailAttachment::new(filename).body(bytes, content_type)))
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

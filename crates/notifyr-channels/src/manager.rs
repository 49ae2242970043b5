//! Notifier registry: named channels behind one routing point.
//!
//! Responsibilities:
//! - Build every configured channel from `ChannelsConfig`
//! - Register / unregister channels by name
//! - Route a send to the channel named by the caller

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use notifyr_core::config::ChannelsConfig;
use notifyr_core::{Attachment, Message, NotifyError};

use crate::base::Notificator;

// ─────────────────────────────────────────────
// NotifierRegistry
// ─────────────────────────────────────────────

/// Channels keyed by `Notificator::name()`.
#[derive(Default)]
pub struct NotifierRegistry {
    channels: HashMap<String, Arc<dyn Notificator>>,
}

impl NotifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every channel whose config section is filled in.
    ///
    /// HTTP channels share `client`. Channels compiled out by features are
    /// skipped silently; a channel that fails to build is logged and skipped
    /// so the others stay usable.
    #[allow(unused_variables, unused_mut)]
    pub fn from_config(config: &ChannelsConfig, client: reqwest::Client) -> Self {
        let mut registry = Self::new();

        #[cfg(feature = "bitrix")]
        if config.bitrix.is_configured() {
            registry.register(Arc::new(crate::bitrix::BitrixNotificator::new(
                config.bitrix.clone(),
                client.clone(),
            )));
        }

        #[cfg(feature = "telegram")]
        if config.telegram.is_configured() {
            registry.register(Arc::new(crate::telegram::TelegramNotificator::new(
                config.telegram.clone(),
                client.clone(),
            )));
        }

        #[cfg(feature = "email")]
        if config.email.is_configured() {
            match crate::email::EmailNotificator::from_config(&config.email) {
                Ok(email) => registry.register(Arc::new(email)),
                Err(e) => warn!(channel = "email", error = %e, "skipping misconfigured channel"),
            }
        }

        if registry.is_empty() {
            debug!("no channels configured");
        }
        registry
    }

    /// Register a channel. Overwrites any previous channel with the same name.
    pub fn register(&mut self, channel: Arc<dyn Notificator>) {
        let name = channel.name().to_string();
        info!(channel = %name, "registered channel");
        self.channels.insert(name, channel);
    }

    /// Unregister a channel by name.
    pub fn unregister(&mut self, name: &str) -> Option<Arc<dyn Notificator>> {
        let removed = self.channels.remove(name);
        if removed.is_some() {
            info!(channel = %name, "unregistered channel");
        }
        removed
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Notificator>> {
        self.channels.get(name)
    }

    /// Names of all registered channels, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.channels.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Send through the channel registered as `name`.
    pub async fn send(
        &self,
        name: &str,
        message: Message,
        attachments: Vec<Attachment>,
    ) -> Result<(), NotifyError> {
        let channel = self
            .get(name)
            .ok_or_else(|| NotifyError::UnknownChannel(name.to_string()))?;
        debug!(channel = %name, recipients = message.addresses.len(), "dispatching message");
        channel.send_message(message, attachments).await
    }
}

impl std::fmt::Debug for NotifierRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifierRegistry")
            .field("channels", &self.names())
            .finish()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use notifyr_core::config::{BitrixConfig, EmailConfig, TelegramConfig};
    use tokio::sync::Mutex;

    struct FakeChannel {
        name: String,
        sent: Mutex<Vec<(Vec<String>, String)>>,
    }

    impl FakeChannel {
        fn new(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                sent: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Notificator for FakeChannel {
        fn name(&self) -> &str {
            &self.name
        }

        async fn send_message(
            &self,
            mut message: Message,
            _attachments: Vec<Attachment>,
        ) -> Result<(), NotifyError> {
            let body = message.read_body().await?;
            self.sent.lock().await.push((message.addresses, body));
            Ok(())
        }
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = NotifierRegistry::new();
        assert!(registry.is_empty());

        registry.register(FakeChannel::new("telegram"));
        registry.register(FakeChannel::new("bitrix"));

        assert_eq!(registry.len(), 2);
        assert!(registry.get("telegram").is_some());
        assert!(registry.get("email").is_none());
        assert_eq!(registry.names(), vec!["bitrix", "telegram"]);
    }

    #[test]
    fn test_register_overwrites() {
        let mut registry = NotifierRegistry::new();
        registry.register(FakeChannel::new("bitrix"));
        registry.register(FakeChannel::new("bitrix"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unregister() {
        let mut registry = NotifierRegistry::new();
        registry.register(FakeChannel::new("bitrix"));
        assert!(registry.unregister("bitrix").is_some());
        assert!(registry.unregister("bitrix").is_none());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_send_routes_by_name() {
        let bitrix = FakeChannel::new("bitrix");
        let telegram = FakeChannel::new("telegram");
        let mut registry = NotifierRegistry::new();
        registry.register(bitrix.clone());
        registry.register(telegram.clone());

        registry
            .send("telegram", Message::text(vec!["42".into()], "s", "hello"), vec![])
            .await
            .unwrap();

        assert!(bitrix.sent.lock().await.is_empty());
        let sent = telegram.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], (vec!["42".to_string()], "hello".to_string()));
    }

    #[tokio::test]
    async fn test_send_unknown_channel() {
        let registry = NotifierRegistry::new();
        let err = registry
            .send("pager", Message::text(vec!["1".into()], "s", "b"), vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::UnknownChannel(ref n) if n == "pager"));
    }

    #[tokio::test]
    async fn test_from_config_builds_configured_channels() {
        let config = ChannelsConfig {
            bitrix: BitrixConfig {
                host: "company.bitrix24.eu".into(),
                token: "tok".into(),
                user_id: "1".into(),
                ..Default::default()
            },
            telegram: TelegramConfig {
                token: "123:ABC".into(),
                ..Default::default()
            },
            email: EmailConfig {
                smtp_host: "smtp.example.com".into(),
                smtp_user: "robot@example.com".into(),
                ..Default::default()
            },
        };

        let registry = NotifierRegistry::from_config(&config, reqwest::Client::new());
        assert_eq!(registry.names(), vec!["bitrix", "email", "telegram"]);
    }

    #[test]
    fn test_from_config_skips_unconfigured() {
        let registry =
            NotifierRegistry::from_config(&ChannelsConfig::default(), reqwest::Client::new());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_from_config_skips_broken_email() {
        let config = ChannelsConfig {
            telegram: TelegramConfig {
                token: "123:ABC".into(),
                ..Default::default()
            },
            email: EmailConfig {
                smtp_host: "smtp.example.com".into(),
                smtp_user: "not an address".into(),
                ..Default::default()
            },
            ..Default::default()
        };

        let registry = NotifierRegistry::from_config(&config, reqwest::Client::new());
        assert_eq!(registry.names(), vec!["telegram"]);
    }

    #[test]
    fn test_debug_lists_names() {
        let mut registry = NotifierRegistry::new();
        registry.register(FakeChannel::new("bitrix"));
        assert_eq!(
            format!("{registry:?}"),
            "NotifierRegistry { channels: [\"bitrix\"] }"
        );
    }
}

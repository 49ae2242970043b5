//! Notificator trait: the single interface calling code depends on.
//!
//! Each channel (Bitrix, Telegram, e-mail) implements this trait to:
//! - `name()`: channel identifier matching config keys
//! - `send_message()`: deliver one message (plus optional attachments)

use async_trait::async_trait;
use notifyr_core::{Attachment, Message, NotifyError};

/// Every delivery channel implements this trait.
///
/// The `NotifierRegistry` holds `Arc<dyn Notificator>` and routes sends
/// by name. Implementations hold read-only configuration, so one instance
/// may serve concurrent sends.
#[async_trait]
pub trait Notificator: Send + Sync {
    /// Unique channel name (e.g. "bitrix", "telegram", "email").
    fn name(&self) -> &str;

    /// Deliver `message` to every address it lists.
    ///
    /// Fails with `NotifyError::NoRecipients` before any I/O when the
    /// address list is empty. Background work started by the send
    /// (deferred deletes) never influences the returned result.
    async fn send_message(
        &self,
        message: Message,
        attachments: Vec<Attachment>,
    ) -> Result<(), NotifyError>;
}

impl std::fmt::Debug for dyn Notificator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notificator")
            .field("name", &self.name())
            .finish()
    }
}

/// Reject messages without recipients.
pub(crate) fn ensure_recipients(message: &Message) -> Result<(), NotifyError> {
    if message.has_recipients() {
        Ok(())
    } else {
        Err(NotifyError::NoRecipients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// A mock notificator for testing.
    struct MockNotificator {
        sent: Arc<tokio::sync::Mutex<Vec<(Vec<String>, String, usize)>>>,
    }

    impl MockNotificator {
        fn new() -> Self {
            Self {
                sent: Arc::new(tokio::sync::Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl Notificator for MockNotificator {
        fn name(&self) -> &str {
            "mock"
        }

        async fn send_message(
            &self,
            mut message: Message,
            attachments: Vec<Attachment>,
        ) -> Result<(), NotifyError> {
            ensure_recipients(&message)?;
            let body = message.read_body().await?;
            self.sent
                .lock()
                .await
                .push((message.addresses, body, attachments.len()));
            Ok(())
        }
    }

    #[test]
    fn test_mock_name() {
        let n = MockNotificator::new();
        assert_eq!(n.name(), "mock");
    }

    #[tokio::test]
    async fn test_mock_send() {
        let n = MockNotificator::new();
        let msg = Message::text(vec!["chat_1".into()], "subj", "Hello!");
        n.send_message(msg, vec![]).await.unwrap();

        let sent = n.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, vec!["chat_1".to_string()]);
        assert_eq!(sent[0].1, "Hello!");
    }

    #[tokio::test]
    async fn test_empty_recipients_rejected() {
        let n = MockNotificator::new();
        let msg = Message::text(vec![], "subj", "Hello!");
        let err = n.send_message(msg, vec![]).await.unwrap_err();
        assert!(matches!(err, NotifyError::NoRecipients));
        assert!(n.sent.lock().await.is_empty());
    }

    #[test]
    fn test_trait_object_debug() {
        let n: Arc<dyn Notificator> = Arc::new(MockNotificator::new());
        assert_eq!(format!("{:?}", n), "Notificator { name: \"mock\" }");
    }
}

//! Error taxonomy shared by every delivery channel.
//!
//! A caller of `Notificator::send_message` gets exactly one of these per
//! invocation. Failures inside detached background work (deferred deletes,
//! timed-out SMTP sends) never reach this type; they are only logged.

use std::time::Duration;

use thiserror::Error;

/// Errors returned from a notification send.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// The message had an empty recipient list.
    #[error("no addresses to send")]
    NoRecipients,

    /// A recipient could not be interpreted by the backend
    /// (e.g. non-numeric Telegram chat id, malformed e-mail address).
    #[error("invalid address '{0}'")]
    InvalidAddress(String),

    /// The remote call could not be completed (network, DNS, transport timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// The local wait deadline passed before the send finished.
    #[error("send timed out after {0:?}")]
    Timeout(Duration),

    /// Malformed or unexpected response shape, or a content stream read failure.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Well-formed error payload returned by the remote service.
    #[error("{code}: {description}")]
    Remote { code: String, description: String },

    /// The adapter was built from unusable configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// No notifier is registered under the requested name.
    #[error("unknown channel '{0}'")]
    UnknownChannel(String),
}

impl NotifyError {
    /// Shorthand for a [`NotifyError::Protocol`] error.
    pub fn protocol(msg: impl Into<String>) -> Self {
        NotifyError::Protocol(msg.into())
    }

    /// Shorthand for a [`NotifyError::Remote`] error.
    pub fn remote(code: impl Into<String>, description: impl Into<String>) -> Self {
        NotifyError::Remote {
            code: code.into(),
            description: description.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_contains_code_and_description() {
        let err = NotifyError::remote("ERROR_ARGUMENT", "Dialog ID can't be empty");
        let text = err.to_string();
        assert!(text.contains("ERROR_ARGUMENT"));
        assert!(text.contains("Dialog ID can't be empty"));
    }

    #[test]
    fn test_no_recipients_message() {
        assert_eq!(NotifyError::NoRecipients.to_string(), "no addresses to send");
    }

    #[test]
    fn test_timeout_message_includes_duration() {
        let err = NotifyError::Timeout(Duration::from_secs(3));
        assert_eq!(err.to_string(), "send timed out after 3s");
    }

    #[test]
    fn test_protocol_helper() {
        let err = NotifyError::protocol("unsupported response");
        assert!(matches!(err, NotifyError::Protocol(ref m) if m == "unsupported response"));
    }
}

//! Core types for Notifyr: the channel-independent message model.
//!
//! A [`Message`] carries the recipients, subject and a body stream. The
//! body is read exactly once by whichever channel delivers it, so it is
//! modelled as a boxed `AsyncRead` rather than a `String`.

use std::fmt;
use std::io::Cursor;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::NotifyError;

/// A one-shot byte stream (message body or attachment content).
pub type ContentReader = Box<dyn AsyncRead + Send + Unpin>;

/// Read a content stream to its end.
///
/// Read failures are reported as [`NotifyError::Protocol`].
pub async fn read_content(reader: &mut ContentReader) -> Result<Vec<u8>, NotifyError> {
    let mut buf = Vec::new();
    reader
        .read_to_end(&mut buf)
        .await
        .map_err(|e| NotifyError::protocol(format!("read content: {e}")))?;
    Ok(buf)
}

// ─────────────────────────────────────────────
// Message
// ─────────────────────────────────────────────

/// A notification to deliver.
pub struct Message {
    /// Recipient identifiers. Meaning is channel specific:
    /// dialog/user ids for Bitrix, chat ids for Telegram, e-mail addresses for SMTP.
    pub addresses: Vec<String>,
    /// Message body, consumed once.
    pub content: ContentReader,
    /// Subject line (e-mail subject, Bitrix notify text).
    pub subject: String,
}

impl Message {
    /// Create a message from any async byte stream.
    pub fn new<R>(addresses: Vec<String>, subject: impl Into<String>, content: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        Message {
            addresses,
            content: Box::new(content),
            subject: subject.into(),
        }
    }

    /// Create a message with an in-memory text body.
    pub fn text(
        addresses: Vec<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self::new(addresses, subject, Cursor::new(body.into().into_bytes()))
    }

    /// Whether the message has at least one recipient.
    pub fn has_recipients(&self) -> bool {
        !self.addresses.is_empty()
    }

    /// Drain the body stream and return it as text.
    ///
    /// Invalid UTF-8 sequences are replaced rather than rejected; a second
    /// call returns an empty string because the stream is already exhausted.
    pub async fn read_body(&mut self) -> Result<String, NotifyError> {
        let bytes = read_content(&mut self.content).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("addresses", &self.addresses)
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────
// Attachment
// ─────────────────────────────────────────────

/// A file attached to a message. Only the e-mail channel delivers these.
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    /// `None` means there is nothing to attach; the attachment is skipped.
    pub content: Option<ContentReader>,
}

impl Attachment {
    pub fn new<R>(filename: impl Into<String>, content_type: impl Into<String>, content: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        Attachment {
            filename: filename.into(),
            content_type: content_type.into(),
            content: Some(Box::new(content)),
        }
    }

    /// An in-memory attachment.
    pub fn from_bytes(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self::new(filename, content_type, Cursor::new(bytes.into()))
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("has_content", &self.content.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;

    /// A reader that always fails.
    struct BrokenReader;

    impl AsyncRead for BrokenReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::Other, "disk gone")))
        }
    }

    #[tokio::test]
    async fn test_text_message_body() {
        let mut msg = Message::text(vec!["42".into()], "Alert", "<b>down</b>");
        assert!(msg.has_recipients());
        assert_eq!(msg.subject, "Alert");
        assert_eq!(msg.read_body().await.unwrap(), "<b>down</b>");
    }

    #[tokio::test]
    async fn test_body_is_consumed_once() {
        let mut msg = Message::text(vec!["42".into()], "s", "hello");
        assert_eq!(msg.read_body().await.unwrap(), "hello");
        assert_eq!(msg.read_body().await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_read_failure_is_protocol_error() {
        let mut msg = Message::new(vec!["1".into()], "s", BrokenReader);
        let err = msg.read_body().await.unwrap_err();
        assert!(matches!(err, NotifyError::Protocol(_)));
        assert!(err.to_string().contains("disk gone"));
    }

    #[test]
    fn test_empty_addresses() {
        let msg = Message::text(vec![], "s", "b");
        assert!(!msg.has_recipients());
    }

    #[tokio::test]
    async fn test_attachment_from_bytes() {
        let mut att = Attachment::from_bytes("report.csv", "text/csv", b"a,b\n1,2".to_vec());
        assert_eq!(att.filename, "report.csv");
        let mut reader = att.content.take().unwrap();
        assert_eq!(read_content(&mut reader).await.unwrap(), b"a,b\n1,2");
    }

    #[test]
    fn test_debug_hides_body() {
        let msg = Message::text(vec!["a@example.com".into()], "Hi", "secret body");
        let dbg = format!("{msg:?}");
        assert!(dbg.contains("a@example.com"));
        assert!(!dbg.contains("secret body"));
    }
}

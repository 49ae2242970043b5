//! `notifyr send`: deliver one message through a configured channel.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use colored::Colorize;
use tracing::info;

use notifyr_channels::NotifierRegistry;
use notifyr_core::config::load_config;
use notifyr_core::utils::expand_home;
use notifyr_core::{Attachment, Message};

use crate::helpers::guess_content_type;

/// Everything `notifyr send` was invoked with.
#[derive(Debug)]
pub struct SendArgs {
    pub channel: String,
    pub to: Vec<String>,
    pub subject: String,
    /// Body text; `None` reads the body from stdin.
    pub message: Option<String>,
    pub attach: Vec<String>,
    pub config: Option<PathBuf>,
}

/// Run the send command.
pub async fn run(args: SendArgs) -> Result<()> {
    let config = load_config(args.config.as_deref());
    let client = reqwest::Client::builder()
        .build()
        .context("failed to build HTTP client")?;
    let registry = NotifierRegistry::from_config(&config.channels, client);

    if registry.get(&args.channel).is_none() {
        let available = registry.names();
        if available.is_empty() {
            bail!(
                "channel '{}' is not configured (no channels configured, run `notifyr init`)",
                args.channel
            );
        }
        bail!(
            "channel '{}' is not configured (available: {})",
            args.channel,
            available.join(", ")
        );
    }

    let attachments = open_attachments(&args.attach).await?;
    let recipients = args.to.len();
    let message = match args.message {
        Some(text) => Message::text(args.to, args.subject, text),
        None => Message::new(args.to, args.subject, tokio::io::stdin()),
    };

    info!(channel = %args.channel, recipients, attachments = attachments.len(), "sending");
    registry
        .send(&args.channel, message, attachments)
        .await
        .with_context(|| format!("{} send failed", args.channel))?;

    println!(
        "  {} sent via {} to {} recipient(s)",
        "✓".green(),
        args.channel.bold(),
        recipients
    );
    Ok(())
}

/// Open every `--attach` path as a streamed attachment.
async fn open_attachments(paths: &[String]) -> Result<Vec<Attachment>> {
    let mut attachments = Vec::with_capacity(paths.len());
    for raw in paths {
        let path = expand_home(raw);
        let file = tokio::fs::File::open(&path)
            .await
            .with_context(|| format!("failed to open attachment: {}", path.display()))?;
        attachments.push(Attachment::new(
            attachment_name(&path),
            guess_content_type(&path),
            file,
        ));
    }
    Ok(attachments)
}

fn attachment_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use notifyr_core::read_content;
    use std::io::Write;

    #[tokio::test]
    async fn open_attachments_streams_files() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(b"a,b\n").unwrap();
        let path = file.path().to_string_lossy().into_owned();

        let mut attachments = open_attachments(&[path]).await.unwrap();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].content_type, "text/csv");
        assert!(attachments[0].filename.ends_with(".csv"));

        let mut reader = attachments[0].content.take().unwrap();
        assert_eq!(read_content(&mut reader).await.unwrap(), b"a,b\n");
    }

    #[tokio::test]
    async fn open_attachments_missing_file() {
        let err = open_attachments(&["/nonexistent/notifyr/file.txt".to_string()])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to open attachment"));
    }

    #[tokio::test]
    async fn unconfigured_channel_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.json");
        std::fs::write(&config, "{}").unwrap();

        let err = run(SendArgs {
            channel: "pager".into(),
            to: vec!["1".into()],
            subject: String::new(),
            message: Some("hi".into()),
            attach: vec![],
            config: Some(config),
        })
        .await
        .unwrap_err();
        assert!(err.to_string().contains("'pager' is not configured"));
    }

    #[test]
    fn attachment_name_from_path() {
        assert_eq!(attachment_name(Path::new("/tmp/report.pdf")), "report.pdf");
        assert_eq!(attachment_name(Path::new("/")), "attachment");
    }
}

//! Notifyr CLI: entry point.
//!
//! # Commands
//!
//! - `notifyr send -c CHANNEL -t ADDR... [-s SUBJECT] [-m MESSAGE | stdin] [-a FILE...]`
//! - `notifyr status`: show config path and channel status
//! - `notifyr init`: write a default config file

mod helpers;
mod init_cmd;
mod send_cmd;
mod status;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use send_cmd::SendArgs;

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// Notifyr: send notifications to Bitrix24, Telegram and e-mail
#[derive(Parser)]
#[command(name = "notifyr", version, about, long_about = None)]
struct Cli {
    /// Config file (default: ~/.notifyr/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a message through one channel
    Send {
        /// Channel name: bitrix, telegram or email
        #[arg(short, long)]
        channel: String,

        /// Recipient address (repeatable)
        #[arg(short, long = "to", required = true)]
        to: Vec<String>,

        /// Subject (e-mail subject, Bitrix notification text)
        #[arg(short, long, default_value = "")]
        subject: String,

        /// Message body. Omit to read it from stdin.
        #[arg(short, long)]
        message: Option<String>,

        /// File to attach (repeatable, e-mail only)
        #[arg(short, long = "attach")]
        attach: Vec<String>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Show configuration and channel status
    Status,

    /// Write a default config file
    Init,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config.map(|p| notifyr_core::utils::expand_home(&p.to_string_lossy()));

    match cli.command {
        Commands::Send {
            channel,
            to,
            subject,
            message,
            attach,
            logs,
        } => {
            init_logging(logs);
            send_cmd::run(SendArgs {
                channel,
                to,
                subject,
                message,
                attach,
                config,
            })
            .await
        }
        Commands::Status => status::run(config.as_deref()),
        Commands::Init => init_cmd::run(config.as_deref()),
    }
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("notifyr=debug,notifyr_core=debug,notifyr_channels=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

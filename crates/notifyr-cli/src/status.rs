//! `notifyr status`: show the config file and which channels are usable.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use notifyr_core::config::{get_config_path, load_config};
use notifyr_core::utils::truncate_string;

use crate::helpers::{mask_secret, status_mark};

/// Widest detail value printed per channel.
const DETAIL_WIDTH: usize = 48;

/// Run the status command.
pub fn run(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path);
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(get_config_path);

    println!();
    println!("{}", "Notifyr Status".cyan().bold());
    println!();

    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        path.display(),
        if path.exists() {
            "✓".green().to_string()
        } else {
            "(not found, using defaults)".red().to_string()
        }
    );

    println!();
    println!("  {}", "Channels:".bold());

    let bitrix = &config.channels.bitrix;
    let mode = if bitrix.is_bot() { "bot" } else { "user" };
    print_channel(
        "bitrix",
        bitrix.is_configured(),
        &format!(
            "{}://{} ({mode}, token {})",
            bitrix.proto,
            bitrix.host,
            mask_secret(&bitrix.token)
        ),
    );

    let telegram = &config.channels.telegram;
    print_channel(
        "telegram",
        telegram.is_configured(),
        &format!("{} (token {})", telegram.host, mask_secret(&telegram.token)),
    );

    let email = &config.channels.email;
    print_channel(
        "email",
        email.is_configured(),
        &format!("{}:{} as {}", email.smtp_host, email.smtp_port, email.smtp_user),
    );

    println!();
    Ok(())
}

fn print_channel(name: &str, configured: bool, detail: &str) {
    if configured {
        println!(
            "    {:<12} {} {}",
            name,
            status_mark(true),
            truncate_string(detail, DETAIL_WIDTH).dimmed()
        );
    } else {
        println!("    {:<12} {}", name, status_mark(false));
    }
}

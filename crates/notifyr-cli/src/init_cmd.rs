//! `notifyr init`: write a default config file to fill in.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use notifyr_core::config::{get_config_path, save_config, Config};

/// Run the init command. An existing file is left untouched.
pub fn run(config_path: Option<&Path>) -> Result<()> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(get_config_path);

    println!();
    println!("{}", "Notifyr Setup".cyan().bold());
    println!();

    if path.exists() {
        println!("  {} config already exists at {}", "✓".green(), path.display());
    } else {
        save_config(&Config::default(), Some(&path))
            .with_context(|| format!("failed to write config: {}", path.display()))?;
        println!("  {} created config at {}", "✓".green(), path.display());
    }

    println!();
    println!(
        "{}",
        "Fill in the channels you use, then check them with `notifyr status`.".dimmed()
    );
    println!();
    Ok(())
}

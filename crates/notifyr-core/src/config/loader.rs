//! Config loader: reads `~/.notifyr/config.json`, merges env vars, and
//! applies legacy migrations.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.notifyr/config.json`
//! 3. Environment variables `NOTIFYR_CHANNELS__<CHANNEL>__<FIELD>` (override JSON)

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::Config;

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the given path (or the default one) + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    load_config_from_path(&config_path)
}

/// Load config from a specific file path.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return apply_env_overrides(Config::default());
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    let mut raw: serde_json::Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            return apply_env_overrides(Config::default());
        }
    };

    migrate_config(&mut raw);

    let config: Config = match serde_json::from_value(raw) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to deserialize config: {}", e);
            return apply_env_overrides(Config::default());
        }
    };

    apply_env_overrides(config)
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply legacy config migrations.
///
/// `channels.bitrix.lifetimeMessage` was expressed in hours; it becomes
/// `channels.bitrix.messageLifetimeSecs` unless that key is already set.
fn migrate_config(raw: &mut serde_json::Value) {
    let Some(bitrix) = raw
        .get_mut("channels")
        .and_then(|c| c.get_mut("bitrix"))
        .and_then(|b| b.as_object_mut())
    else {
        return;
    };

    if bitrix.contains_key("messageLifetimeSecs") {
        return;
    }
    if let Some(hours) = bitrix.get("lifetimeMessage").and_then(|v| v.as_u64()) {
        bitrix.insert(
            "messageLifetimeSecs".to_string(),
            serde_json::Value::from(hours.saturating_mul(3600)),
        );
        debug!("Migrated channels.bitrix.lifetimeMessage → messageLifetimeSecs");
    }
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `NOTIFYR_CHANNELS__<CHANNEL>__<FIELD>` (double underscore as delimiter).
///
/// Supported overrides:
/// - `NOTIFYR_CHANNELS__BITRIX__HOST` / `__TOKEN` / `__USER_ID`
/// - `NOTIFYR_CHANNELS__TELEGRAM__TOKEN` / `__HOST`
/// - `NOTIFYR_CHANNELS__EMAIL__SMTP_HOST` / `__SMTP_PORT` / `__SMTP_USER` / `__SMTP_PASS`
fn apply_env_overrides(mut config: Config) -> Config {
    let bitrix = &mut config.channels.bitrix;
    if let Ok(val) = std::env::var("NOTIFYR_CHANNELS__BITRIX__HOST") {
        bitrix.host = val;
    }
    if let Ok(val) = std::env::var("NOTIFYR_CHANNELS__BITRIX__TOKEN") {
        bitrix.token = val;
    }
    if let Ok(val) = std::env::var("NOTIFYR_CHANNELS__BITRIX__USER_ID") {
        bitrix.user_id = val;
    }

    let telegram = &mut config.channels.telegram;
    if let Ok(val) = std::env::var("NOTIFYR_CHANNELS__TELEGRAM__TOKEN") {
        telegram.token = val;
    }
    if let Ok(val) = std::env::var("NOTIFYR_CHANNELS__TELEGRAM__HOST") {
        telegram.host = val;
    }

    let email = &mut config.channels.email;
    if let Ok(val) = std::env::var("NOTIFYR_CHANNELS__EMAIL__SMTP_HOST") {
        email.smtp_host = val;
    }
    if let Ok(val) = std::env::var("NOTIFYR_CHANNELS__EMAIL__SMTP_PORT") {
        if let Ok(p) = val.parse::<u16>() {
            email.smtp_port = p;
        }
    }
    if let Ok(val) = std::env::var("NOTIFYR_CHANNELS__EMAIL__SMTP_USER") {
        email.smtp_user = val;
    }
    if let Ok(val) = std::env::var("NOTIFYR_CHANNELS__EMAIL__SMTP_PASS") {
        email.smtp_pass = val;
    }

    config
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

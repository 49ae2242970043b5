//! Configuration schema: one section per delivery channel.
//!
//! Hierarchy: `Config` → `ChannelsConfig` → `BitrixConfig`, `TelegramConfig`,
//! `EmailConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration: loaded from `~/.notifyr/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub channels: ChannelsConfig,
}

/// All channel configurations.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChannelsConfig {
    #[serde(default)]
    pub bitrix: BitrixConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub email: EmailConfig,
}

/// Convert a seconds field to a `Duration`, treating 0 as "not set".
fn positive_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

fn default_https() -> String {
    "https".to_string()
}

fn default_http_timeout() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

// ─────────────────────────────────────────────
// Bitrix
// ─────────────────────────────────────────────

/// Bitrix24 REST channel config.
///
/// Requests go to `{proto}://{host}/rest/{userId}/{token}/{method}`.
/// Setting `botId` switches to the bot-scoped `imbot.*` methods.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BitrixConfig {
    /// URL scheme (default `https`).
    #[serde(default = "default_https")]
    pub proto: String,
    /// Portal host, e.g. `company.bitrix24.eu`.
    #[serde(default)]
    pub host: String,
    /// Incoming webhook token.
    #[serde(default)]
    pub token: String,
    /// Id of the user that owns the webhook.
    #[serde(default)]
    pub user_id: String,
    /// Chat-bot id; empty = plain `im.*` methods.
    #[serde(default)]
    pub bot_id: String,
    /// Chat-bot client id (sent alongside `botId`).
    #[serde(default)]
    pub client_id: String,
    /// Per-request timeout in seconds (0 = none).
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
    /// Delete posted messages after this many seconds (0 = keep).
    #[serde(default)]
    pub message_lifetime_secs: u64,
    /// Send a system notification to each recipient user before the message.
    #[serde(default)]
    pub use_notification: bool,
    /// Prefix that marks a dialog id as a group chat (`chat123`).
    #[serde(default = "default_chat_prefix")]
    pub chat_prefix: String,
}

fn default_chat_prefix() -> String {
    "chat".to_string()
}

impl Default for BitrixConfig {
    fn default() -> Self {
        Self {
            proto: default_https(),
            host: String::new(),
            token: String::new(),
            user_id: String::new(),
            bot_id: String::new(),
            client_id: String::new(),
            timeout_secs: default_http_timeout(),
            message_lifetime_secs: 0,
            use_notification: false,
            chat_prefix: default_chat_prefix(),
        }
    }
}

impl BitrixConfig {
    /// Whether host, token and user id are all set.
    pub fn is_configured(&self) -> bool {
        !self.host.is_empty() && !self.token.is_empty() && !self.user_id.is_empty()
    }

    /// Whether the bot-scoped `imbot.*` methods should be used.
    pub fn is_bot(&self) -> bool {
        !self.bot_id.is_empty()
    }

    pub fn timeout(&self) -> Option<Duration> {
        positive_secs(self.timeout_secs)
    }

    pub fn message_lifetime(&self) -> Option<Duration> {
        positive_secs(self.message_lifetime_secs)
    }
}

// ─────────────────────────────────────────────
// Telegram
// ─────────────────────────────────────────────

/// Telegram Bot API channel config.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TelegramConfig {
    #[serde(default = "default_https")]
    pub proto: String,
    /// API host (default `api.telegram.org`).
    #[serde(default = "default_telegram_host")]
    pub host: String,
    /// Bot token from @BotFather.
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
    /// Delete sent messages after this many seconds (0 = keep).
    #[serde(default)]
    pub message_lifetime_secs: u64,
    /// `parse_mode` sent with every message.
    #[serde(default = "default_parse_mode")]
    pub parse_mode: String,
}

fn default_telegram_host() -> String {
    "api.telegram.org".to_string()
}

fn default_parse_mode() -> String {
    "html".to_string()
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            proto: default_https(),
            host: default_telegram_host(),
            token: String::new(),
            timeout_secs: default_http_timeout(),
            message_lifetime_secs: 0,
            parse_mode: default_parse_mode(),
        }
    }
}

impl TelegramConfig {
    pub fn is_configured(&self) -> bool {
        !self.token.is_empty()
    }

    pub fn timeout(&self) -> Option<Duration> {
        positive_secs(self.timeout_secs)
    }

    pub fn message_lifetime(&self) -> Option<Duration> {
        positive_secs(self.message_lifetime_secs)
    }
}

// ─────────────────────────────────────────────
// Email
// ─────────────────────────────────────────────

/// SMTP channel config.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmailConfig {
    /// SMTP server hostname.
    #[serde(default)]
    pub smtp_host: String,
    /// SMTP server port (default 587 for STARTTLS).
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP login; also the sender address.
    #[serde(default)]
    pub smtp_user: String,
    #[serde(default)]
    pub smtp_pass: String,
    /// Display name in the `From` header.
    #[serde(default)]
    pub visible_name: String,
    /// Overall send deadline in seconds (0 = wait for the server).
    #[serde(default)]
    pub timeout_secs: u64,
    /// Skip SMTP authentication entirely.
    #[serde(default)]
    pub without_auth: bool,
    /// Use STARTTLS (default true).
    #[serde(default = "default_true")]
    pub smtp_use_tls: bool,
    /// Use implicit TLS/SMTPS (default false, for port 465).
    #[serde(default)]
    pub smtp_use_ssl: bool,
}

fn default_smtp_port() -> u16 {
    587
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: String::new(),
            smtp_port: default_smtp_port(),
            smtp_user: String::new(),
            smtp_pass: String::new(),
            visible_name: String::new(),
            timeout_secs: 0,
            without_auth: false,
            smtp_use_tls: true,
            smtp_use_ssl: false,
        }
    }
}

impl EmailConfig {
    pub fn is_configured(&self) -> bool {
        !self.smtp_host.is_empty() && !self.smtp_user.is_empty()
    }

    pub fn timeout(&self) -> Option<Duration> {
        positive_secs(self.timeout_secs)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.channels.bitrix.proto, "https");
        assert_eq!(config.channels.bitrix.chat_prefix, "chat");
        assert_eq!(config.channels.bitrix.timeout_secs, 10);
        assert_eq!(config.channels.telegram.host, "api.telegram.org");
        assert_eq!(config.channels.telegram.parse_mode, "html");
        assert_eq!(config.channels.email.smtp_port, 587);
        assert!(config.channels.email.smtp_use_tls);
        assert!(!config.channels.email.without_auth);
    }

    #[test]
    fn test_empty_json_gives_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.channels.telegram.host, "api.telegram.org");
        assert!(!config.channels.bitrix.is_configured());
        assert!(!config.channels.telegram.is_configured());
        assert!(!config.channels.email.is_configured());
    }

    #[test]
    fn test_channel_config_from_json() {
        let json = serde_json::json!({
            "channels": {
                "bitrix": {
                    "host": "company.bitrix24.eu",
                    "token": "777token666",
                    "userId": "1234",
                    "botId": "55",
                    "clientId": "abc",
                    "messageLifetimeSecs": 3600,
                    "useNotification": true
                },
                "telegram": {
                    "token": "bot123:ABC"
                },
                "email": {
                    "smtpHost": "smtp.example.com",
                    "smtpPort": 465,
                    "smtpUser": "robot@example.com",
                    "smtpUseSsl": true,
                    "withoutAuth": true
                }
            }
        });

        let config: Config = serde_json::from_value(json).unwrap();
        let bx = &config.channels.bitrix;
        assert!(bx.is_configured());
        assert!(bx.is_bot());
        assert!(bx.use_notification);
        assert_eq!(bx.message_lifetime(), Some(Duration::from_secs(3600)));
        // Default preserved
        assert_eq!(bx.proto, "https");

        assert_eq!(config.channels.telegram.token, "bot123:ABC");
        assert!(config.channels.telegram.is_configured());

        let email = &config.channels.email;
        assert!(email.is_configured());
        assert_eq!(email.smtp_port, 465);
        assert!(email.smtp_use_ssl);
        assert!(email.without_auth);
    }

    #[test]
    fn test_zero_durations_are_unset() {
        let bx = BitrixConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(bx.timeout(), None);
        assert_eq!(bx.message_lifetime(), None);
        assert_eq!(EmailConfig::default().timeout(), None);
        assert_eq!(
            TelegramConfig::default().timeout(),
            Some(Duration::from_secs(10))
        );
    }

    #[test]
    fn test_config_json_uses_camel_case() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert!(json["channels"]["bitrix"].get("messageLifetimeSecs").is_some());
        assert!(json["channels"]["email"].get("withoutAuth").is_some());
        assert!(json["channels"]["email"].get("without_auth").is_none());
    }

    #[test]
    fn test_config_serialization_round_trip() {
        let mut config = Config::default();
        config.channels.bitrix.host = "h.example".into();
        let json_str = serde_json::to_string_pretty(&config).unwrap();
        let deserialized: Config = serde_json::from_str(&json_str).unwrap();
        assert_eq!(deserialized.channels.bitrix.host, "h.example");
        assert_eq!(deserialized.channels.email.smtp_port, 587);
    }
}

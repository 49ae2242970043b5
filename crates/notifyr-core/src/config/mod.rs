//! Configuration system: schema, loading, and env var overrides.
//!
//! # Usage
//! ```no_run
//! use notifyr_core::config;
//!
//! let cfg = config::load_config(None);
//! println!("Telegram host: {}", cfg.channels.telegram.host);
//! ```

pub mod loader;
pub mod schema;

// Re-export key types
pub use loader::{get_config_path, load_config, save_config};
pub use schema::{BitrixConfig, ChannelsConfig, Config, EmailConfig, TelegramConfig};

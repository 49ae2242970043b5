//! Notifyr Core: the channel-independent half of Notifyr.
//!
//! This crate provides:
//! - **types**: `Message` and `Attachment`, the payload every channel delivers
//! - **error**: `NotifyError`, the error taxonomy returned from a send
//! - **address**: `Address`, deterministic endpoint URL construction
//! - **config**: JSON config schema, loader and env var overrides

pub mod address;
pub mod config;
pub mod error;
pub mod types;
pub mod utils;

pub use address::Address;
pub use error::NotifyError;
pub use types::{read_content, Attachment, ContentReader, Message};

//! Notifyr Channels: delivery backends.
//!
//! This crate provides:
//! - **base**: The `Notificator` trait every channel implements
//! - **manager**: `NotifierRegistry`: builds channels from config and routes sends
//! - **http**: single-request executor shared by the REST channels
//!
//! Channels are feature-gated modules, all enabled by default.

pub mod base;
pub mod manager;

#[cfg(any(feature = "bitrix", feature = "telegram"))]
pub mod http;

#[cfg(any(feature = "bitrix", feature = "telegram"))]
mod detached;

#[cfg(feature = "bitrix")]
pub mod bitrix;

#[cfg(feature = "telegram")]
pub mod telegram;

#[cfg(feature = "email")]
pub mod email;

pub use base::Notificator;
pub use manager::NotifierRegistry;

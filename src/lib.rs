//! notifex library
//!
//! Core of a notification service extension: takes an incoming push
//! notification, optionally fetches the media it references, writes it to a
//! scoped temp file, and publishes the enriched content exactly once before
//! the host's deadline.

pub mod cli;
pub mod config;
pub mod logging;
pub mod media;
pub mod notification;

pub use config::Config;
pub use media::{Attachment, MediaKind};
pub use notification::{EnrichmentPipeline, ExpiryHandle, NotificationContent};

//! Media pipeline module
//!
//! Turns a media reference from a push payload into an attachment file:
//!
//! - **MediaKind / MediaDescriptor**: the closed set of supported kinds, and
//!   one fetched asset with its canonical file name and display options
//! - **MediaFetcher**: URL validation and bounded retrieval through a
//!   pluggable `MediaSource` (HTTP/HTTPS via reqwest, `file://` from disk)
//! - **AttachmentBuilder**: writes bytes to a uniquely named directory under
//!   a temp root and wraps the file as an `Attachment`
//!
//! Failures never escape as errors from the high-level entry points; they are
//! logged and reported as `None` so the caller can still deliver content.
//!
//! # Example
//!
//! ```ignore
//! use notifex::media::{AttachmentBuilder, FetchConfig, MediaFetcher, MediaKind};
//!
//! let fetcher = MediaFetcher::from_config(&FetchConfig::default(), AttachmentBuilder::default())?;
//! if let Some(attachment) = fetcher.fetch(MediaKind::Image, "https://example.com/a.png").await {
//!     println!("{} at {}", attachment.identifier, attachment.path.display());
//! }
//! ```

pub mod attachment;
pub mod fetch;
pub mod ids;
pub mod kind;

pub use attachment::{Attachment, AttachmentBuilder, AttachmentError};
pub use fetch::{
    parse_media_url, path_extension, FetchConfig, FetchError, HttpMediaSource, MediaFetcher,
    MediaSource, DEFAULT_FETCH_TIMEOUT_MS, DEFAULT_MAX_SIZE, DEFAULT_USER_AGENT,
    MAX_FETCH_TIMEOUT_MS, MAX_URL_LENGTH,
};
pub use ids::{IdGenerator, SequentialIds, UuidGenerator};
pub use kind::{
    DisplayOptions, MediaDescriptor, MediaKind, UnknownMediaKind, THUMBNAIL_CLIPPING_RECT_KEY,
    THUMBNAIL_HIDDEN_KEY, THUMBNAIL_TIME_KEY,
};

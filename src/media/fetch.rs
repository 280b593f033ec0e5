//! Media retrieval.
//!
//! [`MediaFetcher`] turns a `mediaUrl` string into an [`Attachment`]:
//! validate the URL, pull the bytes through a [`MediaSource`], and hand the
//! result to the [`AttachmentBuilder`]. Retrieval is the only slow step, so
//! it is the only thing behind the `MediaSource` seam.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use percent_encoding::percent_decode_str;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use super::attachment::{Attachment, AttachmentBuilder};
use super::kind::{MediaDescriptor, MediaKind};

/// Default per-request timeout.
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;

/// Upper bound on the configurable timeout.
pub const MAX_FETCH_TIMEOUT_MS: u64 = 60_000;

/// Default cap on downloaded bytes (20 MiB).
pub const DEFAULT_MAX_SIZE: u64 = 20 * 1024 * 1024;

/// Longest accepted `mediaUrl`.
pub const MAX_URL_LENGTH: usize = 2048;

/// Default `User-Agent` header for HTTP retrieval.
pub const DEFAULT_USER_AGENT: &str = concat!("notifex/", env!("CARGO_PKG_VERSION"));

/// Errors that can occur while retrieving media.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("URL length {0} exceeds maximum of {}", MAX_URL_LENGTH)]
    UrlTooLong(usize),

    #[error("unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("resource exceeds {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Retrieval settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Per-request timeout in milliseconds, clamped to [`MAX_FETCH_TIMEOUT_MS`].
    pub timeout_ms: u64,
    /// Maximum number of bytes to accept.
    pub max_size: u64,
    /// Accept `file://` URLs.
    pub allow_file_urls: bool,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            max_size: DEFAULT_MAX_SIZE,
            allow_file_urls: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.min(MAX_FETCH_TIMEOUT_MS))
    }
}

/// Something that can produce the bytes behind a URL.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn retrieve(&self, url: &Url) -> Result<Bytes, FetchError>;
}

/// Retrieves `http`/`https` URLs with reqwest and `file` URLs from disk.
pub struct HttpMediaSource {
    client: reqwest::Client,
    max_size: u64,
}

impl HttpMediaSource {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let timeout = config.timeout();
        let client = reqwest::Client::builder()
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .timeout(timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            max_size: config.max_size,
        })
    }

    async fn get(&self, url: &Url) -> Result<Bytes, FetchError> {
        let mut response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        if let Some(len) = response.content_length() {
            if len > self.max_size {
                return Err(FetchError::TooLarge {
                    limit: self.max_size,
                });
            }
        }

        let mut buf = BytesMut::new();
        while let Some(chunk) = response.chunk().await? {
            if (buf.len() + chunk.len()) as u64 > self.max_size {
                return Err(FetchError::TooLarge {
                    limit: self.max_size,
                });
            }
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }

    async fn read_file(&self, url: &Url) -> Result<Bytes, FetchError> {
        let path = url
            .to_file_path()
            .map_err(|()| FetchError::InvalidUrl(format!("not a local file path: {url}")))?;

        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|source| FetchError::Io {
                path: path.clone(),
                source,
            })?;
        if meta.len() > self.max_size {
            return Err(FetchError::TooLarge {
                limit: self.max_size,
            });
        }

        let data = tokio::fs::read(&path)
            .await
            .map_err(|source| FetchError::Io { path, source })?;
        Ok(Bytes::from(data))
    }
}

#[async_trait]
impl MediaSource for HttpMediaSource {
    async fn retrieve(&self, url: &Url) -> Result<Bytes, FetchError> {
        match url.scheme() {
            "file" => self.read_file(url).await,
            _ => self.get(url).await,
        }
    }
}

/// Parse and validate a `mediaUrl` value.
pub fn parse_media_url(input: &str, allow_file_urls: bool) -> Result<Url, FetchError> {
    if input.len() > MAX_URL_LENGTH {
        return Err(FetchError::UrlTooLong(input.len()));
    }

    let url = Url::parse(input).map_err(|e| FetchError::InvalidUrl(format!("{input}: {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        "file" if allow_file_urls => Ok(url),
        other => Err(FetchError::UnsupportedScheme(other.to_string())),
    }
}

/// Extension of the last non-empty path segment, percent-decoded, without
/// the dot.
///
/// Empty when the segment has no dot, when its only dot is the first
/// character (`.hidden`), or when it does not decode to a plain UTF-8 name.
pub fn path_extension(url: &Url) -> String {
    let raw = url
        .path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .unwrap_or("");
    let segment = match percent_decode_str(raw).decode_utf8() {
        Ok(decoded) if !decoded.contains('/') => decoded,
        _ => return String::new(),
    };

    match segment.rfind('.') {
        None | Some(0) => String::new(),
        Some(idx) => segment[idx + 1..].to_string(),
    }
}

/// Fetches media and materializes it as an attachment.
#[derive(Clone)]
pub struct MediaFetcher {
    source: Arc<dyn MediaSource>,
    builder: AttachmentBuilder,
    allow_file_urls: bool,
}

impl MediaFetcher {
    pub fn new(source: Arc<dyn MediaSource>, builder: AttachmentBuilder) -> Self {
        Self {
            source,
            builder,
            allow_file_urls: true,
        }
    }

    /// Fetcher backed by [`HttpMediaSource`].
    pub fn from_config(config: &FetchConfig, builder: AttachmentBuilder) -> Result<Self, FetchError> {
        let source = HttpMediaSource::new(config)?;
        Ok(Self::new(Arc::new(source), builder).with_file_urls(config.allow_file_urls))
    }

    pub fn with_file_urls(mut self, allow: bool) -> Self {
        self.allow_file_urls = allow;
        self
    }

    /// Fetch `url` and build an attachment of the given kind.
    ///
    /// Every failure is logged and reported as `None`; nothing is retried.
    pub async fn fetch(&self, kind: MediaKind, url: &str) -> Option<Attachment> {
        match self.download(kind, url).await {
            Ok(media) => self.builder.build(media).await,
            Err(e) => {
                warn!(kind = %kind, url = %url, error = %e, "media fetch failed");
                None
            }
        }
    }

    /// Validate and retrieve `url` without writing anything to disk.
    pub async fn download(&self, kind: MediaKind, url: &str) -> Result<MediaDescriptor, FetchError> {
        let url = parse_media_url(url, self.allow_file_urls)?;
        let bytes = self.source.retrieve(&url).await?;
        debug!(kind = %kind, url = %url, size = bytes.len(), "media retrieved");
        Ok(MediaDescriptor::new(kind, bytes, path_extension(&url)))
    }
}

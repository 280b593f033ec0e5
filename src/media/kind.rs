//! Media kinds and descriptors.
//!
//! A [`MediaDescriptor`] is the in-memory form of one fetched asset. It knows
//! the file name it should be written under and the presentation hints the
//! host renderer uses when showing it as an attachment thumbnail.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Option key: clipping rectangle (unit coordinates) used for the thumbnail.
pub const THUMBNAIL_CLIPPING_RECT_KEY: &str = "thumbnailClippingRect";

/// Option key: time offset (seconds) of the frame used as thumbnail.
pub const THUMBNAIL_TIME_KEY: &str = "thumbnailTime";

/// Option key: hide the thumbnail entirely.
pub const THUMBNAIL_HIDDEN_KEY: &str = "thumbnailHidden";

/// Error returned when a `mediaType` string is not a known kind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized media kind: {0}")]
pub struct UnknownMediaKind(pub String);

/// Kind of media an attachment carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Gif,
    Video,
    Audio,
}

impl MediaKind {
    /// All kinds, in declaration order.
    pub const ALL: [MediaKind; 4] = [
        MediaKind::Image,
        MediaKind::Gif,
        MediaKind::Video,
        MediaKind::Audio,
    ];

    /// Wire name of the kind, as used in payload metadata and file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Gif => "gif",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
        }
    }

    /// Extension used when the source URL carries none.
    pub fn default_extension(&self) -> &'static str {
        match self {
            MediaKind::Image => "jpg",
            MediaKind::Gif => "gif",
            MediaKind::Video => "mp4",
            MediaKind::Audio => "mp3",
        }
    }

    /// Presentation hints for an attachment of this kind.
    pub fn display_options(&self) -> DisplayOptions {
        let mut options = DisplayOptions::new();
        match self {
            MediaKind::Image => {
                // Top half of the asset, in unit coordinates.
                options.insert(
                    THUMBNAIL_CLIPPING_RECT_KEY,
                    json!({ "x": 0.0, "y": 0.0, "width": 1.0, "height": 0.5 }),
                );
            }
            MediaKind::Gif | MediaKind::Video => {
                options.insert(THUMBNAIL_TIME_KEY, json!(0));
            }
            MediaKind::Audio => {
                options.insert(THUMBNAIL_HIDDEN_KEY, json!(true));
            }
        }
        options
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = UnknownMediaKind;

    /// Exact, case-sensitive match on the wire name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(MediaKind::Image),
            "gif" => Ok(MediaKind::Gif),
            "video" => Ok(MediaKind::Video),
            "audio" => Ok(MediaKind::Audio),
            other => Err(UnknownMediaKind(other.to_string())),
        }
    }
}

/// Ordered key/value presentation hints attached to an [`Attachment`].
///
/// Exact semantics of each hint are up to the renderer; this crate only
/// guarantees which hints each [`MediaKind`] produces.
///
/// [`Attachment`]: crate::media::Attachment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayOptions(BTreeMap<String, Value>);

impl DisplayOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One fetched media asset, ready to be written to disk.
#[derive(Debug, Clone)]
pub struct MediaDescriptor {
    kind: MediaKind,
    bytes: Bytes,
    extension: String,
}

impl MediaDescriptor {
    /// Create a descriptor. `extension` may be empty, in which case the
    /// kind's default extension is used.
    pub fn new(kind: MediaKind, bytes: impl Into<Bytes>, extension: impl Into<String>) -> Self {
        Self {
            kind,
            bytes: bytes.into(),
            extension: extension.into(),
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Extension from the source, or the kind default when none was given.
    pub fn file_extension(&self) -> &str {
        if self.extension.is_empty() {
            self.kind.default_extension()
        } else {
            &self.extension
        }
    }

    /// `{kind}.{extension}`, e.g. `image.png` or `audio.mp3`.
    pub fn canonical_file_name(&self) -> String {
        format!("{}.{}", self.kind, self.file_extension())
    }

    pub fn display_options(&self) -> DisplayOptions {
        self.kind.display_options()
    }
}

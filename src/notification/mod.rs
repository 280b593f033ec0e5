//! Notification content and its media metadata.

pub mod payload;
pub mod pipeline;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::media::{Attachment, MediaKind};

pub use payload::PayloadError;
pub use pipeline::{
    ContentHandler, EnrichmentOutcome, EnrichmentPipeline, ExpiryHandle, DEFAULT_DEADLINE_MS,
    DEFAULT_TITLE_SUFFIX,
};

/// Payload key holding the media URL.
pub const MEDIA_URL_KEY: &str = "mediaUrl";

/// Payload key holding the media kind.
pub const MEDIA_TYPE_KEY: &str = "mediaType";

/// Content of one notification as shown to the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationContent {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subtitle: String,
    #[serde(default)]
    pub body: String,
    /// Custom payload data, including the media keys.
    #[serde(default)]
    pub user_info: Map<String, Value>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl NotificationContent {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            ..Self::default()
        }
    }

    /// Set a `user_info` entry.
    pub fn with_user_info(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.user_info.insert(key.into(), value.into());
        self
    }

    /// The media this notification asks for, if any.
    pub fn media_request(&self) -> Option<MediaRequest> {
        MediaRequest::from_user_info(&self.user_info)
    }
}

/// A media reference taken from payload metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRequest {
    pub kind: MediaKind,
    pub url: String,
}

impl MediaRequest {
    /// Extract `mediaUrl` and `mediaType` from payload metadata.
    ///
    /// Both keys must be present as strings and the kind must be one of the
    /// known [`MediaKind`]s; anything else means no media was requested.
    pub fn from_user_info(user_info: &Map<String, Value>) -> Option<Self> {
        let url = user_info.get(MEDIA_URL_KEY)?.as_str()?;
        let kind = user_info.get(MEDIA_TYPE_KEY)?.as_str()?.parse().ok()?;
        Some(Self {
            kind,
            url: url.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_info(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_media_request_present() {
        let req = MediaRequest::from_user_info(&user_info(json!({
            "mediaUrl": "https://x/a.png",
            "mediaType": "image",
        })))
        .unwrap();
        assert_eq!(req.kind, MediaKind::Image);
        assert_eq!(req.url, "https://x/a.png");
    }

    #[test]
    fn test_media_request_missing_keys() {
        assert!(MediaRequest::from_user_info(&user_info(json!({}))).is_none());
        assert!(
            MediaRequest::from_user_info(&user_info(json!({ "mediaUrl": "https://x/a.png" })))
                .is_none()
        );
        assert!(MediaRequest::from_user_info(&user_info(json!({ "mediaType": "gif" }))).is_none());
    }

    #[test]
    fn test_media_request_unrecognized_kind() {
        let info = user_info(json!({ "mediaUrl": "https://x/a.pdf", "mediaType": "document" }));
        assert!(MediaRequest::from_user_info(&info).is_none());
    }

    #[test]
    fn test_media_request_non_string_values() {
        let info = user_info(json!({ "mediaUrl": 42, "mediaType": "image" }));
        assert!(MediaRequest::from_user_info(&info).is_none());
        let info = user_info(json!({ "mediaUrl": "https://x/a.png", "mediaType": ["image"] }));
        assert!(MediaRequest::from_user_info(&info).is_none());
    }

    #[test]
    fn test_content_builder_and_request() {
        let content = NotificationContent::new("Hello", "World")
            .with_user_info(MEDIA_URL_KEY, "https://x/v")
            .with_user_info(MEDIA_TYPE_KEY, "video");
        assert_eq!(content.title, "Hello");
        assert_eq!(content.body, "World");
        assert_eq!(
            content.media_request(),
            Some(MediaRequest {
                kind: MediaKind::Video,
                url: "https://x/v".to_string()
            })
        );
    }

    #[test]
    fn test_content_serializes_camel_case() {
        let content = NotificationContent::new("T", "B").with_user_info("k", 1);
        let value = serde_json::to_value(&content).unwrap();
        assert_eq!(value["title"], "T");
        assert_eq!(value["userInfo"]["k"], 1);
        assert_eq!(value["attachments"], json!([]));
        assert!(value.get("subtitle").is_none());
    }
}

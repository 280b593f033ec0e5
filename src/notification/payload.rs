//! Decoding APNs-style push payloads into [`NotificationContent`].
//!
//! Accepted shape:
//!
//! ```json
//! {
//!   "aps": { "alert": { "title": "...", "subtitle": "...", "body": "..." }, "mutable-content": 1 },
//!   "mediaUrl": "https://...",
//!   "mediaType": "image"
//! }
//! ```
//!
//! `aps.alert` may also be a bare string, which becomes the body. The whole
//! payload object is kept as `user_info`.

use serde_json::{Map, Value};
use thiserror::Error;

use super::NotificationContent;

/// Errors that can occur while decoding a payload.
#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("failed to parse payload: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("payload must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

impl NotificationContent {
    /// Decode a payload from JSON text.
    pub fn from_payload_str(raw: &str) -> Result<Self, PayloadError> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_payload(value)
    }

    /// Decode a payload value.
    pub fn from_payload(value: Value) -> Result<Self, PayloadError> {
        let user_info = match value {
            Value::Object(map) => map,
            other => return Err(PayloadError::NotAnObject(json_type_name(&other))),
        };

        let mut content = NotificationContent::default();
        match user_info.get("aps").and_then(|aps| aps.get("alert")) {
            Some(Value::String(body)) => content.body = body.clone(),
            Some(Value::Object(alert)) => {
                content.title = string_field(alert, "title");
                content.subtitle = string_field(alert, "subtitle");
                content.body = string_field(alert, "body");
            }
            _ => {}
        }
        content.user_info = user_info;
        Ok(content)
    }
}

fn string_field(map: &Map<String, Value>, key: &str) -> String {
    map.get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

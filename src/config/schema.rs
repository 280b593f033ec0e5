//! JSON Schema Generation
//!
//! Generates JSON Schema for notifex configuration validation.
//! Based on draft-07 of the JSON Schema specification.

use serde_json::json;
use serde_json::Value;

use crate::media::{DEFAULT_FETCH_TIMEOUT_MS, DEFAULT_MAX_SIZE, MAX_FETCH_TIMEOUT_MS};
use crate::notification::{DEFAULT_DEADLINE_MS, DEFAULT_TITLE_SUFFIX};

/// Generate the complete JSON schema for notifex configuration
pub fn generate_config_schema() -> Value {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "Notifex Configuration",
        "description": "Configuration schema for the notifex notification enrichment pipeline",
        "type": "object",
        "properties": {
            "logging": generate_logging_schema(),
            "enrichment": generate_enrichment_schema(),
            "media": generate_media_schema(),
        },
        "additionalProperties": false
    })
}

fn generate_logging_schema() -> Value {
    json!({
        "type": "object",
        "description": "Log output settings",
        "properties": {
            "level": {
                "type": "string",
                "description": "Filter directives, e.g. \"info\" or \"notifex=debug\"",
                "default": "info"
            },
            "format": {
                "type": "string",
                "enum": ["text", "json"],
                "default": "text"
            }
        }
    })
}

fn generate_enrichment_schema() -> Value {
    json!({
        "type": "object",
        "description": "Notification enrichment behaviour",
        "properties": {
            "titleSuffix": {
                "type": "string",
                "description": "Text appended to every notification title",
                "default": DEFAULT_TITLE_SUFFIX
            },
            "deadlineMs": {
                "type": "integer",
                "minimum": 0,
                "description": "Time budget per notification in milliseconds",
                "default": DEFAULT_DEADLINE_MS
            }
        }
    })
}

fn generate_media_schema() -> Value {
    json!({
        "type": "object",
        "description": "Media retrieval and attachment storage",
        "properties": {
            "tempDir": {
                "type": "string",
                "description": "Root directory for attachment files (system temp dir when unset)"
            },
            "fetchTimeoutMs": {
                "type": "integer",
                "minimum": 1,
                "maximum": MAX_FETCH_TIMEOUT_MS,
                "default": DEFAULT_FETCH_TIMEOUT_MS
            },
            "maxSize": {
                "type": "integer",
                "minimum": 1,
                "description": "Maximum media size in bytes",
                "default": DEFAULT_MAX_SIZE
            },
            "allowFileUrls": {
                "type": "boolean",
                "default": true
            },
            "userAgent": {
                "type": "string"
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_top_level() {
        let schema = generate_config_schema();
        assert_eq!(schema["$schema"], "http://json-schema.org/draft-07/schema#");
        assert_eq!(schema["type"], "object");
        let props = schema["properties"].as_object().unwrap();
        assert!(props.contains_key("logging"));
        assert!(props.contains_key("enrichment"));
        assert!(props.contains_key("media"));
    }

    #[test]
    fn test_schema_keys_match_config_serialization() {
        let schema = generate_config_schema();
        let config = serde_json::to_value(crate::config::Config::default()).unwrap();

        for (section, value) in config.as_object().unwrap() {
            let props = schema["properties"][section]["properties"]
                .as_object()
                .unwrap_or_else(|| panic!("schema missing section {section}"));
            for key in value.as_object().unwrap().keys() {
                assert!(
                    props.contains_key(key),
                    "schema missing {section}.{key}"
                );
            }
        }
    }

    #[test]
    fn test_schema_defaults() {
        let schema = generate_config_schema();
        assert_eq!(
            schema["properties"]["enrichment"]["properties"]["titleSuffix"]["default"],
            " [modified]"
        );
        assert_eq!(
            schema["properties"]["media"]["properties"]["maxSize"]["default"],
            DEFAULT_MAX_SIZE
        );
    }
}

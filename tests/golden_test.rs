//! Golden payload test runner
//!
//! Runs every fixture under `tests/golden/payloads/` through the enrichment
//! pipeline and compares the published content against the fixture's
//! expectations. Media retrieval is served from memory so fixtures can use
//! arbitrary hosts; `mediaAvailable: false` makes retrieval fail.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use notifex::media::{AttachmentBuilder, FetchError, MediaFetcher, MediaKind, MediaSource};
use notifex::{EnrichmentPipeline, NotificationContent};

/// Root structure for golden payload files
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoldenPayload {
    #[serde(rename = "$schema")]
    schema: Option<String>,
    description: String,
    payload: Value,
    media_available: bool,
    expected: Expected,
}

#[derive(Debug, Deserialize)]
struct Expected {
    title: String,
    body: String,
    attachments: Vec<ExpectedAttachment>,
}

#[derive(Debug, Deserialize)]
struct ExpectedAttachment {
    identifier: String,
    options: Value,
}

/// In-memory source; fails every request when `available` is false.
struct FixtureSource {
    available: bool,
}

#[async_trait]
impl MediaSource for FixtureSource {
    async fn retrieve(&self, url: &Url) -> Result<Bytes, FetchError> {
        if self.available {
            Ok(Bytes::from(format!("bytes of {url}")))
        } else {
            Err(FetchError::Status(404))
        }
    }
}

fn golden_dir() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/golden/payloads")
}

fn golden_files() -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(golden_dir())
        .expect("Failed to read golden directory")
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}

fn load_golden(path: &Path) -> GoldenPayload {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse {}: {}", path.display(), e))
}

async fn run_golden(golden: &GoldenPayload, root: &Path) -> NotificationContent {
    let source = Arc::new(FixtureSource {
        available: golden.media_available,
    });
    let fetcher = MediaFetcher::new(source, AttachmentBuilder::new(root));
    let original = NotificationContent::from_payload(golden.payload.clone())
        .expect("fixture payload should decode");
    EnrichmentPipeline::new(fetcher)
        .enrich(&original, Duration::from_secs(30))
        .await
}

// ============================================================================
// Fixture structure
// ============================================================================

#[test]
fn test_golden_fixtures_present() {
    assert!(
        golden_files().len() >= 8,
        "expected the golden payload corpus, found {:?}",
        golden_files()
    );
}

#[test]
fn test_golden_fixtures_valid() {
    for path in golden_files() {
        let golden = load_golden(&path);
        assert_eq!(
            golden.schema.as_deref(),
            Some("golden-payload-v1"),
            "{}",
            path.display()
        );
        assert!(!golden.description.is_empty(), "{}", path.display());
        assert!(golden.payload.is_object(), "{}", path.display());
        assert!(
            golden.expected.attachments.len() <= 1,
            "{}: enrichment adds at most one attachment",
            path.display()
        );
    }
}

#[test]
fn test_golden_fixtures_cover_every_kind() {
    let covered: HashSet<MediaKind> = golden_files()
        .iter()
        .map(|path| load_golden(path))
        .filter(|golden| !golden.expected.attachments.is_empty())
        .filter_map(|golden| golden.payload["mediaType"].as_str()?.parse().ok())
        .collect();

    for kind in MediaKind::ALL {
        assert!(covered.contains(&kind), "no attached fixture for {kind}");
    }
}

// ============================================================================
// Pipeline against fixtures
// ============================================================================

#[tokio::test]
async fn test_golden_payloads_enrich_as_expected() {
    for path in golden_files() {
        let golden = load_golden(&path);
        let temp_dir = tempfile::tempdir().unwrap();
        let out = run_golden(&golden, temp_dir.path()).await;
        let name = path.display();

        assert_eq!(out.title, golden.expected.title, "{name}: title");
        assert_eq!(out.body, golden.expected.body, "{name}: body");
        assert_eq!(
            out.attachments.len(),
            golden.expected.attachments.len(),
            "{name}: attachment count"
        );

        for (actual, expected) in out.attachments.iter().zip(&golden.expected.attachments) {
            assert_eq!(actual.identifier, expected.identifier, "{name}: identifier");
            assert_eq!(
                serde_json::to_value(&actual.options).unwrap(),
                expected.options,
                "{name}: options"
            );
            assert!(actual.path.starts_with(temp_dir.path()), "{name}: path");
            assert_eq!(
                actual.path.file_name().and_then(|n| n.to_str()),
                Some(expected.identifier.as_str()),
                "{name}: file name"
            );
        }
    }
}

#[tokio::test]
async fn test_golden_payloads_keep_user_info() {
    for path in golden_files() {
        let golden = load_golden(&path);
        let temp_dir = tempfile::tempdir().unwrap();
        let out = run_golden(&golden, temp_dir.path()).await;

        assert_eq!(
            Value::Object(out.user_info),
            golden.payload,
            "{}: user_info must be the untouched payload",
            path.display()
        );
    }
}

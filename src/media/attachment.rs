//! Materializing media descriptors as on-disk attachments.
//!
//! Every attachment gets its own freshly named directory under the temp
//! root, so concurrent requests never write to the same path. Nothing here
//! deletes what it writes: the host reads the file after the content is
//! published, and removal is left to the host via
//! [`Attachment::remove_backing_dir`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::ids::{IdGenerator, UuidGenerator};
use super::kind::{DisplayOptions, MediaDescriptor};

/// Errors that can occur while writing an attachment.
#[derive(Error, Debug)]
pub enum AttachmentError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("media data is empty")]
    EmptyData,

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid attachment {identifier}: {reason}")]
    Invalid { identifier: String, reason: String },
}

/// A media file ready to be shown alongside a notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Canonical file name, e.g. `image.png`.
    pub identifier: String,
    /// Location of the written file.
    pub path: PathBuf,
    /// Renderer hints.
    pub options: DisplayOptions,
    /// Directory allocated by [`AttachmentBuilder`] for this file alone.
    #[serde(skip)]
    pub(crate) scoped_dir: Option<PathBuf>,
}

impl Attachment {
    /// Construct an attachment over an existing, non-empty file.
    pub async fn new(
        identifier: impl Into<String>,
        path: impl Into<PathBuf>,
        options: DisplayOptions,
    ) -> Result<Self, AttachmentError> {
        let identifier = identifier.into();
        let path = path.into();

        if identifier.is_empty() {
            return Err(AttachmentError::Invalid {
                identifier,
                reason: "identifier must not be empty".to_string(),
            });
        }

        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|e| AttachmentError::Invalid {
                identifier: identifier.clone(),
                reason: format!("{}: {}", path.display(), e),
            })?;
        if !meta.is_file() || meta.len() == 0 {
            return Err(AttachmentError::Invalid {
                identifier,
                reason: format!("{} is not a non-empty file", path.display()),
            });
        }

        Ok(Self {
            identifier,
            path,
            options,
            scoped_dir: None,
        })
    }

    /// Delete what was written for this attachment.
    ///
    /// Attachments from [`AttachmentBuilder`] lose their whole scoped
    /// directory; any other attachment only loses its own file. Only call
    /// this once the host has finished reading the file.
    pub async fn remove_backing_dir(&self) -> std::io::Result<()> {
        match &self.scoped_dir {
            Some(dir) => tokio::fs::remove_dir_all(dir).await,
            None => tokio::fs::remove_file(&self.path).await,
        }
    }
}

/// Writes descriptors to uniquely named scratch directories.
#[derive(Clone)]
pub struct AttachmentBuilder {
    temp_root: PathBuf,
    ids: Arc<dyn IdGenerator>,
}

impl std::fmt::Debug for AttachmentBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttachmentBuilder")
            .field("temp_root", &self.temp_root)
            .finish_non_exhaustive()
    }
}

impl Default for AttachmentBuilder {
    fn default() -> Self {
        Self::new(std::env::temp_dir())
    }
}

impl AttachmentBuilder {
    /// Builder rooted at `temp_root`, naming directories with random UUIDs.
    pub fn new(temp_root: impl Into<PathBuf>) -> Self {
        Self {
            temp_root: temp_root.into(),
            ids: Arc::new(UuidGenerator),
        }
    }

    /// Replace the directory name source.
    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn temp_root(&self) -> &Path {
        &self.temp_root
    }

    /// Write `media` to disk and wrap it as an attachment.
    ///
    /// Failures are logged and reported as `None`.
    pub async fn build(&self, media: MediaDescriptor) -> Option<Attachment> {
        let kind = media.kind();
        match self.try_build(media).await {
            Ok(attachment) => {
                debug!(
                    kind = %kind,
                    identifier = %attachment.identifier,
                    path = %attachment.path.display(),
                    "attachment written"
                );
                Some(attachment)
            }
            Err(e) => {
                warn!(kind = %kind, error = %e, "failed to build attachment");
                None
            }
        }
    }

    /// Fallible form of [`build`](Self::build).
    pub async fn try_build(&self, media: MediaDescriptor) -> Result<Attachment, AttachmentError> {
        let dir = self.temp_root.join(self.ids.next_id());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| AttachmentError::CreateDir {
                path: dir.clone(),
                source,
            })?;

        let identifier = media.canonical_file_name();
        let path = dir.join(&identifier);

        if media.bytes().is_empty() {
            return Err(AttachmentError::EmptyData);
        }

        tokio::fs::write(&path, media.bytes())
            .await
            .map_err(|source| AttachmentError::Write {
                path: path.clone(),
                source,
            })?;

        let mut attachment = Attachment::new(identifier, path, media.display_options()).await?;
        attachment.scoped_dir = Some(dir);
        Ok(attachment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::ids::SequentialIds;
    use crate::media::kind::{MediaKind, THUMBNAIL_CLIPPING_RECT_KEY, THUMBNAIL_HIDDEN_KEY};

    fn builder(root: &Path) -> AttachmentBuilder {
        AttachmentBuilder::new(root).with_id_generator(Arc::new(SequentialIds::new("att")))
    }

    #[tokio::test]
    async fn test_build_writes_file_under_scoped_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let media = MediaDescriptor::new(MediaKind::Image, b"png bytes".to_vec(), "png");

        let attachment = builder(temp_dir.path()).build(media).await.unwrap();

        assert_eq!(attachment.identifier, "image.png");
        assert_eq!(
            attachment.path,
            temp_dir.path().join("att-0").join("image.png")
        );
        let written = tokio::fs::read(&attachment.path).await.unwrap();
        assert_eq!(written, b"png bytes");
        assert!(attachment.options.get(THUMBNAIL_CLIPPING_RECT_KEY).is_some());
    }

    #[tokio::test]
    async fn test_build_uses_default_extension() {
        let temp_dir = tempfile::tempdir().unwrap();
        let media = MediaDescriptor::new(MediaKind::Audio, b"id3".to_vec(), "");

        let attachment = builder(temp_dir.path()).build(media).await.unwrap();

        assert_eq!(attachment.identifier, "audio.mp3");
        assert_eq!(attachment.options.get(THUMBNAIL_HIDDEN_KEY), Some(&serde_json::json!(true)));
    }

    #[tokio::test]
    async fn test_build_allocates_fresh_dir_per_call() {
        let temp_dir = tempfile::tempdir().unwrap();
        let builder = builder(temp_dir.path());

        let first = builder
            .build(MediaDescriptor::new(MediaKind::Gif, b"GIF89a".to_vec(), ""))
            .await
            .unwrap();
        let second = builder
            .build(MediaDescriptor::new(MediaKind::Gif, b"GIF89a".to_vec(), ""))
            .await
            .unwrap();

        assert_eq!(first.identifier, second.identifier);
        assert_eq!(first.options, second.options);
        assert_ne!(first.path, second.path);
    }

    #[tokio::test]
    async fn test_build_rejects_empty_bytes() {
        let temp_dir = tempfile::tempdir().unwrap();
        let media = MediaDescriptor::new(MediaKind::Video, Vec::new(), "mov");

        let err = builder(temp_dir.path()).try_build(media.clone()).await.unwrap_err();
        assert!(matches!(err, AttachmentError::EmptyData));
        assert!(builder(temp_dir.path()).build(media).await.is_none());
    }

    #[tokio::test]
    async fn test_build_fails_when_root_is_a_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let blocker = temp_dir.path().join("blocker");
        tokio::fs::write(&blocker, b"x").await.unwrap();

        let media = MediaDescriptor::new(MediaKind::Image, b"data".to_vec(), "jpg");
        let err = builder(&blocker).try_build(media).await.unwrap_err();
        assert!(matches!(err, AttachmentError::CreateDir { .. }));
    }

    #[tokio::test]
    async fn test_build_fails_when_target_is_a_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        // Pre-create the file path as a directory so the write fails.
        tokio::fs::create_dir_all(temp_dir.path().join("att-0").join("image.jpg"))
            .await
            .unwrap();

        let media = MediaDescriptor::new(MediaKind::Image, b"data".to_vec(), "");
        let err = builder(temp_dir.path()).try_build(media).await.unwrap_err();
        assert!(matches!(err, AttachmentError::Write { .. }));
    }

    #[tokio::test]
    async fn test_attachment_new_rejects_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = Attachment::new(
            "image.jpg",
            temp_dir.path().join("missing.jpg"),
            DisplayOptions::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AttachmentError::Invalid { .. }));
    }

    #[tokio::test]
    async fn test_remove_backing_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let media = MediaDescriptor::new(MediaKind::Image, b"data".to_vec(), "jpg");
        let attachment = builder(temp_dir.path()).build(media).await.unwrap();

        attachment.remove_backing_dir().await.unwrap();
        assert!(!temp_dir.path().join("att-0").exists());
        assert!(temp_dir.path().exists());
    }

    #[tokio::test]
    async fn test_remove_backing_dir_leaves_siblings_of_foreign_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let picture = temp_dir.path().join("pic.png");
        let sibling = temp_dir.path().join("notes.txt");
        tokio::fs::write(&picture, b"png").await.unwrap();
        tokio::fs::write(&sibling, b"keep me").await.unwrap();

        let attachment = Attachment::new("image.png", &picture, DisplayOptions::new())
            .await
            .unwrap();
        attachment.remove_backing_dir().await.unwrap();

        assert!(!picture.exists());
        assert!(sibling.exists());
        assert!(temp_dir.path().exists());
    }

    #[test]
    fn test_attachment_serializes_camel_case() {
        let attachment = Attachment {
            identifier: "gif.gif".to_string(),
            path: PathBuf::from("/tmp/x/gif.gif"),
            options: MediaKind::Gif.display_options(),
            scoped_dir: Some(PathBuf::from("/tmp/x")),
        };
        let value = serde_json::to_value(&attachment).unwrap();
        assert!(value.get("scopedDir").is_none());
        assert_eq!(value["identifier"], "gif.gif");
        assert_eq!(value["path"], "/tmp/x/gif.gif");
        assert_eq!(value["options"]["thumbnailTime"], 0);
    }
}

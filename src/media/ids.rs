//! Unique names for per-attachment scratch directories.

use std::sync::atomic::{AtomicU64, Ordering};

/// Source of collision-resistant directory names.
///
/// Injected into [`AttachmentBuilder`](crate::media::AttachmentBuilder) so
/// tests can substitute a deterministic sequence.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Random UUID v4 names, upper-case and hyphenated.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().hyphenated().to_string().to_uppercase()
    }
}

/// `{prefix}-{n}` names from a monotonically increasing counter.
///
/// Unique within one generator only; meant for tests and tooling that need
/// reproducible paths.
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(0),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", self.prefix, n)
    }
}

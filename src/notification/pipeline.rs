//! Notification enrichment pipeline.
//!
//! One call to [`EnrichmentPipeline::receive`] handles one incoming
//! notification:
//!
//! 1. copy the content and append the title suffix
//! 2. look for `mediaUrl`/`mediaType` in `user_info`
//! 3. with no (valid) media request, publish right away
//! 4. otherwise fetch on a spawned task and publish when it settles
//!
//! The host may signal expiry at any time through the returned
//! [`ExpiryHandle`]. Whichever of fetch completion and expiry arrives first
//! publishes; the other is a no-op. The handler is called exactly once.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};

use super::NotificationContent;
use crate::config::Config;
use crate::media::{AttachmentBuilder, FetchError, MediaFetcher};

/// Marker appended to every title the pipeline handles.
pub const DEFAULT_TITLE_SUFFIX: &str = " [modified]";

/// Default time budget for one request.
pub const DEFAULT_DEADLINE_MS: u64 = 30_000;

/// Single-shot receiver of the final content.
pub type ContentHandler = Box<dyn FnOnce(NotificationContent) + Send + 'static>;

/// How a request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichmentOutcome {
    /// No usable media reference in the payload.
    NoMedia,
    /// Media was fetched and attached.
    Attached,
    /// Media was requested but could not be attached.
    Unattached,
    /// The deadline fired before the fetch settled.
    Expired,
}

impl EnrichmentOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrichmentOutcome::NoMedia => "no_media",
            EnrichmentOutcome::Attached => "attached",
            EnrichmentOutcome::Unattached => "unattached",
            EnrichmentOutcome::Expired => "expired",
        }
    }
}

impl fmt::Display for EnrichmentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Publication state shared by the fetch task and the expiry handle.
struct Delivery {
    published: AtomicBool,
    handler: Mutex<Option<ContentHandler>>,
    best_attempt: NotificationContent,
    received_at: Instant,
}

impl Delivery {
    fn new(best_attempt: NotificationContent, handler: ContentHandler) -> Self {
        Self {
            published: AtomicBool::new(false),
            handler: Mutex::new(Some(handler)),
            best_attempt,
            received_at: Instant::now(),
        }
    }

    /// Hand `content` to the handler unless something was already published.
    fn publish(&self, content: NotificationContent, outcome: EnrichmentOutcome) -> bool {
        if self
            .published
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(outcome = %outcome, "content already published, ignoring");
            return false;
        }

        // Only the compare-exchange winner ever locks the slot.
        let handler = self.handler.lock().take();
        info!(
            outcome = %outcome,
            attachments = content.attachments.len(),
            elapsed_ms = self.received_at.elapsed().as_millis() as u64,
            "publishing notification content"
        );
        if let Some(handler) = handler {
            handler(content);
        }
        true
    }

    fn is_published(&self) -> bool {
        self.published.load(Ordering::Acquire)
    }
}

/// Host-side handle for one in-flight request.
pub struct ExpiryHandle {
    delivery: Arc<Delivery>,
    task: Option<JoinHandle<()>>,
}

impl ExpiryHandle {
    /// Signal that the time budget is about to run out.
    ///
    /// Publishes the best-attempt content (suffixed title, no fetched
    /// attachment) if nothing has been published yet. Returns whether this
    /// call published.
    pub fn time_will_expire(&self) -> bool {
        self.delivery
            .publish(self.delivery.best_attempt.clone(), EnrichmentOutcome::Expired)
    }

    /// Whether the handler has been called.
    pub fn is_published(&self) -> bool {
        self.delivery.is_published()
    }

    /// Content that expiry would publish.
    pub fn best_attempt(&self) -> &NotificationContent {
        &self.delivery.best_attempt
    }

    /// Wait for the fetch task, if any, to finish.
    pub async fn settled(mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "enrichment task failed");
            }
        }
    }
}

/// Enriches notifications with fetched media.
#[derive(Clone)]
pub struct EnrichmentPipeline {
    fetcher: MediaFetcher,
    title_suffix: String,
}

impl EnrichmentPipeline {
    pub fn new(fetcher: MediaFetcher) -> Self {
        Self {
            fetcher,
            title_suffix: DEFAULT_TITLE_SUFFIX.to_string(),
        }
    }

    /// Pipeline with an HTTP fetcher and temp root taken from `config`.
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let builder = match &config.media.temp_dir {
            Some(dir) => AttachmentBuilder::new(dir),
            None => AttachmentBuilder::default(),
        };
        let fetcher = MediaFetcher::from_config(&config.media.fetch_config(), builder)?;
        Ok(Self::new(fetcher).with_title_suffix(config.enrichment.title_suffix.clone()))
    }

    pub fn with_title_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.title_suffix = suffix.into();
        self
    }

    pub fn title_suffix(&self) -> &str {
        &self.title_suffix
    }

    /// Start handling `original`; `handler` receives the final content once.
    ///
    /// Returns immediately. When media is requested the fetch runs on the
    /// current Tokio runtime; without one, the content is published
    /// unattached.
    pub fn receive(&self, original: &NotificationContent, handler: ContentHandler) -> ExpiryHandle {
        let mut best_attempt = original.clone();
        best_attempt.title.push_str(&self.title_suffix);

        let request = best_attempt.media_request();
        let delivery = Arc::new(Delivery::new(best_attempt, handler));

        let Some(request) = request else {
            delivery.publish(delivery.best_attempt.clone(), EnrichmentOutcome::NoMedia);
            return ExpiryHandle {
                delivery,
                task: None,
            };
        };

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!(error = %e, "no async runtime available, skipping media fetch");
                delivery.publish(delivery.best_attempt.clone(), EnrichmentOutcome::Unattached);
                return ExpiryHandle {
                    delivery,
                    task: None,
                };
            }
        };

        let span = info_span!("enrich", kind = %request.kind, url = %request.url);
        let fetcher = self.fetcher.clone();
        let shared = Arc::clone(&delivery);
        let task = runtime.spawn(
            async move {
                let attachment = fetcher.fetch(request.kind, &request.url).await;

                let mut content = shared.best_attempt.clone();
                let outcome = match attachment {
                    Some(attachment) => {
                        content.attachments = vec![attachment];
                        EnrichmentOutcome::Attached
                    }
                    None => EnrichmentOutcome::Unattached,
                };
                shared.publish(content, outcome);
            }
            .instrument(span),
        );

        ExpiryHandle {
            delivery,
            task: Some(task),
        }
    }

    /// Enrich `original`, giving up on the fetch once `deadline` elapses.
    pub async fn enrich(
        &self,
        original: &NotificationContent,
        deadline: Duration,
    ) -> NotificationContent {
        let (tx, mut rx) = oneshot::channel();
        let handle = self.receive(
            original,
            Box::new(move |content| {
                let _ = tx.send(content);
            }),
        );

        let early = tokio::select! {
            result = &mut rx => Some(result),
            _ = tokio::time::sleep(deadline) => None,
        };
        let result = match early {
            Some(result) => result,
            None => {
                handle.time_will_expire();
                rx.await
            }
        };

        result.unwrap_or_else(|_| handle.best_attempt().clone())
    }
}

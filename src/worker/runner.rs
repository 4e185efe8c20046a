//! Batch processor and poll loop

use super::WorkerSettings;
use super::fetch::{FetchError, FetchOutcome, Fetcher};
use crate::envelope::{Envelope, EnvelopeError, ObjectRef};
use crate::observability::Metrics;
use crate::queue::{MessageQueue, QueueError, QueueMessage};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    #[error("Fetching {bucket}/{key} failed: {source}")]
    Fetch {
        bucket: String,
        key: String,
        #[source]
        source: FetchError,
    },
}

/// What happened to one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    /// Every referenced object was handled and the message was deleted
    Acknowledged { objects: usize },
    /// No body; left on the queue
    Skipped,
    /// Left on the queue for redelivery
    Failed,
}

/// Tally of one poll cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub received: usize,
    pub acknowledged: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct Worker {
    id: Uuid,
    queue: Arc<dyn MessageQueue>,
    fetcher: Fetcher,
    settings: WorkerSettings,
    metrics: Arc<Metrics>,
}

impl Worker {
    pub fn new(queue: Arc<dyn MessageQueue>, fetcher: Fetcher, settings: WorkerSettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            queue,
            fetcher,
            settings,
            metrics: Arc::new(Metrics::new()),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub const fn id(&self) -> Uuid {
        self.id
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Poll until `shutdown` turns true.
    ///
    /// A cycle that panics is logged and followed by `retry_backoff` before the
    /// next one. Shutdown is only observed between cycles, so an in-flight batch
    /// always runs to completion.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let span = info_span!("worker", worker_id = %self.id);

        async {
            info!(root = %self.fetcher.root().display(), "Listening for object notifications");

            while !*shutdown.borrow() {
                let cycle = AssertUnwindSafe(self.process_one_batch()).catch_unwind().await;

                if let Err(panic) = cycle {
                    self.metrics.loop_fault();
                    error!(
                        panic = panic_message(panic.as_ref()),
                        backoff_ms = self.settings.retry_backoff.as_millis() as u64,
                        "Poll cycle faulted, backing off"
                    );

                    tokio::select! {
                        _ = tokio::time::sleep(self.settings.retry_backoff) => {}
                        Ok(()) = shutdown.changed() => {}
                    }
                }
            }

            info!("Worker stopped");
        }
        .instrument(span)
        .await
    }

    /// Receive one batch and drive every message in it. Never fails: receive
    /// errors end the cycle early, message errors leave that message on the queue.
    pub async fn process_one_batch(&self) -> BatchReport {
        let messages = match self
            .queue
            .receive(self.settings.max_messages, self.settings.wait_time_seconds)
            .await
        {
            Ok(messages) => messages,
            Err(e) => {
                self.metrics.batch_failed();
                error!(error = %e, "Failed to receive messages");
                return BatchReport::default();
            }
        };

        if messages.is_empty() {
            debug!("No messages received");
            return BatchReport::default();
        }

        self.metrics.batch_received(messages.len());
        let mut report = BatchReport {
            received: messages.len(),
            ..Default::default()
        };

        for message in &messages {
            match self.handle_message(message).await {
                MessageOutcome::Acknowledged { .. } => report.acknowledged += 1,
                MessageOutcome::Skipped => report.skipped += 1,
                MessageOutcome::Failed => report.failed += 1,
            }
        }

        debug!(
            received = report.received,
            acknowledged = report.acknowledged,
            skipped = report.skipped,
            failed = report.failed,
            "Batch processed"
        );

        report
    }

    /// Mirror everything one message references, then delete it.
    pub async fn handle_message(&self, message: &QueueMessage) -> MessageOutcome {
        let message_id = message.display_id();

        let Some(body) = message.body.as_deref().filter(|b| !b.is_empty()) else {
            info!(message_id, "Message received without a body, ignoring");
            return MessageOutcome::Skipped;
        };

        debug!(message_id, body, "Message received");

        let objects = match self.mirror(body).await {
            Ok(objects) => objects,
            Err(e) => {
                self.metrics.message_failed();
                error!(message_id, error = %e, body, "Failed to process message");
                return MessageOutcome::Failed;
            }
        };

        match self.acknowledge(message).await {
            Ok(()) => {
                self.metrics.message_acknowledged();
                MessageOutcome::Acknowledged { objects }
            }
            Err(e) => {
                self.metrics.message_failed();
                error!(message_id, error = %e, "Failed to delete message");
                MessageOutcome::Failed
            }
        }
    }

    /// Fetch each referenced object in record order. The first fatal error
    /// stops the message; objects already written stay in place.
    async fn mirror(&self, body: &str) -> Result<usize, ProcessError> {
        let envelope = Envelope::decode(body)?;
        let objects = envelope.objects()?;

        if objects.is_empty() {
            debug!(kind = envelope.kind(), "Envelope references no objects");
        }

        for object in &objects {
            self.fetch(object).await?;
        }

        Ok(objects.len())
    }

    async fn fetch(&self, object: &ObjectRef) -> Result<(), ProcessError> {
        info!(bucket = %object.bucket, key = %object.key, "Mirroring object");

        let outcome = self
            .fetcher
            .fetch(object)
            .await
            .map_err(|source| ProcessError::Fetch {
                bucket: object.bucket.clone(),
                key: object.key.clone(),
                source,
            })?;

        match outcome {
            FetchOutcome::Fetched { bytes, .. } => self.metrics.object_fetched(bytes),
            FetchOutcome::Missing => self.metrics.object_missing(),
            FetchOutcome::Directory { .. } => {}
        }

        Ok(())
    }

    async fn acknowledge(&self, message: &QueueMessage) -> Result<(), QueueError> {
        let Some(receipt_handle) = message.receipt_handle.as_deref() else {
            warn!(message_id = message.display_id(), "No receipt handle found for message");
            return Err(QueueError::MissingReceiptHandle);
        };

        self.queue.delete(receipt_handle).await
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}

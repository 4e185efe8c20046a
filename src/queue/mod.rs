//! Notification queue abstraction
//!
//! The worker only needs two operations from its queue: a bounded long-poll
//! receive and a delete by receipt handle. Delivery is at-least-once; a message
//! that is received and never deleted reappears once its visibility timeout
//! lapses.

pub mod memory;
pub mod sqs;

pub use memory::MemoryQueue;
pub use sqs::SqsQueue;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Receive failed: {0}")]
    Receive(String),

    #[error("Delete failed: {0}")]
    Delete(String),

    #[error("Message has no receipt handle")]
    MissingReceiptHandle,
}

pub type Result<T> = std::result::Result<T, QueueError>;

/// A received message, owned by this worker until its visibility timeout lapses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueMessage {
    pub id: Option<String>,
    /// Opaque token required to delete the message
    pub receipt_handle: Option<String>,
    pub body: Option<String>,
}

impl QueueMessage {
    pub fn new(id: impl Into<String>, receipt_handle: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            receipt_handle: Some(receipt_handle.into()),
            body: Some(body.into()),
        }
    }

    /// Identifier for log lines
    pub fn display_id(&self) -> &str {
        self.id.as_deref().unwrap_or("<unknown>")
    }
}

/// Source of notification messages
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Long-poll for up to `max_messages`, waiting at most `wait_time_seconds`
    /// for the first one. An empty batch is the normal idle result.
    async fn receive(&self, max_messages: i32, wait_time_seconds: i32) -> Result<Vec<QueueMessage>>;

    /// Acknowledge a message so it is never redelivered
    async fn delete(&self, receipt_handle: &str) -> Result<()>;
}

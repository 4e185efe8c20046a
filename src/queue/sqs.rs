//! Amazon SQS implementation of [`MessageQueue`]

use super::{MessageQueue, QueueError, QueueMessage, Result};
use crate::config::QueueConfig;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sqs::Client;
use aws_sdk_sqs::error::DisplayErrorContext;
use tracing::debug;

#[derive(Clone, Debug)]
pub struct SqsQueue {
    client: Client,
    queue_url: String,
    visibility_timeout_seconds: Option<i32>,
}

impl SqsQueue {
    pub fn new(client: Client, queue_url: String) -> Self {
        Self {
            client,
            queue_url,
            visibility_timeout_seconds: None,
        }
    }

    pub fn with_visibility_timeout(mut self, seconds: Option<i32>) -> Self {
        self.visibility_timeout_seconds = seconds;
        self
    }

    /// Build a client from resolved SDK settings
    pub fn from_sdk_config(sdk_config: &SdkConfig, queue: &QueueConfig) -> Self {
        debug!(queue_url = %queue.url, "SQS client configured");

        Self::new(Client::new(sdk_config), queue.url.clone())
            .with_visibility_timeout(queue.visibility_timeout_seconds)
    }

    pub fn queue_url(&self) -> &str {
        &self.queue_url
    }
}

#[async_trait]
impl MessageQueue for SqsQueue {
    async fn receive(&self, max_messages: i32, wait_time_seconds: i32) -> Result<Vec<QueueMessage>> {
        let output = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(max_messages)
            .wait_time_seconds(wait_time_seconds)
            .set_visibility_timeout(self.visibility_timeout_seconds)
            .send()
            .await
            .map_err(|e| QueueError::Receive(DisplayErrorContext(&e).to_string()))?;

        Ok(output
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(|message| QueueMessage {
                id: message.message_id,
                receipt_handle: message.receipt_handle,
                body: message.body,
            })
            .collect())
    }

    async fn delete(&self, receipt_handle: &str) -> Result<()> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|e| QueueError::Delete(DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }
}

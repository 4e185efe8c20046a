//! In-process queue with SQS-like receive/delete semantics
//!
//! Received messages move in-flight until deleted; [`MemoryQueue::expire_in_flight`]
//! plays the part of an elapsed visibility timeout and makes them receivable again.

use super::{MessageQueue, QueueError, QueueMessage, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct State {
    pending: VecDeque<QueueMessage>,
    in_flight: HashMap<String, QueueMessage>,
    deleted: Vec<String>,
    receive_failures: VecDeque<String>,
    receive_calls: usize,
}

#[derive(Debug, Default)]
pub struct MemoryQueue {
    state: Mutex<State>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, message: QueueMessage) {
        self.state.lock().await.pending.push_back(message);
    }

    /// Make the next receive call fail with `reason`
    pub async fn fail_next_receive(&self, reason: impl Into<String>) {
        self.state.lock().await.receive_failures.push_back(reason.into());
    }

    /// Return every unacknowledged in-flight message to the pending set
    pub async fn expire_in_flight(&self) {
        let mut state = self.state.lock().await;
        let expired: Vec<QueueMessage> = state.in_flight.drain().map(|(_, m)| m).collect();
        state.pending.extend(expired);
    }

    /// Receipt handles passed to `delete`, in call order
    pub async fn deleted(&self) -> Vec<String> {
        self.state.lock().await.deleted.clone()
    }

    pub async fn pending_len(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    pub async fn in_flight_len(&self) -> usize {
        self.state.lock().await.in_flight.len()
    }

    pub async fn receive_calls(&self) -> usize {
        self.state.lock().await.receive_calls
    }
}

#[async_trait]
impl MessageQueue for MemoryQueue {
    async fn receive(&self, max_messages: i32, _wait_time_seconds: i32) -> Result<Vec<QueueMessage>> {
        let batch = {
            let mut state = self.state.lock().await;
            state.receive_calls += 1;

            if let Some(reason) = state.receive_failures.pop_front() {
                return Err(QueueError::Receive(reason));
            }

            let take = usize::try_from(max_messages).unwrap_or(0).min(state.pending.len());
            let batch: Vec<QueueMessage> = state.pending.drain(..take).collect();

            for message in &batch {
                if let Some(receipt) = &message.receipt_handle {
                    state.in_flight.insert(receipt.clone(), message.clone());
                }
            }

            batch
        };

        // Stands in for the long-poll wait so an idle poll loop still yields
        if batch.is_empty() {
            tokio::task::yield_now().await;
        }

        Ok(batch)
    }

    async fn delete(&self, receipt_handle: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.in_flight.remove(receipt_handle);
        state.deleted.push(receipt_handle.to_string());
        Ok(())
    }
}

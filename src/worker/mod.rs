//! Notification worker
//!
//! Polls the queue for bucket notifications, mirrors every object they
//! reference into the download root, and acknowledges messages whose objects
//! were all handled.

pub mod fetch;
pub mod runner;

pub use fetch::{FetchError, FetchOutcome, Fetcher, local_path};
pub use runner::{BatchReport, MessageOutcome, Worker};

use crate::config::Config;
use std::time::Duration;

/// Poll loop settings
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub max_messages: i32,
    pub wait_time_seconds: i32,
    pub retry_backoff: Duration,
}

impl WorkerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_messages: config.queue.max_messages,
            wait_time_seconds: config.queue.wait_time_seconds,
            retry_backoff: config.worker.retry_backoff(),
        }
    }
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            max_messages: 10,
            wait_time_seconds: 20,
            retry_backoff: Duration::from_secs(5),
        }
    }
}

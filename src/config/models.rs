use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub health: HealthConfig,
}

/// Notification queue configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    /// SQS queue URL
    #[serde(default)]
    pub url: String,
    /// Messages per receive call (SQS caps this at 10)
    #[serde(default = "default_max_messages")]
    pub max_messages: i32,
    /// Long-poll wait (SQS caps this at 20 seconds)
    #[serde(default = "default_wait_time_seconds")]
    pub wait_time_seconds: i32,
    /// Overrides the queue's visibility timeout for received messages
    pub visibility_timeout_seconds: Option<i32>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_messages: default_max_messages(),
            wait_time_seconds: default_wait_time_seconds(),
            visibility_timeout_seconds: None,
        }
    }
}

fn default_max_messages() -> i32 {
    10
}

fn default_wait_time_seconds() -> i32 {
    20
}

/// Object storage configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible stores
    pub endpoint: Option<String>,
    /// Address buckets as `<endpoint>/<bucket>` (MinIO, LocalStack)
    #[serde(default)]
    pub force_path_style: bool,
    /// Access key (loaded from environment, not from config file)
    #[serde(skip)]
    pub access_key: Option<String>,
    /// Secret key (loaded from environment, not from config file)
    #[serde(skip)]
    pub secret_key: Option<String>,
}

/// Local mirror configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadConfig {
    #[serde(default = "default_download_root")]
    pub root: PathBuf,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            root: default_download_root(),
        }
    }
}

fn default_download_root() -> PathBuf {
    PathBuf::from("downloads")
}

/// Poll loop and process guard timing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkerConfig {
    /// Pause after a poll cycle faults
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// Grace period before exiting on a process-level fault
    #[serde(default = "default_restart_delay_ms")]
    pub restart_delay_ms: u64,
}

impl WorkerConfig {
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            retry_backoff_ms: default_retry_backoff_ms(),
            restart_delay_ms: default_restart_delay_ms(),
        }
    }
}

fn default_retry_backoff_ms() -> u64 {
    5000
}

fn default_restart_delay_ms() -> u64 {
    5000
}

/// Health endpoint configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HealthConfig {
    /// No listener is started when unset
    pub bind_addr: Option<SocketAddr>,
}

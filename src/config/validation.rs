use super::models::Config;
use thiserror::Error;

/// SQS limits for a single ReceiveMessage call
const MAX_RECEIVE_MESSAGES: i32 = 10;
const MAX_WAIT_TIME_SECONDS: i32 = 20;
const MAX_VISIBILITY_TIMEOUT_SECONDS: i32 = 43_200;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("No queue URL configured (set queue.url or SQS_QUEUE_URL)")]
    MissingQueueUrl,

    #[error("queue.max_messages must be between 1 and 10, got {0}")]
    InvalidMaxMessages(i32),

    #[error("queue.wait_time_seconds must be between 0 and 20, got {0}")]
    InvalidWaitTime(i32),

    #[error(
        "queue.visibility_timeout_seconds must be between 0 and 43200, got {0}"
    )]
    InvalidVisibilityTimeout(i32),

    #[error("download.root must not be empty")]
    EmptyDownloadRoot,

    #[error("worker.retry_backoff_ms must be positive")]
    InvalidRetryBackoff,

    #[error("Storage credentials are incomplete (both access key and secret key are required)")]
    IncompleteCredentials,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_queue(config)?;
    validate_download(config)?;
    validate_worker(config)?;
    validate_storage(config)?;
    Ok(())
}

fn validate_queue(config: &Config) -> Result<(), ValidationError> {
    let queue = &config.queue;

    if queue.url.trim().is_empty() {
        return Err(ValidationError::MissingQueueUrl);
    }

    if !(1..=MAX_RECEIVE_MESSAGES).contains(&queue.max_messages) {
        return Err(ValidationError::InvalidMaxMessages(queue.max_messages));
    }

    if !(0..=MAX_WAIT_TIME_SECONDS).contains(&queue.wait_time_seconds) {
        return Err(ValidationError::InvalidWaitTime(queue.wait_time_seconds));
    }

    if let Some(timeout) = queue.visibility_timeout_seconds {
        if !(0..=MAX_VISIBILITY_TIMEOUT_SECONDS).contains(&timeout) {
            return Err(ValidationError::InvalidVisibilityTimeout(timeout));
        }
    }

    Ok(())
}

fn validate_download(config: &Config) -> Result<(), ValidationError> {
    if config.download.root.as_os_str().is_empty() {
        return Err(ValidationError::EmptyDownloadRoot);
    }
    Ok(())
}

fn validate_worker(config: &Config) -> Result<(), ValidationError> {
    if config.worker.retry_backoff_ms == 0 {
        return Err(ValidationError::InvalidRetryBackoff);
    }
    Ok(())
}

/// Static credentials must come as a pair; with neither set the default AWS chain applies
fn validate_storage(config: &Config) -> Result<(), ValidationError> {
    if config.storage.access_key.is_some() != config.storage.secret_key.is_some() {
        return Err(ValidationError::IncompleteCredentials);
    }
    Ok(())
}

//! In-process object source for tests and dry runs

use super::{ObjectSource, ObjectStream, Result, SourceError};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Objects keyed by `(bucket, key)`; every `open` call is recorded
#[derive(Debug, Default)]
pub struct MemorySource {
    objects: RwLock<HashMap<(String, String), Bytes>>,
    requests: RwLock<Vec<(String, String)>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, bucket: &str, key: &str, data: impl Into<Bytes>) {
        self.objects
            .write()
            .await
            .insert((bucket.to_string(), key.to_string()), data.into());
    }

    pub async fn remove(&self, bucket: &str, key: &str) {
        self.objects
            .write()
            .await
            .remove(&(bucket.to_string(), key.to_string()));
    }

    /// `(bucket, key)` pairs passed to `open`, in call order
    pub async fn requests(&self) -> Vec<(String, String)> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl ObjectSource for MemorySource {
    async fn open(&self, bucket: &str, key: &str) -> Result<ObjectStream> {
        self.requests
            .write()
            .await
            .push((bucket.to_string(), key.to_string()));

        let data = self
            .objects
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| SourceError::not_found(bucket, key))?;

        Ok(futures::stream::once(async move { Ok(data) }).boxed())
    }
}

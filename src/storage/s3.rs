//! Amazon S3 implementation of [`ObjectSource`]

use super::{ObjectSource, ObjectStream, Result, SourceError};
use crate::config::StorageConfig;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::operation::get_object::builders::GetObjectFluentBuilder;
use futures::StreamExt;

#[derive(Clone, Debug)]
pub struct S3Source {
    client: Client,
}

impl S3Source {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from resolved SDK settings; path-style addressing is
    /// switched on when the storage section asks for it
    pub fn from_sdk_config(sdk_config: &SdkConfig, storage: &StorageConfig) -> Self {
        let config = aws_sdk_s3::config::Builder::from(sdk_config)
            .force_path_style(storage.force_path_style)
            .build();

        Self::new(Client::from_conf(config))
    }

    /// GetObject for the key exactly as given. The SDK escapes it for the URI
    /// itself, so `~`, `%`, `#` and repeated `/` all reach S3 unchanged.
    fn request(&self, bucket: &str, key: &str) -> GetObjectFluentBuilder {
        self.client.get_object().bucket(bucket).key(key)
    }
}

#[async_trait]
impl ObjectSource for S3Source {
    async fn open(&self, bucket: &str, key: &str) -> Result<ObjectStream> {
        let response = self.request(bucket, key).send().await.map_err(|err| {
            let context = DisplayErrorContext(&err).to_string();
            if err.into_service_error().is_no_such_key() {
                SourceError::not_found(bucket, key)
            } else {
                SourceError::Store(context)
            }
        })?;

        let stream = futures::stream::try_unfold(response.body, |mut body| async move {
            let chunk = body
                .try_next()
                .await
                .map_err(|e| SourceError::Store(DisplayErrorContext(&e).to_string()))?;
            Ok(chunk.map(|chunk| (chunk, body)))
        });

        Ok(stream.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_config::{BehaviorVersion, Region};

    fn source() -> S3Source {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("eu-west-2"))
            .build();
        S3Source::new(Client::from_conf(config))
    }

    #[test]
    fn test_request_carries_key_verbatim() {
        let source = source();

        for key in [
            "~$report.docx",
            "100%.txt",
            "tag#1.txt",
            "a//b.txt",
            "[draft].pdf",
            "a/b c.txt",
        ] {
            let request = source.request("b1", key);
            assert_eq!(request.get_bucket().as_deref(), Some("b1"));
            assert_eq!(request.get_key().as_deref(), Some(key));
        }
    }
}

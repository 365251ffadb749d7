use async_trait::async_trait;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::ByteStream;
use sesman_provider::{ObjectStore, ProviderError};
use tracing::{debug, info, instrument};

use crate::auth::build_sdk_config;
use crate::config::AwsBaseConfig;
use crate::error::sdk_failure;

/// AWS S3 bucket implementing [`ObjectStore`].
pub struct S3ObjectStore {
    config: AwsBaseConfig,
    bucket: String,
    client: aws_sdk_s3::Client,
}

impl std::fmt::Debug for S3ObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3ObjectStore")
            .field("config", &self.config)
            .field("bucket", &self.bucket)
            .field("client", &"<S3Client>")
            .finish()
    }
}

impl S3ObjectStore {
    /// Create a new `S3ObjectStore` for `bucket` by building an AWS SDK client.
    ///
    /// Path-style addressing is forced when an endpoint override is set, as
    /// local emulators do not serve virtual-hosted buckets.
    pub async fn new(config: AwsBaseConfig, bucket: impl Into<String>) -> Self {
        let sdk_config = build_sdk_config(&config).await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.endpoint_url.is_some())
            .build();
        let client = aws_sdk_s3::Client::from_conf(s3_config);
        Self {
            config,
            bucket: bucket.into(),
            client,
        }
    }

    /// Create an `S3ObjectStore` with a pre-built client.
    pub fn with_client(
        config: AwsBaseConfig,
        bucket: impl Into<String>,
        client: aws_sdk_s3::Client,
    ) -> Self {
        Self {
            config,
            bucket: bucket.into(),
            client,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    #[instrument(skip(self), fields(provider = "aws-s3", bucket = %self.bucket))]
    async fn verify_access(&self, prefix: &str) -> Result<(), ProviderError> {
        debug!("verifying S3 bucket access");
        self.client
            .list_objects_v2()
            .bucket(&self.bucket)
            .max_keys(1)
            .prefix(prefix)
            .send()
            .await
            .map_err(|e| sdk_failure("ListObjectsV2", &e))?;
        info!("S3 bucket access verified");
        Ok(())
    }

    #[instrument(skip(self), fields(provider = "aws-s3", bucket = %self.bucket))]
    async fn list_keys(&self, prefix: &str, max_keys: i32) -> Result<Vec<String>, ProviderError> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .max_keys(max_keys)
            .prefix(prefix)
            .send()
            .await
            .map_err(|e| sdk_failure("ListObjectsV2", &e))?;

        let keys: Vec<String> = output
            .contents()
            .iter()
            .filter_map(|object| object.key().map(str::to_owned))
            .collect();
        debug!(count = keys.len(), "listed S3 objects");
        Ok(keys)
    }

    #[instrument(skip(self), fields(provider = "aws-s3", bucket = %self.bucket))]
    async fn get_object(&self, key: &str) -> Result<Option<Vec<u8>>, ProviderError> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        let output = match result {
            Ok(output) => output,
            Err(e) if e.as_service_error().is_some_and(GetObjectError::is_no_such_key) => {
                debug!("S3 object not found");
                return Ok(None);
            }
            Err(e) => return Err(sdk_failure("GetObject", &e)),
        };

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| ProviderError::ExecutionFailed(format!("failed to read S3 body: {e}")))?
            .into_bytes();
        debug!(size = body.len(), "S3 object downloaded");
        Ok(Some(body.to_vec()))
    }

    #[instrument(skip(self, body), fields(provider = "aws-s3", bucket = %self.bucket, size = body.len()))]
    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ProviderError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| sdk_failure("PutObject", &e))?;
        info!("S3 object uploaded");
        Ok(())
    }

    #[instrument(skip(self, body), fields(provider = "aws-s3", bucket = %self.bucket, size = body.len()))]
    async fn put_new_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ProviderError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .if_none_match("*")
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| sdk_failure("PutObject", &e))?;
        info!("S3 object created");
        Ok(())
    }

    #[instrument(skip(self), fields(provider = "aws-s3", bucket = %self.bucket))]
    async fn delete_object(&self, key: &str) -> Result<(), ProviderError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| sdk_failure("DeleteObject", &e))?;
        info!("S3 object deleted");
        Ok(())
    }
}

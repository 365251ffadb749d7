use std::sync::Arc;

use async_trait::async_trait;
use sesman_core::CredentialBundle;
use sesman_provider::factory::MISSING_BUCKET;
use sesman_provider::{ClientFactory, EmailService, ObjectStore, ProviderError};

use crate::config::AwsBaseConfig;
use crate::s3::S3ObjectStore;
use crate::ses::SesClient;

/// Builds SES and S3 clients from a credential bundle.
#[derive(Debug, Clone, Default)]
pub struct AwsClientFactory {
    endpoint_url: Option<String>,
}

impl AwsClientFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point every client at a custom endpoint (e.g. `LocalStack`).
    #[must_use]
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    fn base_config(&self, credentials: &CredentialBundle) -> AwsBaseConfig {
        let config = AwsBaseConfig::from_credentials(credentials);
        match &self.endpoint_url {
            Some(endpoint) => config.with_endpoint_url(endpoint),
            None => config,
        }
    }
}

#[async_trait]
impl ClientFactory for AwsClientFactory {
    async fn email_service(
        &self,
        credentials: &CredentialBundle,
    ) -> Result<Arc<dyn EmailService>, ProviderError> {
        let client = SesClient::new(self.base_config(credentials)).await;
        Ok(Arc::new(client))
    }

    async fn object_store(
        &self,
        credentials: &CredentialBundle,
    ) -> Result<Arc<dyn ObjectStore>, ProviderError> {
        let bucket = credentials
            .bucket_name
            .as_deref()
            .filter(|bucket| !bucket.is_empty())
            .ok_or_else(|| ProviderError::Configuration(MISSING_BUCKET.to_owned()))?;
        let store = S3ObjectStore::new(self.base_config(credentials), bucket).await;
        Ok(Arc::new(store))
    }
}

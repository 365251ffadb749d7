use std::sync::Arc;

use async_trait::async_trait;
use sesman_core::CredentialBundle;

use crate::email::EmailService;
use crate::error::ProviderError;
use crate::object_store::ObjectStore;

/// Message used when the object-store backend is selected without a bucket.
pub const MISSING_BUCKET: &str = "S3 bucket name not found in credentials";

/// Builds authenticated provider clients from a credential bundle.
///
/// Callers build a fresh client per operation; implementations must not
/// cache clients across bundles.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    async fn email_service(
        &self,
        credentials: &CredentialBundle,
    ) -> Result<Arc<dyn EmailService>, ProviderError>;

    /// Fails with [`ProviderError::Configuration`] when the bundle has no bucket.
    async fn object_store(
        &self,
        credentials: &CredentialBundle,
    ) -> Result<Arc<dyn ObjectStore>, ProviderError>;
}

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use sesman_core::CredentialBundle;
use sesman_provider::factory::MISSING_BUCKET;
use sesman_provider::{ClientFactory, EmailService, ObjectStore, ProviderError};

use crate::email::MemoryEmailService;
use crate::object_store::MemoryObjectStore;

/// [`ClientFactory`] handing out shared in-memory backends.
///
/// Every call counts as a client construction so tests can assert that
/// clients are built per operation.
#[derive(Debug, Default)]
pub struct MemoryClientFactory {
    email: Arc<MemoryEmailService>,
    objects: Arc<MemoryObjectStore>,
    email_clients: AtomicUsize,
    object_clients: AtomicUsize,
}

impl MemoryClientFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn email(&self) -> &Arc<MemoryEmailService> {
        &self.email
    }

    pub fn objects(&self) -> &Arc<MemoryObjectStore> {
        &self.objects
    }

    /// Number of email clients built so far.
    pub fn email_clients_built(&self) -> usize {
        self.email_clients.load(Ordering::Relaxed)
    }

    /// Number of object-store clients built so far.
    pub fn object_clients_built(&self) -> usize {
        self.object_clients.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ClientFactory for MemoryClientFactory {
    async fn email_service(
        &self,
        _credentials: &CredentialBundle,
    ) -> Result<Arc<dyn EmailService>, ProviderError> {
        self.email_clients.fetch_add(1, Ordering::Relaxed);
        Ok(self.email.clone())
    }

    async fn object_store(
        &self,
        credentials: &CredentialBundle,
    ) -> Result<Arc<dyn ObjectStore>, ProviderError> {
        if credentials.bucket_name.as_deref().is_none_or(str::is_empty) {
            return Err(ProviderError::Configuration(MISSING_BUCKET.to_owned()));
        }
        self.object_clients.fetch_add(1, Ordering::Relaxed);
        Ok(self.objects.clone())
    }
}

use async_trait::async_trait;

use crate::error::ProviderError;

/// Keyed object storage used by the object-store template backend.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Cheap authenticated listing used to verify bucket access at login.
    async fn verify_access(&self, prefix: &str) -> Result<(), ProviderError>;

    /// Keys under `prefix`, at most `max_keys` of them, in provider order.
    async fn list_keys(&self, prefix: &str, max_keys: i32) -> Result<Vec<String>, ProviderError>;

    /// Object body, or `None` when the key does not exist.
    async fn get_object(&self, key: &str) -> Result<Option<Vec<u8>>, ProviderError>;

    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ProviderError>;

    /// Store an object only if `key` is free. A taken key fails with
    /// [`ProviderError::AlreadyExists`] and leaves the stored object as is.
    async fn put_new_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ProviderError>;

    /// Delete an object. Backends that can tell report a missing key as
    /// [`ProviderError::NotFound`].
    async fn delete_object(&self, key: &str) -> Result<(), ProviderError>;
}

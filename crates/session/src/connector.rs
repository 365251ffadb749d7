use std::sync::Arc;

use sesman_core::CredentialBundle;
use sesman_provider::{ClientFactory, EmailService, ObjectStore};
use tracing::debug;

use crate::error::AuthError;
use crate::session::Session;

/// Builds provider clients from the session's stored credentials.
///
/// Credentials are re-read and a fresh client is built on every call, so a
/// logout or re-login takes effect on the next operation.
#[derive(Clone)]
pub struct Connector {
    session: Session,
    factory: Arc<dyn ClientFactory>,
}

impl std::fmt::Debug for Connector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connector")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl Connector {
    pub fn new(session: Session, factory: Arc<dyn ClientFactory>) -> Self {
        Self { session, factory }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn factory(&self) -> &Arc<dyn ClientFactory> {
        &self.factory
    }

    /// Current credentials; fails fast when nobody is logged in.
    pub async fn credentials(&self) -> Result<CredentialBundle, AuthError> {
        self.session.credentials().await
    }

    pub async fn email_service(&self) -> Result<Arc<dyn EmailService>, AuthError> {
        let credentials = self.credentials().await?;
        debug!(region = %credentials.region, "building email client");
        self.factory
            .email_service(&credentials)
            .await
            .map_err(AuthError::Client)
    }

    /// Object store for the stored bucket, with the folder prefix to use.
    pub async fn object_store(&self) -> Result<(Arc<dyn ObjectStore>, String), AuthError> {
        let credentials = self.credentials().await?;
        debug!(region = %credentials.region, "building object store client");
        let store = self
            .factory
            .object_store(&credentials)
            .await
            .map_err(AuthError::Client)?;
        Ok((store, credentials.prefix().to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use sesman_memory::MemoryClientFactory;
    use sesman_provider::ProviderError;
    use sesman_provider::factory::MISSING_BUCKET;

    use super::*;
    use crate::store::MemoryStore;

    async fn connector() -> (Connector, Arc<MemoryClientFactory>) {
        let session = Session::open(Arc::new(MemoryStore::new())).await.unwrap();
        let factory = Arc::new(MemoryClientFactory::new());
        (Connector::new(session, factory.clone()), factory)
    }

    #[tokio::test]
    async fn fails_fast_without_credentials() {
        let (connector, factory) = connector().await;
        assert!(matches!(
            connector.email_service().await.err().unwrap(),
            AuthError::NotFound
        ));
        assert!(matches!(
            connector.object_store().await.err().unwrap(),
            AuthError::NotFound
        ));
        assert_eq!(factory.email_clients_built(), 0);
    }

    #[tokio::test]
    async fn builds_a_client_per_call() {
        let (connector, factory) = connector().await;
        connector
            .session()
            .save(&CredentialBundle::new("us-east-1", "AKID", "secret"))
            .await
            .unwrap();
        connector.email_service().await.unwrap();
        connector.email_service().await.unwrap();
        assert_eq!(factory.email_clients_built(), 2);
    }

    #[tokio::test]
    async fn object_store_needs_bucket() {
        let (connector, _) = connector().await;
        let bundle = CredentialBundle::new("us-east-1", "AKID", "secret");
        connector.session().save(&bundle).await.unwrap();
        let err = connector.object_store().await.err().unwrap();
        assert!(matches!(
            err,
            AuthError::Client(ProviderError::Configuration(ref m)) if m == MISSING_BUCKET
        ));

        let bundle = bundle.with_bucket("b").with_folder_prefix("templates/");
        connector.session().save(&bundle).await.unwrap();
        let (_, prefix) = connector.object_store().await.unwrap();
        assert_eq!(prefix, "templates/");
    }
}

use std::sync::Arc;

use sesman_core::{Notice, Notifier};
use sesman_provider::{EmailService, ObjectStore};
use sesman_session::{AuthError, Connector, Session};
use tracing::error;

use crate::error::RepositoryError;

/// Dependencies shared by the repositories.
#[derive(Clone)]
pub struct RepositoryContext {
    connector: Connector,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for RepositoryContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryContext")
            .field("connector", &self.connector)
            .finish_non_exhaustive()
    }
}

impl RepositoryContext {
    pub fn new(connector: Connector, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            connector,
            notifier,
        }
    }

    pub fn connector(&self) -> &Connector {
        &self.connector
    }

    pub fn session(&self) -> &Session {
        self.connector.session()
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    /// Log `err` and surface `message` as an error notice.
    pub(crate) fn fail(&self, message: String, err: RepositoryError) -> RepositoryError {
        error!(error = %err, "{message}");
        self.notifier.notify(Notice::error(message));
        err
    }

    pub(crate) async fn email_service(&self) -> Result<Arc<dyn EmailService>, RepositoryError> {
        self.connector
            .email_service()
            .await
            .map_err(|e| self.auth_failure(e, "SES"))
    }

    /// Object store and folder prefix from the stored credentials.
    pub(crate) async fn object_store(
        &self,
    ) -> Result<(Arc<dyn ObjectStore>, String), RepositoryError> {
        self.connector
            .object_store()
            .await
            .map_err(|e| self.auth_failure(e, "S3"))
    }

    fn auth_failure(&self, err: AuthError, service: &str) -> RepositoryError {
        let message = match &err {
            AuthError::NotFound => "AWS credentials not found. Please login first.".to_owned(),
            _ => format!("Failed to initialize AWS {service} client. Please login again."),
        };
        self.fail(message, err.into())
    }
}

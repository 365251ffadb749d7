use std::sync::Arc;

use sesman_core::{CredentialBundle, Notice, Notifier, Theme};
use sesman_provider::ClientFactory;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use crate::error::AuthError;
use crate::store::KeyValueStore;

/// Store key holding the JSON credential bundle.
pub const CREDENTIALS_KEY: &str = "awsCredentials";
/// Store key holding the theme preference.
pub const THEME_KEY: &str = "theme";

struct Inner {
    store: Arc<dyn KeyValueStore>,
    logged_in: watch::Sender<bool>,
}

/// Login state backed by a [`KeyValueStore`].
///
/// Cloning is cheap; clones share the store and the change channel.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("logged_in", &*self.inner.logged_in.borrow())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Open a session over `store`, reading the initial login state.
    pub async fn open(store: Arc<dyn KeyValueStore>) -> Result<Self, AuthError> {
        let logged_in = store.read(CREDENTIALS_KEY).await?.is_some();
        let (tx, _) = watch::channel(logged_in);
        Ok(Self {
            inner: Arc::new(Inner {
                store,
                logged_in: tx,
            }),
        })
    }

    /// Stored credentials, or `None` when nobody is logged in.
    pub async fn load(&self) -> Result<Option<CredentialBundle>, AuthError> {
        let Some(raw) = self.inner.store.read(CREDENTIALS_KEY).await? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(AuthError::Malformed)
    }

    /// Stored credentials, failing when absent or unparsable.
    pub async fn credentials(&self) -> Result<CredentialBundle, AuthError> {
        self.load().await?.ok_or(AuthError::NotFound)
    }

    pub async fn is_logged_in(&self) -> Result<bool, AuthError> {
        Ok(self.inner.store.read(CREDENTIALS_KEY).await?.is_some())
    }

    pub async fn save(&self, bundle: &CredentialBundle) -> Result<(), AuthError> {
        let raw = serde_json::to_string(bundle).map_err(AuthError::Malformed)?;
        self.inner.store.write(CREDENTIALS_KEY, &raw).await?;
        self.inner.logged_in.send_replace(true);
        debug!(region = %bundle.region, "credentials saved");
        Ok(())
    }

    /// Forget the stored credentials (logout).
    pub async fn clear(&self) -> Result<(), AuthError> {
        self.inner.store.remove(CREDENTIALS_KEY).await?;
        self.inner.logged_in.send_replace(false);
        info!("logged out");
        Ok(())
    }

    /// Receiver notified whenever credentials are saved or cleared.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.logged_in.subscribe()
    }

    /// Stored theme, `Light` when unset or unrecognised.
    pub async fn theme(&self) -> Result<Theme, AuthError> {
        let stored = self.inner.store.read(THEME_KEY).await?;
        Ok(stored
            .and_then(|raw| {
                raw.parse::<Theme>()
                    .inspect_err(|e| warn!(error = %e, "ignoring stored theme"))
                    .ok()
            })
            .unwrap_or_default())
    }

    pub async fn set_theme(&self, theme: Theme) -> Result<(), AuthError> {
        self.inner.store.write(THEME_KEY, theme.as_str()).await?;
        Ok(())
    }

    /// Flip between dark and light, returning the new theme.
    pub async fn toggle_theme(&self) -> Result<Theme, AuthError> {
        let theme = self.theme().await?.toggled();
        self.set_theme(theme).await?;
        Ok(theme)
    }

    /// Verify `bundle` against the provider and persist it on success.
    ///
    /// The email service is always checked. The object store is checked as
    /// well when the bundle names a bucket.
    #[instrument(skip_all, fields(region = %bundle.region))]
    pub async fn login(
        &self,
        factory: &dyn ClientFactory,
        bundle: CredentialBundle,
        notifier: &dyn Notifier,
    ) -> Result<(), AuthError> {
        if bundle.access_key_id.is_empty() || bundle.secret_access_key.is_empty() {
            notifier.notify(Notice::error("Please enter your AWS credentials"));
            return Err(AuthError::MissingInput("access key"));
        }
        if bundle.region.is_empty() {
            notifier.notify(Notice::error("Please select an AWS region"));
            return Err(AuthError::MissingInput("region"));
        }

        let bundle = normalize(bundle);
        if let Err(e) = verify(factory, &bundle).await {
            error!(error = %e, "login verification failed");
            notifier.notify(Notice::error(
                "Login failed. Please check your credentials and try again.",
            ));
            return Err(AuthError::LoginFailed(e));
        }

        self.save(&bundle).await?;
        info!("logged in");
        notifier.notify(Notice::success("Successfully logged in"));
        Ok(())
    }
}

/// Drop empty optional fields so they are not persisted.
fn normalize(mut bundle: CredentialBundle) -> CredentialBundle {
    bundle.bucket_name = bundle.bucket_name.filter(|b| !b.is_empty());
    bundle.folder_prefix = bundle.folder_prefix.filter(|p| !p.is_empty());
    bundle
}

async fn verify(
    factory: &dyn ClientFactory,
    bundle: &CredentialBundle,
) -> Result<(), sesman_provider::ProviderError> {
    factory.email_service(bundle).await?.verify_access().await?;
    if bundle.bucket_name.is_some() {
        factory
            .object_store(bundle)
            .await?
            .verify_access(bundle.prefix())
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use sesman_core::RecordingNotifier;
    use sesman_memory::{MemoryClientFactory, ops};
    use sesman_provider::ProviderError;

    use super::*;
    use crate::store::MemoryStore;

    async fn session() -> Session {
        Session::open(Arc::new(MemoryStore::new())).await.unwrap()
    }

    fn bundle() -> CredentialBundle {
        CredentialBundle::new("us-east-1", "AKID", "secret")
    }

    #[tokio::test]
    async fn save_load_clear() {
        let session = session().await;
        assert!(!session.is_logged_in().await.unwrap());
        assert!(session.load().await.unwrap().is_none());
        assert!(matches!(
            session.credentials().await.unwrap_err(),
            AuthError::NotFound
        ));

        session.save(&bundle()).await.unwrap();
        assert!(session.is_logged_in().await.unwrap());
        assert_eq!(session.credentials().await.unwrap(), bundle());

        session.clear().await.unwrap();
        assert!(!session.is_logged_in().await.unwrap());
    }

    #[tokio::test]
    async fn malformed_record_is_reported() {
        let store = Arc::new(MemoryStore::new());
        store.write(CREDENTIALS_KEY, "not json").await.unwrap();
        let session = Session::open(store).await.unwrap();
        assert!(session.is_logged_in().await.unwrap());
        let err = session.credentials().await.unwrap_err();
        assert!(matches!(err, AuthError::Malformed(_)));
        assert_eq!(err.to_string(), "malformed credentials");
    }

    #[tokio::test]
    async fn subscribers_see_login_changes() {
        let session = session().await;
        let mut rx = session.subscribe();
        assert!(!*rx.borrow());

        session.save(&bundle()).await.unwrap();
        rx.changed().await.unwrap();
        assert!(*rx.borrow_and_update());

        session.clear().await.unwrap();
        rx.changed().await.unwrap();
        assert!(!*rx.borrow_and_update());
    }

    #[tokio::test]
    async fn theme_defaults_to_light_and_toggles() {
        let session = session().await;
        assert_eq!(session.theme().await.unwrap(), Theme::Light);
        assert_eq!(session.toggle_theme().await.unwrap(), Theme::Dark);
        assert_eq!(session.theme().await.unwrap(), Theme::Dark);
        session.set_theme(Theme::Light).await.unwrap();
        assert_eq!(session.theme().await.unwrap(), Theme::Light);
    }

    #[tokio::test]
    async fn unknown_theme_falls_back_to_light() {
        let store = Arc::new(MemoryStore::new());
        store.write(THEME_KEY, "sepia").await.unwrap();
        let session = Session::open(store).await.unwrap();
        assert_eq!(session.theme().await.unwrap(), Theme::Light);
    }

    #[tokio::test]
    async fn login_requires_keys_without_building_clients() {
        let session = session().await;
        let factory = MemoryClientFactory::new();
        let notifier = RecordingNotifier::new();

        let err = session
            .login(&factory, CredentialBundle::new("us-east-1", "", "secret"), &notifier)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingInput(_)));
        assert_eq!(notifier.messages(), vec!["Please enter your AWS credentials"]);
        assert_eq!(factory.email_clients_built(), 0);
        assert!(!session.is_logged_in().await.unwrap());
    }

    #[tokio::test]
    async fn login_requires_region() {
        let session = session().await;
        let factory = MemoryClientFactory::new();
        let notifier = RecordingNotifier::new();

        session
            .login(&factory, CredentialBundle::new("", "AKID", "secret"), &notifier)
            .await
            .unwrap_err();
        assert_eq!(notifier.messages(), vec!["Please select an AWS region"]);
        assert_eq!(factory.email_clients_built(), 0);
    }

    #[tokio::test]
    async fn login_success_persists_bundle() {
        let session = session().await;
        let factory = MemoryClientFactory::new();
        let notifier = RecordingNotifier::new();

        session.login(&factory, bundle(), &notifier).await.unwrap();
        assert_eq!(notifier.messages(), vec!["Successfully logged in"]);
        assert_eq!(session.credentials().await.unwrap(), bundle());
        assert_eq!(factory.email().faults().calls(ops::VERIFY_ACCESS), 1);
        assert_eq!(factory.object_clients_built(), 0);
    }

    #[tokio::test]
    async fn login_verifies_bucket_when_given() {
        let session = session().await;
        let factory = MemoryClientFactory::new();
        let notifier = RecordingNotifier::new();
        factory
            .objects()
            .faults()
            .fail(ops::VERIFY_ACCESS, ProviderError::NotFound("bucket".into()));

        let err = session
            .login(&factory, bundle().with_bucket("missing"), &notifier)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::LoginFailed(_)));
        assert_eq!(
            notifier.messages(),
            vec!["Login failed. Please check your credentials and try again."]
        );
        assert!(!session.is_logged_in().await.unwrap());
    }

    #[tokio::test]
    async fn login_failure_keeps_previous_state() {
        let session = session().await;
        let factory = MemoryClientFactory::new();
        factory
            .email()
            .faults()
            .fail(ops::VERIFY_ACCESS, ProviderError::Configuration("bad key".into()));
        let notifier = RecordingNotifier::new();

        session.login(&factory, bundle(), &notifier).await.unwrap_err();
        assert!(notifier.last().unwrap().is_error());
        assert!(!session.is_logged_in().await.unwrap());
    }

    #[tokio::test]
    async fn login_drops_empty_optional_fields() {
        let session = session().await;
        let factory = MemoryClientFactory::new();
        let notifier = RecordingNotifier::new();

        session
            .login(
                &factory,
                bundle().with_bucket("").with_folder_prefix(""),
                &notifier,
            )
            .await
            .unwrap();
        let stored = session.credentials().await.unwrap();
        assert_eq!(stored.bucket_name, None);
        assert_eq!(stored.folder_prefix, None);
    }
}

//! Both template backends honour the same repository contract.

use std::sync::Arc;

use sesman_core::{CredentialBundle, RecordingNotifier};
use sesman_memory::MemoryClientFactory;
use sesman_repository::testing::run_template_conformance_tests;
use sesman_repository::{RepositoryContext, TemplateBackend, template_repository};
use sesman_session::{Connector, MemoryStore, Session};

async fn context(bundle: CredentialBundle) -> (RepositoryContext, Arc<RecordingNotifier>) {
    let session = Session::open(Arc::new(MemoryStore::new())).await.unwrap();
    session.save(&bundle).await.unwrap();
    let notifier = Arc::new(RecordingNotifier::new());
    let ctx = RepositoryContext::new(
        Connector::new(session, Arc::new(MemoryClientFactory::new())),
        notifier.clone(),
    );
    (ctx, notifier)
}

#[tokio::test]
async fn ses_backend_conformance() {
    let (ctx, _) = context(CredentialBundle::new("us-east-1", "AKID", "secret")).await;
    let repo = template_repository(TemplateBackend::Ses, ctx);
    assert_eq!(repo.backend(), TemplateBackend::Ses);
    run_template_conformance_tests(repo.as_ref()).await.unwrap();
}

#[tokio::test]
async fn object_store_backend_conformance() {
    let bundle = CredentialBundle::new("us-east-1", "AKID", "secret")
        .with_bucket("templates")
        .with_folder_prefix("conformance/");
    let (ctx, _) = context(bundle).await;
    let repo = template_repository(TemplateBackend::ObjectStore, ctx);
    assert_eq!(repo.backend(), TemplateBackend::ObjectStore);
    run_template_conformance_tests(repo.as_ref()).await.unwrap();
}

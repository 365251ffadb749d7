//! End-to-end form flows against the in-memory provider.

use std::collections::HashMap;
use std::sync::Arc;

use sesman_core::{CredentialBundle, RecordingNotifier, TemplateContent};
use sesman_forms::{
    ContactListField, ContactListForm, Route, TagEntry, TemplateField, TemplateForm, TestEmailForm,
};
use sesman_memory::MemoryClientFactory;
use sesman_repository::{
    ContactListRepository, RepositoryContext, TemplateBackend, template_repository,
};
use sesman_session::{Connector, MemoryStore, Session};

struct Console {
    session: Session,
    factory: Arc<MemoryClientFactory>,
    notifier: Arc<RecordingNotifier>,
    ctx: RepositoryContext,
}

async fn console() -> Console {
    let session = Session::open(Arc::new(MemoryStore::new())).await.unwrap();
    let factory = Arc::new(MemoryClientFactory::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let ctx = RepositoryContext::new(
        Connector::new(session.clone(), factory.clone()),
        notifier.clone(),
    );
    Console {
        session,
        factory,
        notifier,
        ctx,
    }
}

async fn logged_in_console() -> Console {
    let c = console().await;
    c.session
        .login(
            c.factory.as_ref(),
            CredentialBundle::new("us-east-1", "AKID", "secret"),
            c.notifier.as_ref(),
        )
        .await
        .unwrap();
    c.notifier.drain();
    c
}

#[tokio::test]
async fn login_with_empty_access_key_builds_no_client() {
    let c = console().await;
    let result = c
        .session
        .login(
            c.factory.as_ref(),
            CredentialBundle::new("us-east-1", "", "secret"),
            c.notifier.as_ref(),
        )
        .await;

    assert!(result.is_err());
    assert_eq!(
        c.notifier.messages(),
        vec!["Please enter your AWS credentials"]
    );
    assert_eq!(c.factory.email_clients_built(), 0);
    assert!(!c.session.is_logged_in().await.unwrap());
}

#[tokio::test]
async fn welcome_template_submit_reports_dynamic_fields() {
    let c = logged_in_console().await;
    let repo = template_repository(TemplateBackend::Ses, c.ctx.clone());
    let mut form = TemplateForm::new(repo, c.session.clone(), c.notifier.clone());
    assert_eq!(form.mount().await, None);

    form.handle_change(TemplateField::Name, "welcome");
    form.handle_change(TemplateField::Subject, "Hi {{name}}");
    form.handle_change(TemplateField::Html, "<p>{{name}}</p>");
    form.handle_change(TemplateField::Text, "{{name}}");

    assert_eq!(form.handle_submit().await, Some(Route::Templates));
    assert_eq!(form.dynamic_fields(), ["name"]);
    assert_eq!(
        c.factory.email().template("welcome"),
        Some(TemplateContent::new("Hi {{name}}", "<p>{{name}}</p>", "{{name}}"))
    );
    assert_eq!(
        c.notifier.last().unwrap().message,
        "Template \"welcome\" has been created"
    );
}

#[tokio::test]
async fn template_list_search_filters_by_name() {
    let c = logged_in_console().await;
    let email = c.factory.email();
    email.insert_template("welcome-template", TemplateContent::new("s", "h", "t"));
    email.insert_template("newsletter-template", TemplateContent::new("s", "h", "t"));

    let repo = template_repository(TemplateBackend::Ses, c.ctx.clone());
    let found = repo.list(Some("wel")).await.unwrap();
    let names: Vec<&str> = found.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["welcome-template"]);
}

#[tokio::test]
async fn contact_list_form_with_empty_name_never_reaches_provider() {
    let c = logged_in_console().await;
    let built = c.factory.email_clients_built();
    let mut form = ContactListForm::new(
        ContactListRepository::new(c.ctx.clone()),
        c.session.clone(),
        c.notifier.clone(),
    );
    form.mount().await;
    form.handle_change(ContactListField::Description, "no name");

    assert_eq!(form.handle_submit().await, None);
    assert!(form.error(ContactListField::Name).is_some());
    assert_eq!(
        c.notifier.last().unwrap().message,
        "Please fix the errors in the form"
    );
    assert_eq!(c.factory.email_clients_built(), built);
    assert!(c.factory.email().contact_list_names().is_empty());
}

#[tokio::test]
async fn duplicate_tag_key_is_rejected_before_submit() {
    let c = logged_in_console().await;
    let mut form = ContactListForm::new(
        ContactListRepository::new(c.ctx.clone()),
        c.session.clone(),
        c.notifier.clone(),
    );
    form.mount().await;
    form.handle_change(ContactListField::Name, "customers");
    assert!(form.add_tag(&mut TagEntry::new("env", "prod")));
    assert!(!form.add_tag(&mut TagEntry::new("env", "dev")));

    assert_eq!(form.handle_submit().await, Some(Route::ContactLists));
    let stored = c.factory.email().contact_list("customers").unwrap();
    assert_eq!(stored.tags.len(), 1);
    assert_eq!(stored.tags[0].value, "prod");
}

#[tokio::test]
async fn forms_refuse_to_mount_when_logged_out() {
    let c = console().await;
    let repo = template_repository(TemplateBackend::Ses, c.ctx.clone());
    let mut form = TemplateForm::edit(repo, c.session.clone(), c.notifier.clone(), "welcome");
    assert_eq!(form.mount().await, Some(Route::Home));
    let notice = c.notifier.last().unwrap();
    assert_eq!(notice.title.as_deref(), Some("Login Required"));
}

#[tokio::test]
async fn test_email_renders_on_object_store_backend() {
    let c = console().await;
    c.session
        .login(
            c.factory.as_ref(),
            CredentialBundle::new("us-east-1", "AKID", "secret").with_bucket("templates"),
            c.notifier.as_ref(),
        )
        .await
        .unwrap();

    let repo = template_repository(TemplateBackend::ObjectStore, c.ctx.clone());
    let mut form = TemplateForm::new(repo.clone(), c.session.clone(), c.notifier.clone());
    form.mount().await;
    form.handle_change(TemplateField::Name, "welcome");
    form.handle_change(TemplateField::Subject, "Hi {{name}}");
    form.handle_change(TemplateField::Html, "<p>{{name}}</p>");
    form.handle_change(TemplateField::Text, "{{name}}");
    assert_eq!(form.handle_submit().await, Some(Route::Templates));

    let mut dialog = TestEmailForm::new("welcome");
    dialog.from = "me@example.com".into();
    dialog.to = "you@example.com".into();
    dialog.set_field("name", "Ada");
    let notifier = RecordingNotifier::new();
    assert!(dialog.send(repo.as_ref(), &notifier).await.is_some());
    assert_eq!(c.factory.email().sent_emails().len(), 1);

    let preview = form.preview(&HashMap::from([("name".to_owned(), "Ada".to_owned())]));
    assert_eq!(preview.subject, "Hi Ada");
}

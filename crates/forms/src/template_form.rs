use std::collections::HashMap;
use std::sync::Arc;

use sesman_core::validation::{field, validate_template};
use sesman_core::{
    FieldErrors, Notice, Notifier, TemplateContent, TemplateInput, TemplatePatch,
    render_placeholders,
};
use sesman_repository::TemplateRepository;
use sesman_session::Session;
use tracing::{debug, instrument};

use crate::state::{FormPhase, Route, require_login, validation_notice};

/// Editable template fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateField {
    Name,
    Subject,
    Html,
    Text,
}

impl TemplateField {
    /// Key of this field in [`FieldErrors`].
    pub fn key(self) -> &'static str {
        match self {
            Self::Name => field::NAME,
            Self::Subject => field::SUBJECT,
            Self::Html => field::HTML,
            Self::Text => field::TEXT,
        }
    }
}

/// Content editor tab.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContentTab {
    #[default]
    Html,
    Text,
}

/// Create/edit form for a single template.
pub struct TemplateForm {
    repo: Arc<dyn TemplateRepository>,
    session: Session,
    notifier: Arc<dyn Notifier>,
    id: Option<String>,
    phase: FormPhase,
    is_saving: bool,
    is_deleting: bool,
    show_preview: bool,
    tab: ContentTab,
    data: TemplateInput,
    dynamic_fields: Vec<String>,
    errors: FieldErrors,
}

impl std::fmt::Debug for TemplateForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateForm")
            .field("id", &self.id)
            .field("phase", &self.phase)
            .field("is_saving", &self.is_saving)
            .field("data", &self.data)
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

impl TemplateForm {
    /// Form creating a new template.
    pub fn new(
        repo: Arc<dyn TemplateRepository>,
        session: Session,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            repo,
            session,
            notifier,
            id: None,
            phase: FormPhase::Idle,
            is_saving: false,
            is_deleting: false,
            show_preview: false,
            tab: ContentTab::Html,
            data: TemplateInput::default(),
            dynamic_fields: Vec::new(),
            errors: FieldErrors::new(),
        }
    }

    /// Form editing template `id`.
    pub fn edit(
        repo: Arc<dyn TemplateRepository>,
        session: Session,
        notifier: Arc<dyn Notifier>,
        id: impl Into<String>,
    ) -> Self {
        let mut form = Self::new(repo, session, notifier);
        form.id = Some(id.into());
        form
    }

    pub fn is_editing(&self) -> bool {
        self.id.is_some()
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == FormPhase::Loading
    }

    pub fn is_saving(&self) -> bool {
        self.is_saving
    }

    pub fn is_deleting(&self) -> bool {
        self.is_deleting
    }

    pub fn data(&self) -> &TemplateInput {
        &self.data
    }

    pub fn dynamic_fields(&self) -> &[String] {
        &self.dynamic_fields
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error(&self, field: TemplateField) -> Option<&str> {
        self.errors.get(field.key())
    }

    pub fn tab(&self) -> ContentTab {
        self.tab
    }

    pub fn set_tab(&mut self, tab: ContentTab) {
        self.tab = tab;
    }

    pub fn show_preview(&self) -> bool {
        self.show_preview
    }

    pub fn toggle_preview(&mut self) {
        self.show_preview = !self.show_preview;
    }

    /// Check the session and, when editing, load the template.
    #[instrument(skip(self), fields(id = ?self.id))]
    pub async fn mount(&mut self) -> Option<Route> {
        if !require_login(&self.session, self.notifier.as_ref()).await {
            return Some(Route::Home);
        }
        let Some(id) = self.id.clone() else {
            self.phase = FormPhase::Ready;
            return None;
        };

        self.phase = FormPhase::Loading;
        match self.repo.get(&id).await {
            Ok(Some(template)) => {
                self.data = TemplateInput {
                    name: template.name,
                    subject: template.subject,
                    html: template.html,
                    text: template.text,
                };
                self.dynamic_fields = template.dynamic_fields;
                self.phase = FormPhase::Ready;
                None
            }
            Ok(None) => {
                self.phase = FormPhase::LoadError;
                self.notifier
                    .notify(Notice::error("Template not found").with_title("Error"));
                Some(Route::Home)
            }
            Err(e) => {
                debug!(error = %e, "template load failed");
                self.phase = FormPhase::LoadError;
                self.notifier
                    .notify(Notice::error("Failed to load template").with_title("Error"));
                Some(Route::Home)
            }
        }
    }

    /// Set a field and clear its validation error.
    pub fn handle_change(&mut self, field: TemplateField, value: impl Into<String>) {
        let value = value.into();
        match field {
            TemplateField::Name => self.data.name = value,
            TemplateField::Subject => self.data.subject = value,
            TemplateField::Html => self.data.html = value,
            TemplateField::Text => self.data.text = value,
        }
        self.errors.remove(field.key());
    }

    /// Validate the form, switching to the tab holding an invalid body.
    ///
    /// The HTML tab wins when both bodies are invalid.
    pub fn validate(&mut self) -> bool {
        match validate_template(&self.data) {
            Ok(()) => {
                self.errors.clear();
                true
            }
            Err(errors) => {
                if errors.contains(field::HTML) {
                    self.tab = ContentTab::Html;
                } else if errors.contains(field::TEXT) {
                    self.tab = ContentTab::Text;
                }
                self.errors = errors;
                false
            }
        }
    }

    /// Validate and save. Returns the templates page on success.
    ///
    /// Does nothing until [`mount`](Self::mount) has made the form ready.
    #[instrument(skip(self), fields(id = ?self.id, name = %self.data.name))]
    pub async fn handle_submit(&mut self) -> Option<Route> {
        if self.phase != FormPhase::Ready {
            debug!(phase = ?self.phase, "submit ignored");
            return None;
        }
        if !self.validate() {
            self.notifier.notify(validation_notice());
            return None;
        }

        self.is_saving = true;
        let result = match &self.id {
            Some(id) => {
                let patch = TemplatePatch::from(self.data.clone());
                self.repo.update(id, &patch).await
            }
            None => self.repo.create(&self.data).await,
        };
        self.is_saving = false;

        match result {
            Ok(template) => {
                let verb = if self.id.is_some() { "updated" } else { "created" };
                self.notifier.notify(
                    Notice::success(format!("Template \"{}\" has been {verb}", self.data.name))
                        .with_title("Success"),
                );
                self.dynamic_fields = template.dynamic_fields;
                self.id = Some(template.id);
                Some(Route::Templates)
            }
            Err(e) => {
                self.notifier
                    .notify(Notice::error(e.to_string()).with_title("Error"));
                None
            }
        }
    }

    /// Delete the template being edited. Returns the templates page on success.
    #[instrument(skip(self), fields(id = ?self.id))]
    pub async fn handle_delete(&mut self) -> Option<Route> {
        let id = self.id.clone()?;
        self.is_deleting = true;
        let result = self.repo.delete(&id).await;
        self.is_deleting = false;

        match result {
            Ok(()) => {
                self.notifier.notify(
                    Notice::success(format!("Template \"{id}\" has been deleted."))
                        .with_title("Success"),
                );
                Some(Route::Templates)
            }
            Err(_) => {
                self.notifier.notify(
                    Notice::error("Failed to delete the template. Please try again.")
                        .with_title("Error"),
                );
                None
            }
        }
    }

    /// Current content with placeholders substituted from `values`.
    pub fn preview(&self, values: &HashMap<String, String>) -> TemplateContent {
        TemplateContent::new(
            render_placeholders(&self.data.subject, values),
            render_placeholders(&self.data.html, values),
            render_placeholders(&self.data.text, values),
        )
    }
}

#[cfg(test)]
mod tests {
    use sesman_core::{CredentialBundle, RecordingNotifier};
    use sesman_memory::{MemoryClientFactory, ops};
    use sesman_provider::ProviderError;
    use sesman_repository::{RepositoryContext, TemplateBackend, template_repository};
    use sesman_session::{Connector, MemoryStore};

    use super::*;

    struct Fixture {
        repo: Arc<dyn TemplateRepository>,
        session: Session,
        factory: Arc<MemoryClientFactory>,
        notifier: Arc<RecordingNotifier>,
    }

    impl Fixture {
        fn new_form(&self) -> TemplateForm {
            TemplateForm::new(self.repo.clone(), self.session.clone(), self.notifier.clone())
        }

        fn edit_form(&self, id: &str) -> TemplateForm {
            TemplateForm::edit(
                self.repo.clone(),
                self.session.clone(),
                self.notifier.clone(),
                id,
            )
        }
    }

    async fn fixture(logged_in: bool) -> Fixture {
        let session = Session::open(Arc::new(MemoryStore::new())).await.unwrap();
        if logged_in {
            session
                .save(&CredentialBundle::new("us-east-1", "AKID", "secret"))
                .await
                .unwrap();
        }
        let factory = Arc::new(MemoryClientFactory::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let ctx = RepositoryContext::new(
            Connector::new(session.clone(), factory.clone()),
            notifier.clone(),
        );
        Fixture {
            repo: template_repository(TemplateBackend::Ses, ctx),
            session,
            factory,
            notifier,
        }
    }

    fn fill(form: &mut TemplateForm) {
        form.handle_change(TemplateField::Name, "welcome");
        form.handle_change(TemplateField::Subject, "Hi {{name}}");
        form.handle_change(TemplateField::Html, "<p>{{name}}</p>");
        form.handle_change(TemplateField::Text, "{{name}}");
    }

    #[tokio::test]
    async fn mount_requires_login() {
        let f = fixture(false).await;
        let mut form = f.new_form();
        assert_eq!(form.mount().await, Some(Route::Home));
        assert_eq!(form.phase(), FormPhase::Idle);
        let notice = f.notifier.last().unwrap();
        assert_eq!(notice.title.as_deref(), Some("Login Required"));
        assert_eq!(notice.message, "You need to log in to manage templates");
    }

    #[tokio::test]
    async fn submit_after_refused_mount_does_nothing() {
        let f = fixture(false).await;
        let mut form = f.new_form();
        assert_eq!(form.mount().await, Some(Route::Home));
        fill(&mut form);

        assert_eq!(form.handle_submit().await, None);
        assert_eq!(f.notifier.messages().len(), 1);
        assert_eq!(
            f.notifier.last().unwrap().title.as_deref(),
            Some("Login Required")
        );
        assert_eq!(f.factory.email_clients_built(), 0);
        assert!(f.factory.email().template("welcome").is_none());
    }

    #[tokio::test]
    async fn mount_loads_existing_template() {
        let f = fixture(true).await;
        f.factory.email().insert_template(
            "welcome",
            TemplateContent::new("Hi {{name}}", "<p>{{ team }}</p>", "Bye"),
        );
        let mut form = f.edit_form("welcome");
        assert_eq!(form.mount().await, None);
        assert_eq!(form.phase(), FormPhase::Ready);
        assert_eq!(form.data().subject, "Hi {{name}}");
        assert_eq!(form.dynamic_fields(), ["name", "team"]);
    }

    #[tokio::test]
    async fn mount_of_missing_template_navigates_home() {
        let f = fixture(true).await;
        let mut form = f.edit_form("ghost");
        assert_eq!(form.mount().await, Some(Route::Home));
        assert_eq!(form.phase(), FormPhase::LoadError);
        assert_eq!(f.notifier.messages(), vec!["Template not found"]);
    }

    #[tokio::test]
    async fn mount_fetch_error_navigates_home() {
        let f = fixture(true).await;
        f.factory
            .email()
            .faults()
            .fail(ops::GET_TEMPLATE, ProviderError::Timeout);
        let mut form = f.edit_form("welcome");
        assert_eq!(form.mount().await, Some(Route::Home));
        assert_eq!(
            f.notifier.messages().last().map(String::as_str),
            Some("Failed to load template")
        );
    }

    #[tokio::test]
    async fn handle_change_clears_field_error() {
        let f = fixture(true).await;
        let mut form = f.new_form();
        assert!(!form.validate());
        assert!(form.error(TemplateField::Subject).is_some());
        form.handle_change(TemplateField::Subject, "Hello");
        assert!(form.error(TemplateField::Subject).is_none());
        assert!(form.error(TemplateField::Name).is_some());
    }

    #[tokio::test]
    async fn invalid_submit_routes_to_html_tab_first() {
        let f = fixture(true).await;
        let mut form = f.new_form();
        form.mount().await;
        form.set_tab(ContentTab::Text);
        form.handle_change(TemplateField::Name, "welcome");
        form.handle_change(TemplateField::Subject, "Hi");

        assert_eq!(form.handle_submit().await, None);
        assert_eq!(form.tab(), ContentTab::Html);
        assert_eq!(form.error(TemplateField::Html), Some("HTML Content is required."));
        assert_eq!(form.error(TemplateField::Text), Some("Text Content is required."));
        let notice = f.notifier.last().unwrap();
        assert_eq!(notice.title.as_deref(), Some("Validation Error"));
        assert_eq!(notice.message, "Please fix the errors in the form");
        assert_eq!(f.factory.email_clients_built(), 0);
    }

    #[tokio::test]
    async fn invalid_text_only_routes_to_text_tab() {
        let f = fixture(true).await;
        let mut form = f.new_form();
        fill(&mut form);
        form.handle_change(TemplateField::Text, "");
        assert!(!form.validate());
        assert_eq!(form.tab(), ContentTab::Text);
    }

    #[tokio::test]
    async fn submit_creates_template() {
        let f = fixture(true).await;
        let mut form = f.new_form();
        form.mount().await;
        fill(&mut form);

        assert_eq!(form.handle_submit().await, Some(Route::Templates));
        assert!(!form.is_saving());
        assert_eq!(form.dynamic_fields(), ["name"]);
        assert_eq!(
            f.notifier.messages(),
            vec!["Template \"welcome\" has been created"]
        );
        let stored = f.factory.email().template("welcome").unwrap();
        assert_eq!(
            stored,
            TemplateContent::new("Hi {{name}}", "<p>{{name}}</p>", "{{name}}")
        );
    }

    #[tokio::test]
    async fn failed_submit_resets_saving_and_stays() {
        let f = fixture(true).await;
        f.factory.email().faults().fail(
            ops::CREATE_TEMPLATE,
            ProviderError::AlreadyExists("welcome".into()),
        );
        let mut form = f.new_form();
        form.mount().await;
        fill(&mut form);

        assert_eq!(form.handle_submit().await, None);
        assert!(!form.is_saving());
        let notice = f.notifier.last().unwrap();
        assert!(notice.is_error());
        assert_eq!(notice.title.as_deref(), Some("Error"));
        assert_eq!(
            notice.message,
            "CreateEmailTemplate failed: already exists: welcome"
        );
    }

    #[tokio::test]
    async fn edit_submit_renames() {
        let f = fixture(true).await;
        f.factory
            .email()
            .insert_template("welcome", TemplateContent::new("Hi", "<p>Hi</p>", "Hi"));
        let mut form = f.edit_form("welcome");
        form.mount().await;
        form.handle_change(TemplateField::Name, "greeting");

        assert_eq!(form.handle_submit().await, Some(Route::Templates));
        assert_eq!(f.factory.email().template_names(), vec!["greeting".to_owned()]);
        assert_eq!(
            f.notifier.last().unwrap().message,
            "Template \"greeting\" has been updated"
        );
    }

    #[tokio::test]
    async fn delete_routes_to_templates() {
        let f = fixture(true).await;
        f.factory
            .email()
            .insert_template("welcome", TemplateContent::new("Hi", "<p>Hi</p>", "Hi"));
        let mut form = f.edit_form("welcome");
        assert_eq!(form.handle_delete().await, Some(Route::Templates));
        assert!(f.factory.email().template("welcome").is_none());
        assert_eq!(
            f.notifier.last().unwrap().message,
            "Template \"welcome\" has been deleted."
        );

        assert_eq!(form.handle_delete().await, None);
        assert_eq!(
            f.notifier.last().unwrap().message,
            "Failed to delete the template. Please try again."
        );
    }

    #[tokio::test]
    async fn preview_renders_known_fields() {
        let f = fixture(true).await;
        let mut form = f.new_form();
        fill(&mut form);
        form.handle_change(TemplateField::Text, "{{name}} / {{ unknown }}");
        assert!(!form.show_preview());
        form.toggle_preview();
        assert!(form.show_preview());

        let values = HashMap::from([("name".to_owned(), "Ada".to_owned())]);
        let rendered = form.preview(&values);
        assert_eq!(rendered.subject, "Hi Ada");
        assert_eq!(rendered.html, "<p>Ada</p>");
        assert_eq!(rendered.text, "Ada / {{ unknown }}");
    }
}

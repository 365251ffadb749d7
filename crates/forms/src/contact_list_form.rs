use std::sync::Arc;

use sesman_core::validation::{field, validate_contact_list};
use sesman_core::{ContactListInput, ContactListPatch, FieldErrors, Notice, Notifier, Tag, Topic};
use sesman_repository::ContactListRepository;
use sesman_session::Session;
use tracing::{debug, instrument};

use crate::entry::{TagEntry, TopicEntry};
use crate::state::{FormPhase, Route, require_login, validation_notice};

/// Scalar contact list fields editable through [`ContactListForm::handle_change`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactListField {
    Name,
    Description,
}

impl ContactListField {
    pub fn key(self) -> &'static str {
        match self {
            Self::Name => field::NAME,
            Self::Description => field::DESCRIPTION,
        }
    }
}

/// Create/edit form for a contact list with its topics and tags.
pub struct ContactListForm {
    repo: ContactListRepository,
    session: Session,
    notifier: Arc<dyn Notifier>,
    name: Option<String>,
    phase: FormPhase,
    is_saving: bool,
    is_deleting: bool,
    data: ContactListInput,
    errors: FieldErrors,
}

impl std::fmt::Debug for ContactListForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContactListForm")
            .field("name", &self.name)
            .field("phase", &self.phase)
            .field("data", &self.data)
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

impl ContactListForm {
    pub fn new(repo: ContactListRepository, session: Session, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            repo,
            session,
            notifier,
            name: None,
            phase: FormPhase::Idle,
            is_saving: false,
            is_deleting: false,
            data: ContactListInput::default(),
            errors: FieldErrors::new(),
        }
    }

    pub fn edit(
        repo: ContactListRepository,
        session: Session,
        notifier: Arc<dyn Notifier>,
        name: impl Into<String>,
    ) -> Self {
        let mut form = Self::new(repo, session, notifier);
        form.name = Some(name.into());
        form
    }

    pub fn is_editing(&self) -> bool {
        self.name.is_some()
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn is_saving(&self) -> bool {
        self.is_saving
    }

    pub fn is_deleting(&self) -> bool {
        self.is_deleting
    }

    pub fn data(&self) -> &ContactListInput {
        &self.data
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error(&self, field: ContactListField) -> Option<&str> {
        self.errors.get(field.key())
    }

    #[instrument(skip(self), fields(name = ?self.name))]
    pub async fn mount(&mut self) -> Option<Route> {
        if !require_login(&self.session, self.notifier.as_ref()).await {
            return Some(Route::Home);
        }
        let Some(name) = self.name.clone() else {
            self.phase = FormPhase::Ready;
            return None;
        };

        self.phase = FormPhase::Loading;
        match self.repo.get(&name).await {
            Ok(Some(list)) => {
                self.data = ContactListInput::from(&list);
                self.phase = FormPhase::Ready;
                None
            }
            Ok(None) => {
                self.phase = FormPhase::LoadError;
                self.notifier.notify(
                    Notice::error(format!("Contact list \"{name}\" not found")).with_title("Error"),
                );
                Some(Route::ContactLists)
            }
            Err(e) => {
                debug!(error = %e, "contact list load failed");
                self.phase = FormPhase::LoadError;
                self.notifier.notify(
                    Notice::error(format!("Failed to load \"{name}\" contact list"))
                        .with_title("Error"),
                );
                Some(Route::ContactLists)
            }
        }
    }

    /// Set a scalar field and clear its validation error. An empty
    /// description clears it.
    pub fn handle_change(&mut self, field: ContactListField, value: impl Into<String>) {
        let value = value.into();
        match field {
            ContactListField::Name => self.data.name = value,
            ContactListField::Description => {
                self.data.description = Some(value).filter(|d| !d.is_empty());
            }
        }
        self.errors.remove(field.key());
    }

    /// Add the tag held by `entry`. Invalid or duplicate entries leave the
    /// tag list untouched and keep their errors on `entry`.
    pub fn add_tag(&mut self, entry: &mut TagEntry) -> bool {
        match entry.submit(&self.data.tags) {
            Some(tag) => {
                self.data.tags.push(tag);
                true
            }
            None => false,
        }
    }

    pub fn remove_tag(&mut self, index: usize) -> Option<Tag> {
        (index < self.data.tags.len()).then(|| self.data.tags.remove(index))
    }

    /// Add the topic held by `entry`, as [`add_tag`](Self::add_tag) does.
    pub fn add_topic(&mut self, entry: &mut TopicEntry) -> bool {
        match entry.submit(&self.data.topics) {
            Some(topic) => {
                self.data.topics.push(topic);
                true
            }
            None => false,
        }
    }

    pub fn remove_topic(&mut self, index: usize) -> Option<Topic> {
        (index < self.data.topics.len()).then(|| self.data.topics.remove(index))
    }

    pub fn validate(&mut self) -> bool {
        match validate_contact_list(&self.data) {
            Ok(()) => {
                self.errors.clear();
                true
            }
            Err(errors) => {
                self.errors = errors;
                false
            }
        }
    }

    /// Validate and save. Returns the contact lists page on success.
    #[instrument(skip(self), fields(name = ?self.name))]
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
        let result = match &self.name {
            Some(name) => {
                let patch = ContactListPatch::from(self.data.clone());
                self.repo.update(name, &patch).await
            }
            None => self.repo.create(&self.data).await,
        };
        self.is_saving = false;

        match result {
            Ok(list) => {
                let verb = if self.name.is_some() { "updated" } else { "created" };
                self.notifier.notify(
                    Notice::success(format!(
                        "Contact list \"{}\" has been {verb}",
                        self.data.name
                    ))
                    .with_title("Success"),
                );
                self.name = Some(list.name);
                Some(Route::ContactLists)
            }
            Err(e) => {
                self.notifier
                    .notify(Notice::error(e.to_string()).with_title("Error"));
                None
            }
        }
    }

    /// Delete the contact list being edited.
    #[instrument(skip(self), fields(name = ?self.name))]
    pub async fn handle_delete(&mut self) -> Option<Route> {
        let name = self.name.clone()?;
        self.is_deleting = true;
        let result = self.repo.delete(&name).await;
        self.is_deleting = false;

        match result {
            Ok(()) => {
                self.notifier.notify(
                    Notice::success(format!("Contact list \"{name}\" has been deleted."))
                        .with_title("Success"),
                );
                Some(Route::ContactLists)
            }
            Err(_) => {
                self.notifier.notify(
                    Notice::error("Failed to delete the contact list. Please try again.")
                        .with_title("Error"),
                );
                None
            }
        }
    }
}

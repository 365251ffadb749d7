//! Form state machines driving template and contact list editing.
//!
//! Each form loads its entity on [`mount`](TemplateForm::mount), tracks
//! field edits and validation errors, and submits through a repository.
//! Operations that finish a form return the [`Route`] to navigate to.

mod contact_list_form;
mod entry;
mod state;
mod template_form;
mod test_email;

pub use contact_list_form::{ContactListField, ContactListForm};
pub use entry::{TagEntry, TopicEntry};
pub use state::{FormPhase, Route};
pub use template_form::{ContentTab, TemplateField, TemplateForm};
pub use test_email::TestEmailForm;

//! Repositories over the email provider and the object store.
//!
//! Every operation reads credentials through the session, builds a fresh
//! client, and reports failures both as a returned [`RepositoryError`] and
//! as an error [`Notice`](sesman_core::Notice).

pub mod context;
pub mod contact_list;
pub mod error;
pub mod object_store_template;
pub mod ses_template;
pub mod template;
pub mod testing;

pub use context::RepositoryContext;
pub use contact_list::ContactListRepository;
pub use error::RepositoryError;
pub use object_store_template::ObjectStoreTemplateRepository;
pub use ses_template::SesTemplateRepository;
pub use template::{TemplateBackend, TemplateRepository, template_repository};

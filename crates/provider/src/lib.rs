//! Provider seams for the SES manager.
//!
//! Repositories talk to the outside world only through these traits:
//!
//! - [`EmailService`]: email templates, contact lists and sending
//! - [`ObjectStore`]: keyed objects for the object-store template backend
//! - [`ClientFactory`]: builds authenticated clients from a credential bundle

pub mod email;
pub mod error;
pub mod factory;
pub mod object_store;

pub use email::{EmailService, OutgoingContent, OutgoingEmail};
pub use error::ProviderError;
pub use factory::ClientFactory;
pub use object_store::ObjectStore;

//! Persisted login state for the SES manager.
//!
//! The session keeps the credential bundle and theme preference in a
//! [`KeyValueStore`], publishes login changes on a watch channel and builds
//! authenticated provider clients through a [`Connector`].

pub mod connector;
pub mod error;
pub mod session;
pub mod store;

pub use connector::Connector;
pub use error::{AuthError, StoreError};
pub use session::{CREDENTIALS_KEY, Session, THEME_KEY};
pub use store::{FileStore, KeyValueStore, MemoryStore};

use std::fmt;

use sesman_core::{Notice, Notifier};
use sesman_session::Session;
use tracing::warn;

/// Load state of a form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormPhase {
    /// Not mounted yet, or mounting was refused.
    #[default]
    Idle,
    /// Fetching the entity being edited.
    Loading,
    /// Editable.
    Ready,
    /// The entity could not be loaded.
    LoadError,
}

/// Navigation target after a form operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Templates,
    ContactLists,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Templates => "/templates",
            Self::ContactLists => "/contact-lists",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Refuse to mount when nobody is logged in.
///
/// Returns `false` after notifying when the session has no credentials.
pub(crate) async fn require_login(session: &Session, notifier: &dyn Notifier) -> bool {
    let logged_in = session.is_logged_in().await.unwrap_or_else(|e| {
        warn!(error = %e, "could not read session state");
        false
    });
    if !logged_in {
        notifier.notify(
            Notice::error("You need to log in to manage templates").with_title("Login Required"),
        );
    }
    logged_in
}

pub(crate) fn validation_notice() -> Notice {
    Notice::error("Please fix the errors in the form").with_title("Validation Error")
}

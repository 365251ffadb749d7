use sesman_provider::ProviderError;
use thiserror::Error;

/// Errors from a [`KeyValueStore`](crate::store::KeyValueStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Keys are used as file names and must be plain identifiers.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from reading credentials or logging in.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("credentials not found")]
    NotFound,

    #[error("malformed credentials")]
    Malformed(#[source] serde_json::Error),

    /// A required login field was empty.
    #[error("missing {0}")]
    MissingInput(&'static str),

    /// The provider rejected the credentials during login.
    #[error("login failed: {0}")]
    LoginFailed(#[source] ProviderError),

    /// A client could not be built from the stored credentials.
    #[error(transparent)]
    Client(ProviderError),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

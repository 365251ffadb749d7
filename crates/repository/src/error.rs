use sesman_provider::ProviderError;
use sesman_session::AuthError;
use thiserror::Error;

/// Errors returned by the repositories.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Credentials are missing or unusable.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The entity addressed by an update does not exist.
    #[error("{kind} \"{name}\" not found")]
    NotFound { kind: &'static str, name: String },

    /// An entity with the target name already exists.
    #[error("{kind} \"{name}\" already exists")]
    AlreadyExists { kind: &'static str, name: String },

    /// The provider call failed.
    #[error("{operation} failed: {source}")]
    Provider {
        operation: &'static str,
        #[source]
        source: ProviderError,
    },

    /// A stored object could not be encoded or decoded.
    #[error("invalid stored template \"{name}\": {message}")]
    Serialization { name: String, message: String },
}

impl RepositoryError {
    pub(crate) fn provider(operation: &'static str, source: ProviderError) -> Self {
        Self::Provider { operation, source }
    }

    pub(crate) fn template_not_found(name: &str) -> Self {
        Self::NotFound {
            kind: "template",
            name: name.to_owned(),
        }
    }

    pub(crate) fn contact_list_not_found(name: &str) -> Self {
        Self::NotFound {
            kind: "contact list",
            name: name.to_owned(),
        }
    }

    /// Returns `true` if the provider refused to send the message.
    pub fn is_message_rejected(&self) -> bool {
        matches!(
            self,
            Self::Provider {
                source: ProviderError::MessageRejected(_),
                ..
            }
        )
    }

    /// Returns `true` for a missing entity.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Provider { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(
            RepositoryError::template_not_found("welcome").to_string(),
            "template \"welcome\" not found"
        );
        assert_eq!(
            RepositoryError::provider("CreateEmailTemplate", ProviderError::RateLimited)
                .to_string(),
            "CreateEmailTemplate failed: rate limited"
        );
        assert_eq!(
            RepositoryError::Auth(AuthError::NotFound).to_string(),
            "credentials not found"
        );
    }

    #[test]
    fn classification() {
        let rejected = RepositoryError::provider(
            "SendEmail",
            ProviderError::MessageRejected("sandbox".into()),
        );
        assert!(rejected.is_message_rejected());
        assert!(!rejected.is_not_found());
        assert!(RepositoryError::contact_list_not_found("news").is_not_found());
        assert!(
            RepositoryError::provider("GetObject", ProviderError::NotFound("k".into()))
                .is_not_found()
        );
    }
}

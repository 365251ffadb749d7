use thiserror::Error;

/// Errors returned by provider clients.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The addressed entity does not exist on the provider.
    #[error("not found: {0}")]
    NotFound(String),

    /// An entity with the same name already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The provider failed to carry out the request.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// The provider did not respond in time.
    #[error("request timed out")]
    Timeout,

    /// A network or transport-level error occurred.
    #[error("connection error: {0}")]
    Connection(String),

    /// The client was given invalid configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The provider rejected the request due to rate limiting.
    #[error("rate limited")]
    RateLimited,

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The provider refused to send the message (e.g. sandbox restrictions).
    #[error("message rejected: {0}")]
    MessageRejected(String),
}

impl ProviderError {
    /// Returns `true` if the error means the entity is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_detection() {
        assert!(ProviderError::NotFound("welcome".into()).is_not_found());
        assert!(!ProviderError::ExecutionFailed("x".into()).is_not_found());
        assert!(!ProviderError::Timeout.is_not_found());
    }

    #[test]
    fn error_display() {
        let err = ProviderError::NotFound("template welcome".into());
        assert_eq!(err.to_string(), "not found: template welcome");

        assert_eq!(ProviderError::RateLimited.to_string(), "rate limited");
        assert_eq!(ProviderError::Timeout.to_string(), "request timed out");
    }
}

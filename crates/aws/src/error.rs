use aws_sdk_sesv2::error::DisplayErrorContext;
use sesman_provider::ProviderError;
use thiserror::Error;
use tracing::error;

/// Errors specific to AWS operations.
#[derive(Debug, Error)]
pub enum AwsProviderError {
    /// The AWS SDK returned an error from the service.
    #[error("AWS service error: {0}")]
    ServiceError(String),

    /// The addressed template, contact list or object does not exist.
    #[error("AWS resource not found: {0}")]
    NotFound(String),

    /// A resource with the same name already exists.
    #[error("AWS resource already exists: {0}")]
    AlreadyExists(String),

    /// SES refused the message (sandbox, unverified identity, ...).
    #[error("AWS message rejected: {0}")]
    MessageRejected(String),

    /// The request was throttled by the AWS service.
    #[error("AWS request throttled")]
    Throttled,

    /// A network or connection error occurred communicating with AWS.
    #[error("AWS connection error: {0}")]
    Connection(String),

    /// The request timed out.
    #[error("AWS request timed out")]
    Timeout,

    /// AWS rejected the credentials.
    #[error("credential error: {0}")]
    CredentialError(String),
}

impl From<AwsProviderError> for ProviderError {
    fn from(err: AwsProviderError) -> Self {
        match err {
            AwsProviderError::ServiceError(msg) => ProviderError::ExecutionFailed(msg),
            AwsProviderError::NotFound(msg) => ProviderError::NotFound(msg),
            AwsProviderError::AlreadyExists(msg) => ProviderError::AlreadyExists(msg),
            AwsProviderError::MessageRejected(msg) => ProviderError::MessageRejected(msg),
            AwsProviderError::Throttled => ProviderError::RateLimited,
            AwsProviderError::Connection(msg) => ProviderError::Connection(msg),
            AwsProviderError::Timeout => ProviderError::Timeout,
            AwsProviderError::CredentialError(msg) => ProviderError::Configuration(msg),
        }
    }
}

/// Classify an AWS SDK error string into the appropriate [`AwsProviderError`].
///
/// Inspects the error message for the service error codes and transport
/// failures the console distinguishes.
pub fn classify_sdk_error(error_str: &str) -> AwsProviderError {
    let lower = error_str.to_lowercase();
    if lower.contains("throttl") || lower.contains("rate exceed") || lower.contains("too many") {
        AwsProviderError::Throttled
    } else if lower.contains("notfound") || lower.contains("nosuchkey") {
        AwsProviderError::NotFound(error_str.to_owned())
    } else if lower.contains("alreadyexists") || lower.contains("preconditionfailed") {
        AwsProviderError::AlreadyExists(error_str.to_owned())
    } else if lower.contains("messagerejected") {
        AwsProviderError::MessageRejected(error_str.to_owned())
    } else if lower.contains("invalidclienttokenid")
        || lower.contains("signaturedoesnotmatch")
        || lower.contains("unrecognizedclient")
    {
        AwsProviderError::CredentialError(error_str.to_owned())
    } else if lower.contains("timeout") || lower.contains("timed out") {
        AwsProviderError::Timeout
    } else if lower.contains("connection")
        || lower.contains("connect")
        || lower.contains("dns")
        || lower.contains("network")
    {
        AwsProviderError::Connection(error_str.to_owned())
    } else {
        AwsProviderError::ServiceError(error_str.to_owned())
    }
}

/// Log a failed SDK call and convert it into a [`ProviderError`].
pub(crate) fn sdk_failure<E>(operation: &str, err: &E) -> ProviderError
where
    E: std::error::Error,
{
    let err_str = DisplayErrorContext(err).to_string();
    error!(operation = %operation, error = %err_str, "AWS call failed");
    classify_sdk_error(&err_str).into()
}

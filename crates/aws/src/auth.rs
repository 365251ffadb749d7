use aws_sdk_sesv2::config::Credentials;
use tracing::debug;

use crate::config::AwsBaseConfig;

/// Provider name attached to the static credentials.
const CREDENTIALS_SOURCE: &str = "sesman-credential-bundle";

/// Build an AWS SDK configuration from the given [`AwsBaseConfig`].
///
/// Uses the static keys of the configuration instead of the environment
/// credential chain, and optionally overrides the endpoint URL for local
/// development (e.g. `LocalStack`).
///
/// # Examples
///
/// ```no_run
/// use sesman_aws::config::AwsBaseConfig;
/// use sesman_aws::auth::build_sdk_config;
///
/// # async fn example() {
/// let config = AwsBaseConfig::new("us-east-1", "AKID", "secret")
///     .with_endpoint_url("http://localhost:4566");
/// let sdk_config = build_sdk_config(&config).await;
/// # }
/// ```
pub async fn build_sdk_config(config: &AwsBaseConfig) -> aws_config::SdkConfig {
    let credentials = Credentials::new(
        config.access_key_id.clone(),
        config.secret_access_key.clone(),
        None,
        None,
        CREDENTIALS_SOURCE,
    );

    let mut loader = aws_config::from_env()
        .region(aws_config::Region::new(config.region.clone()))
        .credentials_provider(credentials);

    if let Some(endpoint) = &config.endpoint_url {
        debug!(endpoint = %endpoint, "using custom AWS endpoint");
        loader = loader.endpoint_url(endpoint);
    }

    loader.load().await
}

#[cfg(all(test, feature = "integration"))]
mod integration_tests {
    use super::*;

    // The AWS SDK panics on `load()` if no system root certificates are
    // available, so these only run in integration mode.

    #[tokio::test]
    async fn build_sdk_config_sets_region() {
        let config = AwsBaseConfig::new("ap-northeast-1", "AKID", "secret");
        let sdk_config = build_sdk_config(&config).await;
        assert_eq!(
            sdk_config.region().map(|r| r.as_ref()),
            Some("ap-northeast-1")
        );
    }

    #[tokio::test]
    async fn build_sdk_config_uses_static_credentials() {
        let config = AwsBaseConfig::new("us-west-2", "AKID", "secret")
            .with_endpoint_url("http://localhost:4566");
        let sdk_config = build_sdk_config(&config).await;
        assert!(sdk_config.credentials_provider().is_some());
        assert_eq!(sdk_config.region().map(|r| r.as_ref()), Some("us-west-2"));
    }
}

use sesman_core::CredentialBundle;

/// Shared base configuration for the AWS clients.
///
/// Built from the stored [`CredentialBundle`]; the endpoint override points
/// the clients at a local emulator (e.g. `LocalStack`).
#[derive(Clone)]
pub struct AwsBaseConfig {
    /// AWS region (e.g. `"us-east-1"`).
    pub region: String,

    /// Static access key ID.
    pub access_key_id: String,

    /// Static secret access key.
    pub secret_access_key: String,

    /// Optional endpoint URL override for local development.
    pub endpoint_url: Option<String>,
}

impl std::fmt::Debug for AwsBaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsBaseConfig")
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field("endpoint_url", &self.endpoint_url)
            .finish()
    }
}

impl AwsBaseConfig {
    /// Create a configuration from a region and static keys.
    pub fn new(
        region: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        Self {
            region: region.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            endpoint_url: None,
        }
    }

    /// Create a configuration from a stored credential bundle.
    pub fn from_credentials(credentials: &CredentialBundle) -> Self {
        Self::new(
            &credentials.region,
            &credentials.access_key_id,
            &credentials.secret_access_key,
        )
    }

    /// Set an endpoint URL override for local development.
    #[must_use]
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }
}

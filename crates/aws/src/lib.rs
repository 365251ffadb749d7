//! AWS adapters for the SES manager.
//!
//! - [`SesClient`]: [`EmailService`](sesman_provider::EmailService) over SES v2
//! - [`S3ObjectStore`]: [`ObjectStore`](sesman_provider::ObjectStore) over S3
//! - [`AwsClientFactory`]: builds both from a stored credential bundle
//!
//! Every client is configured from an [`AwsBaseConfig`](config::AwsBaseConfig)
//! holding the region, static keys and an optional endpoint override.

pub mod auth;
pub mod config;
pub mod error;
pub mod factory;
pub mod s3;
pub mod ses;

pub use config::AwsBaseConfig;
pub use error::AwsProviderError;
pub use factory::AwsClientFactory;
pub use s3::S3ObjectStore;
pub use ses::SesClient;

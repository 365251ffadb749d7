use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sesman_core::{EmailTemplate, TemplateInput, TemplatePatch};

use crate::context::RepositoryContext;
use crate::error::RepositoryError;
use crate::object_store_template::ObjectStoreTemplateRepository;
use crate::ses_template::SesTemplateRepository;

/// Page size used when listing provider templates.
pub const LIST_PAGE_SIZE: i32 = 100;

/// CRUD over named email templates.
///
/// `get` of a missing template is `Ok(None)`. `update` of a missing template
/// fails with [`RepositoryError::NotFound`]. A rename creates the new
/// template, reads it back and only then deletes the old one; a failed read
/// back removes the new template again.
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    fn backend(&self) -> TemplateBackend;

    /// All templates whose name contains `search` (case-insensitive).
    async fn list(&self, search: Option<&str>) -> Result<Vec<EmailTemplate>, RepositoryError>;

    async fn get(&self, id: &str) -> Result<Option<EmailTemplate>, RepositoryError>;

    async fn create(&self, input: &TemplateInput) -> Result<EmailTemplate, RepositoryError>;

    async fn update(
        &self,
        id: &str,
        patch: &TemplatePatch,
    ) -> Result<EmailTemplate, RepositoryError>;

    async fn delete(&self, id: &str) -> Result<(), RepositoryError>;

    /// Send template `name` to `to`, substituting `fields`. Returns the
    /// provider message id, empty when none was returned.
    async fn send_test_email(
        &self,
        name: &str,
        from: &str,
        to: &[String],
        fields: &HashMap<String, String>,
    ) -> Result<String, RepositoryError>;
}

/// Where template content lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateBackend {
    /// SES-managed templates.
    #[default]
    Ses,
    /// One JSON object per template in an S3 bucket.
    ObjectStore,
}

impl TemplateBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ses => "ses",
            Self::ObjectStore => "object_store",
        }
    }
}

impl fmt::Display for TemplateBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ses" => Ok(Self::Ses),
            "object_store" | "s3" => Ok(Self::ObjectStore),
            other => Err(format!(
                "unknown template backend '{other}' (expected 'ses' or 'object_store')"
            )),
        }
    }
}

/// Build the template repository for `backend`.
pub fn template_repository(
    backend: TemplateBackend,
    ctx: RepositoryContext,
) -> Arc<dyn TemplateRepository> {
    match backend {
        TemplateBackend::Ses => Arc::new(SesTemplateRepository::new(ctx)),
        TemplateBackend::ObjectStore => Arc::new(ObjectStoreTemplateRepository::new(ctx)),
    }
}

/// Case-insensitive substring match used by the list operations.
pub(crate) fn matches_search(name: &str, search: Option<&str>) -> bool {
    match search {
        Some(term) if !term.is_empty() => name.to_lowercase().contains(&term.to_lowercase()),
        _ => true,
    }
}

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use sesman_core::{EmailTemplate, TemplateContent, TemplateInput, TemplatePatch, render_placeholders};
use sesman_provider::{ObjectStore, OutgoingContent, OutgoingEmail, ProviderError};
use tracing::{debug, error, info, instrument, warn};

use crate::context::RepositoryContext;
use crate::error::RepositoryError;
use crate::template::{TemplateBackend, TemplateRepository, matches_search};

/// Maximum number of objects enumerated by `list`.
pub const MAX_LIST_KEYS: i32 = 1000;

const TEMPLATE_SUFFIX: &str = ".json";
const CONTENT_TYPE: &str = "application/json";

/// On-bucket layout of a template object.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredTemplate {
    #[serde(rename = "TemplateName", default, skip_serializing_if = "Option::is_none")]
    template_name: Option<String>,
    #[serde(rename = "TemplateContent", default)]
    template_content: StoredContent,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StoredContent {
    #[serde(default)]
    subject: String,
    #[serde(default)]
    html: String,
    #[serde(default)]
    text: String,
}

impl StoredTemplate {
    fn new(
        name: &str,
        content: &TemplateContent,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            template_name: Some(name.to_owned()),
            template_content: StoredContent {
                subject: content.subject.clone(),
                html: content.html.clone(),
                text: content.text.clone(),
            },
            created_at: Some(created_at),
            updated_at: Some(updated_at),
        }
    }

    fn into_template(self, id: &str) -> EmailTemplate {
        let now = Utc::now();
        let name = self
            .template_name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| id.to_owned());
        let StoredContent {
            subject,
            html,
            text,
        } = self.template_content;
        let mut template = EmailTemplate::from_content(
            name,
            TemplateContent::new(subject, html, text),
            self.created_at.unwrap_or(now),
            self.updated_at.unwrap_or(now),
        );
        template.id = id.to_owned();
        template
    }
}

/// Object key of template `name` under `prefix`.
pub fn template_key(prefix: &str, name: &str) -> String {
    format!("{prefix}{name}{TEMPLATE_SUFFIX}")
}

/// Template name of `key`, when it is a template object under `prefix`.
fn template_name<'a>(prefix: &str, key: &'a str) -> Option<&'a str> {
    key.strip_prefix(prefix)?
        .strip_suffix(TEMPLATE_SUFFIX)
        .filter(|name| !name.is_empty())
}

/// Templates stored as JSON objects in an S3 bucket.
///
/// Each template is one pretty-printed JSON object at
/// `<folder prefix><name>.json`. `createdAt` survives updates and renames.
#[derive(Debug, Clone)]
pub struct ObjectStoreTemplateRepository {
    ctx: RepositoryContext,
}

impl ObjectStoreTemplateRepository {
    pub fn new(ctx: RepositoryContext) -> Self {
        Self { ctx }
    }

    async fn read(
        store: &dyn ObjectStore,
        prefix: &str,
        name: &str,
    ) -> Result<Option<EmailTemplate>, RepositoryError> {
        let Some(body) = store
            .get_object(&template_key(prefix, name))
            .await
            .map_err(|e| RepositoryError::provider("GetObject", e))?
        else {
            debug!(template = %name, "template object not found");
            return Ok(None);
        };
        let stored: StoredTemplate =
            serde_json::from_slice(&body).map_err(|e| RepositoryError::Serialization {
                name: name.to_owned(),
                message: e.to_string(),
            })?;
        Ok(Some(stored.into_template(name)))
    }

    fn encode(stored: &StoredTemplate, name: &str) -> Result<Vec<u8>, RepositoryError> {
        serde_json::to_vec_pretty(stored).map_err(|e| RepositoryError::Serialization {
            name: name.to_owned(),
            message: e.to_string(),
        })
    }

    async fn write(
        store: &dyn ObjectStore,
        prefix: &str,
        stored: &StoredTemplate,
        name: &str,
    ) -> Result<(), RepositoryError> {
        let body = Self::encode(stored, name)?;
        store
            .put_object(&template_key(prefix, name), body, CONTENT_TYPE)
            .await
            .map_err(|e| RepositoryError::provider("PutObject", e))
    }

    /// Write a template under a name that must not be taken yet.
    ///
    /// The store checks the key and writes in one conditional request.
    async fn write_new(
        store: &dyn ObjectStore,
        prefix: &str,
        stored: &StoredTemplate,
        name: &str,
    ) -> Result<(), RepositoryError> {
        let body = Self::encode(stored, name)?;
        match store
            .put_new_object(&template_key(prefix, name), body, CONTENT_TYPE)
            .await
        {
            Ok(()) => Ok(()),
            Err(ProviderError::AlreadyExists(_)) => Err(RepositoryError::AlreadyExists {
                kind: "template",
                name: name.to_owned(),
            }),
            Err(e) => Err(RepositoryError::provider("PutObject", e)),
        }
    }

    async fn remove(store: &dyn ObjectStore, prefix: &str, name: &str) -> Result<(), RepositoryError> {
        match store.delete_object(&template_key(prefix, name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                debug!(template = %name, "template object already absent");
                Ok(())
            }
            Err(e) => Err(RepositoryError::provider("DeleteObject", e)),
        }
    }

    async fn rename(
        store: &dyn ObjectStore,
        prefix: &str,
        id: &str,
        new_name: &str,
        stored: &StoredTemplate,
    ) -> Result<(), RepositoryError> {
        Self::write_new(store, prefix, stored, new_name).await?;

        let verified = match Self::read(store, prefix, new_name).await {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(RepositoryError::template_not_found(new_name)),
            Err(e) => Err(e),
        };
        if let Err(err) = verified {
            warn!(template = %new_name, error = %err, "renamed template not readable, removing it");
            if let Err(e) = Self::remove(store, prefix, new_name).await {
                error!(template = %new_name, error = %e, "failed to remove unverified template");
            }
            return Err(err);
        }

        Self::remove(store, prefix, id).await
    }
}

#[async_trait]
impl TemplateRepository for ObjectStoreTemplateRepository {
    fn backend(&self) -> TemplateBackend {
        TemplateBackend::ObjectStore
    }

    #[instrument(skip(self))]
    async fn list(&self, search: Option<&str>) -> Result<Vec<EmailTemplate>, RepositoryError> {
        let (store, prefix) = self.ctx.object_store().await?;
        let result: Result<_, RepositoryError> = async {
            let keys = store
                .list_keys(&prefix, MAX_LIST_KEYS)
                .await
                .map_err(|e| RepositoryError::provider("ListObjectsV2", e))?;
            let fetches = keys
                .iter()
                .filter_map(|key| template_name(&prefix, key))
                .filter(|name| matches_search(name, search))
                .map(|name| Self::read(store.as_ref(), &prefix, name));
            let templates: Vec<EmailTemplate> =
                try_join_all(fetches).await?.into_iter().flatten().collect();
            Ok(templates)
        }
        .await;
        result.map_err(|e| {
            self.ctx
                .fail("Failed to list templates from S3 bucket".to_owned(), e)
        })
    }

    #[instrument(skip(self))]
    async fn get(&self, id: &str) -> Result<Option<EmailTemplate>, RepositoryError> {
        let (store, prefix) = self.ctx.object_store().await?;
        Self::read(store.as_ref(), &prefix, id).await.map_err(|e| {
            self.ctx
                .fail(format!("Failed to get template \"{id}\" from S3 bucket"), e)
        })
    }

    #[instrument(skip(self, input), fields(template = %input.name))]
    async fn create(&self, input: &TemplateInput) -> Result<EmailTemplate, RepositoryError> {
        let (store, prefix) = self.ctx.object_store().await?;
        let now = Utc::now();
        let content = input.content();
        let stored = StoredTemplate::new(&input.name, &content, now, now);
        Self::write_new(store.as_ref(), &prefix, &stored, &input.name)
            .await
            .map_err(|e| {
                self.ctx
                    .fail("Failed to create template in S3 bucket".to_owned(), e)
            })?;
        info!("template created");
        Ok(EmailTemplate::from_content(&input.name, content, now, now))
    }

    #[instrument(skip(self, patch))]
    async fn update(
        &self,
        id: &str,
        patch: &TemplatePatch,
    ) -> Result<EmailTemplate, RepositoryError> {
        let (store, prefix) = self.ctx.object_store().await?;
        let result: Result<_, RepositoryError> = async {
            let existing = Self::read(store.as_ref(), &prefix, id)
                .await?
                .ok_or_else(|| RepositoryError::template_not_found(id))?;
            let content = patch.apply(&existing.content());
            let now = Utc::now();

            let name = match patch.rename_target(id) {
                Some(new_name) => {
                    let stored = StoredTemplate::new(new_name, &content, existing.created_at, now);
                    Self::rename(store.as_ref(), &prefix, id, new_name, &stored).await?;
                    info!(from = %id, to = %new_name, "template renamed");
                    new_name
                }
                None => {
                    let stored = StoredTemplate::new(id, &content, existing.created_at, now);
                    Self::write(store.as_ref(), &prefix, &stored, id).await?;
                    info!("template updated");
                    id
                }
            };
            Ok(EmailTemplate::from_content(name, content, existing.created_at, now))
        }
        .await;
        result.map_err(|e| {
            self.ctx
                .fail(format!("Failed to update template \"{id}\" in S3 bucket"), e)
        })
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        let (store, prefix) = self.ctx.object_store().await?;
        Self::remove(store.as_ref(), &prefix, id).await.map_err(|e| {
            self.ctx
                .fail(format!("Failed to delete template \"{id}\" from S3 bucket"), e)
        })?;
        info!("template deleted");
        Ok(())
    }

    /// SES does not know templates kept in the bucket, so the content is
    /// rendered here and sent as a simple message. Failures are logged and
    /// returned without a notice; the caller reports them.
    #[instrument(skip(self, fields), fields(recipients = to.len()))]
    async fn send_test_email(
        &self,
        name: &str,
        from: &str,
        to: &[String],
        fields: &HashMap<String, String>,
    ) -> Result<String, RepositoryError> {
        let (store, prefix) = self.ctx.object_store().await?;
        let template = Self::read(store.as_ref(), &prefix, name)
            .await?
            .ok_or_else(|| RepositoryError::template_not_found(name))?;
        let rendered = TemplateContent::new(
            render_placeholders(&template.subject, fields),
            render_placeholders(&template.html, fields),
            render_placeholders(&template.text, fields),
        );

        let ses = self.ctx.email_service().await?;
        let email = OutgoingEmail {
            from: from.to_owned(),
            to: to.to_vec(),
            content: OutgoingContent::Simple(rendered),
        };
        let message_id = ses.send_email(&email).await.map_err(|e| {
            error!(error = %e, "failed to send test email");
            RepositoryError::provider("SendEmail", e)
        })?;
        info!("test email sent");
        Ok(message_id.unwrap_or_default())
    }
}

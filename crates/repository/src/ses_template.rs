use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use futures::future::try_join_all;
use sesman_core::{EmailTemplate, TemplateInput, TemplatePatch};
use sesman_provider::{EmailService, OutgoingContent, OutgoingEmail};
use tracing::{error, info, instrument, warn};

use crate::context::RepositoryContext;
use crate::error::RepositoryError;
use crate::template::{LIST_PAGE_SIZE, TemplateBackend, TemplateRepository, matches_search};

/// Templates managed by SES.
///
/// SES keeps no timestamps, so `created_at`/`updated_at` are the time the
/// template was read or written by this process.
#[derive(Debug, Clone)]
pub struct SesTemplateRepository {
    ctx: RepositoryContext,
}

impl SesTemplateRepository {
    pub fn new(ctx: RepositoryContext) -> Self {
        Self { ctx }
    }

    async fn fetch(
        ses: &dyn EmailService,
        name: &str,
    ) -> Result<Option<EmailTemplate>, RepositoryError> {
        let content = ses
            .get_template(name)
            .await
            .map_err(|e| RepositoryError::provider("GetEmailTemplate", e))?;
        let now = Utc::now();
        Ok(content.map(|content| EmailTemplate::from_content(name, content, now, now)))
    }

    async fn rename(
        ses: &dyn EmailService,
        id: &str,
        new_name: &str,
        content: &sesman_core::TemplateContent,
    ) -> Result<(), RepositoryError> {
        ses.create_template(new_name, content)
            .await
            .map_err(|e| RepositoryError::provider("CreateEmailTemplate", e))?;

        let verified = match ses.get_template(new_name).await {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(RepositoryError::template_not_found(new_name)),
            Err(e) => Err(RepositoryError::provider("GetEmailTemplate", e)),
        };
        if let Err(err) = verified {
            warn!(template = %new_name, error = %err, "renamed template not readable, removing it");
            if let Err(e) = ses.delete_template(new_name).await {
                error!(template = %new_name, error = %e, "failed to remove unverified template");
            }
            return Err(err);
        }

        ses.delete_template(id)
            .await
            .map_err(|e| RepositoryError::provider("DeleteEmailTemplate", e))
    }
}

#[async_trait]
impl TemplateRepository for SesTemplateRepository {
    fn backend(&self) -> TemplateBackend {
        TemplateBackend::Ses
    }

    #[instrument(skip(self))]
    async fn list(&self, search: Option<&str>) -> Result<Vec<EmailTemplate>, RepositoryError> {
        let ses = self.ctx.email_service().await?;
        let result: Result<_, RepositoryError> = async {
            let names = ses
                .list_template_names(LIST_PAGE_SIZE)
                .await
                .map_err(|e| RepositoryError::provider("ListEmailTemplates", e))?;
            let fetches = names
                .iter()
                .filter(|name| matches_search(name, search))
                .map(|name| Self::fetch(ses.as_ref(), name));
            let templates: Vec<EmailTemplate> =
                try_join_all(fetches).await?.into_iter().flatten().collect();
            Ok(templates)
        }
        .await;
        result.map_err(|e| {
            self.ctx
                .fail("Failed to list templates from AWS SES".to_owned(), e)
        })
    }

    #[instrument(skip(self))]
    async fn get(&self, id: &str) -> Result<Option<EmailTemplate>, RepositoryError> {
        let ses = self.ctx.email_service().await?;
        Self::fetch(ses.as_ref(), id).await.map_err(|e| {
            self.ctx
                .fail(format!("Failed to get template \"{id}\" from AWS SES"), e)
        })
    }

    #[instrument(skip(self, input), fields(template = %input.name))]
    async fn create(&self, input: &TemplateInput) -> Result<EmailTemplate, RepositoryError> {
        let ses = self.ctx.email_service().await?;
        let content = input.content();
        ses.create_template(&input.name, &content)
            .await
            .map_err(|e| {
                self.ctx.fail(
                    "Failed to create template in AWS SES".to_owned(),
                    RepositoryError::provider("CreateEmailTemplate", e),
                )
            })?;
        info!("template created");
        let now = Utc::now();
        Ok(EmailTemplate::from_content(&input.name, content, now, now))
    }

    #[instrument(skip(self, patch))]
    async fn update(
        &self,
        id: &str,
        patch: &TemplatePatch,
    ) -> Result<EmailTemplate, RepositoryError> {
        let ses = self.ctx.email_service().await?;
        let result: Result<_, RepositoryError> = async {
            let existing = Self::fetch(ses.as_ref(), id)
                .await?
                .ok_or_else(|| RepositoryError::template_not_found(id))?;
            let content = patch.apply(&existing.content());

            let name = match patch.rename_target(id) {
                Some(new_name) => {
                    Self::rename(ses.as_ref(), id, new_name, &content).await?;
                    info!(from = %id, to = %new_name, "template renamed");
                    new_name
                }
                None => {
                    ses.update_template(id, &content)
                        .await
                        .map_err(|e| RepositoryError::provider("UpdateEmailTemplate", e))?;
                    info!("template updated");
                    id
                }
            };
            Ok(EmailTemplate::from_content(
                name,
                content,
                existing.created_at,
                Utc::now(),
            ))
        }
        .await;
        result.map_err(|e| {
            self.ctx
                .fail(format!("Failed to update template \"{id}\" in AWS SES"), e)
        })
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        let ses = self.ctx.email_service().await?;
        ses.delete_template(id).await.map_err(|e| {
            self.ctx.fail(
                format!("Failed to delete template \"{id}\" from AWS SES"),
                RepositoryError::provider("DeleteEmailTemplate", e),
            )
        })?;
        info!("template deleted");
        Ok(())
    }

    /// Sends through SES with the template referenced by name. Failures are
    /// logged and returned without a notice; the caller reports them.
    #[instrument(skip(self, fields), fields(recipients = to.len()))]
    async fn send_test_email(
        &self,
        name: &str,
        from: &str,
        to: &[String],
        fields: &HashMap<String, String>,
    ) -> Result<String, RepositoryError> {
        let ses = self.ctx.email_service().await?;
        let data = serde_json::to_value(fields).map_err(|e| RepositoryError::Serialization {
            name: name.to_owned(),
            message: e.to_string(),
        })?;
        let email = OutgoingEmail {
            from: from.to_owned(),
            to: to.to_vec(),
            content: OutgoingContent::Template {
                name: name.to_owned(),
                data,
            },
        };
        let message_id = ses.send_email(&email).await.map_err(|e| {
            error!(error = %e, "failed to send test email");
            RepositoryError::provider("SendEmail", e)
        })?;
        info!("test email sent");
        Ok(message_id.unwrap_or_default())
    }
}

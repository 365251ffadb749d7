use async_trait::async_trait;
use chrono::Utc;
use futures::future::try_join_all;
use sesman_core::{ContactList, ContactListInput, ContactListPatch};
use sesman_provider::EmailService;
use tracing::{error, info, instrument, warn};

use crate::context::RepositoryContext;
use crate::error::RepositoryError;
use crate::template::matches_search;

/// CRUD over SES contact lists.
#[derive(Debug, Clone)]
pub struct ContactListRepository {
    ctx: RepositoryContext,
}

async fn fetch(ses: &dyn EmailService, name: &str) -> Result<Option<ContactList>, RepositoryError> {
    ses.get_contact_list(name)
        .await
        .map_err(|e| RepositoryError::provider("GetContactList", e))
}

async fn create(ses: &dyn EmailService, input: &ContactListInput) -> Result<(), RepositoryError> {
    ses.create_contact_list(input)
        .await
        .map_err(|e| RepositoryError::provider("CreateContactList", e))
}

async fn delete(ses: &dyn EmailService, name: &str) -> Result<(), RepositoryError> {
    ses.delete_contact_list(name)
        .await
        .map_err(|e| RepositoryError::provider("DeleteContactList", e))
}

fn materialize(input: ContactListInput) -> ContactList {
    ContactList {
        name: input.name,
        description: input.description,
        topics: input.topics,
        tags: input.tags,
        last_updated_timestamp: Some(Utc::now()),
    }
}

impl ContactListRepository {
    pub fn new(ctx: RepositoryContext) -> Self {
        Self { ctx }
    }

    /// Contact lists whose name contains `search` (case-insensitive).
    #[instrument(skip(self))]
    pub async fn list(&self, search: Option<&str>) -> Result<Vec<ContactList>, RepositoryError> {
        let ses = self.ctx.email_service().await?;
        let result: Result<_, RepositoryError> = async {
            let names = ses
                .list_contact_list_names()
                .await
                .map_err(|e| RepositoryError::provider("ListContactLists", e))?;
            let fetches = names
                .iter()
                .filter(|name| matches_search(name, search))
                .map(|name| fetch(ses.as_ref(), name));
            let lists: Vec<ContactList> =
                try_join_all(fetches).await?.into_iter().flatten().collect();
            Ok(lists)
        }
        .await;
        result.map_err(|e| {
            self.ctx
                .fail("Failed to list contact list from AWS SES".to_owned(), e)
        })
    }

    #[instrument(skip(self))]
    pub async fn get(&self, name: &str) -> Result<Option<ContactList>, RepositoryError> {
        let ses = self.ctx.email_service().await?;
        fetch(ses.as_ref(), name).await.map_err(|e| {
            self.ctx
                .fail(format!("Failed to get contact list \"{name}\" from AWS SES"), e)
        })
    }

    #[instrument(skip(self, input), fields(contact_list = %input.name))]
    pub async fn create(&self, input: &ContactListInput) -> Result<ContactList, RepositoryError> {
        let ses = self.ctx.email_service().await?;
        create(ses.as_ref(), input).await.map_err(|e| {
            self.ctx
                .fail("Failed to create contact list in AWS SES".to_owned(), e)
        })?;
        info!("contact list created");
        Ok(materialize(input.clone()))
    }

    /// Apply `patch` to contact list `name`.
    ///
    /// SES cannot rename a list or change its tags in place:
    ///
    /// * a rename creates the new list, reads it back and then deletes the
    ///   old one; a failed read back deletes the new list again and a failed
    ///   final delete leaves both lists in place;
    /// * a tag change under the same name deletes and re-creates the list,
    ///   restoring the previous list if the re-create fails.
    ///
    /// Anything else is an in-place description and topic update.
    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        name: &str,
        patch: &ContactListPatch,
    ) -> Result<ContactList, RepositoryError> {
        let ses = self.ctx.email_service().await?;
        let result: Result<_, RepositoryError> = async {
            let existing = fetch(ses.as_ref(), name)
                .await?
                .ok_or_else(|| RepositoryError::contact_list_not_found(name))?;
            let merged = patch.apply(&existing);

            if let Some(new_name) = patch.rename_target(name) {
                Self::rename(ses.as_ref(), name, &merged).await?;
                info!(from = %name, to = %new_name, "contact list renamed");
            } else if patch.changes_tags(&existing.tags) {
                Self::recreate(ses.as_ref(), &existing, &merged).await?;
                info!("contact list re-created with new tags");
            } else {
                ses.update_contact_list(name, merged.description.as_deref(), &merged.topics)
                    .await
                    .map_err(|e| RepositoryError::provider("UpdateContactList", e))?;
                info!("contact list updated");
            }
            Ok(materialize(merged))
        }
        .await;
        result.map_err(|e| {
            self.ctx
                .fail(format!("Failed to update contact list \"{name}\" in AWS SES"), e)
        })
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, name: &str) -> Result<(), RepositoryError> {
        let ses = self.ctx.email_service().await?;
        delete(ses.as_ref(), name).await.map_err(|e| {
            self.ctx
                .fail(format!("Failed to delete contact list \"{name}\" from AWS SES"), e)
        })?;
        info!("contact list deleted");
        Ok(())
    }

    async fn rename(
        ses: &dyn EmailService,
        old_name: &str,
        merged: &ContactListInput,
    ) -> Result<(), RepositoryError> {
        create(ses, merged).await?;

        let verified = match fetch(ses, &merged.name).await {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(RepositoryError::contact_list_not_found(&merged.name)),
            Err(e) => Err(e),
        };
        if let Err(err) = verified {
            warn!(contact_list = %merged.name, error = %err, "renamed contact list not readable, removing it");
            if let Err(e) = delete(ses, &merged.name).await {
                error!(contact_list = %merged.name, error = %e, "failed to remove unverified contact list");
            }
            return Err(err);
        }

        delete(ses, old_name).await
    }

    async fn recreate(
        ses: &dyn EmailService,
        existing: &ContactList,
        merged: &ContactListInput,
    ) -> Result<(), RepositoryError> {
        let snapshot = ContactListInput::from(existing);
        delete(ses, &existing.name).await?;

        if let Err(err) = create(ses, merged).await {
            warn!(contact_list = %existing.name, error = %err, "re-create failed, restoring previous contact list");
            if let Err(e) = create(ses, &snapshot).await {
                error!(contact_list = %existing.name, error = %e, "failed to restore contact list");
            }
            return Err(err);
        }
        Ok(())
    }
}

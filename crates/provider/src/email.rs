use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sesman_core::{ContactList, ContactListInput, TemplateContent, Topic};

use crate::error::ProviderError;

/// Body of an outgoing email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutgoingContent {
    /// Fully rendered subject and bodies.
    Simple(TemplateContent),
    /// A provider-side template rendered with `data` at send time.
    Template {
        name: String,
        data: serde_json::Value,
    },
}

/// A send request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub content: OutgoingContent,
}

/// Email-delivery provider operations used by the console.
///
/// Reads of absent entities return `Ok(None)`; mutations of absent entities
/// return [`ProviderError::NotFound`].
#[async_trait]
pub trait EmailService: Send + Sync {
    /// Cheap authenticated call used to verify credentials at login.
    async fn verify_access(&self) -> Result<(), ProviderError>;

    /// Names of all templates, following pagination with `page_size` per page.
    async fn list_template_names(&self, page_size: i32) -> Result<Vec<String>, ProviderError>;

    async fn get_template(&self, name: &str) -> Result<Option<TemplateContent>, ProviderError>;

    async fn create_template(
        &self,
        name: &str,
        content: &TemplateContent,
    ) -> Result<(), ProviderError>;

    async fn update_template(
        &self,
        name: &str,
        content: &TemplateContent,
    ) -> Result<(), ProviderError>;

    async fn delete_template(&self, name: &str) -> Result<(), ProviderError>;

    /// Send an email. Returns the provider's message identifier, if any.
    async fn send_email(&self, email: &OutgoingEmail) -> Result<Option<String>, ProviderError>;

    async fn list_contact_list_names(&self) -> Result<Vec<String>, ProviderError>;

    async fn get_contact_list(&self, name: &str) -> Result<Option<ContactList>, ProviderError>;

    async fn create_contact_list(&self, list: &ContactListInput) -> Result<(), ProviderError>;

    /// Replace the description and topics of an existing list. Tags cannot
    /// be changed in place.
    async fn update_contact_list(
        &self,
        name: &str,
        description: Option<&str>,
        topics: &[Topic],
    ) -> Result<(), ProviderError>;

    async fn delete_contact_list(&self, name: &str) -> Result<(), ProviderError>;
}

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use sesman_core::{ContactList, ContactListInput, TemplateContent, Topic};
use sesman_provider::{EmailService, OutgoingEmail, ProviderError};

use crate::faults::{Faults, ops};

#[derive(Debug, Default)]
struct State {
    templates: BTreeMap<String, TemplateContent>,
    contact_lists: BTreeMap<String, ContactList>,
    sent: Vec<OutgoingEmail>,
}

/// In-memory [`EmailService`].
///
/// Templates and contact lists are listed in name order. Creating an
/// existing name fails with [`ProviderError::AlreadyExists`]; updating or
/// deleting a missing one fails with [`ProviderError::NotFound`].
#[derive(Debug, Default)]
pub struct MemoryEmailService {
    state: Mutex<State>,
    faults: Faults,
}

impl MemoryEmailService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fault injection and call counters for this service.
    pub fn faults(&self) -> &Faults {
        &self.faults
    }

    /// Seed a template without going through the trait.
    pub fn insert_template(&self, name: impl Into<String>, content: TemplateContent) {
        self.state.lock().templates.insert(name.into(), content);
    }

    /// Seed a contact list without going through the trait.
    pub fn insert_contact_list(&self, list: ContactList) {
        self.state
            .lock()
            .contact_lists
            .insert(list.name.clone(), list);
    }

    pub fn template(&self, name: &str) -> Option<TemplateContent> {
        self.state.lock().templates.get(name).cloned()
    }

    pub fn contact_list(&self, name: &str) -> Option<ContactList> {
        self.state.lock().contact_lists.get(name).cloned()
    }

    pub fn template_names(&self) -> Vec<String> {
        self.state.lock().templates.keys().cloned().collect()
    }

    pub fn contact_list_names(&self) -> Vec<String> {
        self.state.lock().contact_lists.keys().cloned().collect()
    }

    /// Every email accepted by [`EmailService::send_email`], oldest first.
    pub fn sent_emails(&self) -> Vec<OutgoingEmail> {
        self.state.lock().sent.clone()
    }
}

#[async_trait]
impl EmailService for MemoryEmailService {
    async fn verify_access(&self) -> Result<(), ProviderError> {
        self.faults.check(ops::VERIFY_ACCESS)
    }

    async fn list_template_names(&self, page_size: i32) -> Result<Vec<String>, ProviderError> {
        self.faults.check(ops::LIST_TEMPLATE_NAMES)?;
        if page_size < 1 {
            return Err(ProviderError::ExecutionFailed(format!(
                "invalid page size {page_size}"
            )));
        }
        Ok(self.template_names())
    }

    async fn get_template(&self, name: &str) -> Result<Option<TemplateContent>, ProviderError> {
        self.faults.check(ops::GET_TEMPLATE)?;
        Ok(self.template(name))
    }

    async fn create_template(
        &self,
        name: &str,
        content: &TemplateContent,
    ) -> Result<(), ProviderError> {
        self.faults.check(ops::CREATE_TEMPLATE)?;
        let mut state = self.state.lock();
        if state.templates.contains_key(name) {
            return Err(ProviderError::AlreadyExists(format!("template {name}")));
        }
        state.templates.insert(name.to_owned(), content.clone());
        Ok(())
    }

    async fn update_template(
        &self,
        name: &str,
        content: &TemplateContent,
    ) -> Result<(), ProviderError> {
        self.faults.check(ops::UPDATE_TEMPLATE)?;
        let mut state = self.state.lock();
        let existing = state
            .templates
            .get_mut(name)
            .ok_or_else(|| ProviderError::NotFound(format!("template {name}")))?;
        *existing = content.clone();
        Ok(())
    }

    async fn delete_template(&self, name: &str) -> Result<(), ProviderError> {
        self.faults.check(ops::DELETE_TEMPLATE)?;
        self.state
            .lock()
            .templates
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| ProviderError::NotFound(format!("template {name}")))
    }

    async fn send_email(&self, email: &OutgoingEmail) -> Result<Option<String>, ProviderError> {
        self.faults.check(ops::SEND_EMAIL)?;
        let mut state = self.state.lock();
        if let sesman_provider::OutgoingContent::Template { name, .. } = &email.content
            && !state.templates.contains_key(name)
        {
            return Err(ProviderError::NotFound(format!("template {name}")));
        }
        state.sent.push(email.clone());
        Ok(Some(format!("memory-{}", state.sent.len())))
    }

    async fn list_contact_list_names(&self) -> Result<Vec<String>, ProviderError> {
        self.faults.check(ops::LIST_CONTACT_LIST_NAMES)?;
        Ok(self.contact_list_names())
    }

    async fn get_contact_list(&self, name: &str) -> Result<Option<ContactList>, ProviderError> {
        self.faults.check(ops::GET_CONTACT_LIST)?;
        Ok(self.contact_list(name))
    }

    async fn create_contact_list(&self, list: &ContactListInput) -> Result<(), ProviderError> {
        self.faults.check(ops::CREATE_CONTACT_LIST)?;
        let mut state = self.state.lock();
        if state.contact_lists.contains_key(&list.name) {
            return Err(ProviderError::AlreadyExists(format!(
                "contact list {}",
                list.name
            )));
        }
        state.contact_lists.insert(
            list.name.clone(),
            ContactList {
                name: list.name.clone(),
                description: list.description.clone(),
                topics: list.topics.clone(),
                tags: list.tags.clone(),
                last_updated_timestamp: Some(Utc::now()),
            },
        );
        Ok(())
    }

    async fn update_contact_list(
        &self,
        name: &str,
        description: Option<&str>,
        topics: &[Topic],
    ) -> Result<(), ProviderError> {
        self.faults.check(ops::UPDATE_CONTACT_LIST)?;
        let mut state = self.state.lock();
        let existing = state
            .contact_lists
            .get_mut(name)
            .ok_or_else(|| ProviderError::NotFound(format!("contact list {name}")))?;
        existing.description = description.map(str::to_owned);
        existing.topics = topics.to_vec();
        existing.last_updated_timestamp = Some(Utc::now());
        Ok(())
    }

    async fn delete_contact_list(&self, name: &str) -> Result<(), ProviderError> {
        self.faults.check(ops::DELETE_CONTACT_LIST)?;
        self.state
            .lock()
            .contact_lists
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| ProviderError::NotFound(format!("contact list {name}")))
    }
}

#[cfg(test)]
mod tests {
    use sesman_core::{SubscriptionStatus, Tag};
    use sesman_provider::OutgoingContent;

    use super::*;

    fn content() -> TemplateContent {
        TemplateContent::new("Hi {{name}}", "<p>Hi</p>", "Hi")
    }

    #[tokio::test]
    async fn template_lifecycle() {
        let ses = MemoryEmailService::new();
        ses.create_template("welcome", &content()).await.unwrap();
        ses.create_template("alpha", &content()).await.unwrap();
        assert_eq!(
            ses.list_template_names(10).await.unwrap(),
            vec!["alpha".to_owned(), "welcome".to_owned()]
        );

        let err = ses.create_template("welcome", &content()).await.unwrap_err();
        assert!(matches!(err, ProviderError::AlreadyExists(_)));

        let updated = TemplateContent::new("New", "<p>New</p>", "New");
        ses.update_template("welcome", &updated).await.unwrap();
        assert_eq!(ses.get_template("welcome").await.unwrap(), Some(updated));

        ses.delete_template("welcome").await.unwrap();
        assert_eq!(ses.get_template("welcome").await.unwrap(), None);
        assert!(ses.delete_template("welcome").await.unwrap_err().is_not_found());
        assert!(
            ses.update_template("welcome", &content())
                .await
                .unwrap_err()
                .is_not_found()
        );
    }

    #[tokio::test]
    async fn contact_list_update_keeps_tags() {
        let ses = MemoryEmailService::new();
        let input = ContactListInput {
            name: "news".into(),
            description: Some("News".into()),
            topics: vec![],
            tags: vec![Tag::new("team", "growth")],
        };
        ses.create_contact_list(&input).await.unwrap();

        let topic = Topic {
            topic_name: "weekly".into(),
            display_name: "Weekly".into(),
            description: None,
            default_subscription_status: SubscriptionStatus::OptIn,
        };
        ses.update_contact_list("news", None, std::slice::from_ref(&topic))
            .await
            .unwrap();

        let list = ses.get_contact_list("news").await.unwrap().unwrap();
        assert_eq!(list.description, None);
        assert_eq!(list.topics, vec![topic]);
        assert_eq!(list.tags, vec![Tag::new("team", "growth")]);
        assert!(list.last_updated_timestamp.is_some());
    }

    #[tokio::test]
    async fn send_records_email_and_checks_template() {
        let ses = MemoryEmailService::new();
        let email = OutgoingEmail {
            from: "a@example.com".into(),
            to: vec!["b@example.com".into()],
            content: OutgoingContent::Template {
                name: "missing".into(),
                data: serde_json::json!({}),
            },
        };
        assert!(ses.send_email(&email).await.unwrap_err().is_not_found());

        ses.insert_template("missing", content());
        let id = ses.send_email(&email).await.unwrap();
        assert_eq!(id.as_deref(), Some("memory-1"));
        assert_eq!(ses.sent_emails(), vec![email]);
    }

    #[tokio::test]
    async fn injected_fault_is_returned() {
        let ses = MemoryEmailService::new();
        ses.faults().fail_once(ops::VERIFY_ACCESS, ProviderError::Timeout);
        assert_eq!(ses.verify_access().await, Err(ProviderError::Timeout));
        assert_eq!(ses.verify_access().await, Ok(()));
        assert_eq!(ses.faults().calls(ops::VERIFY_ACCESS), 2);
    }
}

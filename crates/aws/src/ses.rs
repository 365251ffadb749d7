use async_trait::async_trait;
use aws_sdk_sesv2::operation::get_contact_list::GetContactListError;
use aws_sdk_sesv2::operation::get_email_template::GetEmailTemplateError;
use aws_sdk_sesv2::types as ses;
use sesman_core::{
    ContactList, ContactListInput, SubscriptionStatus, Tag, TemplateContent, Topic,
};
use sesman_provider::{EmailService, OutgoingContent, OutgoingEmail, ProviderError};
use tracing::{debug, info, instrument};

use crate::auth::build_sdk_config;
use crate::config::AwsBaseConfig;
use crate::error::sdk_failure;

const CHARSET: &str = "UTF-8";

/// AWS `SESv2` client implementing [`EmailService`].
pub struct SesClient {
    config: AwsBaseConfig,
    client: aws_sdk_sesv2::Client,
}

impl std::fmt::Debug for SesClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SesClient")
            .field("config", &self.config)
            .field("client", &"<SesV2Client>")
            .finish()
    }
}

impl SesClient {
    /// Create a new `SesClient` by building an AWS SDK client.
    pub async fn new(config: AwsBaseConfig) -> Self {
        let sdk_config = build_sdk_config(&config).await;
        let client = aws_sdk_sesv2::Client::new(&sdk_config);
        Self { config, client }
    }

    /// Create a `SesClient` with a pre-built client.
    pub fn with_client(config: AwsBaseConfig, client: aws_sdk_sesv2::Client) -> Self {
        Self { config, client }
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AwsBaseConfig {
        &self.config
    }
}

fn utf8_content(data: &str) -> Result<ses::Content, ProviderError> {
    ses::Content::builder()
        .data(data)
        .charset(CHARSET)
        .build()
        .map_err(|e| ProviderError::Serialization(e.to_string()))
}

fn template_content(content: &TemplateContent) -> ses::EmailTemplateContent {
    ses::EmailTemplateContent::builder()
        .subject(&content.subject)
        .html(&content.html)
        .text(&content.text)
        .build()
}

fn email_content(content: &OutgoingContent) -> Result<ses::EmailContent, ProviderError> {
    match content {
        OutgoingContent::Template { name, data } => {
            let data =
                serde_json::to_string(data).map_err(|e| ProviderError::Serialization(e.to_string()))?;
            let template = ses::Template::builder()
                .template_name(name)
                .template_data(data)
                .build();
            Ok(ses::EmailContent::builder().template(template).build())
        }
        OutgoingContent::Simple(parts) => {
            let mut body = ses::Body::builder();
            if !parts.text.is_empty() {
                body = body.text(utf8_content(&parts.text)?);
            }
            if !parts.html.is_empty() {
                body = body.html(utf8_content(&parts.html)?);
            }
            let message = ses::Message::builder()
                .subject(utf8_content(&parts.subject)?)
                .body(body.build())
                .build();
            Ok(ses::EmailContent::builder().simple(message).build())
        }
    }
}

fn to_ses_status(status: SubscriptionStatus) -> ses::SubscriptionStatus {
    match status {
        SubscriptionStatus::OptIn => ses::SubscriptionStatus::OptIn,
        SubscriptionStatus::OptOut => ses::SubscriptionStatus::OptOut,
    }
}

fn from_ses_status(status: &ses::SubscriptionStatus) -> SubscriptionStatus {
    match status {
        ses::SubscriptionStatus::OptIn => SubscriptionStatus::OptIn,
        _ => SubscriptionStatus::OptOut,
    }
}

fn to_ses_topics(topics: &[Topic]) -> Result<Vec<ses::Topic>, ProviderError> {
    topics
        .iter()
        .map(|topic| {
            ses::Topic::builder()
                .topic_name(&topic.topic_name)
                .display_name(&topic.display_name)
                .set_description(topic.description.clone())
                .default_subscription_status(to_ses_status(topic.default_subscription_status))
                .build()
                .map_err(|e| ProviderError::Serialization(e.to_string()))
        })
        .collect()
}

fn to_ses_tags(tags: &[Tag]) -> Result<Vec<ses::Tag>, ProviderError> {
    tags.iter()
        .map(|tag| {
            ses::Tag::builder()
                .key(&tag.key)
                .value(&tag.value)
                .build()
                .map_err(|e| ProviderError::Serialization(e.to_string()))
        })
        .collect()
}

fn from_ses_topic(topic: &ses::Topic) -> Topic {
    Topic {
        topic_name: topic.topic_name().to_owned(),
        display_name: topic.display_name().to_owned(),
        description: topic.description().map(str::to_owned),
        default_subscription_status: from_ses_status(topic.default_subscription_status()),
    }
}

fn to_chrono(ts: &aws_sdk_sesv2::primitives::DateTime) -> Option<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::from_timestamp(ts.secs(), ts.subsec_nanos())
}

#[async_trait]
impl EmailService for SesClient {
    #[instrument(skip(self), fields(provider = "aws-ses"))]
    async fn verify_access(&self) -> Result<(), ProviderError> {
        debug!("verifying SES credentials");
        self.client
            .list_email_templates()
            .page_size(1)
            .send()
            .await
            .map_err(|e| sdk_failure("ListEmailTemplates", &e))?;
        info!("SES credentials verified");
        Ok(())
    }

    #[instrument(skip(self), fields(provider = "aws-ses"))]
    async fn list_template_names(&self, page_size: i32) -> Result<Vec<String>, ProviderError> {
        let mut names = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let output = self
                .client
                .list_email_templates()
                .page_size(page_size)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| sdk_failure("ListEmailTemplates", &e))?;

            names.extend(
                output
                    .templates_metadata()
                    .iter()
                    .filter_map(|meta| meta.template_name().map(str::to_owned)),
            );

            match output.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_owned()),
                _ => break,
            }
        }
        debug!(count = names.len(), "listed SES templates");
        Ok(names)
    }

    #[instrument(skip(self), fields(provider = "aws-ses"))]
    async fn get_template(&self, name: &str) -> Result<Option<TemplateContent>, ProviderError> {
        let result = self
            .client
            .get_email_template()
            .template_name(name)
            .send()
            .await;

        match result {
            Ok(output) => Ok(output.template_content().map(|content| {
                TemplateContent::new(
                    content.subject().unwrap_or_default(),
                    content.html().unwrap_or_default(),
                    content.text().unwrap_or_default(),
                )
            })),
            Err(e)
                if e
                    .as_service_error()
                    .is_some_and(GetEmailTemplateError::is_not_found_exception) =>
            {
                debug!(template = %name, "SES template not found");
                Ok(None)
            }
            Err(e) => Err(sdk_failure("GetEmailTemplate", &e)),
        }
    }

    #[instrument(skip(self, content), fields(provider = "aws-ses"))]
    async fn create_template(
        &self,
        name: &str,
        content: &TemplateContent,
    ) -> Result<(), ProviderError> {
        self.client
            .create_email_template()
            .template_name(name)
            .template_content(template_content(content))
            .send()
            .await
            .map_err(|e| sdk_failure("CreateEmailTemplate", &e))?;
        info!(template = %name, "SES template created");
        Ok(())
    }

    #[instrument(skip(self, content), fields(provider = "aws-ses"))]
    async fn update_template(
        &self,
        name: &str,
        content: &TemplateContent,
    ) -> Result<(), ProviderError> {
        self.client
            .update_email_template()
            .template_name(name)
            .template_content(template_content(content))
            .send()
            .await
            .map_err(|e| sdk_failure("UpdateEmailTemplate", &e))?;
        info!(template = %name, "SES template updated");
        Ok(())
    }

    #[instrument(skip(self), fields(provider = "aws-ses"))]
    async fn delete_template(&self, name: &str) -> Result<(), ProviderError> {
        self.client
            .delete_email_template()
            .template_name(name)
            .send()
            .await
            .map_err(|e| sdk_failure("DeleteEmailTemplate", &e))?;
        info!(template = %name, "SES template deleted");
        Ok(())
    }

    #[instrument(skip(self, email), fields(provider = "aws-ses", from = %email.from))]
    async fn send_email(&self, email: &OutgoingEmail) -> Result<Option<String>, ProviderError> {
        debug!(recipients = email.to.len(), "sending email via SES");

        let destination = ses::Destination::builder()
            .set_to_addresses(Some(email.to.clone()))
            .build();

        let output = self
            .client
            .send_email()
            .from_email_address(&email.from)
            .destination(destination)
            .content(email_content(&email.content)?)
            .send()
            .await
            .map_err(|e| sdk_failure("SendEmail", &e))?;

        let message_id = output.message_id().map(str::to_owned);
        info!(message_id = ?message_id, "SES email sent");
        Ok(message_id)
    }

    #[instrument(skip(self), fields(provider = "aws-ses"))]
    async fn list_contact_list_names(&self) -> Result<Vec<String>, ProviderError> {
        let mut names = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let output = self
                .client
                .list_contact_lists()
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| sdk_failure("ListContactLists", &e))?;

            names.extend(
                output
                    .contact_lists()
                    .iter()
                    .filter_map(|list| list.contact_list_name().map(str::to_owned)),
            );

            match output.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_owned()),
                _ => break,
            }
        }
        Ok(names)
    }

    #[instrument(skip(self), fields(provider = "aws-ses"))]
    async fn get_contact_list(&self, name: &str) -> Result<Option<ContactList>, ProviderError> {
        let result = self
            .client
            .get_contact_list()
            .contact_list_name(name)
            .send()
            .await;

        match result {
            Ok(output) => Ok(Some(ContactList {
                name: output.contact_list_name().unwrap_or(name).to_owned(),
                description: output.description().map(str::to_owned),
                topics: output.topics().iter().map(from_ses_topic).collect(),
                tags: output
                    .tags()
                    .iter()
                    .map(|tag| Tag::new(tag.key(), tag.value()))
                    .collect(),
                last_updated_timestamp: output.last_updated_timestamp().and_then(to_chrono),
            })),
            Err(e)
                if e
                    .as_service_error()
                    .is_some_and(GetContactListError::is_not_found_exception) =>
            {
                debug!(contact_list = %name, "SES contact list not found");
                Ok(None)
            }
            Err(e) => Err(sdk_failure("GetContactList", &e)),
        }
    }

    #[instrument(skip(self, list), fields(provider = "aws-ses", contact_list = %list.name))]
    async fn create_contact_list(&self, list: &ContactListInput) -> Result<(), ProviderError> {
        let tags = to_ses_tags(&list.tags)?;
        self.client
            .create_contact_list()
            .contact_list_name(&list.name)
            .set_description(list.description.clone())
            .set_topics(Some(to_ses_topics(&list.topics)?))
            .set_tags((!tags.is_empty()).then_some(tags))
            .send()
            .await
            .map_err(|e| sdk_failure("CreateContactList", &e))?;
        info!("SES contact list created");
        Ok(())
    }

    #[instrument(skip(self, description, topics), fields(provider = "aws-ses"))]
    async fn update_contact_list(
        &self,
        name: &str,
        description: Option<&str>,
        topics: &[Topic],
    ) -> Result<(), ProviderError> {
        self.client
            .update_contact_list()
            .contact_list_name(name)
            .set_description(description.map(str::to_owned))
            .set_topics(Some(to_ses_topics(topics)?))
            .send()
            .await
            .map_err(|e| sdk_failure("UpdateContactList", &e))?;
        info!(contact_list = %name, "SES contact list updated");
        Ok(())
    }

    #[instrument(skip(self), fields(provider = "aws-ses"))]
    async fn delete_contact_list(&self, name: &str) -> Result<(), ProviderError> {
        self.client
            .delete_contact_list()
            .contact_list_name(name)
            .send()
            .await
            .map_err(|e| sdk_failure("DeleteContactList", &e))?;
        info!(contact_list = %name, "SES contact list deleted");
        Ok(())
    }
}

use std::collections::HashMap;

use sesman_core::validation::validate_test_email;
use sesman_core::{Notice, Notifier};
use sesman_repository::TemplateRepository;
use tracing::instrument;

const REJECTED: &str = "Email rejected: Your account may be in sandbox mode. Verify your sending limits and that recipient emails are verified.";

/// Send-test-email dialog for one template.
#[derive(Debug, Clone, Default)]
pub struct TestEmailForm {
    template: String,
    pub from: String,
    /// Comma-separated recipients.
    pub to: String,
    fields: HashMap<String, String>,
    is_sending: bool,
}

impl TestEmailForm {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            ..Self::default()
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn fields(&self) -> &HashMap<String, String> {
        &self.fields
    }

    pub fn is_sending(&self) -> bool {
        self.is_sending
    }

    /// Validate the addresses and send. Returns the message id on success.
    #[instrument(skip_all, fields(template = %self.template))]
    pub async fn send(
        &mut self,
        repo: &dyn TemplateRepository,
        notifier: &dyn Notifier,
    ) -> Option<String> {
        let recipients = match validate_test_email(&self.from, &self.to) {
            Ok(recipients) => recipients,
            Err(message) => {
                notifier.notify(Notice::error(message));
                return None;
            }
        };

        self.is_sending = true;
        let result = repo
            .send_test_email(&self.template, self.from.trim(), &recipients, &self.fields)
            .await;
        self.is_sending = false;

        match result {
            Ok(message_id) => {
                notifier.notify(Notice::success(format!(
                    "Email sent successfully! Message ID: {message_id}"
                )));
                Some(message_id)
            }
            Err(e) if e.is_message_rejected() => {
                notifier.notify(Notice::error(REJECTED));
                None
            }
            Err(e) => {
                notifier.notify(Notice::error(format!("Failed to send email: {e}")));
                None
            }
        }
    }
}

//! Field validation shared by the forms and the CLI.
//!
//! Every validator returns all failing fields at once, with the first
//! failing rule's message for each field.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::contact_list::{ContactListInput, SubscriptionStatus, Tag, Topic};
use crate::template::TemplateInput;

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("name regex is valid"));

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid"));

const MAX_LIST_NAME: usize = 128;
const MAX_LIST_DESCRIPTION: usize = 256;
const MAX_TOPIC_NAME: usize = 64;
const MAX_DISPLAY_NAME: usize = 256;
const MAX_TOPIC_DESCRIPTION: usize = 1024;
const MAX_TAG_KEY: usize = 128;
const MAX_TAG_VALUE: usize = 256;

/// Field names used as keys in [`FieldErrors`].
pub mod field {
    pub const NAME: &str = "name";
    pub const SUBJECT: &str = "subject";
    pub const HTML: &str = "html";
    pub const TEXT: &str = "text";
    pub const DESCRIPTION: &str = "description";
    pub const TOPIC_NAME: &str = "topic_name";
    pub const DISPLAY_NAME: &str = "display_name";
    pub const DEFAULT_SUBSCRIPTION_STATUS: &str = "default_subscription_status";
    pub const KEY: &str = "key";
    pub const VALUE: &str = "value";
}

/// Per-field validation messages, in the order the fields were checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors {
    entries: Vec<(String, String)>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `field`. The first message recorded wins.
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        let field = field.into();
        if self.get(&field).is_none() {
            self.entries.push((field, message.into()));
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, message)| message.as_str())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Clear the message for `field`, returning it.
    pub fn remove(&mut self, field: &str) -> Option<String> {
        let index = self.entries.iter().position(|(name, _)| name == field)?;
        Some(self.entries.remove(index).1)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// The first failing field and its message.
    pub fn first(&self) -> Option<(&str, &str)> {
        self.entries
            .first()
            .map(|(field, message)| (field.as_str(), message.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(field, message)| (field.as_str(), message.as_str()))
    }

    /// Merge `other` under `prefix` (e.g. `topics.0`).
    pub fn extend_prefixed(&mut self, prefix: &str, other: FieldErrors) {
        for (field, message) in other.entries {
            self.insert(format!("{prefix}.{field}"), message);
        }
    }

    fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

/// Validate an identifier: required, at most `max` characters, `[a-zA-Z0-9_-]+`.
fn check_identifier(
    errors: &mut FieldErrors,
    field: &str,
    value: &str,
    label: &str,
    max: Option<usize>,
) {
    if value.is_empty() {
        errors.insert(field, format!("{label} is required."));
    } else if let Some(max) = max.filter(|max| char_len(value) > *max) {
        errors.insert(field, format!("{label} must be at most {max} characters."));
    } else if !NAME_RE.is_match(value) {
        errors.insert(
            field,
            format!(
                "{label} must contain only alphanumeric characters, underscores (_) or hyphens (-)."
            ),
        );
    }
}

fn check_max(errors: &mut FieldErrors, field: &str, value: &str, label: &str, max: usize) {
    if char_len(value) > max {
        errors.insert(field, format!("{label} must be at most {max} characters."));
    }
}

fn check_required(errors: &mut FieldErrors, field: &str, value: &str, message: &str) {
    if value.is_empty() {
        errors.insert(field, message);
    }
}

/// Validate the fields of a template form.
pub fn validate_template(input: &TemplateInput) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    check_identifier(&mut errors, field::NAME, &input.name, "Template name", None);
    check_required(&mut errors, field::SUBJECT, &input.subject, "Subject is required.");
    check_required(&mut errors, field::HTML, &input.html, "HTML Content is required.");
    check_required(&mut errors, field::TEXT, &input.text, "Text Content is required.");
    errors.into_result()
}

/// Validate a single topic.
pub fn validate_topic(topic: &Topic) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    check_identifier(
        &mut errors,
        field::TOPIC_NAME,
        &topic.topic_name,
        "Topic name",
        Some(MAX_TOPIC_NAME),
    );
    if topic.display_name.is_empty() {
        errors.insert(field::DISPLAY_NAME, "Display name is required.");
    } else {
        check_max(
            &mut errors,
            field::DISPLAY_NAME,
            &topic.display_name,
            "Display name",
            MAX_DISPLAY_NAME,
        );
    }
    if let Some(description) = &topic.description {
        check_max(
            &mut errors,
            field::DESCRIPTION,
            description,
            "Description",
            MAX_TOPIC_DESCRIPTION,
        );
    }
    errors.into_result()
}

/// Parse a subscription status entered as text.
pub fn parse_subscription_status(value: &str) -> Result<SubscriptionStatus, FieldErrors> {
    SubscriptionStatus::parse(value).ok_or_else(|| {
        let mut errors = FieldErrors::new();
        errors.insert(
            field::DEFAULT_SUBSCRIPTION_STATUS,
            "DefaultSubscriptionStatus must be either 'OPT_IN' or 'OPT_OUT'.",
        );
        errors
    })
}

/// Validate a single tag.
pub fn validate_tag(tag: &Tag) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if tag.key.is_empty() {
        errors.insert(field::KEY, "Tag key is required.");
    } else {
        check_max(&mut errors, field::KEY, &tag.key, "Tag key", MAX_TAG_KEY);
    }
    check_max(&mut errors, field::VALUE, &tag.value, "Tag value", MAX_TAG_VALUE);
    errors.into_result()
}

/// Validate a whole contact list, including nested topics and tags.
///
/// Nested errors are keyed `topics.<index>.<field>` and `tags.<index>.<field>`.
pub fn validate_contact_list(input: &ContactListInput) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    check_identifier(
        &mut errors,
        field::NAME,
        &input.name,
        "Contact list name",
        Some(MAX_LIST_NAME),
    );
    if let Some(description) = &input.description {
        check_max(
            &mut errors,
            field::DESCRIPTION,
            description,
            "Description",
            MAX_LIST_DESCRIPTION,
        );
    }
    for (index, topic) in input.topics.iter().enumerate() {
        if let Err(nested) = validate_topic(topic) {
            errors.extend_prefixed(&format!("topics.{index}"), nested);
        }
        if input.topics[..index]
            .iter()
            .any(|t| t.topic_name == topic.topic_name)
        {
            errors.insert(
                format!("topics.{index}.{}", field::TOPIC_NAME),
                format!("Topic with name \"{}\" already exists.", topic.topic_name),
            );
        }
    }
    for (index, tag) in input.tags.iter().enumerate() {
        if let Err(nested) = validate_tag(tag) {
            errors.extend_prefixed(&format!("tags.{index}"), nested);
        }
        // Keys compare case-sensitively, as SES does.
        if input.tags[..index].iter().any(|t| t.key == tag.key) {
            errors.insert(
                format!("tags.{index}.{}", field::KEY),
                format!("Tag with key \"{}\" already exists.", tag.key),
            );
        }
    }
    errors.into_result()
}

/// Validate the sender and comma-separated recipients of a test email.
///
/// Returns the trimmed recipient list, or the single message to show.
pub fn validate_test_email(from: &str, to: &str) -> Result<Vec<String>, String> {
    let from = from.trim();
    if from.is_empty() {
        return Err("Please enter a sender email address".to_owned());
    }
    if to.trim().is_empty() {
        return Err("Please enter at least one recipient email address".to_owned());
    }
    if !EMAIL_RE.is_match(from) {
        return Err("Please enter a valid sender email address".to_owned());
    }
    let recipients: Vec<String> = to.split(',').map(|addr| addr.trim().to_owned()).collect();
    let invalid: Vec<&str> = recipients
        .iter()
        .filter(|addr| !EMAIL_RE.is_match(addr))
        .map(String::as_str)
        .collect();
    if !invalid.is_empty() {
        return Err(format!("Invalid email format: {}", invalid.join(", ")));
    }
    Ok(recipients)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(name: &str) -> TemplateInput {
        TemplateInput {
            name: name.into(),
            subject: "Hi".into(),
            html: "<p>Hi</p>".into(),
            text: "Hi".into(),
        }
    }

    fn topic(name: &str) -> Topic {
        Topic {
            topic_name: name.into(),
            display_name: "Display".into(),
            description: None,
            default_subscription_status: SubscriptionStatus::OptIn,
        }
    }

    #[test]
    fn template_accepts_valid_input() {
        assert!(validate_template(&template("welcome_v2-final")).is_ok());
    }

    #[test]
    fn template_reports_every_empty_field() {
        let errors = validate_template(&TemplateInput::default()).unwrap_err();
        assert_eq!(errors.get(field::NAME), Some("Template name is required."));
        assert_eq!(errors.get(field::SUBJECT), Some("Subject is required."));
        assert_eq!(errors.get(field::HTML), Some("HTML Content is required."));
        assert_eq!(errors.get(field::TEXT), Some("Text Content is required."));
        assert_eq!(errors.first().map(|(f, _)| f), Some(field::NAME));
    }

    #[test]
    fn template_name_rejects_spaces_and_dots() {
        for bad in ["my template", "a.b", "naïve"] {
            let errors = validate_template(&template(bad)).unwrap_err();
            assert!(errors.get(field::NAME).unwrap().contains("alphanumeric"));
        }
    }

    #[test]
    fn contact_list_name_with_space_is_rejected() {
        let input = ContactListInput {
            name: "my list".into(),
            ..ContactListInput::default()
        };
        let errors = validate_contact_list(&input).unwrap_err();
        assert_eq!(
            errors.get(field::NAME),
            Some(
                "Contact list name must contain only alphanumeric characters, underscores (_) or hyphens (-)."
            )
        );
    }

    #[test]
    fn contact_list_empty_name_is_required() {
        let errors = validate_contact_list(&ContactListInput::default()).unwrap_err();
        assert_eq!(errors.get(field::NAME), Some("Contact list name is required."));
    }

    #[test]
    fn contact_list_limits() {
        let input = ContactListInput {
            name: "a".repeat(129),
            description: Some("d".repeat(257)),
            ..ContactListInput::default()
        };
        let errors = validate_contact_list(&input).unwrap_err();
        assert_eq!(
            errors.get(field::NAME),
            Some("Contact list name must be at most 128 characters.")
        );
        assert_eq!(
            errors.get(field::DESCRIPTION),
            Some("Description must be at most 256 characters.")
        );

        let ok = ContactListInput {
            name: "a".repeat(128),
            description: Some("d".repeat(256)),
            ..ContactListInput::default()
        };
        assert!(validate_contact_list(&ok).is_ok());
    }

    #[test]
    fn topic_name_of_65_characters_is_rejected() {
        let errors = validate_topic(&topic(&"t".repeat(65))).unwrap_err();
        assert_eq!(
            errors.get(field::TOPIC_NAME),
            Some("Topic name must be at most 64 characters.")
        );
        assert!(validate_topic(&topic(&"t".repeat(64))).is_ok());
    }

    #[test]
    fn topic_display_name_and_description_rules() {
        let mut bad = topic("sports");
        bad.display_name = String::new();
        bad.description = Some("x".repeat(1025));
        let errors = validate_topic(&bad).unwrap_err();
        assert_eq!(errors.get(field::DISPLAY_NAME), Some("Display name is required."));
        assert_eq!(
            errors.get(field::DESCRIPTION),
            Some("Description must be at most 1024 characters.")
        );
    }

    #[test]
    fn tag_key_of_129_characters_is_rejected() {
        let errors = validate_tag(&Tag::new("k".repeat(129), "v")).unwrap_err();
        assert_eq!(
            errors.get(field::KEY),
            Some("Tag key must be at most 128 characters.")
        );
        assert!(validate_tag(&Tag::new("k".repeat(128), "")).is_ok());
    }

    #[test]
    fn tag_key_required_and_value_limit() {
        let errors = validate_tag(&Tag::new("", "v".repeat(257))).unwrap_err();
        assert_eq!(errors.get(field::KEY), Some("Tag key is required."));
        assert_eq!(
            errors.get(field::VALUE),
            Some("Tag value must be at most 256 characters.")
        );
    }

    #[test]
    fn nested_errors_are_prefixed() {
        let input = ContactListInput {
            name: "news".into(),
            topics: vec![topic("ok"), topic("bad name")],
            tags: vec![Tag::new("", "")],
            ..ContactListInput::default()
        };
        let errors = validate_contact_list(&input).unwrap_err();
        assert!(errors.contains("topics.1.topic_name"));
        assert!(errors.contains("tags.0.key"));
        assert!(!errors.contains("topics.0.topic_name"));
    }

    #[test]
    fn repeated_tag_key_is_rejected() {
        let input = ContactListInput {
            name: "news".into(),
            tags: vec![
                Tag::new("env", "prod"),
                Tag::new("Env", "qa"),
                Tag::new("env", "dev"),
            ],
            ..ContactListInput::default()
        };
        let errors = validate_contact_list(&input).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.get("tags.2.key"),
            Some("Tag with key \"env\" already exists.")
        );
    }

    #[test]
    fn repeated_topic_name_is_rejected() {
        let input = ContactListInput {
            name: "news".into(),
            topics: vec![topic("sports"), topic("sports")],
            ..ContactListInput::default()
        };
        let errors = validate_contact_list(&input).unwrap_err();
        assert_eq!(
            errors.get("topics.1.topic_name"),
            Some("Topic with name \"sports\" already exists.")
        );
    }

    #[test]
    fn subscription_status_parsing() {
        assert_eq!(
            parse_subscription_status("OPT_OUT").unwrap(),
            SubscriptionStatus::OptOut
        );
        let errors = parse_subscription_status("maybe").unwrap_err();
        assert!(errors.contains(field::DEFAULT_SUBSCRIPTION_STATUS));
    }

    #[test]
    fn field_errors_keep_first_message_and_order() {
        let mut errors = FieldErrors::new();
        errors.insert("b", "first");
        errors.insert("a", "second");
        errors.insert("b", "ignored");
        assert_eq!(errors.get("b"), Some("first"));
        assert_eq!(errors.first(), Some(("b", "first")));
        assert_eq!(errors.remove("b").as_deref(), Some("first"));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.to_string(), "a: second");
    }

    #[test]
    fn test_email_validation_messages() {
        assert_eq!(
            validate_test_email("", "a@b.co").unwrap_err(),
            "Please enter a sender email address"
        );
        assert_eq!(
            validate_test_email("me@x.io", "  ").unwrap_err(),
            "Please enter at least one recipient email address"
        );
        assert_eq!(
            validate_test_email("me", "a@b.co").unwrap_err(),
            "Please enter a valid sender email address"
        );
        assert_eq!(
            validate_test_email("me@x.io", "a@b.co, nope, c@").unwrap_err(),
            "Invalid email format: nope, c@"
        );
        assert_eq!(
            validate_test_email("me@x.io", " a@b.co ,c@d.org").unwrap(),
            vec!["a@b.co", "c@d.org"]
        );
    }
}

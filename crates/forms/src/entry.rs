use sesman_core::validation::{parse_subscription_status, validate_tag, validate_topic};
use sesman_core::{FieldErrors, SubscriptionStatus, Tag, Topic};

/// Ad-hoc entry form for one tag of a contact list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagEntry {
    pub key: String,
    pub value: String,
    errors: FieldErrors,
    duplicate: Option<String>,
}

impl TagEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            ..Self::default()
        }
    }

    /// Schema errors of the last submission.
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Duplicate-key error of the last submission.
    pub fn duplicate_error(&self) -> Option<&str> {
        self.duplicate.as_deref()
    }

    /// Validate against `existing` and return the tag to add.
    ///
    /// Keys are compared case-sensitively. On success the entry is cleared.
    pub fn submit(&mut self, existing: &[Tag]) -> Option<Tag> {
        let tag = Tag::new(&self.key, &self.value);
        self.duplicate = None;
        if let Err(errors) = validate_tag(&tag) {
            self.errors = errors;
            return None;
        }
        self.errors.clear();
        if existing.iter().any(|t| t.key == tag.key) {
            self.duplicate = Some(format!("Tag with key \"{}\" already exists.", tag.key));
            return None;
        }
        *self = Self::default();
        Some(tag)
    }
}

/// Ad-hoc entry form for one topic of a contact list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicEntry {
    pub topic_name: String,
    pub display_name: String,
    pub description: String,
    /// `OPT_IN` or `OPT_OUT`.
    pub default_subscription_status: String,
    errors: FieldErrors,
    duplicate: Option<String>,
}

impl Default for TopicEntry {
    fn default() -> Self {
        Self {
            topic_name: String::new(),
            display_name: String::new(),
            description: String::new(),
            default_subscription_status: SubscriptionStatus::OptIn.as_str().to_owned(),
            errors: FieldErrors::new(),
            duplicate: None,
        }
    }
}

impl TopicEntry {
    pub fn new(topic_name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            topic_name: topic_name.into(),
            display_name: display_name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.default_subscription_status = status.into();
        self
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn duplicate_error(&self) -> Option<&str> {
        self.duplicate.as_deref()
    }

    /// Validate against `existing` and return the topic to add.
    ///
    /// Topic names are compared case-sensitively. On success the entry is
    /// cleared.
    pub fn submit(&mut self, existing: &[Topic]) -> Option<Topic> {
        self.duplicate = None;
        let status = parse_subscription_status(&self.default_subscription_status);
        let topic = Topic {
            topic_name: self.topic_name.clone(),
            display_name: self.display_name.clone(),
            description: Some(self.description.clone()).filter(|d| !d.is_empty()),
            default_subscription_status: *status.as_ref().unwrap_or(&SubscriptionStatus::OptIn),
        };

        let mut errors = validate_topic(&topic).err().unwrap_or_default();
        if let Err(status_errors) = status {
            for (field, message) in status_errors.iter() {
                errors.insert(field, message);
            }
        }
        if !errors.is_empty() {
            self.errors = errors;
            return None;
        }
        self.errors.clear();

        if existing.iter().any(|t| t.topic_name == topic.topic_name) {
            self.duplicate = Some(format!(
                "Topic with name \"{}\" already exists.",
                topic.topic_name
            ));
            return None;
        }
        *self = Self::default();
        Some(topic)
    }
}

#[cfg(test)]
mod tests {
    use sesman_core::validation::field;

    use super::*;

    #[test]
    fn tag_key_length_is_checked() {
        let mut entry = TagEntry::new("k".repeat(129), "v");
        assert!(entry.submit(&[]).is_none());
        assert_eq!(
            entry.errors().get(field::KEY),
            Some("Tag key must be at most 128 characters.")
        );
        assert_eq!(entry.key.len(), 129, "entry kept for correction");
    }

    #[test]
    fn duplicate_tag_is_rejected_case_sensitively() {
        let existing = vec![Tag::new("team", "growth")];
        let mut entry = TagEntry::new("team", "other");
        assert!(entry.submit(&existing).is_none());
        assert_eq!(
            entry.duplicate_error(),
            Some("Tag with key \"team\" already exists.")
        );
        assert!(entry.errors().is_empty());

        let mut entry = TagEntry::new("Team", "other");
        assert_eq!(entry.submit(&existing), Some(Tag::new("Team", "other")));
        assert_eq!(entry, TagEntry::default());
    }

    #[test]
    fn topic_entry_validates_and_parses_status() {
        let mut entry = TopicEntry::new("t".repeat(65), "").with_status("MAYBE");
        assert!(entry.submit(&[]).is_none());
        assert_eq!(
            entry.errors().get(field::TOPIC_NAME),
            Some("Topic name must be at most 64 characters.")
        );
        assert_eq!(
            entry.errors().get(field::DISPLAY_NAME),
            Some("Display name is required.")
        );
        assert!(entry.errors().contains(field::DEFAULT_SUBSCRIPTION_STATUS));
    }

    #[test]
    fn topic_entry_builds_topic() {
        let mut entry = TopicEntry::new("sports", "Sports").with_status("OPT_OUT");
        let topic = entry.submit(&[]).unwrap();
        assert_eq!(topic.default_subscription_status, SubscriptionStatus::OptOut);
        assert_eq!(topic.description, None);
        assert_eq!(entry.default_subscription_status, "OPT_IN");

        let mut again = TopicEntry::new("sports", "Other").with_description("x");
        assert!(again.submit(&[topic]).is_none());
        assert_eq!(
            again.duplicate_error(),
            Some("Topic with name \"sports\" already exists.")
        );
    }
}

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default subscription status of a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    OptIn,
    OptOut,
}

impl SubscriptionStatus {
    /// Wire representation (`OPT_IN` / `OPT_OUT`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OptIn => "OPT_IN",
            Self::OptOut => "OPT_OUT",
        }
    }

    /// Parse the wire representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "OPT_IN" => Some(Self::OptIn),
            "OPT_OUT" => Some(Self::OptOut),
            _ => None,
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A subscription category within a contact list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub topic_name: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub default_subscription_status: SubscriptionStatus,
}

/// A metadata tag attached to a contact list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A named contact list owned by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactList {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_timestamp: Option<DateTime<Utc>>,
}

/// Input for creating a contact list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactListInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl From<&ContactList> for ContactListInput {
    fn from(list: &ContactList) -> Self {
        Self {
            name: list.name.clone(),
            description: list.description.clone(),
            topics: list.topics.clone(),
            tags: list.tags.clone(),
        }
    }
}

/// Partial update of a contact list. Absent fields keep the existing value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactListPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub topics: Option<Vec<Topic>>,
    #[serde(default)]
    pub tags: Option<Vec<Tag>>,
}

impl ContactListPatch {
    /// Returns the requested new name when it differs from `current`.
    pub fn rename_target(&self, current: &str) -> Option<&str> {
        self.name
            .as_deref()
            .filter(|name| !name.is_empty() && *name != current)
    }

    /// Returns `true` when the patch carries a tag list different from `existing`.
    pub fn changes_tags(&self, existing: &[Tag]) -> bool {
        self.tags.as_deref().is_some_and(|tags| tags != existing)
    }

    /// Merge this patch over `existing`, producing the full desired state.
    pub fn apply(&self, existing: &ContactList) -> ContactListInput {
        let description = match self.description.as_deref() {
            Some(desc) if !desc.is_empty() => Some(desc.to_owned()),
            _ => existing.description.clone(),
        };
        ContactListInput {
            name: self
                .rename_target(&existing.name)
                .unwrap_or(&existing.name)
                .to_owned(),
            description,
            topics: self
                .topics
                .clone()
                .unwrap_or_else(|| existing.topics.clone()),
            tags: self.tags.clone().unwrap_or_else(|| existing.tags.clone()),
        }
    }
}

impl From<ContactListInput> for ContactListPatch {
    fn from(input: ContactListInput) -> Self {
        Self {
            name: Some(input.name),
            description: input.description,
            topics: Some(input.topics),
            tags: Some(input.tags),
        }
    }
}

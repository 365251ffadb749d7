use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::placeholder::dynamic_fields;

/// The three content parts of an email template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateContent {
    /// Subject line.
    #[serde(default)]
    pub subject: String,
    /// HTML body.
    #[serde(default)]
    pub html: String,
    /// Plain-text body.
    #[serde(default)]
    pub text: String,
}

impl TemplateContent {
    /// Create content from its three parts.
    pub fn new(
        subject: impl Into<String>,
        html: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            html: html.into(),
            text: text.into(),
        }
    }

    /// Placeholder names in canonical scan order (subject, text, html).
    pub fn dynamic_fields(&self) -> Vec<String> {
        dynamic_fields(&self.subject, &self.text, &self.html)
    }
}

/// A named email template as seen by the console.
///
/// The identifier is the template name. `dynamic_fields` is never stored; it
/// is derived from the content every time a template is materialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailTemplate {
    /// Identifier, equal to the name.
    pub id: String,
    /// Template name.
    pub name: String,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html: String,
    /// Plain-text body.
    pub text: String,
    /// Ordered, de-duplicated placeholder names.
    pub dynamic_fields: Vec<String>,
    /// Creation time. Client-observed for the SES backend.
    pub created_at: DateTime<Utc>,
    /// Last update time. Client-observed for the SES backend.
    pub updated_at: DateTime<Utc>,
}

impl EmailTemplate {
    /// Materialize a template from stored content, deriving its dynamic fields.
    pub fn from_content(
        name: impl Into<String>,
        content: TemplateContent,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        let name = name.into();
        let dynamic_fields = content.dynamic_fields();
        Self {
            id: name.clone(),
            name,
            subject: content.subject,
            html: content.html,
            text: content.text,
            dynamic_fields,
            created_at,
            updated_at,
        }
    }

    /// The content parts of this template.
    pub fn content(&self) -> TemplateContent {
        TemplateContent::new(&self.subject, &self.html, &self.text)
    }
}

/// Input for creating a template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateInput {
    pub name: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

impl TemplateInput {
    /// The content parts of this input.
    pub fn content(&self) -> TemplateContent {
        TemplateContent::new(&self.subject, &self.html, &self.text)
    }
}

/// Partial update of a template.
///
/// Absent or empty fields keep the existing value. A `name` different from
/// the current identifier requests a rename.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplatePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl TemplatePatch {
    /// Returns the requested new name when it differs from `current`.
    pub fn rename_target(&self, current: &str) -> Option<&str> {
        self.name
            .as_deref()
            .filter(|name| !name.is_empty() && *name != current)
    }

    /// Merge this patch over existing content.
    pub fn apply(&self, existing: &TemplateContent) -> TemplateContent {
        TemplateContent {
            subject: pick(self.subject.as_deref(), &existing.subject),
            html: pick(self.html.as_deref(), &existing.html),
            text: pick(self.text.as_deref(), &existing.text),
        }
    }
}

impl From<TemplateInput> for TemplatePatch {
    fn from(input: TemplateInput) -> Self {
        Self {
            name: Some(input.name),
            subject: Some(input.subject),
            html: Some(input.html),
            text: Some(input.text),
        }
    }
}

fn pick(patch: Option<&str>, existing: &str) -> String {
    match patch {
        Some(value) if !value.is_empty() => value.to_owned(),
        _ => existing.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content() -> TemplateContent {
        TemplateContent::new("Hi {{name}}", "<p>{{ name }} {{order.id}}</p>", "{{name}}")
    }

    #[test]
    fn from_content_derives_fields_and_id() {
        let now = Utc::now();
        let template = EmailTemplate::from_content("welcome", content(), now, now);
        assert_eq!(template.id, "welcome");
        assert_eq!(template.name, "welcome");
        assert_eq!(template.dynamic_fields, vec!["name", "order.id"]);
    }

    #[test]
    fn patch_keeps_existing_for_absent_and_empty_fields() {
        let patch = TemplatePatch {
            subject: Some("New subject".into()),
            html: Some(String::new()),
            ..TemplatePatch::default()
        };
        let merged = patch.apply(&content());
        assert_eq!(merged.subject, "New subject");
        assert_eq!(merged.html, content().html);
        assert_eq!(merged.text, content().text);
    }

    #[test]
    fn rename_target_ignores_same_or_empty_name() {
        let mut patch = TemplatePatch::default();
        assert_eq!(patch.rename_target("welcome"), None);
        patch.name = Some("welcome".into());
        assert_eq!(patch.rename_target("welcome"), None);
        patch.name = Some(String::new());
        assert_eq!(patch.rename_target("welcome"), None);
        patch.name = Some("welcome-v2".into());
        assert_eq!(patch.rename_target("welcome"), Some("welcome-v2"));
    }

    #[test]
    fn content_serializes_with_provider_field_names() {
        let json = serde_json::to_value(content()).unwrap();
        assert_eq!(json["Subject"], "Hi {{name}}");
        assert!(json.get("Html").is_some());
        assert!(json.get("Text").is_some());
    }
}

//! Core types shared by every SES manager crate.
//!
//! - [`template`]: email templates, their inputs and patches
//! - [`contact_list`]: contact lists with topics and tags
//! - [`credentials`]: the cached credential bundle
//! - [`placeholder`]: `{{ field }}` extraction and preview rendering
//! - [`validation`]: field rules shared by the forms and the CLI
//! - [`notice`]: user-facing notifications

pub mod contact_list;
pub mod credentials;
pub mod notice;
pub mod placeholder;
pub mod template;
pub mod validation;

pub use contact_list::{
    ContactList, ContactListInput, ContactListPatch, SubscriptionStatus, Tag, Topic,
};
pub use credentials::{CredentialBundle, Theme};
pub use notice::{Notice, NoticeLevel, Notifier, RecordingNotifier};
pub use placeholder::{dynamic_fields, extract_placeholders, render_placeholders};
pub use template::{EmailTemplate, TemplateContent, TemplateInput, TemplatePatch};
pub use validation::FieldErrors;

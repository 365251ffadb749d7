use serde::Serialize;
use sesman_core::{FieldErrors, Notice, Notifier};

use crate::OutputFormat;

/// Prints notices to stderr, one line each.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        eprintln!("{}", notice_line(&notice));
    }
}

fn notice_line(notice: &Notice) -> String {
    let marker = if notice.is_error() { "error" } else { "ok" };
    match &notice.title {
        Some(title) => format!("[{marker}] {title}: {}", notice.message),
        None => format!("[{marker}] {}", notice.message),
    }
}

/// Print `value` as pretty JSON, or `text` otherwise.
pub fn emit<T: Serialize>(
    format: &OutputFormat,
    value: &T,
    text: impl FnOnce(),
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => text(),
    }
    Ok(())
}

/// Print per-field validation errors to stderr.
pub fn print_field_errors(errors: &FieldErrors) {
    for (field, message) in errors.iter() {
        eprintln!("  {field}: {message}");
    }
}

/// Parse a `key=value` argument.
pub fn parse_key_value(input: &str) -> Result<(String, String), String> {
    input
        .split_once('=')
        .map(|(key, value)| (key.trim().to_owned(), value.to_owned()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{input}'"))
}

/// Read a JSON argument given inline or as `@path`.
pub fn parse_json_data<T: serde::de::DeserializeOwned>(input: &str) -> anyhow::Result<T> {
    if let Some(path) = input.strip_prefix('@') {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    } else {
        Ok(serde_json::from_str(input)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_lines_carry_level_and_title() {
        assert_eq!(
            notice_line(&Notice::success("Successfully logged out")),
            "[ok] Successfully logged out"
        );
        assert_eq!(
            notice_line(&Notice::error("Template not found").with_title("Error")),
            "[error] Error: Template not found"
        );
    }

    #[test]
    fn key_value_splits_on_first_equals() {
        assert_eq!(
            parse_key_value("url=https://x?a=b").unwrap(),
            ("url".to_owned(), "https://x?a=b".to_owned())
        );
        assert!(parse_key_value("novalue").is_err());
    }

    #[test]
    fn json_data_inline() {
        let input: sesman_core::TemplateInput =
            parse_json_data(r#"{"name":"w","subject":"s","html":"h","text":"t"}"#).unwrap();
        assert_eq!(input.name, "w");
    }
}

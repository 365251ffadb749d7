use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Matches `{{ name }}` and `{{ name.path }}` with optional inner whitespace.
static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([\w.]+)\s*\}\}").expect("placeholder regex is valid"));

/// Extract placeholder names from `content` in order of appearance.
///
/// Duplicates are kept; see [`dynamic_fields`] for the de-duplicated form.
pub fn extract_placeholders(content: &str) -> Vec<String> {
    PLACEHOLDER_RE
        .captures_iter(content)
        .map(|caps| caps[1].to_owned())
        .collect()
}

/// Ordered, de-duplicated placeholder names of a template.
///
/// Scans subject, then text, then html; each name appears once, at the
/// position of its first occurrence.
pub fn dynamic_fields(subject: &str, text: &str, html: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    [subject, text, html]
        .into_iter()
        .flat_map(extract_placeholders)
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Substitute placeholders with the supplied values.
///
/// Placeholders without a value are left untouched so a preview shows what
/// is still missing.
pub fn render_placeholders(content: &str, values: &HashMap<String, String>) -> String {
    PLACEHOLDER_RE
        .replace_all(content, |caps: &Captures<'_>| {
            values
                .get(&caps[1])
                .cloned()
                .unwrap_or_else(|| caps[0].to_owned())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_simple_and_dotted_names() {
        let found = extract_placeholders("Hi {{a}}, order {{ b.c }} and {{  a  }}");
        assert_eq!(found, vec!["a", "b.c", "a"]);
    }

    #[test]
    fn ignores_malformed_tokens() {
        assert!(extract_placeholders("{{}} {{ a b }} {a} {{-x}}").is_empty());
        assert!(extract_placeholders("").is_empty());
    }

    #[test]
    fn dynamic_fields_dedupes_in_subject_text_html_order() {
        let fields = dynamic_fields(
            "Hello {{name}}",
            "{{ order.id }} for {{name}}",
            "<p>{{footer}} {{order.id}}</p>",
        );
        assert_eq!(fields, vec!["name", "order.id", "footer"]);
    }

    #[test]
    fn dynamic_fields_is_exactly_the_set_of_placeholders() {
        let fields = dynamic_fields("{{a}}", "", "{{b.c}} {{a}}");
        assert_eq!(fields, vec!["a", "b.c"]);
    }

    #[test]
    fn render_substitutes_known_values_only() {
        let mut values = HashMap::new();
        values.insert("name".to_owned(), "Ada".to_owned());
        let rendered = render_placeholders("Hi {{ name }}, code {{code}}", &values);
        assert_eq!(rendered, "Hi Ada, code {{code}}");
    }
}

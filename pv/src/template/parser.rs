use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::debug;

use super::rules::{infer_type, options_for};
use super::{FieldType, ParsedPlaceholders, PlaceholderField};

/// `[label]` with no nested brackets
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\[\]]+)\]").expect("placeholder pattern is valid"));

/// `{{field_id}}`
static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{([^{}]+)\}\}").expect("token pattern is valid"));

const STRIPPED: &[char] = &[
    '(', ')', '[', ']', '{', '}', '!', '?', '.', ',', ':', ';', '\'', '"', '/', '\\', '|', '+', '=', '@', '#', '$',
    '%', '^', '&', '*',
];

const MIN_ALTERNATIVES: usize = 2;
const MAX_ALTERNATIVES: usize = 10;

/// Normalize a placeholder label into a field identifier
///
/// Lower-cases, turns whitespace and hyphens into underscores and drops punctuation.
pub fn field_id(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !STRIPPED.contains(c))
        .map(|c| if c.is_whitespace() || c == '-' { '_' } else { c })
        .collect()
}

/// Token that stands in for a field in processed text
pub fn token(id: &str) -> String {
    format!("{{{{{id}}}}}")
}

/// Extract typed fields from every bracketed placeholder in `text`
pub fn parse(text: &str) -> ParsedPlaceholders {
    debug!(len = text.len(), "parse: called");
    let mut fields = Vec::new();
    let mut seen = HashSet::new();

    let processed = PLACEHOLDER.replace_all(text, |caps: &Captures| {
        let label = &caps[1];
        let id = field_id(label);
        if id.is_empty() {
            return caps[0].to_string();
        }
        if seen.insert(id.clone()) {
            fields.push(build_field(label, id.clone()));
        }
        token(&id)
    });

    debug!(fields = fields.len(), "parse: done");
    ParsedPlaceholders {
        fields,
        processed: processed.into_owned(),
    }
}

/// Replace field tokens with supplied values
///
/// Tokens without a value are left as they are.
pub fn substitute(text: &str, values: &HashMap<String, String>) -> String {
    TOKEN
        .replace_all(text, |caps: &Captures| match values.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

fn build_field(label: &str, id: String) -> PlaceholderField {
    let lower = label.to_lowercase();
    let mut field_type = infer_type(&lower);
    let mut options = None;

    if let Some(alternatives) = explicit_alternatives(label) {
        field_type = FieldType::Select;
        options = Some(alternatives);
    } else if field_type == FieldType::Select {
        options = Some(options_for(&lower));
    }

    PlaceholderField {
        id,
        label: label.to_string(),
        field_type,
        required: !lower.contains("optional"),
        placeholder: format!("Enter {label}"),
        options,
        description: format!("Enter {lower}"),
    }
}

/// `a/b/c` style alternatives, read after a leading `Label:` prefix when there is one
fn explicit_alternatives(label: &str) -> Option<Vec<String>> {
    if !label.contains('/') || label.to_lowercase().contains("http") {
        return None;
    }
    let list = match label.split_once(':') {
        Some((prefix, rest)) if is_label_prefix(prefix) => rest,
        _ => label,
    };
    let alternatives: Vec<String> = list
        .split('/')
        .map(str::trim)
        .filter(|alt| !alt.is_empty())
        .map(str::to_string)
        .collect();

    (MIN_ALTERNATIVES..=MAX_ALTERNATIVES)
        .contains(&alternatives.len())
        .then_some(alternatives)
}

/// A prefix names the field; `9` in `9:00/10:00` does not
fn is_label_prefix(prefix: &str) -> bool {
    !prefix.contains('/') && prefix.chars().any(char::is_alphabetic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_field_id() {
        assert_eq!(field_id("Target Audience"), "target_audience");
        assert_eq!(field_id("e-mail (optional)"), "e_mail_optional");
        assert_eq!(field_id("What's next?"), "whats_next");
    }

    #[test]
    fn test_parse_audience_and_budget() {
        let parsed = parse("Write to [Audience] about [Budget: Low/Medium/High]");
        assert_eq!(parsed.fields.len(), 2);

        let audience = &parsed.fields[0];
        assert_eq!(audience.id, "audience");
        assert_eq!(audience.field_type, FieldType::Text);
        assert!(audience.required);
        assert!(audience.options.is_none());

        let budget = &parsed.fields[1];
        assert_eq!(budget.field_type, FieldType::Select);
        assert_eq!(
            budget.options.as_deref(),
            Some(&["Low".to_string(), "Medium".to_string(), "High".to_string()][..])
        );

        let filled = substitute(&parsed.processed, &values(&[("audience", "devs")]));
        assert!(filled.starts_with("Write to devs about "));
        assert!(filled.contains(&token(&budget.id)));
    }

    #[test]
    fn test_duplicate_labels_share_one_field() {
        let parsed = parse("[Name] and [name] and [Name]");
        assert_eq!(parsed.fields.len(), 1);
        assert_eq!(parsed.fields[0].label, "Name");
        assert_eq!(parsed.processed, "{{name}} and {{name}} and {{name}}");
    }

    #[test]
    fn test_slash_list_overrides_chain() {
        let parsed = parse("[Email/Phone]");
        assert_eq!(parsed.fields[0].field_type, FieldType::Select);
        assert_eq!(parsed.fields[0].options, Some(vec!["Email".to_string(), "Phone".to_string()]));
    }

    #[test]
    fn test_slash_list_with_colons_in_alternatives() {
        let parsed = parse("[Start time: 9:00/10:00/11:00]");
        let field = &parsed.fields[0];
        assert_eq!(field.id, "start_time_90010001100");
        assert_eq!(field.field_type, FieldType::Select);
        assert_eq!(
            field.options,
            Some(vec!["9:00".to_string(), "10:00".to_string(), "11:00".to_string()])
        );

        let bare = parse("[9:00/10:00]");
        assert_eq!(bare.fields[0].options, Some(vec!["9:00".to_string(), "10:00".to_string()]));
    }

    #[test]
    fn test_slash_list_limits() {
        let url = parse("[Link: https://example.com/path]");
        assert_eq!(url.fields[0].field_type, FieldType::Url);
        assert!(url.fields[0].options.is_none());

        let too_many = parse("[a/b/c/d/e/f/g/h/i/j/k]");
        assert_eq!(too_many.fields[0].field_type, FieldType::Text);
    }

    #[test]
    fn test_select_without_alternatives_uses_table() {
        let parsed = parse("[Select platform] [Choose flavor]");
        assert_eq!(parsed.fields[0].options.as_ref().map(|o| o[0].as_str()), Some("Facebook"));
        assert_eq!(
            parsed.fields[1].options,
            Some(vec!["Option 1".to_string(), "Option 2".to_string(), "Option 3".to_string()])
        );
    }

    #[test]
    fn test_optional_and_hints() {
        let parsed = parse("[Company Website (optional)]");
        let field = &parsed.fields[0];
        assert!(!field.required);
        assert_eq!(field.field_type, FieldType::Url);
        assert_eq!(field.placeholder, "Enter Company Website (optional)");
        assert_eq!(field.description, "Enter company website (optional)");
    }

    #[test]
    fn test_nested_and_empty_brackets() {
        let parsed = parse("[outer [inner]] and [] and [?]");
        assert_eq!(parsed.fields.len(), 1);
        assert_eq!(parsed.fields[0].id, "inner");
        assert_eq!(parsed.processed, "[outer {{inner}}] and [] and [?]");
    }

    #[test]
    fn test_substitute_single_pass() {
        let text = "{{a}} {{b}}";
        let filled = substitute(text, &values(&[("a", "{{b}}"), ("b", "x")]));
        assert_eq!(filled, "{{b}} x");
    }

    #[test]
    fn test_no_placeholders() {
        let parsed = parse("Plain text");
        assert!(parsed.fields.is_empty());
        assert_eq!(parsed.processed, "Plain text");
    }

    proptest! {
        #[test]
        fn field_ids_are_normalized(label in "[ -~]{1,40}") {
            let id = field_id(&label);
            prop_assert!(!id.chars().any(|c| STRIPPED.contains(&c)));
            prop_assert!(!id.chars().any(|c| c.is_whitespace() || c == '-' || c.is_uppercase()));
            prop_assert_eq!(field_id(&id), id.clone());
        }

        #[test]
        fn parse_yields_unique_ids(text in "[a-c\\[\\] ]{0,60}") {
            let parsed = parse(&text);
            let ids: HashSet<&String> = parsed.fields.iter().map(|f| &f.id).collect();
            prop_assert_eq!(ids.len(), parsed.fields.len());
        }
    }
}

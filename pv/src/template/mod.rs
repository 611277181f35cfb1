//! Template placeholders
//!
//! A prompt body marks user-fillable slots with square brackets:
//!
//! ```text
//! Write to [Audience] about [Budget: Low/Medium/High]
//! ```
//!
//! `parse` turns each distinct slot into a typed `PlaceholderField` and
//! rewrites the body with `{{field_id}}` tokens. `substitute` fills those
//! tokens back in from a map of values.
//!
//! Type inference and canned option lists are driven by the ordered tables
//! in `rules`, so the policy can be read and tested on its own.

mod parser;
mod rules;

use serde::{Deserialize, Serialize};

pub use parser::{field_id, parse, substitute, token};
pub use rules::{GENERIC_OPTIONS, OPTION_RULES, TYPE_RULES, infer_type, options_for};

/// Input control a placeholder should render as
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Email,
    Url,
    Number,
    /// Multi-line text
    Textarea,
    /// Enumerated choice
    Select,
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FieldType::Text => "text",
            FieldType::Email => "email",
            FieldType::Url => "url",
            FieldType::Number => "number",
            FieldType::Textarea => "textarea",
            FieldType::Select => "select",
        };
        f.write_str(name)
    }
}

/// One typed placeholder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceholderField {
    pub id: String,
    /// Label as written between the brackets
    pub label: String,
    pub field_type: FieldType,
    pub required: bool,
    /// Hint text for an empty input
    pub placeholder: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub description: String,
}

/// Result of `parse`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedPlaceholders {
    /// Fields in first-occurrence order
    pub fields: Vec<PlaceholderField>,
    /// Source text with placeholders replaced by field tokens
    pub processed: String,
}

impl ParsedPlaceholders {
    pub fn field(&self, id: &str) -> Option<&PlaceholderField> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Required fields with no entry in `values`
    pub fn missing_required<'a>(&'a self, values: &std::collections::HashMap<String, String>) -> Vec<&'a PlaceholderField> {
        self.fields
            .iter()
            .filter(|f| f.required && values.get(&f.id).is_none_or(|v| v.trim().is_empty()))
            .collect()
    }
}

//! Declarative inference tables
//!
//! Each table is scanned top to bottom against the lower-cased label and the
//! first row with a matching keyword wins.

use super::FieldType;

/// Keyword rows that classify a label
pub const TYPE_RULES: &[(&[&str], FieldType)] = &[
    (&["email", "e-mail"], FieldType::Email),
    (&["url", "website", "link"], FieldType::Url),
    (&["number", "count", "age", "year"], FieldType::Number),
    (&["description", "details", "explain", "content"], FieldType::Textarea),
    (&["choose", "select", "option"], FieldType::Select),
];

/// Canned option lists for choice fields without explicit alternatives
pub const OPTION_RULES: &[(&[&str], &[&str])] = &[
    (
        &["genre"],
        &["Fiction", "Non-fiction", "Mystery", "Romance", "Sci-Fi", "Fantasy", "Thriller", "Horror", "Comedy", "Drama"],
    ),
    (
        &["platform"],
        &["Facebook", "Instagram", "Twitter", "LinkedIn", "TikTok", "YouTube", "Pinterest", "Snapchat"],
    ),
    (
        &["style", "tone"],
        &["Professional", "Casual", "Friendly", "Formal", "Humorous", "Serious", "Creative", "Technical"],
    ),
    (&["level", "difficulty"], &["Beginner", "Intermediate", "Advanced", "Expert"]),
    (&["frequency"], &["Daily", "Weekly", "Monthly", "Quarterly", "Annually"]),
    (&["size"], &["Small", "Medium", "Large", "Extra Large"]),
    (&["priority"], &["Low", "Medium", "High", "Critical"]),
    (
        &["business type", "company type"],
        &[
            "E-commerce", "SaaS", "Consulting", "Agency", "Non-profit", "Education", "Healthcare", "Finance", "Retail",
            "Manufacturing",
        ],
    ),
    (
        &["industry"],
        &[
            "Technology", "Healthcare", "Finance", "Education", "Retail", "Manufacturing", "Real Estate",
            "Food & Beverage", "Travel", "Entertainment",
        ],
    ),
    (&["budget"], &["Under $5K", "$5K - $15K", "$15K - $50K", "$50K - $100K", "Over $100K"]),
    (&["timeline", "duration"], &["1-2 weeks", "1 month", "2-3 months", "3-6 months", "6+ months"]),
    (
        &["goals", "purpose"],
        &["Brand Awareness", "Lead Generation", "Sales", "Engagement", "Education", "Support", "Community Building"],
    ),
];

/// Fallback list for choice fields nothing else matches
pub const GENERIC_OPTIONS: &[&str] = &["Option 1", "Option 2", "Option 3"];

fn first_match<'a, T>(table: &'a [(&[&str], T)], lower: &str) -> Option<&'a T> {
    table
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, value)| value)
}

/// Classify a lower-cased label by the first matching row of `TYPE_RULES`
pub fn infer_type(lower: &str) -> FieldType {
    first_match(TYPE_RULES, lower).copied().unwrap_or_default()
}

/// Canned options for a lower-cased label
pub fn options_for(lower: &str) -> Vec<String> {
    let options: &[&str] = first_match(OPTION_RULES, lower).copied().unwrap_or(GENERIC_OPTIONS);
    options.iter().map(|o| o.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_type_priority() {
        assert_eq!(infer_type("your email"), FieldType::Email);
        assert_eq!(infer_type("website url"), FieldType::Url);
        // email wins over the url row even when both match
        assert_eq!(infer_type("email link"), FieldType::Email);
        assert_eq!(infer_type("word count"), FieldType::Number);
        assert_eq!(infer_type("product description"), FieldType::Textarea);
        assert_eq!(infer_type("choose one"), FieldType::Select);
        assert_eq!(infer_type("audience"), FieldType::Text);
    }

    #[test]
    fn test_substring_matches() {
        // "age" inside "language" is a number by the keyword rule
        assert_eq!(infer_type("language"), FieldType::Number);
    }

    #[test]
    fn test_options_for() {
        assert_eq!(options_for("select tone")[0], "Professional");
        assert_eq!(options_for("company type").len(), 10);
        assert_eq!(options_for("select flavor"), GENERIC_OPTIONS);
    }

    #[test]
    fn test_option_rows_are_ordered() {
        // "style" is listed before "size"
        assert_eq!(options_for("style size")[0], "Professional");
    }
}

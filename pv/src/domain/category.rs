//! Category domain type and the built-in category list

use serde::{Deserialize, Serialize};

use super::number;
use super::prompt::Prompt;

/// Reserved category id that selects every prompt
pub const ALL_CATEGORY: &str = "all";

/// Bucket for prompts that arrive without a category
pub const GENERAL_CATEGORY: &str = "general";

/// A grouping of prompts
///
/// `prompt_count` is derived. It is rebuilt from the catalog by `recount`
/// after every catalog change and never edited directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub color: String,
    #[serde(deserialize_with = "number::deserialize_int")]
    pub sort_order: i32,
    #[serde(deserialize_with = "number::deserialize_count")]
    pub prompt_count: usize,
}

impl Category {
    fn builtin(id: &str, name: &str, description: &str, icon: &str, color: &str, sort_order: i32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
            color: color.to_string(),
            sort_order,
            prompt_count: 0,
        }
    }

    pub fn is_all(&self) -> bool {
        self.id == ALL_CATEGORY
    }

    /// Recompute `prompt_count` for every category from the catalog
    pub fn recount(categories: &mut [Category], prompts: &[Prompt]) {
        for category in categories.iter_mut() {
            category.prompt_count = if category.is_all() {
                prompts.len()
            } else {
                prompts.iter().filter(|p| p.category == category.id).count()
            };
        }
    }
}

/// The fixed category list seeded into an empty state
pub fn default_categories() -> Vec<Category> {
    vec![
        Category::builtin(ALL_CATEGORY, "All Prompts", "View all available prompts", "LayoutGrid", "blue", 0),
        Category::builtin("marketing", "Marketing", "Marketing and promotional content", "TrendingUp", "pink", 1),
        Category::builtin("development", "Development", "Code generation and development tools", "Code2", "green", 2),
        Category::builtin("creative-writing", "Creative Writing", "Creative writing and storytelling", "PenTool", "purple", 3),
        Category::builtin("business", "Business", "Business strategy and analysis", "Briefcase", "blue", 4),
        Category::builtin("education", "Education", "Educational content and learning", "GraduationCap", "green", 5),
        Category::builtin("technology", "Technology", "Technology and technical documentation", "Cpu", "orange", 6),
        Category::builtin("fun", "Fun", "Entertainment and creative content", "Sparkles", "yellow", 7),
        Category::builtin("productivity", "Productivity", "Productivity and efficiency tools", "Zap", "purple", 8),
        Category::builtin("data-analysis", "Data Analysis", "Data visualization and analytics", "BarChart3", "blue", 9),
        Category::builtin("testing", "Testing", "Test prompts and examples", "CheckCircle", "gray", 10),
        Category::builtin(GENERAL_CATEGORY, "General", "General purpose prompts", "FileText", "gray", 11),
    ]
}

//! The closed set of spending categories a transaction can end up in.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Spending category. Every transaction carries exactly one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    #[serde(rename = "Food & Dining")]
    FoodAndDining,
    #[serde(rename = "Transportation")]
    Transportation,
    #[serde(rename = "Shopping")]
    Shopping,
    #[serde(rename = "Bills & Utilities")]
    BillsAndUtilities,
    #[serde(rename = "Entertainment")]
    Entertainment,
    #[serde(rename = "Healthcare")]
    Healthcare,
    #[serde(rename = "Personal Care")]
    PersonalCare,
    #[serde(rename = "Education")]
    Education,
    #[serde(rename = "Other")]
    Other,
}

impl Category {
    /// All categories in prompt order; `Other` is last.
    pub const ALL: [Category; 9] = [
        Category::FoodAndDining,
        Category::Transportation,
        Category::Shopping,
        Category::BillsAndUtilities,
        Category::Entertainment,
        Category::Healthcare,
        Category::PersonalCare,
        Category::Education,
        Category::Other,
    ];

    /// Display label, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::FoodAndDining => "Food & Dining",
            Category::Transportation => "Transportation",
            Category::Shopping => "Shopping",
            Category::BillsAndUtilities => "Bills & Utilities",
            Category::Entertainment => "Entertainment",
            Category::Healthcare => "Healthcare",
            Category::PersonalCare => "Personal Care",
            Category::Education => "Education",
            Category::Other => "Other",
        }
    }

    /// Comma-separated list of every label, as shown to the classification model.
    pub fn label_list() -> String {
        Category::ALL
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Exact label lookup.
    pub fn from_label(label: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.as_str() == label)
    }

    /// Map a free-form label (typically model output) onto the closed set.
    ///
    /// Exact match first, then case-insensitive match, then substring containment
    /// in either direction. Anything else, including a blank label, is `Other`.
    pub fn resolve(label: &str) -> Category {
        let label = label.trim();
        if label.is_empty() {
            return Category::Other;
        }
        if let Some(c) = Category::from_label(label) {
            return c;
        }

        let lower = label.to_lowercase();
        if let Some(c) = Category::ALL
            .into_iter()
            .find(|c| c.as_str().to_lowercase() == lower)
        {
            return c;
        }

        Category::ALL
            .into_iter()
            .find(|c| {
                let name = c.as_str().to_lowercase();
                name.contains(&lower) || lower.contains(&name)
            })
            .unwrap_or(Category::Other)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Deterministic keyword rules mapping descriptions to categories.
//!
//! No network needed; this pass runs before any remote classification so the
//! obvious merchants never cost a model call.

use async_trait::async_trait;
use spendlens_core::{Category, Transaction};

use crate::classifier::Classifier;

/// Lowercase substring → category, tested in order; first hit wins.
pub const KEYWORD_RULES: &[(&str, Category)] = &[
    ("food", Category::FoodAndDining),
    ("restaurant", Category::FoodAndDining),
    ("cafe", Category::FoodAndDining),
    ("carrefour", Category::FoodAndDining),
    ("lulu", Category::FoodAndDining),
    ("supermarket", Category::FoodAndDining),
    ("grocery", Category::FoodAndDining),
    ("uber", Category::Transportation),
    ("careem", Category::Transportation),
    ("taxi", Category::Transportation),
    ("metro", Category::Transportation),
    ("amazon", Category::Shopping),
    ("shopping", Category::Shopping),
    ("mall", Category::Shopping),
    ("pharmacy", Category::Healthcare),
    ("hospital", Category::Healthcare),
    ("medical", Category::Healthcare),
    ("salon", Category::PersonalCare),
    ("gym", Category::PersonalCare),
    ("fitness", Category::PersonalCare),
    ("etisalat", Category::BillsAndUtilities),
    ("du telecom", Category::BillsAndUtilities),
    ("dewa", Category::BillsAndUtilities),
    ("utility", Category::BillsAndUtilities),
];

/// Categorize a description by keyword, or `None` to defer to the next classifier.
pub fn categorize(description: &str) -> Option<Category> {
    let desc = description.to_lowercase();
    KEYWORD_RULES
        .iter()
        .find(|(keyword, _)| desc.contains(keyword))
        .map(|(_, category)| *category)
}

/// Keyword table as a chain stage
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordClassifier;

#[async_trait]
impl Classifier for KeywordClassifier {
    fn name(&self) -> &'static str {
        "keyword"
    }

    async fn classify(&self, txns: &[Transaction]) -> Vec<Option<Category>> {
        txns.iter().map(|t| categorize(&t.description)).collect()
    }
}

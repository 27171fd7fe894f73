//! Per-category totals for one statement.
//!
//! Serializes as
//! `{"categories": {"<label>": {"total", "transactions"}}, "total_expenses", "total_transactions"}`
//! with `categories` keys emitted in the stored order (largest total first).

use serde::{Deserialize, Serialize};

use crate::{Category, Transaction};

/// Transactions and their sum for a single category
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CategoryTotal {
    pub total: f64,
    pub transactions: Vec<Transaction>,
}

/// Categorized result of one statement upload
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CategorizedSummary {
    #[serde(with = "ordered_categories")]
    pub categories: Vec<(Category, CategoryTotal)>,
    #[serde(default)]
    pub total_expenses: f64,
    #[serde(default)]
    pub total_transactions: usize,
}

impl CategorizedSummary {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn get(&self, category: Category) -> Option<&CategoryTotal> {
        self.categories
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, t)| t)
    }

    /// Iterate every (category, transaction) pair in presentation order.
    pub fn labeled(&self) -> impl Iterator<Item = (Category, &Transaction)> {
        self.categories
            .iter()
            .flat_map(|(c, t)| t.transactions.iter().map(move |txn| (*c, txn)))
    }
}

mod ordered_categories {
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};
    use std::fmt;

    use super::CategoryTotal;
    use crate::Category;

    pub fn serialize<S>(value: &[(Category, CategoryTotal)], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(value.len()))?;
        for (category, total) in value {
            map.serialize_entry(category.as_str(), total)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<(Category, CategoryTotal)>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = Vec<(Category, CategoryTotal)>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of category label to category total")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut out = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((label, total)) = access.next_entry::<String, CategoryTotal>()? {
                    let category = Category::from_label(&label).ok_or_else(|| {
                        serde::de::Error::custom(format!("unknown category: {label}"))
                    })?;
                    out.push((category, total));
                }
                Ok(out)
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

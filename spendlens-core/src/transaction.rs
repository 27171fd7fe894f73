//! Transaction record extracted from a statement.

use serde::{Deserialize, Serialize};

/// One debit line from a statement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    /// Posting date as printed, `DD-MMM-YY`
    pub date: String,
    /// Whitespace-collapsed description as printed
    pub description: String,
    /// Always positive; credits never become transactions
    pub amount: f64,
}

/// Identity used to collapse repeated matches of the same row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransactionKey {
    date: String,
    description: String,
    amount_bits: u64,
}

impl Transaction {
    pub fn new(date: impl Into<String>, description: impl Into<String>, amount: f64) -> Self {
        Self {
            date: date.into(),
            description: description.into(),
            amount,
        }
    }

    pub fn key(&self) -> TransactionKey {
        TransactionKey {
            date: self.date.clone(),
            description: self.description.clone(),
            amount_bits: self.amount.to_bits(),
        }
    }
}

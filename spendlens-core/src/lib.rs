//! spendlens-core: domain types shared by the statement pipeline

pub mod category;
pub mod summary;
pub mod transaction;

pub use category::Category;
pub use summary::{CategorizedSummary, CategoryTotal};
pub use transaction::{Transaction, TransactionKey};

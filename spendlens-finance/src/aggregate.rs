//! Aggregator: folds labeled transactions into per-category totals.

use spendlens_core::{CategorizedSummary, Category, CategoryTotal, Transaction};

/// Build the summary from (transaction, category) pairs.
///
/// Categories are ordered by total, largest first. Equal totals keep the order in
/// which their category was first encountered.
pub fn aggregate<I>(labeled: I) -> CategorizedSummary
where
    I: IntoIterator<Item = (Transaction, Category)>,
{
    let mut groups: Vec<(Category, CategoryTotal)> = Vec::new();
    let mut count = 0usize;

    for (txn, category) in labeled {
        count += 1;
        let idx = match groups.iter().position(|(c, _)| *c == category) {
            Some(i) => i,
            None => {
                groups.push((category, CategoryTotal::default()));
                groups.len() - 1
            }
        };
        let group = &mut groups[idx].1;
        group.total += txn.amount;
        group.transactions.push(txn);
    }

    // stable sort: ties stay in first-seen order
    groups.sort_by(|a, b| b.1.total.total_cmp(&a.1.total));

    let total_expenses = groups.iter().fold(0.0, |acc, (_, g)| acc + g.total);

    CategorizedSummary {
        categories: groups,
        total_expenses,
        total_transactions: count,
    }
}

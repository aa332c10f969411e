use serde::Serialize;

use super::money::Money;
use super::transaction::Transaction;

/// Which side of the export a summary totals. The original dashboard split
/// the batch the same way: expenses are the debit rows, payments the credits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Debit,
    Credit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Money,
}

/// Groups a categorized batch by category and totals the selected flow.
///
/// Sorted by total descending, ties broken by name ascending. Every category
/// present in the batch appears, including zero totals; callers wanting only
/// spending rows can filter on `total.is_positive()`.
pub fn summarize(transactions: &[Transaction], flow: Flow) -> Vec<CategoryTotal> {
    let mut totals: Vec<CategoryTotal> = Vec::new();

    for tx in transactions {
        let amount = match flow {
            Flow::Debit => tx.debit,
            Flow::Credit => tx.credit,
        };
        match totals.iter_mut().find(|t| t.category == tx.category) {
            Some(entry) => entry.total = entry.total + amount,
            None => totals.push(CategoryTotal {
                category: tx.category.clone(),
                total: amount,
            }),
        }
    }

    totals.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));
    totals
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::category::{KeywordIndex, RuleSet, UNCATEGORISED};
use super::money::Money;

/// One row of a bank export. Loaded fresh on every import; only `category`
/// is mutated afterwards, and nothing is ever written back to the export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// None when the export field was absent or unparsable.
    pub date: Option<NaiveDate>,
    pub narrative: String,
    pub debit: Money,
    pub credit: Money,
    pub category: String,
}

impl Transaction {
    pub fn new(
        date: Option<NaiveDate>,
        narrative: impl Into<String>,
        debit: Money,
        credit: Money,
    ) -> Self {
        Transaction {
            date,
            narrative: narrative.into(),
            debit,
            credit,
            category: UNCATEGORISED.to_string(),
        }
    }

    pub fn is_expense(&self) -> bool {
        self.debit.is_positive()
    }

    pub fn is_payment(&self) -> bool {
        self.credit.is_positive()
    }
}

/// Stamps every transaction's category from the rule set.
///
/// Re-running after a rule mutation is the intended refresh path: the pass
/// is deterministic in (transactions, rules) and overwrites any previous
/// assignment. Amounts are never consulted, only the narrative.
pub fn categorize(transactions: &mut [Transaction], rules: &RuleSet) {
    let index = KeywordIndex::build(rules);
    for tx in transactions.iter_mut() {
        tx.category = index
            .category_for(&tx.narrative)
            .unwrap_or(UNCATEGORISED)
            .to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(narrative: &str) -> Transaction {
        Transaction::new(
            NaiveDate::from_ymd_opt(2025, 5, 9),
            narrative,
            Money::from_cents(1000),
            Money::zero(),
        )
    }

    fn rules(entries: &[(&str, &[&str])]) -> RuleSet {
        let mut rules = RuleSet::default();
        for (name, keywords) in entries {
            rules.create_category(name).unwrap();
            for kw in *keywords {
                rules.add_keyword(name, kw).unwrap();
            }
        }
        rules
    }

    #[test]
    fn matching_narrative_gets_the_category() {
        let rules = rules(&[("Groceries", &["coles"])]);
        let mut txs = vec![tx("Coles")];
        categorize(&mut txs, &rules);
        assert_eq!(txs[0].category, "Groceries");
    }

    #[test]
    fn non_matching_narrative_stays_uncategorised() {
        let rules = rules(&[("Groceries", &["coles"])]);
        let mut txs = vec![tx("ALDI STORE 42")];
        categorize(&mut txs, &rules);
        assert_eq!(txs[0].category, UNCATEGORISED);
    }

    #[test]
    fn substring_of_keyword_does_not_match() {
        // "woolworths 123" != "woolworths": whole-narrative equality only.
        let rules = rules(&[("Groceries", &["woolworths"])]);
        let mut txs = vec![tx("WOOLWORTHS 123")];
        categorize(&mut txs, &rules);
        assert_eq!(txs[0].category, UNCATEGORISED);
    }

    #[test]
    fn recategorize_overwrites_previous_assignment() {
        let mut txs = vec![tx("Coles")];
        categorize(&mut txs, &rules(&[("Groceries", &["coles"])]));
        assert_eq!(txs[0].category, "Groceries");

        // Same batch against a ruleset that no longer knows the keyword.
        categorize(&mut txs, &RuleSet::default());
        assert_eq!(txs[0].category, UNCATEGORISED);
    }

    #[test]
    fn categorize_is_deterministic() {
        let rules = rules(&[("Groceries", &["coles"]), ("Dining", &["coles", "kfc"])]);
        let mut a = vec![tx("coles"), tx("kfc"), tx("unknown")];
        let mut b = a.clone();
        categorize(&mut a, &rules);
        categorize(&mut b, &rules);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.category, y.category);
        }
        assert_eq!(a[0].category, "Groceries");
        assert_eq!(a[1].category, "Dining");
    }

    #[test]
    fn empty_narrative_matches_nothing() {
        let rules = rules(&[("Groceries", &["coles"])]);
        let mut txs = vec![tx("")];
        categorize(&mut txs, &rules);
        assert_eq!(txs[0].category, UNCATEGORISED);
    }

    #[test]
    fn expense_and_payment_flags() {
        let expense = Transaction::new(None, "x", Money::from_cents(500), Money::zero());
        assert!(expense.is_expense());
        assert!(!expense.is_payment());

        let payment = Transaction::new(None, "y", Money::zero(), Money::from_cents(500));
        assert!(payment.is_payment());
        assert!(!payment.is_expense());
    }
}

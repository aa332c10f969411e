pub mod category;
pub mod money;
pub mod summary;
pub mod transaction;

pub use category::{KeywordIndex, RuleError, RuleSet, UNCATEGORISED};
pub use money::Money;
pub use summary::{summarize, CategoryTotal, Flow};
pub use transaction::{categorize, Transaction};

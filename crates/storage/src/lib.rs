pub mod file;

pub use file::{RuleStore, StoreError};

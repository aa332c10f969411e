use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Reserved fallback category. Always present in a rule set, never matched
/// against, never deleted.
pub const UNCATEGORISED: &str = "Uncategorised";

/// Shared normalization for keywords and narratives. Matching and learning
/// must agree on this or a learned rule would never re-match.
pub(crate) fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("Category name must not be blank")]
    EmptyCategoryName,
    #[error("Unknown category: {0}")]
    UnknownCategory(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Category {
    name: String,
    keywords: Vec<String>,
}

/// User-editable mapping from category name to keyword list.
///
/// Insertion order is meaningful: when a keyword appears under more than one
/// category, the earliest category wins. Names are case-sensitive and unique;
/// keywords are stored normalized and deduplicated within a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    categories: Vec<Category>,
}

impl Default for RuleSet {
    fn default() -> Self {
        RuleSet {
            categories: vec![Category {
                name: UNCATEGORISED.to_string(),
                keywords: Vec::new(),
            }],
        }
    }
}

impl RuleSet {
    /// Appends the reserved category if a loaded set lacks it.
    pub fn ensure_reserved(&mut self) {
        if !self.contains(UNCATEGORISED) {
            self.categories.push(Category {
                name: UNCATEGORISED.to_string(),
                keywords: Vec::new(),
            });
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.categories.iter().any(|c| c.name == name)
    }

    /// Category names with their keyword lists, in insertion order.
    pub fn categories(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.categories
            .iter()
            .map(|c| (c.name.as_str(), c.keywords.as_slice()))
    }

    pub fn keywords(&self, name: &str) -> Option<&[String]> {
        self.categories
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.keywords.as_slice())
    }

    /// Inserts an empty category. Returns `Ok(false)` if `name` already
    /// exists (the call is a no-op), `Ok(true)` if it was created. Blank
    /// names are rejected without touching the set.
    pub fn create_category(&mut self, name: &str) -> Result<bool, RuleError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RuleError::EmptyCategoryName);
        }
        if self.contains(name) {
            return Ok(false);
        }
        self.categories.push(Category {
            name: name.to_string(),
            keywords: Vec::new(),
        });
        Ok(true)
    }

    /// Records a manual correction: the normalized `narrative` becomes a
    /// keyword of `category`. Returns `Ok(false)` when there is nothing to
    /// learn (blank narrative, or the keyword is already present), so a
    /// repeated correction mutates the set at most once. The category must
    /// already exist; corrections never create categories as a side effect.
    pub fn add_keyword(&mut self, category: &str, narrative: &str) -> Result<bool, RuleError> {
        let cat = self
            .categories
            .iter_mut()
            .find(|c| c.name == category)
            .ok_or_else(|| RuleError::UnknownCategory(category.to_string()))?;

        let keyword = normalize(narrative);
        if keyword.is_empty() || cat.keywords.iter().any(|k| normalize(k) == keyword) {
            return Ok(false);
        }
        cat.keywords.push(keyword);
        Ok(true)
    }
}

// The persisted form is a single JSON object, name -> keyword array, exactly
// as the rules file has always been written. A derived map type would lose
// insertion order, which carries the match precedence, so (de)serialization
// goes through the ordered Vec by hand.
impl Serialize for RuleSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.categories.len()))?;
        for cat in &self.categories {
            map.serialize_entry(&cat.name, &cat.keywords)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RuleSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RuleSetVisitor;

        impl<'de> Visitor<'de> for RuleSetVisitor {
            type Value = RuleSet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of category name to keyword list")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<RuleSet, A::Error> {
                let mut categories = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, keywords)) = access.next_entry::<String, Vec<String>>()? {
                    categories.push(Category { name, keywords });
                }
                Ok(RuleSet { categories })
            }
        }

        deserializer.deserialize_map(RuleSetVisitor)
    }
}

/// Normalized keyword -> category lookup, built once per categorization pass.
///
/// Ties across categories are resolved at build time: the first category in
/// rule-set order claims the keyword and later occurrences are ignored.
pub struct KeywordIndex {
    map: HashMap<String, String>,
}

impl KeywordIndex {
    pub fn build(rules: &RuleSet) -> Self {
        let mut map = HashMap::new();
        for (name, keywords) in rules.categories() {
            if name == UNCATEGORISED || keywords.is_empty() {
                continue;
            }
            for keyword in keywords {
                let keyword = normalize(keyword);
                if keyword.is_empty() {
                    continue;
                }
                map.entry(keyword).or_insert_with(|| name.to_string());
            }
        }
        KeywordIndex { map }
    }

    /// Full-string match on the normalized narrative; substrings never hit.
    pub fn category_for(&self, narrative: &str) -> Option<&str> {
        let needle = normalize(narrative);
        if needle.is_empty() {
            return None;
        }
        self.map.get(&needle).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ruleset(entries: &[(&str, &[&str])]) -> RuleSet {
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
    fn default_has_only_reserved_category() {
        let rules = RuleSet::default();
        assert!(rules.contains(UNCATEGORISED));
        assert_eq!(rules.categories().count(), 1);
    }

    #[test]
    fn create_category_rejects_blank_names() {
        let mut rules = RuleSet::default();
        assert_eq!(rules.create_category(""), Err(RuleError::EmptyCategoryName));
        assert_eq!(
            rules.create_category("   "),
            Err(RuleError::EmptyCategoryName)
        );
        assert_eq!(rules.categories().count(), 1);
    }

    #[test]
    fn create_category_is_idempotent() {
        let mut rules = RuleSet::default();
        assert_eq!(rules.create_category("Groceries"), Ok(true));
        assert_eq!(rules.create_category("Groceries"), Ok(false));
        assert_eq!(rules.categories().count(), 2);
    }

    #[test]
    fn create_category_trims_name() {
        let mut rules = RuleSet::default();
        rules.create_category("  Groceries  ").unwrap();
        assert!(rules.contains("Groceries"));
    }

    #[test]
    fn category_names_are_case_sensitive() {
        let mut rules = RuleSet::default();
        assert_eq!(rules.create_category("Groceries"), Ok(true));
        assert_eq!(rules.create_category("groceries"), Ok(true));
    }

    #[test]
    fn add_keyword_normalizes_and_dedupes() {
        let mut rules = ruleset(&[("Groceries", &[])]);
        assert_eq!(rules.add_keyword("Groceries", "  COLES  "), Ok(true));
        assert_eq!(rules.keywords("Groceries").unwrap(), ["coles"]);
        // Same correction again, differently cased: nothing to learn.
        assert_eq!(rules.add_keyword("Groceries", "Coles"), Ok(false));
        assert_eq!(rules.keywords("Groceries").unwrap(), ["coles"]);
    }

    #[test]
    fn add_keyword_rejects_blank_narrative() {
        let mut rules = ruleset(&[("Groceries", &[])]);
        assert_eq!(rules.add_keyword("Groceries", "   "), Ok(false));
        assert!(rules.keywords("Groceries").unwrap().is_empty());
    }

    #[test]
    fn add_keyword_unknown_category_errors_without_mutation() {
        let mut rules = RuleSet::default();
        let before = rules.clone();
        assert_eq!(
            rules.add_keyword("Dining", "coles"),
            Err(RuleError::UnknownCategory("Dining".to_string()))
        );
        assert_eq!(rules, before);
    }

    #[test]
    fn index_skips_reserved_and_empty_categories() {
        let rules = ruleset(&[("Empty", &[]), ("Groceries", &["coles"])]);
        let index = KeywordIndex::build(&rules);
        assert_eq!(index.category_for("coles"), Some("Groceries"));
        assert_eq!(index.category_for(""), None);
    }

    #[test]
    fn first_category_in_order_wins_shared_keyword() {
        let rules = ruleset(&[("Groceries", &["coles"]), ("Dining", &["coles"])]);
        let index = KeywordIndex::build(&rules);
        assert_eq!(index.category_for("coles"), Some("Groceries"));
    }

    #[test]
    fn match_is_exact_not_substring() {
        let rules = ruleset(&[("Groceries", &["woolworths"])]);
        let index = KeywordIndex::build(&rules);
        assert_eq!(index.category_for("WOOLWORTHS 123"), None);
        assert_eq!(index.category_for("woolworths"), Some("Groceries"));
    }

    #[test]
    fn match_is_case_insensitive_and_trimmed() {
        let rules = ruleset(&[("Groceries", &["coles"])]);
        let index = KeywordIndex::build(&rules);
        assert_eq!(index.category_for("  Coles "), Some("Groceries"));
    }

    #[test]
    fn serializes_as_ordered_json_object() {
        let rules = ruleset(&[("Groceries", &["coles"]), ("Transport", &["opal"])]);
        let json = serde_json::to_string(&rules).unwrap();
        assert_eq!(
            json,
            r#"{"Uncategorised":[],"Groceries":["coles"],"Transport":["opal"]}"#
        );
    }

    #[test]
    fn json_round_trip_is_a_fixed_point() {
        let rules = ruleset(&[("Transport", &["opal", "uber"]), ("Groceries", &["coles"])]);
        let first = serde_json::to_string(&rules).unwrap();
        let reloaded: RuleSet = serde_json::from_str(&first).unwrap();
        assert_eq!(serde_json::to_string(&reloaded).unwrap(), first);
        assert_eq!(reloaded, rules);
    }

    #[test]
    fn ensure_reserved_appends_when_missing() {
        let mut rules: RuleSet = serde_json::from_str(r#"{"Groceries":["coles"]}"#).unwrap();
        assert!(!rules.contains(UNCATEGORISED));
        rules.ensure_reserved();
        assert!(rules.contains(UNCATEGORISED));
        // First category keeps match precedence.
        assert_eq!(rules.categories().next().unwrap().0, "Groceries");
    }
}

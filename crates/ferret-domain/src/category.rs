//! Category module - ranked rules mapping article text to a category

use crate::error::StoreError;
use regex::{Regex, RegexBuilder};

/// A category assignment rule
///
/// Rules are evaluated in ascending `rank`; the first rule whose pattern is
/// found anywhere in the article text decides the category.
#[derive(Debug, Clone)]
pub struct CategoryRule {
    /// Category identifier
    pub category_id: i64,

    /// Case-insensitive search pattern
    pub pattern: Regex,

    /// Evaluation order, lowest first
    pub rank: i32,
}

impl CategoryRule {
    /// Compile a stored rule
    ///
    /// # Examples
    ///
    /// ```
    /// use ferret_domain::CategoryRule;
    ///
    /// let rule = CategoryRule::compile(4, "ransom(ware)?", 1).unwrap();
    /// assert!(rule.matches("New RANSOMWARE strain spotted"));
    /// ```
    pub fn compile(category_id: i64, pattern: &str, rank: i32) -> Result<Self, StoreError> {
        let pattern = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| {
                StoreError::InvalidData(format!("Bad category pattern '{}': {}", pattern, e))
            })?;
        Ok(Self {
            category_id,
            pattern,
            rank,
        })
    }

    /// Whether the pattern occurs anywhere in `text`
    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    /// First rule of `rules` that matches `text`
    ///
    /// `rules` must already be in ascending rank order, as loaded by the
    /// category engine; the first match is then the lowest-ranked one.
    pub fn first_match<'a>(rules: &'a [CategoryRule], text: &str) -> Option<&'a CategoryRule> {
        rules.iter().find(|rule| rule.matches(text))
    }
}

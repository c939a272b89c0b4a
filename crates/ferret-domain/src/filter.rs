//! Filter module - type-scoped patterns that suppress indicators

use crate::error::StoreError;
use crate::indicator::IndicatorCandidate;
use regex::Regex;
use std::collections::HashMap;

/// A compiled filter pattern for one indicator type
#[derive(Debug, Clone)]
pub struct FilterPattern {
    /// Indicator type id the pattern applies to
    pub type_id: i32,

    /// Pattern anchored at both ends
    pub pattern: Regex,
}

impl FilterPattern {
    /// Compile a stored pattern
    ///
    /// The pattern is wrapped in `^(?:...)$` so that it only ever matches a
    /// whole indicator value; a pattern matching only part of a value does
    /// not filter it.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferret_domain::FilterPattern;
    ///
    /// let filter = FilterPattern::compile(2, r"example\.com").unwrap();
    /// assert!(filter.matches("example.com"));
    /// assert!(!filter.matches("www.example.com"));
    /// ```
    pub fn compile(type_id: i32, pattern: &str) -> Result<Self, StoreError> {
        let anchored = format!("^(?:{})$", pattern);
        let pattern = Regex::new(&anchored).map_err(|e| {
            StoreError::InvalidData(format!("Bad filter pattern '{}': {}", pattern, e))
        })?;
        Ok(Self { type_id, pattern })
    }

    /// Whether the pattern matches the whole value
    pub fn matches(&self, value: &str) -> bool {
        self.pattern.is_match(value)
    }
}

/// Filter patterns grouped by indicator type id
///
/// A type with no entry has no filters; looking it up yields an empty slice.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    by_type: HashMap<i32, Vec<Regex>>,
}

impl FilterSet {
    /// Group patterns by their type id
    pub fn new(patterns: impl IntoIterator<Item = FilterPattern>) -> Self {
        let mut by_type: HashMap<i32, Vec<Regex>> = HashMap::new();
        for filter in patterns {
            by_type.entry(filter.type_id).or_default().push(filter.pattern);
        }
        Self { by_type }
    }

    /// Patterns registered for a type
    pub fn patterns_for(&self, type_id: i32) -> &[Regex] {
        self.by_type.get(&type_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether any pattern of the candidate's type matches its whole value
    pub fn is_filtered(&self, candidate: &IndicatorCandidate) -> bool {
        self.patterns_for(candidate.type_id)
            .iter()
            .any(|pattern| pattern.is_match(&candidate.value))
    }

    /// Total number of patterns
    pub fn len(&self) -> usize {
        self.by_type.values().map(Vec::len).sum()
    }

    /// Whether the set holds no patterns
    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }
}

impl FromIterator<FilterPattern> for FilterSet {
    fn from_iter<I: IntoIterator<Item = FilterPattern>>(iter: I) -> Self {
        Self::new(iter)
    }
}

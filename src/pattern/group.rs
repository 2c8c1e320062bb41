//! Ordered bundles of timestamp-patterns and data-patterns.

use super::regex_pattern::RegexPattern;

/// A named collection of timestamp-patterns plus data-patterns.
///
/// Both lists are order-significant: the loader evaluates timestamp
/// patterns in declared order and uses the first that matches. Built
/// once via [`PatternGroupBuilder`] and treated as immutable afterwards.
#[derive(Debug)]
pub struct PatternGroup {
    name: String,
    patterns: Vec<RegexPattern>,
    ts_patterns: Vec<RegexPattern>,
}

impl PatternGroup {
    /// Group name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Data patterns in declared order.
    #[must_use]
    pub fn patterns(&self) -> &[RegexPattern] {
        &self.patterns
    }

    /// Timestamp patterns in declared order.
    #[must_use]
    pub fn ts_patterns(&self) -> &[RegexPattern] {
        &self.ts_patterns
    }

    /// Run the self-tests of every data pattern.
    ///
    /// Returns the aggregate `(passed, total)` over all patterns.
    pub fn run_tests(&self) -> (usize, usize) {
        let mut passed = 0;
        let mut total = 0;
        for pattern in &self.patterns {
            let (p, t) = pattern.run_tests();
            passed += p;
            total += t;
        }
        (passed, total)
    }
}

/// Builder assembling a [`PatternGroup`].
#[derive(Debug)]
pub struct PatternGroupBuilder {
    group: PatternGroup,
}

impl PatternGroupBuilder {
    /// Start building a group named `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            group: PatternGroup {
                name: name.into(),
                patterns: Vec::new(),
                ts_patterns: Vec::new(),
            },
        }
    }

    /// Append a data pattern.
    #[must_use]
    pub fn add_pattern(mut self, pattern: RegexPattern) -> Self {
        self.group.patterns.push(pattern);
        self
    }

    /// Append a timestamp pattern.
    #[must_use]
    pub fn add_ts_pattern(mut self, pattern: RegexPattern) -> Self {
        self.group.ts_patterns.push(pattern);
        self
    }

    /// Replace all data patterns.
    #[must_use]
    pub fn set_patterns(mut self, patterns: Vec<RegexPattern>) -> Self {
        self.group.patterns = patterns;
        self
    }

    /// Replace all timestamp patterns.
    #[must_use]
    pub fn set_ts_patterns(mut self, ts_patterns: Vec<RegexPattern>) -> Self {
        self.group.ts_patterns = ts_patterns;
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> PatternGroup {
        self.group
    }
}

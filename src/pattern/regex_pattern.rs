//! Named regex extractor producing a typed field map from one line.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use regex::Regex;

use crate::point::{FieldMap, FieldValue, TagSpec};

use super::transform::Transform;

/// Scalar type a captured field converts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Signed integer.
    Int,
    /// Floating point.
    Float,
    /// Verbatim text.
    Str,
}

impl FieldKind {
    /// Convert a captured string to this kind, if it parses.
    pub(crate) fn convert(self, raw: &str) -> Option<FieldValue> {
        match self {
            Self::Int => raw.trim().parse().ok().map(FieldValue::Int),
            Self::Float => raw.trim().parse().ok().map(FieldValue::Float),
            Self::Str => Some(FieldValue::Str(raw.to_string())),
        }
    }
}

/// A named, versioned regex matcher with typed field extraction.
///
/// The regex is compiled once, on first use, and reused for every
/// subsequent line. A successful match requires the captured group count
/// to equal the declared field count; any mismatch yields no result.
/// A field whose captured text fails conversion is dropped from the
/// result while the rest of the match survives.
pub struct RegexPattern {
    name: String,
    version: String,
    pattern: String,
    fields: Vec<(String, FieldKind)>,
    tags: Vec<TagSpec>,
    transforms: Vec<Box<dyn Transform>>,
    tests: Vec<String>,
    regex: OnceLock<Option<Regex>>,
    match_count: AtomicU64,
}

impl RegexPattern {
    /// Create a pattern named `name` matching `pattern`.
    #[must_use]
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: String::new(),
            pattern: pattern.into(),
            fields: Vec::new(),
            tags: Vec::new(),
            transforms: Vec::new(),
            tests: Vec::new(),
            regex: OnceLock::new(),
            match_count: AtomicU64::new(0),
        }
    }

    /// Declare the next captured group as field `name` of kind `kind`.
    ///
    /// Declaration order must follow capture-group order.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push((name.into(), kind));
        self
    }

    /// Mark field `field` as doubling as the indexed tag `tag`.
    #[must_use]
    pub fn with_tag(mut self, field: impl Into<String>, tag: impl Into<String>) -> Self {
        self.tags.push(TagSpec::new(field, tag));
        self
    }

    /// Set the pattern version, making the unique id `name@version`.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Append a post-match transform.
    #[must_use]
    pub fn with_transform(mut self, transform: Box<dyn Transform>) -> Self {
        self.transforms.push(transform);
        self
    }

    /// Store a sample line for [`RegexPattern::run_tests`].
    #[must_use]
    pub fn with_test(mut self, line: impl Into<String>) -> Self {
        self.tests.push(line.into());
        self
    }

    /// Pattern name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pattern version, empty when unversioned.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Unique id: `name`, or `name@version` when versioned.
    #[must_use]
    pub fn unique_id(&self) -> String {
        if self.version.is_empty() {
            self.name.clone()
        } else {
            format!("{}@{}", self.name, self.version)
        }
    }

    /// Tag associations declared on this pattern.
    #[must_use]
    pub fn tags(&self) -> &[TagSpec] {
        &self.tags
    }

    /// Declared fields in capture-group order.
    #[must_use]
    pub fn fields(&self) -> &[(String, FieldKind)] {
        &self.fields
    }

    /// Number of successful matches over the life of this pattern.
    #[must_use]
    pub fn match_count(&self) -> u64 {
        self.match_count.load(Ordering::Relaxed)
    }

    fn regex(&self) -> Option<&Regex> {
        self.regex
            .get_or_init(|| match Regex::new(&self.pattern) {
                Ok(re) => Some(re),
                Err(error) => {
                    tracing::warn!(
                        pattern = %self.unique_id(),
                        %error,
                        "invalid regex, pattern disabled"
                    );
                    None
                }
            })
            .as_ref()
    }

    /// Match one line, returning the extracted field map.
    ///
    /// Returns `None` when the regex does not hit or the captured group
    /// count differs from the declared field count. Fields that fail
    /// conversion are logged and dropped; the remaining fields are still
    /// returned. The match counter increments exactly once per
    /// successful match, before transforms run.
    #[must_use]
    pub fn match_line(&self, line: &str) -> Option<FieldMap> {
        let re = self.regex()?;

        // A regex with capture groups contributes its groups; one
        // without contributes every non-overlapping full match.
        let captured: Vec<&str> = if re.captures_len() > 1 {
            let caps = re.captures(line)?;
            (1..caps.len())
                .map(|i| caps.get(i).map_or("", |m| m.as_str()))
                .collect()
        } else {
            re.find_iter(line).map(|m| m.as_str()).collect()
        };

        if captured.is_empty() || captured.len() != self.fields.len() {
            return None;
        }

        let mut fields = FieldMap::new();
        for ((name, kind), raw) in self.fields.iter().zip(&captured) {
            match kind.convert(raw) {
                Some(value) => {
                    fields.insert(name.clone(), value);
                }
                None => {
                    tracing::warn!(
                        pattern = %self.unique_id(),
                        field = %name,
                        value = %raw,
                        "field conversion failed, dropping field"
                    );
                }
            }
        }

        self.match_count.fetch_add(1, Ordering::Relaxed);

        for transform in &self.transforms {
            fields = transform.transform(&self.name, fields);
        }
        Some(fields)
    }

    /// Replay the stored sample lines through [`RegexPattern::match_line`].
    ///
    /// Returns `(passed, total)`; a sample passes when it yields a
    /// non-empty field map. Meant for pattern authoring validation, not
    /// the runtime hot path.
    pub fn run_tests(&self) -> (usize, usize) {
        let passed = self
            .tests
            .iter()
            .filter(|line| self.match_line(line).is_some_and(|m| !m.is_empty()))
            .count();
        tracing::info!(
            pattern = %self.unique_id(),
            passed,
            total = self.tests.len(),
            "pattern self-test finished"
        );
        (passed, self.tests.len())
    }
}

impl fmt::Debug for RegexPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegexPattern")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("pattern", &self.pattern)
            .field("fields", &self.fields)
            .field("tags", &self.tags)
            .field("match_count", &self.match_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::FieldValue;

    fn ab_pattern() -> RegexPattern {
        RegexPattern::new("ab", r"(\d+),(\d+)")
            .with_field("a", FieldKind::Int)
            .with_field("b", FieldKind::Int)
    }

    #[test]
    fn test_match_extracts_typed_fields() {
        let p = ab_pattern();
        let fields = p.match_line("prefix 1234,1 suffix").unwrap();
        assert_eq!(fields.get("a"), Some(&FieldValue::Int(1234)));
        assert_eq!(fields.get("b"), Some(&FieldValue::Int(1)));
        assert_eq!(p.match_count(), 1);
    }

    #[test]
    fn test_no_hit_returns_none() {
        let p = ab_pattern();
        assert!(p.match_line("nothing to see").is_none());
        assert_eq!(p.match_count(), 0);
    }

    #[test]
    fn test_group_count_mismatch_returns_none() {
        // Three capture groups, two declared fields.
        let p = RegexPattern::new("bad", r"(\d+),(\d+),(\d+)")
            .with_field("a", FieldKind::Int)
            .with_field("b", FieldKind::Int);
        assert!(p.match_line("1,2,3").is_none());
        assert_eq!(p.match_count(), 0);
    }

    #[test]
    fn test_conversion_failure_drops_field_only() {
        let p = RegexPattern::new("mixed", r"(\w+)=(\d+\.\d+)")
            .with_field("count", FieldKind::Int)
            .with_field("ratio", FieldKind::Float);
        // "loss" does not parse as an integer, "0.25" does as a float.
        let fields = p.match_line("loss=0.25").unwrap();
        assert!(!fields.contains_key("count"));
        assert_eq!(fields.get("ratio"), Some(&FieldValue::Float(0.25)));
        assert_eq!(p.match_count(), 1);
    }

    #[test]
    fn test_match_is_idempotent_in_value() {
        let p = ab_pattern();
        let first = p.match_line("7,8").unwrap();
        let second = p.match_line("7,8").unwrap();
        assert_eq!(first, second);
        assert_eq!(p.match_count(), 2);
    }

    #[test]
    fn test_groupless_regex_uses_full_matches() {
        let p = RegexPattern::new("word", r"[a-z]+").with_field("word", FieldKind::Str);
        let fields = p.match_line("hello").unwrap();
        assert_eq!(fields.get("word"), Some(&FieldValue::Str("hello".into())));

        // Two full matches against one declared field: no result.
        assert!(p.match_line("hello world").is_none());
    }

    #[test]
    fn test_invalid_regex_never_matches() {
        let p = RegexPattern::new("broken", r"(\d+").with_field("a", FieldKind::Int);
        assert!(p.match_line("123").is_none());
        assert!(p.match_line("123").is_none());
        assert_eq!(p.match_count(), 0);
    }

    #[test]
    fn test_unique_id_with_and_without_version() {
        assert_eq!(ab_pattern().unique_id(), "ab");
        assert_eq!(ab_pattern().with_version("1.0").unique_id(), "ab@1.0");
    }

    #[test]
    fn test_transforms_run_in_order() {
        let p = RegexPattern::new("t", r"(\d+)")
            .with_field("a", FieldKind::Int)
            .with_transform(Box::new(|_: &str, mut f: FieldMap| {
                f.insert("a".to_string(), FieldValue::Int(10));
                f
            }))
            .with_transform(Box::new(|_: &str, mut f: FieldMap| {
                if let Some(FieldValue::Int(v)) = f.get("a").cloned() {
                    f.insert("a".to_string(), FieldValue::Int(v + 1));
                }
                f
            }));

        let fields = p.match_line("5").unwrap();
        assert_eq!(fields.get("a"), Some(&FieldValue::Int(11)));
        assert_eq!(p.match_count(), 1);
    }

    #[test]
    fn test_run_tests_counts_non_empty_results() {
        let p = RegexPattern::new("ab", r"(\d+),(\d+)")
            .with_field("a", FieldKind::Int)
            .with_field("b", FieldKind::Int)
            .with_test("1,2")
            .with_test("no match here")
            .with_test("30,40");
        assert_eq!(p.run_tests(), (2, 3));
    }
}

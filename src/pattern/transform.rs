//! Post-match field transforms.

use crate::point::FieldMap;

/// Capability for reshaping a matched field map before it leaves the
/// pattern.
///
/// Transforms run in registration order, each receiving the previous
/// one's output. Stateful objects implement the trait directly; plain
/// functions and closures qualify through the blanket impl below.
pub trait Transform: Send + Sync {
    /// Transform the field map extracted by the pattern named
    /// `pattern_name`.
    fn transform(&self, pattern_name: &str, fields: FieldMap) -> FieldMap;
}

impl<F> Transform for F
where
    F: Fn(&str, FieldMap) -> FieldMap + Send + Sync,
{
    fn transform(&self, pattern_name: &str, fields: FieldMap) -> FieldMap {
        self(pattern_name, fields)
    }
}

//! Declared-schema normalization for extracted field maps.

use crate::point::{FieldMap, FieldValue};

use super::regex_pattern::FieldKind;

/// Coerce `fields` onto a declared schema.
///
/// Only fields named in the schema survive. Integer coercion routes
/// through float parsing so `"3.0"` becomes `3`; non-finite values are
/// discarded along with anything that fails to convert.
#[must_use]
pub fn normalize_fields(fields: &FieldMap, schema: &[(&str, FieldKind)]) -> FieldMap {
    let mut result = FieldMap::new();
    for (name, kind) in schema {
        let Some(value) = fields.get(*name) else {
            continue;
        };
        let normalized = match kind {
            #[allow(clippy::cast_possible_truncation)]
            FieldKind::Int => value
                .as_f64()
                .filter(|v| v.is_finite())
                .map(|v| FieldValue::Int(v as i64)),
            FieldKind::Float => value
                .as_f64()
                .filter(|v| v.is_finite())
                .map(FieldValue::Float),
            FieldKind::Str => Some(FieldValue::Str(value.to_string())),
        };
        if let Some(v) = normalized {
            result.insert((*name).to_string(), v);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_coerces_through_float() {
        let mut fields = FieldMap::new();
        fields.insert("count".to_string(), FieldValue::Str("3.0".into()));

        let out = normalize_fields(&fields, &[("count", FieldKind::Int)]);
        assert_eq!(out.get("count"), Some(&FieldValue::Int(3)));
    }

    #[test]
    fn test_undeclared_fields_are_dropped() {
        let mut fields = FieldMap::new();
        fields.insert("keep".to_string(), FieldValue::Int(1));
        fields.insert("drop".to_string(), FieldValue::Int(2));

        let out = normalize_fields(&fields, &[("keep", FieldKind::Int)]);
        assert_eq!(out.len(), 1);
        assert!(out.contains_key("keep"));
    }

    #[test]
    fn test_non_finite_values_are_discarded() {
        let mut fields = FieldMap::new();
        fields.insert("v".to_string(), FieldValue::Str("inf".into()));

        let out = normalize_fields(&fields, &[("v", FieldKind::Float)]);
        assert!(out.is_empty());
    }

    #[test]
    fn test_unconvertible_value_is_discarded() {
        let mut fields = FieldMap::new();
        fields.insert("v".to_string(), FieldValue::Str("abc".into()));

        let out = normalize_fields(&fields, &[("v", FieldKind::Int)]);
        assert!(out.is_empty());
    }
}

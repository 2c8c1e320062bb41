//! Regex pattern library for extracting typed fields from log lines.

mod group;
mod regex_pattern;
mod schema;
mod transform;

pub use group::{PatternGroup, PatternGroupBuilder};
pub use regex_pattern::{FieldKind, RegexPattern};
pub use schema::normalize_fields;
pub use transform::Transform;

//! Schema capability consumed by the form engine
//!
//! A schema describes a record as an ordered list of named properties. Each
//! property can be checked on its own, and the whole record can be parsed into
//! a typed value or a list of path-scoped violations. The engine never looks
//! inside a schema beyond this contract.

mod rules;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

pub use rules::{ObjectSchema, Property, PropertyKind};

/// Untyped record assembled from field values, keyed by field path
pub type Record = Map<String, Value>;

/// Predicate deciding whether a field's value still equals its default
pub type FieldEquality = fn(Option<&Value>, Option<&Value>) -> bool;

/// Structural equality on JSON values (`None` only equals `None`)
pub fn structural_eq(a: Option<&Value>, b: Option<&Value>) -> bool {
    a == b
}

/// A single schema rule violation attributed to a field path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Field path, or empty for record-level violations
    pub path: String,
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Violation not attributed to any property
    pub fn record(message: impl Into<String>) -> Self {
        Self::new(String::new(), message)
    }
}

/// Structural contract for a record, queryable per property or as a whole
#[async_trait]
pub trait Schema: Send + Sync {
    /// Typed record produced by a successful whole-record parse
    type Output: Send + Sync + 'static;

    /// Property names in declaration order
    fn properties(&self) -> Vec<String>;

    /// Check one property's value in isolation
    async fn parse_property(&self, name: &str, value: Option<&Value>) -> Result<(), Vec<String>>;

    /// Parse the whole record
    async fn parse_all(&self, record: &Record) -> Result<Self::Output, Vec<Violation>>;

    /// Equality used for dirty tracking of a property
    fn equality(&self, _name: &str) -> FieldEquality {
        structural_eq
    }

    /// Display label of a property; fields fall back to the property name
    fn label(&self, _name: &str) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_structural_eq_compares_nested_values() {
        let a = json!({"tags": ["a", "b"]});
        let b = json!({"tags": ["a", "b"]});
        let c = json!({"tags": ["b", "a"]});
        assert!(structural_eq(Some(&a), Some(&b)));
        assert!(!structural_eq(Some(&a), Some(&c)));
    }

    #[test]
    fn test_structural_eq_undefined() {
        assert!(structural_eq(None, None));
        assert!(!structural_eq(None, Some(&Value::Null)));
    }

    #[test]
    fn test_record_violation_has_empty_path() {
        let v = Violation::record("missing field `name`");
        assert!(v.path.is_empty());
        assert_eq!(v.message, "missing field `name`");
    }
}

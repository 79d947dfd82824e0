//! Declarative object schemas built from per-property rules

use super::{structural_eq, FieldEquality, Record, Schema, Violation};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;

/// JSON shape a property accepts
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKind {
    String,
    Number,
    Boolean,
    Array,
    /// A string restricted to a fixed set of values
    Enumeration(Vec<String>),
}

impl PropertyKind {
    fn label(&self) -> &'static str {
        match self {
            PropertyKind::String | PropertyKind::Enumeration(_) => "string",
            PropertyKind::Number => "number",
            PropertyKind::Boolean => "boolean",
            PropertyKind::Array => "array",
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            PropertyKind::String | PropertyKind::Enumeration(_) => value.is_string(),
            PropertyKind::Number => value.is_number(),
            PropertyKind::Boolean => value.is_boolean(),
            PropertyKind::Array => value.is_array(),
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn looks_like_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        && !s.chars().any(char::is_whitespace)
}

#[derive(Debug, Clone)]
enum Check {
    MinLen(usize, String),
    MaxLen(usize, String),
    Email(String),
    Min(f64, String),
    Max(f64, String),
}

impl Check {
    /// Message for a failed check; checks that don't apply to the value pass
    fn violation(&self, value: &Value) -> Option<&str> {
        let length = match value {
            Value::String(s) => Some(s.chars().count()),
            Value::Array(items) => Some(items.len()),
            _ => None,
        };
        let failed = match self {
            Check::MinLen(min, _) => length.is_some_and(|len| len < *min),
            Check::MaxLen(max, _) => length.is_some_and(|len| len > *max),
            Check::Email(_) => value.as_str().is_some_and(|s| !looks_like_email(s)),
            Check::Min(min, _) => value.as_f64().is_some_and(|n| n < *min),
            Check::Max(max, _) => value.as_f64().is_some_and(|n| n > *max),
        };
        if !failed {
            return None;
        }
        match self {
            Check::MinLen(_, m)
            | Check::MaxLen(_, m)
            | Check::Email(m)
            | Check::Min(_, m)
            | Check::Max(_, m) => Some(m),
        }
    }
}

/// One named property of an object schema
#[derive(Clone)]
pub struct Property {
    name: String,
    label: Option<String>,
    kind: PropertyKind,
    checks: Vec<Check>,
    optional: bool,
    default: Option<Value>,
    equality: FieldEquality,
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("kind", &self.kind)
            .field("checks", &self.checks)
            .field("optional", &self.optional)
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}

impl Property {
    fn new(name: &str, kind: PropertyKind) -> Self {
        Self {
            name: name.to_string(),
            label: None,
            kind,
            checks: Vec::new(),
            optional: false,
            default: None,
            equality: structural_eq,
        }
    }

    pub fn string(name: &str) -> Self {
        Self::new(name, PropertyKind::String)
    }

    pub fn number(name: &str) -> Self {
        Self::new(name, PropertyKind::Number)
    }

    pub fn boolean(name: &str) -> Self {
        Self::new(name, PropertyKind::Boolean)
    }

    pub fn array(name: &str) -> Self {
        Self::new(name, PropertyKind::Array)
    }

    pub fn enumeration<I, V>(name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self::new(
            name,
            PropertyKind::Enumeration(values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    /// Minimum length in characters (strings) or items (arrays)
    pub fn min_len(mut self, min: usize, message: &str) -> Self {
        self.checks.push(Check::MinLen(min, message.to_string()));
        self
    }

    /// Maximum length in characters (strings) or items (arrays)
    pub fn max_len(mut self, max: usize, message: &str) -> Self {
        self.checks.push(Check::MaxLen(max, message.to_string()));
        self
    }

    pub fn email(mut self, message: &str) -> Self {
        self.checks.push(Check::Email(message.to_string()));
        self
    }

    pub fn min(mut self, min: f64, message: &str) -> Self {
        self.checks.push(Check::Min(min, message.to_string()));
        self
    }

    pub fn max(mut self, max: f64, message: &str) -> Self {
        self.checks.push(Check::Max(max, message.to_string()));
        self
    }

    /// Allow the property to be undefined
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Value substituted when the property is undefined
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Equality used for dirty tracking instead of structural comparison
    pub fn with_equality(mut self, equality: FieldEquality) -> Self {
        self.equality = equality;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &PropertyKind {
        &self.kind
    }

    /// Check a value against this property's rules
    pub fn check(&self, value: Option<&Value>) -> Result<(), Vec<String>> {
        let Some(value) = value else {
            return if self.optional || self.default.is_some() {
                Ok(())
            } else {
                Err(vec!["Required".to_string()])
            };
        };

        if !self.kind.accepts(value) {
            return Err(vec![format!(
                "Expected {}, received {}",
                self.kind.label(),
                value_kind(value)
            )]);
        }

        let mut messages = Vec::new();
        if let PropertyKind::Enumeration(values) = &self.kind {
            if !values.iter().any(|v| value.as_str() == Some(v.as_str())) {
                let expected = values
                    .iter()
                    .map(|v| format!("'{v}'"))
                    .collect::<Vec<_>>()
                    .join(" | ");
                messages.push(format!(
                    "Invalid enum value. Expected {expected}, received '{}'",
                    value.as_str().unwrap_or_default()
                ));
            }
        }
        messages.extend(
            self.checks
                .iter()
                .filter_map(|check| check.violation(value))
                .map(str::to_string),
        );

        if messages.is_empty() {
            Ok(())
        } else {
            Err(messages)
        }
    }
}

/// Object schema whose successful parse deserializes into `T`
pub struct ObjectSchema<T> {
    properties: Vec<Property>,
    _output: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for ObjectSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectSchema")
            .field("properties", &self.properties)
            .finish()
    }
}

impl<T> Default for ObjectSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ObjectSchema<T> {
    pub fn new() -> Self {
        Self {
            properties: Vec::new(),
            _output: PhantomData,
        }
    }

    pub fn property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Declared properties only, with defaults filled in for undefined values
    fn normalize(&self, record: &Record) -> Record {
        self.properties
            .iter()
            .filter_map(|p| {
                record
                    .get(&p.name)
                    .or(p.default.as_ref())
                    .map(|value| (p.name.clone(), value.clone()))
            })
            .collect()
    }
}

#[async_trait]
impl<T> Schema for ObjectSchema<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    type Output = T;

    fn properties(&self) -> Vec<String> {
        self.properties.iter().map(|p| p.name.clone()).collect()
    }

    async fn parse_property(&self, name: &str, value: Option<&Value>) -> Result<(), Vec<String>> {
        match self.get(name) {
            Some(property) => property.check(value),
            None => Err(vec![format!("Unknown property '{name}'")]),
        }
    }

    async fn parse_all(&self, record: &Record) -> Result<T, Vec<Violation>> {
        let violations: Vec<Violation> = self
            .properties
            .iter()
            .filter_map(|p| p.check(record.get(&p.name)).err().map(|m| (p, m)))
            .flat_map(|(p, messages)| {
                messages
                    .into_iter()
                    .map(move |message| Violation::new(&p.name, message))
            })
            .collect();

        if !violations.is_empty() {
            return Err(violations);
        }

        serde_json::from_value(Value::Object(self.normalize(record)))
            .map_err(|e| vec![Violation::record(e.to_string())])
    }

    fn equality(&self, name: &str) -> FieldEquality {
        self.get(name).map_or(structural_eq as FieldEquality, |p| p.equality)
    }

    fn label(&self, name: &str) -> Option<String> {
        self.get(name).and_then(|p| p.label.clone())
    }
}

//! Form field edit state

use crate::schema::{structural_eq, FieldEquality};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Hook invoked with the field name when the field reports a user event
pub type FieldCallback = Box<dyn FnMut(&str) + Send + Sync>;

/// Attributes a frontend binds to the control rendering a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldProps {
    pub id: String,
    pub name: String,
}

/// Represents a single form field: its value, its errors and its touched state
///
/// The field never decides validity. Change and blur events are forwarded to
/// the hooks it was created with; whoever owns the hooks decides when to
/// revalidate. Error lists are written by the owning form only.
pub struct FormField {
    name: String,
    id: String,
    label: String,
    value: Option<Value>,
    default_value: Option<Value>,
    errors: Vec<String>,
    is_touched: bool,
    equality: FieldEquality,
    on_value_change: Option<FieldCallback>,
    on_blur: Option<FieldCallback>,
}

impl fmt::Debug for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormField")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("value", &self.value)
            .field("default_value", &self.default_value)
            .field("errors", &self.errors)
            .field("is_touched", &self.is_touched)
            .finish_non_exhaustive()
    }
}

impl FormField {
    /// Create a field seeded with its default value
    pub fn new(name: &str, default_value: Option<Value>) -> Self {
        Self {
            name: name.to_string(),
            id: format!("form-field-{name}-{}", uuid::Uuid::new_v4()),
            label: name.to_string(),
            value: default_value.clone(),
            default_value,
            errors: Vec::new(),
            is_touched: false,
            equality: structural_eq,
            on_value_change: None,
            on_blur: None,
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    pub fn with_equality(mut self, equality: FieldEquality) -> Self {
        self.equality = equality;
        self
    }

    /// Hook run by `handle_input` and `handle_change`
    pub fn on_value_change(mut self, callback: FieldCallback) -> Self {
        self.on_value_change = Some(callback);
        self
    }

    /// Hook run by `handle_blur` after the field is marked touched
    pub fn on_blur(mut self, callback: FieldCallback) -> Self {
        self.on_blur = Some(callback);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn props(&self) -> FieldProps {
        FieldProps {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Set the value without triggering validation
    pub fn set_value(&mut self, value: Option<Value>) {
        self.value = value;
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_touched(&self) -> bool {
        self.is_touched
    }

    /// Whether the value differs from the default
    pub fn is_dirty(&self) -> bool {
        !(self.equality)(self.value.as_ref(), self.default_value.as_ref())
    }

    /// Called by the bound control on every keystroke
    pub fn handle_input(&mut self) {
        self.notify_value_change();
    }

    /// Called by the bound control when an edit is committed
    pub fn handle_change(&mut self) {
        self.notify_value_change();
    }

    /// Called when the bound control loses focus
    pub fn handle_blur(&mut self) {
        self.is_touched = true;
        if let Some(callback) = self.on_blur.as_mut() {
            callback(&self.name);
        }
    }

    fn notify_value_change(&mut self) {
        if let Some(callback) = self.on_value_change.as_mut() {
            callback(&self.name);
        }
    }

    pub(crate) fn replace_errors(&mut self, errors: Vec<String>) {
        self.errors = errors;
    }

    pub(crate) fn push_error(&mut self, message: String) {
        self.errors.push(message);
    }

    pub(crate) fn clear_errors(&mut self) {
        self.errors.clear();
    }

    /// Restore the default value and drop errors
    pub(crate) fn reset(&mut self, clear_touched: bool) {
        self.value = self.default_value.clone();
        self.errors.clear();
        if clear_touched {
            self.is_touched = false;
        }
    }

    /// Get the text value (empty for non-text values)
    pub fn as_text(&self) -> &str {
        self.value.as_ref().and_then(Value::as_str).unwrap_or("")
    }

    /// Push a character to the field value, returning whether the value changed
    ///
    /// Undefined values become text. Integer values accept digits only.
    pub fn push_char(&mut self, c: char) -> bool {
        let Some(value) = self.value.as_mut() else {
            self.value = Some(Value::String(c.to_string()));
            return true;
        };
        match value {
            Value::String(s) => {
                s.push(c);
                true
            }
            Value::Number(n) => {
                let (Some(current), Some(d)) = (n.as_u64(), c.to_digit(10)) else {
                    return false;
                };
                match current.checked_mul(10).and_then(|v| v.checked_add(u64::from(d))) {
                    Some(next) => {
                        *n = next.into();
                        true
                    }
                    None => false,
                }
            }
            _ => false,
        }
    }

    /// Remove the last character from the field value
    pub fn pop_char(&mut self) -> bool {
        match &mut self.value {
            Some(Value::String(s)) => s.pop().is_some(),
            Some(Value::Number(n)) => match n.as_u64() {
                Some(current) if current > 0 => {
                    *n = (current / 10).into();
                    true
                }
                _ => false,
            },
            _ => false,
        }
    }

    /// Clear the field value
    pub fn clear(&mut self) -> bool {
        match &mut self.value {
            Some(Value::String(s)) if !s.is_empty() => {
                s.clear();
                true
            }
            Some(Value::Number(n)) if n.as_u64() != Some(0) => {
                *n = 0u64.into();
                true
            }
            Some(Value::Array(items)) if !items.is_empty() => {
                items.clear();
                true
            }
            _ => false,
        }
    }

    /// Get the display value for rendering
    pub fn display_value(&self) -> String {
        match &self.value {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(", "),
            Some(other) => other.to_string(),
        }
    }
}

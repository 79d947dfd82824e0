//! Form-level error map

use serde::Serialize;
use std::collections::BTreeMap;

/// Reserved error path for errors reported by the submit handler
pub const SUBMIT_ERROR_PATH: &str = "_submit";

/// Messages keyed by field path, plus the reserved submission path
///
/// Entries are never empty: writing an empty list removes the path, so the
/// key set is exactly the set of paths that currently have errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrorMap(BTreeMap<String, Vec<String>>);

impl FormErrorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<&[String]> {
        self.0.get(path).map(Vec::as_slice)
    }

    /// Replace the messages for a path
    pub(crate) fn set(&mut self, path: &str, messages: Vec<String>) {
        if messages.is_empty() {
            self.0.remove(path);
        } else {
            self.0.insert(path.to_string(), messages);
        }
    }

    pub(crate) fn push(&mut self, path: &str, message: String) {
        self.0.entry(path.to_string()).or_default().push(message);
    }

    pub(crate) fn remove(&mut self, path: &str) {
        self.0.remove(path);
    }

    pub(crate) fn clear(&mut self) {
        self.0.clear();
    }

    /// Drop every field entry, keeping the submission error
    pub(crate) fn clear_fields(&mut self) {
        self.0.retain(|path, _| path == SUBMIT_ERROR_PATH);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn has_field_errors(&self) -> bool {
        self.field_paths().next().is_some()
    }

    /// Paths with errors, excluding the submission path
    pub fn field_paths(&self) -> impl Iterator<Item = &str> {
        self.0
            .keys()
            .map(String::as_str)
            .filter(|path| *path != SUBMIT_ERROR_PATH)
    }

    pub fn submit_errors(&self) -> Option<&[String]> {
        self.get(SUBMIT_ERROR_PATH)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

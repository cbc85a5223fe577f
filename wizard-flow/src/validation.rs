use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::path::{self, FieldPath};

/// Error messages keyed by concrete field path.
///
/// At most one message is kept per field: the first violated rule wins, every
/// violated field is reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a message unless the field already has one. Returns whether it was recorded.
    pub fn insert(&mut self, path: impl Into<String>, message: impl Into<String>) -> bool {
        let path = path.into();
        if self.fields.contains_key(&path) {
            return false;
        }
        self.fields.insert(path, message.into());
        true
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.fields.get(path).map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.fields.contains_key(path)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(path, message)| (path.as_str(), message.as_str()))
    }

    pub fn paths(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    /// Drops the message of `path` and of every field below it.
    pub fn clear_field(&mut self, path: &str) {
        let prefix = format!("{path}.");
        self.fields
            .retain(|field, _| field != path && !field.starts_with(&prefix));
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.fields.retain(|path, _| keep(path));
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (path, message) in other.fields {
            self.insert(path, message);
        }
    }

    /// Re-keys entries of the list at `list_path` after the entry at
    /// `removed` was deleted, so messages stay attached to the same record.
    pub fn shift_list(&mut self, list_path: &str, removed: usize) {
        let prefix = format!("{list_path}.");
        let mut shifted = BTreeMap::new();
        for (path, message) in std::mem::take(&mut self.fields) {
            let Some(tail) = path.strip_prefix(&prefix) else {
                shifted.insert(path, message);
                continue;
            };
            let (index, rest) = tail.split_once('.').unwrap_or((tail, ""));
            match index.parse::<usize>() {
                Ok(index) if index == removed => {}
                Ok(index) if index > removed => {
                    let mut moved = format!("{prefix}{}", index - 1);
                    if !rest.is_empty() {
                        moved.push('.');
                        moved.push_str(rest);
                    }
                    shifted.insert(moved, message);
                }
                _ => {
                    shifted.insert(path, message);
                }
            }
        }
        self.fields = shifted;
    }

    /// Messages arranged in the same shape as the answer tree.
    pub fn to_tree(&self) -> Value {
        let mut tree = Value::Object(Default::default());
        for (raw, message) in &self.fields {
            if let Ok(path) = FieldPath::parse(raw) {
                path::place(&mut tree, path.segments(), Value::String(message.clone()));
            }
        }
        tree
    }
}

/// Outcome of validating one step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    errors: ValidationErrors,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn into_errors(self) -> ValidationErrors {
        self.errors
    }
}

impl From<ValidationErrors> for ValidationResult {
    fn from(errors: ValidationErrors) -> Self {
        Self { errors }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_message_per_field_wins() {
        let mut errors = ValidationErrors::new();
        assert!(errors.insert("a.b", "required"));
        assert!(!errors.insert("a.b", "too short"));
        assert_eq!(errors.get("a.b"), Some("required"));
    }

    #[test]
    fn clear_field_drops_descendants_only() {
        let mut errors = ValidationErrors::new();
        errors.insert("people.0.email", "x");
        errors.insert("people.0", "y");
        errors.insert("people.1.email", "z");
        errors.insert("people.10.email", "w");
        errors.clear_field("people.0");
        assert_eq!(errors.paths(), vec!["people.1.email", "people.10.email"]);
    }

    #[test]
    fn shift_list_follows_removed_entries() {
        let mut errors = ValidationErrors::new();
        errors.insert("people.0.email", "first");
        errors.insert("people.1.email", "second");
        errors.insert("people.2.phone", "third");
        errors.insert("address.city", "other");
        errors.shift_list("people", 1);
        assert_eq!(errors.get("people.0.email"), Some("first"));
        assert_eq!(errors.get("people.1.phone"), Some("third"));
        assert!(!errors.contains("people.2.phone"));
        assert_eq!(errors.get("address.city"), Some("other"));
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn tree_mirrors_answer_shape() {
        let mut errors = ValidationErrors::new();
        errors.insert("arrival.departureDate", "after");
        errors.insert("people.1.email", "missing");
        assert_eq!(
            errors.to_tree(),
            json!({
                "arrival": { "departureDate": "after" },
                "people": [null, { "email": "missing" }]
            })
        );
    }
}

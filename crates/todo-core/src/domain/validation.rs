//! Field-level validation results shared by the entities.

use std::collections::BTreeMap;

/// A single rule violation on a named field.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FieldError {
    /// Wire name of the field (`title`, `dueDate`, ...).
    field: &'static str,
    message: String,
}

/// Ordered list of field violations, at most one per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("validation failed on {} field(s)", .errors.len())]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a single violation.
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Record a violation. The first message recorded for a field wins.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        if self.errors.iter().any(|e| e.field == field) {
            return;
        }
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Message recorded for `field`, if any.
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// `Ok(value)` when nothing was recorded, otherwise `Err(self)`.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }

    /// Field → message map, as rendered in error bodies.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.errors
            .iter()
            .map(|e| (e.field.to_string(), e.message.clone()))
            .collect()
    }
}

/// Length in characters, which is what the length rules count.
pub(crate) fn char_len(value: &str) -> usize {
    value.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_message_per_field_wins() {
        let mut errors = ValidationErrors::new();
        errors.add("title", "first");
        errors.add("title", "second");
        errors.add("priority", "bad");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.message_for("title"), Some("first"));
        assert_eq!(errors.message_for("priority"), Some("bad"));
    }

    #[test]
    fn test_into_result() {
        assert_eq!(ValidationErrors::new().into_result(7), Ok(7));
        assert!(ValidationErrors::single("email", "x").into_result(7).is_err());
    }

    #[test]
    fn test_char_len_counts_characters() {
        assert_eq!(char_len("ação"), 4);
    }
}

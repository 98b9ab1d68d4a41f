//! Rule evaluation

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use super::FieldRule;
use super::FieldValue;
use super::FormData;
use super::ValidationSchema;
use crate::error::Error;

/// Per-field error messages. A field is absent when it has no error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    /// Creates an empty error map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field's error.
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    /// Clears a field's error, returning it.
    pub fn remove(&mut self, field: &str) -> Option<String> {
        self.0.remove(field)
    }

    /// Returns a field's error.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Returns `true` if the field has an error.
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Returns `true` if no field has an error.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failing fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Removes every error.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// The first message in field-name order.
    pub fn first_message(&self) -> Option<&str> {
        self.0.values().next().map(String::as_str)
    }

    /// Iterates over failing field names.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterates over `(field, message)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Keeps only the errors whose field satisfies the predicate.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.0.retain(|field, _| keep(field));
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldErrors {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Outcome of a whole-form validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// `true` when `errors` is empty.
    pub is_valid: bool,
    /// Failing fields.
    pub errors: FieldErrors,
}

/// Checks one value against one rule.
///
/// A custom check decides alone. Otherwise the required check runs first, and
/// length and pattern checks run only on non-blank text, first failure wins.
pub fn validate_field(
    value: &FieldValue,
    rule: &FieldRule,
    field: &str,
    form: &FormData,
) -> Option<String> {
    if let Some(check) = rule.custom_check() {
        return check(value, form);
    }

    if rule.required && value.is_blank() {
        return Some(format!("{field} is required"));
    }

    let text = match value {
        FieldValue::Text(text) if !text.trim().is_empty() => text.trim(),
        _ => return None,
    };
    let len = text.chars().count();

    if let Some(min) = rule.min_length
        && len < min
    {
        return Some(format!("{field} must be at least {min} characters"));
    }

    if let Some(max) = rule.max_length
        && len > max
    {
        return Some(format!("{field} must be less than {max} characters"));
    }

    if let Some(pattern) = &rule.pattern
        && !pattern.is_match(text)
    {
        return Some(format!("{field} format is invalid"));
    }

    None
}

/// Checks every field the schema names.
///
/// Fields present in the form but not in the schema are ignored.
pub fn validate_form(form: &FormData, schema: &ValidationSchema) -> ValidationResult {
    let errors: FieldErrors = schema
        .iter()
        .filter_map(|(field, rule)| {
            validate_field(form.get(field), rule, field, form).map(|msg| (field, msg))
        })
        .collect();

    ValidationResult {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// Checks a single field by name; unknown fields are always valid.
pub fn validate_field_in_schema(
    field: &str,
    value: &FieldValue,
    schema: &ValidationSchema,
    form: &FormData,
) -> Option<String> {
    let rule = schema.rule(field)?;
    validate_field(value, rule, field, form)
}

/// Builds the failure a route returns for rejected input.
pub fn server_validation_failure(errors: FieldErrors) -> Error {
    Error::from_field_errors(errors)
}

/// `true` when client and server rejected exactly the same fields.
pub fn errors_match(client: &FieldErrors, server: &FieldErrors) -> bool {
    client.len() == server.len() && client.fields().all(|field| server.contains(field))
}

//! Input sanitization

use super::FieldValue;
use super::FormData;

/// Removes angle brackets, trims, and collapses whitespace runs to one space.
///
/// Brackets go first so that removing one can never leave a fresh run of
/// whitespace behind, which keeps the function idempotent.
pub fn sanitize_input(value: &str) -> String {
    let stripped: String = value.chars().filter(|c| !matches!(c, '<' | '>')).collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Sanitizes a text value or every item of a list value.
pub fn sanitize_value(value: &FieldValue) -> FieldValue {
    match value {
        FieldValue::Missing => FieldValue::Missing,
        FieldValue::Text(text) => FieldValue::Text(sanitize_input(text)),
        FieldValue::List(items) => {
            FieldValue::List(items.iter().map(|item| sanitize_input(item)).collect())
        }
    }
}

/// Sanitizes every field of a form.
pub fn sanitize_form_data(form: &FormData) -> FormData {
    form.iter()
        .map(|(field, value)| (field, sanitize_value(value)))
        .collect()
}

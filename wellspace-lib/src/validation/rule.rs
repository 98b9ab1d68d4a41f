//! Field rules and schemas

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;

use super::FieldValue;
use super::FormData;

/// A custom check: `(value, whole form) -> error message`.
pub type CustomRule = Arc<dyn Fn(&FieldValue, &FormData) -> Option<String> + Send + Sync>;

/// Declarative rule for a single field.
///
/// When a custom check is present it replaces every other check on the field.
///
/// # Example
///
/// ```
/// use wellspace_lib::validation::FieldRule;
///
/// let rule = FieldRule::new().required().min_length(3).max_length(100);
/// assert!(rule.required);
/// ```
#[derive(Clone, Default)]
pub struct FieldRule {
    /// Reject missing or blank values.
    pub required: bool,
    /// Minimum length in characters of the trimmed text.
    pub min_length: Option<usize>,
    /// Maximum length in characters of the trimmed text.
    pub max_length: Option<usize>,
    /// Pattern the trimmed text must match.
    pub pattern: Option<Regex>,
    custom: Option<CustomRule>,
}

impl FieldRule {
    /// Creates a rule with no checks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the field as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the minimum length.
    pub fn min_length(mut self, n: usize) -> Self {
        self.min_length = Some(n);
        self
    }

    /// Sets the maximum length.
    pub fn max_length(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }

    /// Sets the pattern.
    pub fn pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }

    /// Sets a custom check that overrides all others.
    pub fn custom<F>(mut self, check: F) -> Self
    where
        F: Fn(&FieldValue, &FormData) -> Option<String> + Send + Sync + 'static,
    {
        self.custom = Some(Arc::new(check));
        self
    }

    /// Returns the custom check, if any.
    pub fn custom_check(&self) -> Option<&CustomRule> {
        self.custom.as_ref()
    }
}

impl fmt::Debug for FieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRule")
            .field("required", &self.required)
            .field("min_length", &self.min_length)
            .field("max_length", &self.max_length)
            .field("pattern", &self.pattern.as_ref().map(Regex::as_str))
            .field("custom", &self.custom.is_some())
            .finish()
    }
}

/// Field name to rule mapping for one kind of form.
#[derive(Debug, Clone, Default)]
pub struct ValidationSchema {
    rules: BTreeMap<String, FieldRule>,
}

impl ValidationSchema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field rule, builder style.
    pub fn field(mut self, name: impl Into<String>, rule: FieldRule) -> Self {
        self.rules.insert(name.into(), rule);
        self
    }

    /// Returns the rule for a field.
    pub fn rule(&self, name: &str) -> Option<&FieldRule> {
        self.rules.get(name)
    }

    /// Iterates over `(field, rule)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldRule)> {
        self.rules.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates over field names.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }
}

//! Form-state controller

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::validation::FieldErrors;
use crate::validation::FieldValue;
use crate::validation::FormData;
use crate::validation::ValidationResult;
use crate::validation::ValidationSchema;
use crate::validation::sanitize_form_data;
use crate::validation::validate_field_in_schema;
use crate::validation::validate_form;

/// Behaviour switches for a [`FormController`].
#[derive(Debug, Clone)]
pub struct FormOptions {
    /// Re-check touched fields after each edit, debounced.
    pub validate_on_change: bool,
    /// Check a field as soon as it loses focus.
    pub validate_on_blur: bool,
    /// Quiet period before a debounced re-check runs.
    pub debounce: Duration,
    /// Trim edited text, and fully sanitize whole-form replacements.
    pub sanitize_on_change: bool,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            validate_on_change: true,
            validate_on_blur: true,
            debounce: Duration::from_millis(300),
            sanitize_on_change: true,
        }
    }
}

impl FormOptions {
    /// Options used by the login and register forms.
    pub fn auth() -> Self {
        Self::default()
    }

    /// Options used by the session editor; a slightly longer debounce.
    pub fn session() -> Self {
        Self::default().debounce(Duration::from_millis(500))
    }

    /// Enables or disables debounced validation on change.
    pub fn validate_on_change(mut self, enabled: bool) -> Self {
        self.validate_on_change = enabled;
        self
    }

    /// Enables or disables validation on blur.
    pub fn validate_on_blur(mut self, enabled: bool) -> Self {
        self.validate_on_blur = enabled;
        self
    }

    /// Sets the debounce delay.
    pub fn debounce(mut self, delay: Duration) -> Self {
        self.debounce = delay;
        self
    }

    /// Enables or disables sanitization on change.
    pub fn sanitize_on_change(mut self, enabled: bool) -> Self {
        self.sanitize_on_change = enabled;
        self
    }
}

/// A point-in-time copy of the form state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormSnapshot {
    pub values: FormData,
    pub errors: FieldErrors,
    pub touched: BTreeSet<String>,
    pub is_validating: bool,
}

impl FormSnapshot {
    /// `true` when no error is recorded.
    ///
    /// Not a submit gate: a debounced check may still be pending. Run
    /// [`FormController::validate_form`] before submitting.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors of touched fields only, the ones a UI should display.
    pub fn visible_errors(&self) -> FieldErrors {
        let mut visible = self.errors.clone();
        visible.retain(|field| self.touched.contains(field));
        visible
    }
}

#[derive(Default)]
struct FormState {
    initial: FormData,
    values: FormData,
    errors: FieldErrors,
    touched: BTreeSet<String>,
    is_validating: bool,
    // Bumped on every schedule or cancel; a debounced check applies only if
    // its ticket is still current when it wakes.
    ticket: u64,
    pending: Option<JoinHandle<()>>,
}

impl FormState {
    fn cancel_pending(&mut self) {
        self.ticket += 1;
        self.is_validating = false;
        if let Some(task) = self.pending.take() {
            task.abort();
        }
    }

    fn apply_debounced(&mut self, schema: &ValidationSchema) {
        let result = validate_form(&self.values, schema);
        for field in schema.fields() {
            match result.errors.get(field) {
                Some(message) if self.touched.contains(field) => {
                    self.errors.insert(field, message);
                }
                Some(_) => {}
                None => {
                    self.errors.remove(field);
                }
            }
        }
        self.is_validating = false;
        self.pending = None;
    }
}

fn lock(state: &Mutex<FormState>) -> MutexGuard<'_, FormState> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Owns the values, errors and touched set of one form.
///
/// Edits are sanitized and optimistically clear the field's error. Touched
/// fields are re-checked after a quiet period; the pending check lives in
/// the controller, so two controllers never share a timer. Dropping the
/// controller cancels any pending check.
///
/// Debounced checks need a tokio runtime. Outside one they run inline.
///
/// # Example
///
/// ```
/// use wellspace_lib::form::{FormController, FormOptions};
/// use wellspace_lib::validation::schemas;
///
/// let form = FormController::new(schemas::session(), FormOptions::session());
/// form.handle_field_change("title", "ab");
/// let result = form.validate_form();
/// assert!(!result.is_valid);
/// ```
pub struct FormController {
    schema: Arc<ValidationSchema>,
    options: FormOptions,
    state: Arc<Mutex<FormState>>,
}

impl FormController {
    /// Creates an empty form.
    pub fn new(schema: Arc<ValidationSchema>, options: FormOptions) -> Self {
        Self::with_initial(schema, FormData::new(), options)
    }

    /// Creates a form pre-filled with `initial`, which `reset_form` returns to.
    pub fn with_initial(schema: Arc<ValidationSchema>, initial: FormData, options: FormOptions) -> Self {
        let state = FormState {
            values: initial.clone(),
            initial,
            ..Default::default()
        };
        Self {
            schema,
            options,
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// The schema this form validates against.
    pub fn schema(&self) -> &Arc<ValidationSchema> {
        &self.schema
    }

    /// The options in effect.
    pub fn options(&self) -> &FormOptions {
        &self.options
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Copies the current state.
    pub fn snapshot(&self) -> FormSnapshot {
        let state = lock(&self.state);
        FormSnapshot {
            values: state.values.clone(),
            errors: state.errors.clone(),
            touched: state.touched.clone(),
            is_validating: state.is_validating,
        }
    }

    /// Current values.
    pub fn values(&self) -> FormData {
        lock(&self.state).values.clone()
    }

    /// Current value of one field.
    pub fn value(&self, field: &str) -> FieldValue {
        lock(&self.state).values.get(field).clone()
    }

    /// Current errors.
    pub fn errors(&self) -> FieldErrors {
        lock(&self.state).errors.clone()
    }

    /// Current error of one field.
    pub fn error(&self, field: &str) -> Option<String> {
        lock(&self.state).errors.get(field).map(str::to_string)
    }

    /// `true` when no error is recorded. See [`FormSnapshot::is_valid`].
    pub fn is_valid(&self) -> bool {
        lock(&self.state).errors.is_empty()
    }

    /// `true` while a debounced check is pending.
    pub fn is_validating(&self) -> bool {
        lock(&self.state).is_validating
    }

    /// `true` if the field has been edited or blurred.
    pub fn is_touched(&self, field: &str) -> bool {
        lock(&self.state).touched.contains(field)
    }

    // =========================================================================
    // Edits
    // =========================================================================

    /// Replaces all values, sanitizing them first when enabled.
    pub fn set_form_data(&self, data: FormData) {
        let data = if self.options.sanitize_on_change {
            sanitize_form_data(&data)
        } else {
            data
        };
        lock(&self.state).values = data;
    }

    /// Sets one value and clears its error.
    ///
    /// If the field was already touched, a debounced re-check is scheduled.
    pub fn set_field_value(&self, field: &str, value: impl Into<FieldValue>) {
        let mut value = value.into();
        if self.options.sanitize_on_change
            && let FieldValue::Text(text) = &value
        {
            value = FieldValue::Text(text.trim().to_string());
        }

        let mut state = lock(&self.state);
        state.values.set(field, value);
        state.errors.remove(field);

        if self.options.validate_on_change && state.touched.contains(field) {
            self.schedule_validation(&mut state);
        }
    }

    /// Sets one value, then marks the field touched.
    ///
    /// The first edit of a fresh field does not schedule a check.
    pub fn handle_field_change(&self, field: &str, value: impl Into<FieldValue>) {
        self.set_field_value(field, value);
        self.mark_field_touched(field);
    }

    /// Marks the field touched and checks it immediately when enabled.
    pub fn handle_field_blur(&self, field: &str) {
        self.mark_field_touched(field);
        if self.options.validate_on_blur {
            self.validate_field(field);
        }
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Checks one field now, recording or clearing its error.
    pub fn validate_field(&self, field: &str) -> Option<String> {
        let mut state = lock(&self.state);
        let error = validate_field_in_schema(field, state.values.get(field), &self.schema, &state.values);
        match &error {
            Some(message) => state.errors.insert(field, message.clone()),
            None => {
                state.errors.remove(field);
            }
        }
        error
    }

    /// Checks every field now and replaces the error map.
    ///
    /// Cancels any pending debounced check. This is the result to gate a
    /// submit on.
    pub fn validate_form(&self) -> ValidationResult {
        let mut state = lock(&self.state);
        state.cancel_pending();
        let result = validate_form(&state.values, &self.schema);
        state.errors = result.errors.clone();
        result
    }

    fn schedule_validation(&self, state: &mut FormState) {
        state.cancel_pending();
        let ticket = state.ticket;
        state.is_validating = true;

        let Ok(handle) = Handle::try_current() else {
            state.apply_debounced(&self.schema);
            return;
        };

        let shared = Arc::clone(&self.state);
        let schema = Arc::clone(&self.schema);
        let delay = self.options.debounce;
        state.pending = Some(handle.spawn(async move {
            tokio::time::sleep(delay).await;
            let mut state = lock(&shared);
            if state.ticket == ticket {
                state.apply_debounced(&schema);
                log::debug!("Debounced validation applied ({} errors)", state.errors.len());
            }
        }));
    }

    // =========================================================================
    // Errors and touched set
    // =========================================================================

    /// Sets or clears one field's error.
    pub fn set_field_error(&self, field: &str, error: Option<String>) {
        let mut state = lock(&self.state);
        match error {
            Some(message) => state.errors.insert(field, message),
            None => {
                state.errors.remove(field);
            }
        }
    }

    /// Replaces the error map, e.g. with errors returned by the server.
    pub fn set_errors(&self, errors: FieldErrors) {
        lock(&self.state).errors = errors;
    }

    /// Removes every error.
    pub fn clear_errors(&self) {
        lock(&self.state).errors.clear();
    }

    /// Removes one field's error.
    pub fn clear_field_error(&self, field: &str) {
        lock(&self.state).errors.remove(field);
    }

    /// Marks one field touched.
    pub fn mark_field_touched(&self, field: &str) {
        lock(&self.state).touched.insert(field.to_string());
    }

    /// Marks every schema field touched so all errors become visible.
    pub fn mark_all_touched(&self) {
        let mut state = lock(&self.state);
        state.touched.extend(self.schema.fields().map(str::to_string));
    }

    /// Returns to the initial values, overlaid with `data` if given.
    ///
    /// Clears errors, the touched set, and any pending check.
    pub fn reset_form(&self, data: Option<FormData>) {
        let mut state = lock(&self.state);
        state.cancel_pending();
        let mut values = state.initial.clone();
        if let Some(data) = data {
            for (field, value) in data.iter() {
                values.set(field, value.clone());
            }
        }
        state.values = values;
        state.errors.clear();
        state.touched.clear();
    }

    /// Cancels any pending debounced check. Called on drop.
    pub fn dispose(&self) {
        lock(&self.state).cancel_pending();
    }
}

impl Drop for FormController {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for FormController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormController")
            .field("options", &self.options)
            .field("state", &self.snapshot())
            .finish_non_exhaustive()
    }
}

//! Form engine: field composition, validation, reset and submission

use super::errors::{FormErrorMap, SUBMIT_ERROR_PATH};
use super::field::{FieldCallback, FormField};
use super::submit::{
    failure_message, FlagGuard, SubmitErrors, SubmitEvent, SubmitHandler, SubmitOutcome,
};
use crate::error::FormError;
use crate::schema::{Record, Schema, Violation};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Submission error used when a failed handler gives no message
pub const DEFAULT_SUBMIT_ERROR: &str = "Something went wrong while submitting the form";

/// Behaviour switches for a form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormOptions {
    /// Validate a field on every input/change event
    pub validate_on_change: bool,
    /// Validate a field when it loses focus
    pub validate_on_blur: bool,
    /// Whether `reset` also forgets that fields were visited
    pub reset_clears_touched: bool,
    pub submit_error_fallback: String,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            validate_on_change: true,
            validate_on_blur: true,
            reset_clears_touched: false,
            submit_error_fallback: DEFAULT_SUBMIT_ERROR.to_string(),
        }
    }
}

/// Read-only view of a form's aggregate state
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormStateSnapshot {
    pub is_valid: bool,
    pub is_validating: bool,
    pub is_submitting: bool,
    pub is_submittable: bool,
    pub has_errors: bool,
    pub errors: FormErrorMap,
    /// Violations not attributable to a single field
    pub global_errors: Vec<String>,
    pub submit_count: u32,
    pub last_submitted_at: Option<DateTime<Utc>>,
}

/// Builder for [`Form`]
pub struct FormBuilder<S: Schema> {
    schema: S,
    defaults: Record,
    on_submit: Option<Box<dyn SubmitHandler<S::Output>>>,
    options: FormOptions,
}

impl<S: Schema> FormBuilder<S> {
    /// Initial values keyed by field path
    pub fn defaults(mut self, defaults: Record) -> Self {
        self.defaults = defaults;
        self
    }

    /// Initial values taken from any value serializing to an object
    pub fn defaults_from<T: Serialize>(self, value: &T) -> crate::error::Result<Self> {
        match serde_json::to_value(value)? {
            Value::Object(map) => Ok(self.defaults(map)),
            other => Err(FormError::Defaults {
                kind: json_kind(&other).to_string(),
            }),
        }
    }

    pub fn on_submit(mut self, handler: impl SubmitHandler<S::Output> + 'static) -> Self {
        self.on_submit = Some(Box::new(handler));
        self
    }

    pub fn options(mut self, options: FormOptions) -> Self {
        self.options = options;
        self
    }

    pub fn validate_on_change(mut self, enabled: bool) -> Self {
        self.options.validate_on_change = enabled;
        self
    }

    pub fn validate_on_blur(mut self, enabled: bool) -> Self {
        self.options.validate_on_blur = enabled;
        self
    }

    pub fn build(self) -> Form<S> {
        let FormBuilder {
            schema,
            defaults,
            on_submit,
            options,
        } = self;

        let properties = schema.properties();
        for key in defaults.keys() {
            if !properties.contains(key) {
                warn!(field = %key, "Ignoring default value for unknown field");
            }
        }

        let (trigger_tx, triggers) = mpsc::unbounded_channel();
        let mut fields: Vec<FormField> = Vec::with_capacity(properties.len());
        for name in properties {
            if name == SUBMIT_ERROR_PATH {
                warn!("{}; property skipped", FormError::ReservedPath { name });
                continue;
            }
            if fields.iter().any(|f| f.name() == name) {
                warn!(field = %name, "Duplicate schema property skipped");
                continue;
            }
            let mut field = FormField::new(&name, defaults.get(&name).cloned())
                .with_equality(schema.equality(&name));
            if let Some(label) = schema.label(&name) {
                field = field.with_label(&label);
            }
            if options.validate_on_change {
                field = field.on_value_change(trigger(&trigger_tx));
            }
            if options.validate_on_blur {
                field = field.on_blur(trigger(&trigger_tx));
            }
            fields.push(field);
        }

        let (state_tx, _) = watch::channel(FormStateSnapshot::default());
        let form = Form {
            schema,
            fields,
            errors: FormErrorMap::new(),
            global_errors: Vec::new(),
            is_valid: true,
            is_validating: Arc::new(AtomicBool::new(false)),
            is_submitting: Arc::new(AtomicBool::new(false)),
            options,
            on_submit,
            triggers,
            state_tx,
            active_field: 0,
            submit_count: 0,
            last_submitted_at: None,
        };
        form.publish();
        form
    }
}

/// Field hook that queues a validation request for the form to pick up
fn trigger(tx: &mpsc::UnboundedSender<String>) -> FieldCallback {
    let tx = tx.clone();
    Box::new(move |name: &str| {
        // Only fails once the form itself is gone
        let _ = tx.send(name.to_string());
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A schema-driven form
///
/// The form is the only writer of field error lists and of the error map, and
/// writes both on every validation event, so the two views never drift.
/// Field hooks only queue validation requests; the queue is drained at the
/// form's own call sites, which keeps validation from re-entering the
/// handlers that requested it. Every operation takes `&mut self`, so field
/// validation, whole-form validation and submission never overlap.
pub struct Form<S: Schema> {
    schema: S,
    fields: Vec<FormField>,
    errors: FormErrorMap,
    global_errors: Vec<String>,
    is_valid: bool,
    is_validating: Arc<AtomicBool>,
    is_submitting: Arc<AtomicBool>,
    options: FormOptions,
    on_submit: Option<Box<dyn SubmitHandler<S::Output>>>,
    triggers: mpsc::UnboundedReceiver<String>,
    state_tx: watch::Sender<FormStateSnapshot>,
    active_field: usize,
    submit_count: u32,
    last_submitted_at: Option<DateTime<Utc>>,
}

impl<S: Schema> Form<S> {
    pub fn builder(schema: S) -> FormBuilder<S> {
        FormBuilder {
            schema,
            defaults: Record::new(),
            on_submit: None,
            options: FormOptions::default(),
        }
    }

    pub fn schema(&self) -> &S {
        &self.schema
    }

    pub fn options(&self) -> &FormOptions {
        &self.options
    }

    // --- Fields ---

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Mutable access for bound controls; call [`Form::flush_pending`] after
    /// firing the field's own handlers
    pub fn field_mut(&mut self, name: &str) -> Option<&mut FormField> {
        self.fields.iter_mut().find(|f| f.name() == name)
    }

    fn field_index(&self, name: &str) -> Result<usize, FormError> {
        self.fields
            .iter()
            .position(|f| f.name() == name)
            .ok_or_else(|| FormError::UnknownField {
                name: name.to_string(),
            })
    }

    /// Current field values; undefined values are left out
    pub fn values(&self) -> Record {
        self.fields
            .iter()
            .filter_map(|f| f.value().map(|v| (f.name().to_string(), v.clone())))
            .collect()
    }

    pub fn get_field_value(&self, name: &str) -> Option<&Value> {
        match self.field_index(name) {
            Ok(index) => self.fields[index].value(),
            Err(err) => {
                warn!("{err}; read ignored");
                None
            }
        }
    }

    /// Write a value directly, without running any validation
    pub fn set_field_value(&mut self, name: &str, value: Option<Value>) {
        match self.field_index(name) {
            Ok(index) => {
                self.fields[index].set_value(value);
                self.publish();
            }
            Err(err) => warn!("{err}; write ignored"),
        }
    }

    // --- Aggregate state ---

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn is_validating(&self) -> bool {
        self.is_validating.load(Ordering::SeqCst)
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting.load(Ordering::SeqCst)
    }

    pub fn is_submittable(&self) -> bool {
        self.is_valid && !self.is_validating() && !self.is_submitting()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty() || !self.global_errors.is_empty()
    }

    pub fn errors(&self) -> &FormErrorMap {
        &self.errors
    }

    pub fn global_errors(&self) -> &[String] {
        &self.global_errors
    }

    pub fn state(&self) -> FormStateSnapshot {
        let is_validating = self.is_validating();
        let is_submitting = self.is_submitting();
        FormStateSnapshot {
            is_valid: self.is_valid,
            is_validating,
            is_submitting,
            is_submittable: self.is_valid && !is_validating && !is_submitting,
            has_errors: self.has_errors(),
            errors: self.errors.clone(),
            global_errors: self.global_errors.clone(),
            submit_count: self.submit_count,
            last_submitted_at: self.last_submitted_at,
        }
    }

    /// Receiver that sees a fresh snapshot after every state change
    pub fn subscribe(&self) -> watch::Receiver<FormStateSnapshot> {
        self.state_tx.subscribe()
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state());
    }

    fn refresh_validity(&mut self) {
        self.is_valid = !self.errors.has_field_errors() && self.global_errors.is_empty();
    }

    // --- Field events ---

    pub async fn handle_input(&mut self, name: &str) {
        self.dispatch(name, FormField::handle_input).await;
    }

    pub async fn handle_change(&mut self, name: &str) {
        self.dispatch(name, FormField::handle_change).await;
    }

    pub async fn handle_blur(&mut self, name: &str) {
        self.dispatch(name, FormField::handle_blur).await;
    }

    async fn dispatch(&mut self, name: &str, event: fn(&mut FormField)) {
        match self.field_index(name) {
            Ok(index) => {
                event(&mut self.fields[index]);
                self.flush_pending().await;
                self.publish();
            }
            Err(err) => warn!("{err}; event ignored"),
        }
    }

    /// Type a character into a field, then fire its input event
    pub async fn input_char(&mut self, name: &str, c: char) {
        self.edit(name, |field| field.push_char(c)).await;
    }

    /// Delete the last character of a field, then fire its input event
    pub async fn delete_char(&mut self, name: &str) {
        self.edit(name, FormField::pop_char).await;
    }

    async fn edit(&mut self, name: &str, edit: impl FnOnce(&mut FormField) -> bool) {
        let index = match self.field_index(name) {
            Ok(index) => index,
            Err(err) => {
                warn!("{err}; edit ignored");
                return;
            }
        };
        if edit(&mut self.fields[index]) {
            self.fields[index].handle_input();
            self.flush_pending().await;
        }
        self.publish();
    }

    /// Run validations queued by field hooks, in the order they were queued
    pub async fn flush_pending(&mut self) {
        while let Ok(name) = self.triggers.try_recv() {
            debug!(field = %name, "Running queued field validation");
            self.validate_field(&name).await;
        }
    }

    fn discard_pending(&mut self) {
        let mut dropped = 0usize;
        while self.triggers.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            debug!(dropped, "Discarded queued field validations");
        }
    }

    // --- Validation ---

    /// Validate one field against its own property rules
    ///
    /// Replaces the field's errors and its error-map entry with the new
    /// result. Never fires field hooks.
    pub async fn validate_field(&mut self, name: &str) -> bool {
        let index = match self.field_index(name) {
            Ok(index) => index,
            Err(err) => {
                warn!("{err}; validation skipped");
                return false;
            }
        };

        let value = self.fields[index].value().cloned();
        let messages = match self.schema.parse_property(name, value.as_ref()).await {
            Ok(()) => Vec::new(),
            Err(messages) => messages,
        };
        let valid = messages.is_empty();

        self.fields[index].replace_errors(messages.clone());
        self.errors.set(name, messages);
        // Record-level rules can only be rechecked by a whole-form pass
        self.global_errors.clear();
        self.refresh_validity();
        self.publish();
        valid
    }

    /// Validate the whole form
    pub async fn validate(&mut self) -> bool {
        self.validate_all().await.is_some()
    }

    async fn validate_all(&mut self) -> Option<S::Output> {
        self.discard_pending();
        let validating = FlagGuard::raise(&self.is_validating)
            .publishing(&self.state_tx, |state| state.is_validating = false);
        self.publish();

        let record = self.values();
        let parsed = self.schema.parse_all(&record).await;

        for field in &mut self.fields {
            field.clear_errors();
        }
        self.global_errors.clear();

        let output = match parsed {
            Ok(output) => {
                debug!("Form validation passed");
                self.errors.clear();
                Some(output)
            }
            Err(violations) => {
                self.errors.clear_fields();
                debug!(count = violations.len(), "Form validation failed");
                if violations.is_empty() {
                    self.global_errors.push("Invalid input".to_string());
                }
                for violation in violations {
                    self.attribute(violation);
                }
                None
            }
        };

        self.refresh_validity();
        drop(validating);
        self.publish();
        output
    }

    fn attribute(&mut self, violation: Violation) {
        let Violation { path, message } = violation;
        match self.fields.iter_mut().find(|f| f.name() == path) {
            Some(field) => {
                field.push_error(message.clone());
                self.errors.push(&path, message);
            }
            None => {
                if !path.is_empty() {
                    warn!(path = %path, "Violation for unknown field kept as record-level error");
                }
                self.global_errors.push(message);
            }
        }
    }

    // --- Reset ---

    /// Restore defaults and drop every error
    pub fn reset(&mut self) {
        self.discard_pending();
        let clear_touched = self.options.reset_clears_touched;
        for field in &mut self.fields {
            field.reset(clear_touched);
        }
        self.errors.clear();
        self.global_errors.clear();
        self.is_valid = true;
        debug!(clear_touched, "Form reset");
        self.publish();
    }

    // --- Submission ---

    /// Submit event binding: suppresses the event's default handling, then submits
    pub async fn handle_submit(&mut self, event: &mut SubmitEvent) -> SubmitOutcome {
        event.prevent_default();
        event.stop_propagation();
        self.submit().await
    }

    /// Validate the whole form and hand the typed record to the submit handler
    ///
    /// Never fails: validation problems land on the fields, handler failures
    /// land under the reserved submission path.
    pub async fn submit(&mut self) -> SubmitOutcome {
        if !self.is_submittable() {
            debug!(
                is_valid = self.is_valid,
                is_validating = self.is_validating(),
                is_submitting = self.is_submitting(),
                "Submission rejected"
            );
            return SubmitOutcome::Rejected;
        }

        self.errors.remove(SUBMIT_ERROR_PATH);
        let submitting = FlagGuard::raise(&self.is_submitting)
            .publishing(&self.state_tx, |state| state.is_submitting = false);
        self.publish();

        let outcome = self.run_submission().await;

        drop(submitting);
        self.publish();
        outcome
    }

    async fn run_submission(&mut self) -> SubmitOutcome {
        let Some(data) = self.validate_all().await else {
            info!("Form is invalid; submission aborted");
            return SubmitOutcome::Invalid;
        };

        self.submit_count += 1;
        let Some(handler) = self.on_submit.as_ref() else {
            debug!("No submit handler configured");
            self.last_submitted_at = Some(Utc::now());
            return SubmitOutcome::Submitted;
        };

        let errors = SubmitErrors::default();
        let result = handler.submit(data, self.state(), errors.clone()).await;

        let mut messages = errors.take();
        if let Err(err) = result {
            warn!(error = %err, "Submit handler failed");
            messages.push(failure_message(&err, &self.options.submit_error_fallback));
        }

        if messages.is_empty() {
            self.last_submitted_at = Some(Utc::now());
            info!(submit_count = self.submit_count, "Form submitted");
            SubmitOutcome::Submitted
        } else {
            info!(count = messages.len(), "Submission reported errors");
            self.errors.set(SUBMIT_ERROR_PATH, messages.clone());
            SubmitOutcome::Failed { errors: messages }
        }
    }

    // --- Focus ---

    pub fn active_field_index(&self) -> usize {
        self.active_field
    }

    pub fn active_field(&self) -> Option<&FormField> {
        self.fields.get(self.active_field)
    }

    /// Move focus to the next field (wraps around), blurring the current one
    pub async fn focus_next(&mut self) {
        let count = self.fields.len();
        if count == 0 {
            return;
        }
        self.move_focus((self.active_field + 1) % count).await;
    }

    /// Move focus to the previous field (wraps around), blurring the current one
    pub async fn focus_prev(&mut self) {
        let count = self.fields.len();
        if count == 0 {
            return;
        }
        let index = if self.active_field == 0 {
            count - 1
        } else {
            self.active_field - 1
        };
        self.move_focus(index).await;
    }

    pub async fn focus(&mut self, name: &str) {
        match self.field_index(name) {
            Ok(index) => self.move_focus(index).await,
            Err(err) => warn!("{err}; focus unchanged"),
        }
    }

    async fn move_focus(&mut self, index: usize) {
        if index == self.active_field {
            return;
        }
        if let Some(current) = self.fields.get_mut(self.active_field) {
            current.handle_blur();
        }
        self.active_field = index;
        self.flush_pending().await;
        self.publish();
    }
}

pub mod rules;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::config::FieldSpec;

pub use rules::check_value;

/// Banner shown when a submit attempt finds invalid fields
pub const FORM_ERROR_MESSAGE: &str = "Please correct the errors above";

/// Submit control label while a submission is in flight
pub const BUSY_LABEL: &str = "Sending...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Text,
    Email,
    Tel,
    Other,
}

impl FieldKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "email" => Some(Self::Email),
            "tel" | "phone" => Some(Self::Tel),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("This field is required")]
    Required,
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Please enter a valid phone number")]
    InvalidPhone,
}

#[derive(Debug, Clone)]
pub struct FieldState {
    pub name: String,
    pub label: String,
    pub value: String,
    pub required: bool,
    pub kind: FieldKind,
    pub error: Option<FieldError>,
}

impl FieldState {
    pub fn new(name: impl Into<String>, kind: FieldKind, required: bool) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            value: String::new(),
            required,
            kind,
            error: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[cfg(test)]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

impl From<&FieldSpec> for FieldState {
    fn from(spec: &FieldSpec) -> Self {
        FieldState::new(&spec.name, spec.kind, spec.required).with_label(&spec.label)
    }
}

/// Validate a field, replacing whatever error it showed before.
pub fn validate_field(field: &mut FieldState) -> bool {
    clear_field_error(field);

    match check_value(&field.value, field.required, field.kind) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!("Field {} invalid: {}", field.name, e);
            field.error = Some(e);
            false
        }
    }
}

/// Remove any error from a field. Safe to call when none is present.
pub fn clear_field_error(field: &mut FieldState) {
    field.error = None;
}

/// Submit button state
#[derive(Debug, Clone)]
pub struct SubmitControl {
    pub label: String,
    idle_label: String,
    pub busy: bool,
}

impl SubmitControl {
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            idle_label: label.clone(),
            label,
            busy: false,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.busy
    }

    fn set_busy(&mut self) {
        self.busy = true;
        self.label = BUSY_LABEL.to_string();
    }

    fn set_idle(&mut self) {
        self.busy = false;
        self.label = self.idle_label.clone();
    }
}

/// Snapshot of every field value, produced only by a submit that found all
/// required fields valid.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedForm {
    values: BTreeMap<String, String>,
}

impl ValidatedForm {
    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    pub fn into_values(self) -> BTreeMap<String, String> {
        self.values
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormRejected {
    #[error("{0} field(s) need attention")]
    Invalid(usize),
    #[error("A submission is already in progress")]
    Busy,
}

/// UI intents the pipeline observes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    /// Field value changed (keystroke, paste)
    Input { field: usize, value: String },
    /// Focus left the field
    Blur { field: usize },
    SubmitIntent,
}

/// What a dispatched event produced
#[derive(Debug)]
pub enum Dispatch {
    /// State updated, nothing to hand off
    Updated,
    /// Field index out of range or control busy
    Ignored,
    Rejected(FormRejected),
    Accepted(ValidatedForm),
}

#[derive(Debug, Clone)]
pub struct FormState {
    pub fields: Vec<FieldState>,
    pub banner: Option<String>,
    pub submit: SubmitControl,
}

impl FormState {
    pub fn new(fields: Vec<FieldState>, submit_label: impl Into<String>) -> Self {
        Self {
            fields,
            banner: None,
            submit: SubmitControl::new(submit_label),
        }
    }

    pub fn from_specs(specs: &[FieldSpec], submit_label: &str) -> Self {
        Self::new(specs.iter().map(FieldState::from).collect(), submit_label)
    }

    #[cfg(test)]
    pub fn field(&self, name: &str) -> Option<&FieldState> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[cfg(test)]
    pub fn field_mut(&mut self, name: &str) -> Option<&mut FieldState> {
        self.fields.iter_mut().find(|f| f.name == name)
    }

    pub fn invalid_count(&self) -> usize {
        self.fields.iter().filter(|f| f.has_error()).count()
    }

    pub fn dispatch(&mut self, event: FormEvent) -> Dispatch {
        if self.submit.is_disabled() {
            return Dispatch::Ignored;
        }

        match event {
            FormEvent::Input { field, value } => match self.fields.get_mut(field) {
                Some(f) => {
                    f.value = value;
                    clear_field_error(f);
                    Dispatch::Updated
                }
                None => Dispatch::Ignored,
            },
            FormEvent::Blur { field } => match self.fields.get_mut(field) {
                Some(f) => {
                    validate_field(f);
                    Dispatch::Updated
                }
                None => Dispatch::Ignored,
            },
            FormEvent::SubmitIntent => match self.submit() {
                Ok(form) => Dispatch::Accepted(form),
                Err(e) => Dispatch::Rejected(e),
            },
        }
    }

    /// Validate every required field and, if all pass, move the submit control
    /// into its busy state and hand back the values to send.
    pub fn submit(&mut self) -> Result<ValidatedForm, FormRejected> {
        if self.submit.busy {
            return Err(FormRejected::Busy);
        }

        // Validate all of them so every error shows, not just the first
        let mut invalid = 0;
        for field in self.fields.iter_mut().filter(|f| f.required) {
            if !validate_field(field) {
                invalid += 1;
            }
        }

        if invalid > 0 {
            tracing::info!("Submission blocked: {} invalid field(s)", invalid);
            self.banner = Some(FORM_ERROR_MESSAGE.to_string());
            return Err(FormRejected::Invalid(invalid));
        }

        self.banner = None;
        self.submit.set_busy();

        let values = self
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.value.clone()))
            .collect();

        Ok(ValidatedForm { values })
    }

    /// Return the control to idle once the in-flight submission settles.
    pub fn finish(&mut self, failure: Option<&str>) {
        self.submit.set_idle();
        if let Some(message) = failure {
            self.banner = Some(format!("Submission failed: {}", message));
        }
    }
}

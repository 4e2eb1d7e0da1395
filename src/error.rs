//! Error types shared by the record core. Every failure here is recoverable:
//! the shell turns each variant into a footer notification and carries on.

use std::fmt;

use thiserror::Error;

use crate::models::RecordId;

/// Input fields that can carry a validation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    FirstName,
    LastName,
    Category,
    Username,
    Password,
}

/// Per-field validation messages collected before any mutation happens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<(Field, String)>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `field`. Only the first message per field is kept.
    pub fn push(&mut self, field: Field, message: impl Into<String>) {
        if self.get(field).is_none() {
            self.errors.push((field, message.into()));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Message attached to `field`, if any.
    pub fn get(&self, field: Field) -> Option<&str> {
        self.errors
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, message)| message.as_str())
    }

    /// Convert into `Ok(value)` when empty, otherwise into a validation error.
    pub fn into_result<T>(self, value: T) -> Result<T, AdminError> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(AdminError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (_, message) in &self.errors {
            if !first {
                f.write_str("; ")?;
            }
            f.write_str(message)?;
            first = false;
        }
        Ok(())
    }
}

/// Failure kinds surfaced by the store, form bridge, session gate, and loader.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdminError {
    #[error("No record with id {0}.")]
    NotFound(RecordId),
    #[error("{0}")]
    Validation(ValidationErrors),
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Failed to fetch {resource}: {reason}")]
    LoadFailure { resource: String, reason: String },
    /// A request of the same kind is already in flight.
    #[error("Please wait for the current request to finish.")]
    Busy,
    #[error("No form is open.")]
    FormClosed,
}

impl AdminError {
    pub fn load_failure(resource: impl Into<String>, reason: impl fmt::Display) -> Self {
        AdminError::LoadFailure {
            resource: resource.into(),
            reason: reason.to_string(),
        }
    }
}

use std::fmt::{Display, Formatter};
use thiserror::Error;

/// A single rejected field of a work log or payment entry.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every field that failed validation for one entry. An entry with any field error is never
/// written to the store.
#[derive(Debug, Clone, Default, Eq, PartialEq, Error)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// Returns `Ok(())` when nothing was pushed, otherwise returns `self` as the error.
    pub(crate) fn into_result(self) -> Result<(), ValidationErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// True if `field` is among the rejected fields.
    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid entry")?;
        for (ix, e) in self.0.iter().enumerate() {
            let sep = if ix == 0 { ": " } else { "; " };
            write!(f, "{sep}{e}")?;
        }
        Ok(())
    }
}

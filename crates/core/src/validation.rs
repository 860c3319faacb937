//! Field-level validation errors.
//!
//! Intake validation reports every violated rule, not just the first, so a
//! caller can render one message next to each offending form control. Each
//! error is tagged with the wire name of the field it belongs to.

use serde::Serialize;
use utoipa::ToSchema;

/// A single validation failure, tagged with the wire name of the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    /// Wire name of the offending field (e.g. `"montantPaiement"`).
    pub champ: &'static str,
    /// Human-readable message, suitable for display next to the field.
    pub message: String,
}

impl FieldError {
    pub fn new(champ: &'static str, message: impl Into<String>) -> Self {
        Self {
            champ,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.champ, self.message)
    }
}

/// The full set of violations found in one validation pass.
///
/// Never empty when returned as an `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    /// Wraps a single field error.
    pub fn single(champ: &'static str, message: impl Into<String>) -> Self {
        Self(vec![FieldError::new(champ, message)])
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if some error is tagged with the given field name.
    pub fn concerne(&self, champ: &str) -> bool {
        self.0.iter().any(|e| e.champ == champ)
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for err in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}", err)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}
